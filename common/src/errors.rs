// Error handling framework

use std::time::Duration;
use thiserror::Error;

/// Errors raised while publishing a reading to the cloud endpoint
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Failed to reach endpoint: {0}")]
    Connection(String),

    #[error("Endpoint responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response from endpoint: {0}")]
    InvalidResponse(String),

    #[error("Request serialization failed: {0}")]
    Serialization(String),

    #[error("No response after {0:?}")]
    Timeout(Duration),
}

impl PublishError {
    /// Short label used for metrics and alerts
    pub fn reason(&self) -> &'static str {
        match self {
            PublishError::Connection(_) => "connection",
            PublishError::Status { .. } => "status",
            PublishError::InvalidResponse(_) => "invalid_response",
            PublishError::Serialization(_) => "serialization",
            PublishError::Timeout(_) => "timeout",
        }
    }
}

/// Readiness gate errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("Readiness gate closed before the transport became ready")]
    Closed,
}

/// Fatal errors that end the scheduler loop
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Readiness gate failed: {0}")]
    Gate(#[from] GateError),

    #[error("Scheduler loop is already running")]
    AlreadyRunning,
}

/// Configuration validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },
}

impl ValidationError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFieldValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for PublishError {
    fn from(err: serde_json::Error) -> Self {
        PublishError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for PublishError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PublishError::InvalidResponse(err.to_string())
        } else {
            PublishError::Connection(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_error_status_display() {
        let err = PublishError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("unavailable"));
    }

    #[test]
    fn test_publish_error_reason_labels() {
        assert_eq!(PublishError::Connection("x".into()).reason(), "connection");
        assert_eq!(
            PublishError::Timeout(Duration::from_millis(500)).reason(),
            "timeout"
        );
    }

    #[test]
    fn test_json_error_converts_to_serialization() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: PublishError = json_err.into();
        assert!(matches!(err, PublishError::Serialization(_)));
        assert_eq!(err.reason(), "serialization");
    }

    #[test]
    fn test_gate_error_converts_to_scheduler_error() {
        let err: SchedulerError = GateError::Closed.into();
        assert!(matches!(err, SchedulerError::Gate(GateError::Closed)));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::invalid("cloud.endpoint_url", "cannot be empty");
        assert_eq!(
            err.to_string(),
            "Invalid field value for cloud.endpoint_url: cannot be empty"
        );
    }
}
