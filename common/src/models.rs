// Data models shared by the sensor, publisher and scheduler

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One simulated sensor value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub value: f64,
    pub taken_at: DateTime<Utc>,
}

impl Reading {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            taken_at: Utc::now(),
        }
    }
}

/// Label set attached to a published sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricLabels {
    #[serde(rename = "__name__")]
    pub name: String,
}

/// `[labels, value]` pair, serialized as a two element array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample(pub MetricLabels, pub f64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishArgs {
    pub vars: Vec<MetricSample>,
}

/// Command descriptor handed to the publisher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub cmd: String,
    pub args: PublishArgs,
}

impl PublishRequest {
    /// Build a single-sample metrics publish request
    pub fn metric(command: &str, metric_name: &str, reading: Reading) -> Self {
        Self {
            cmd: command.to_string(),
            args: PublishArgs {
                vars: vec![MetricSample(
                    MetricLabels {
                        name: metric_name.to_string(),
                    },
                    reading.value,
                )],
            },
        }
    }
}

/// Opaque response returned by the publisher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublishResponse(pub serde_json::Value);

impl fmt::Display for PublishResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scheduler loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    AwaitingReadiness,
    AwaitingResponse,
    Stopped,
}

/// Snapshot of the scheduler loop counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStats {
    pub cycles_completed: u64,
    pub publishes_succeeded: u64,
    pub publishes_failed: u64,
    pub consecutive_failures: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metric_request_matches_wire_shape() {
        let request = PublishRequest::metric("/v1/Metrics.Publish", "value", Reading::new(27.5));

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            json!({
                "cmd": "/v1/Metrics.Publish",
                "args": { "vars": [[{ "__name__": "value" }, 27.5]] }
            })
        );
    }

    #[test]
    fn test_metric_request_has_single_sample() {
        let request = PublishRequest::metric("cmd", "temperature", Reading::new(21.0));
        assert_eq!(request.args.vars.len(), 1);
        assert_eq!(request.args.vars[0].0.name, "temperature");
        assert_eq!(request.args.vars[0].1, 21.0);
    }

    #[test]
    fn test_publish_response_display_is_json() {
        let response = PublishResponse(json!({ "status": 0 }));
        assert_eq!(response.to_string(), r#"{"status":0}"#);
    }

    #[test]
    fn test_loop_state_serialization() {
        assert_eq!(
            serde_json::to_string(&LoopState::AwaitingReadiness).unwrap(),
            "\"awaiting_readiness\""
        );
    }
}
