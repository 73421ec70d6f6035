// HTTP/JSON publisher

use crate::config::CloudConfig;
use crate::errors::PublishError;
use crate::models::{PublishRequest, PublishResponse};
use crate::rpc::publisher::{Publisher, RpcFrame};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Publishes requests as JSON POST bodies
pub struct HttpRpcPublisher {
    client: Client,
}

impl HttpRpcPublisher {
    /// Create a new publisher with the specified request timeout
    pub fn new(timeout_seconds: u64) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| {
                PublishError::Connection(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    pub fn from_config(config: &CloudConfig) -> Result<Self, PublishError> {
        Self::new(config.request_timeout_seconds)
    }
}

#[async_trait]
impl Publisher for HttpRpcPublisher {
    #[instrument(skip(self, request), fields(cmd = %request.cmd))]
    async fn call(
        &self,
        endpoint: &str,
        request: &PublishRequest,
    ) -> Result<PublishResponse, PublishError> {
        let frame = RpcFrame::new(endpoint, request);
        debug!(call_id = %frame.id, "Sending request");

        let payload = serde_json::to_vec(&frame)?;
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Endpoint rejected request");
            return Err(PublishError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(PublishResponse(serde_json::Value::Null));
        }

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| PublishError::InvalidResponse(format!("Body is not JSON: {}", e)))?;

        debug!(call_id = %frame.id, "Received response");
        Ok(PublishResponse(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_publisher_from_config() {
        let publisher = HttpRpcPublisher::from_config(&CloudConfig::default());
        assert!(publisher.is_ok());
    }
}
