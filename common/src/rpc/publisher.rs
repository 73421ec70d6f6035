// Publisher trait and the frame sent over the wire

use crate::errors::PublishError;
use crate::models::{PublishArgs, PublishRequest, PublishResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sends a named command to a remote endpoint and yields its response
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one request to `endpoint`
    ///
    /// Resolves exactly once, when the reply arrives or the call fails.
    async fn call(
        &self,
        endpoint: &str,
        request: &PublishRequest,
    ) -> Result<PublishResponse, PublishError>;
}

/// Request envelope: the command descriptor plus call routing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcFrame {
    /// Unique call ID
    pub id: Uuid,
    /// Destination endpoint
    pub dst: String,
    pub cmd: String,
    pub args: PublishArgs,
}

impl RpcFrame {
    pub fn new(endpoint: &str, request: &PublishRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            dst: endpoint.to_string(),
            cmd: request.cmd.clone(),
            args: request.args.clone(),
        }
    }
}
