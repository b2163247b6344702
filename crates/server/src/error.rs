//! Errors raised by the host itself, as opposed to the worker or store.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Tool arguments that cannot be turned into a request.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The host's own network fetch for a passthrough request failed.
    #[error("PASSTHROUGH_FAILED: {0}")]
    PassthroughFailed(String),
}

impl From<HostError> for McpError {
    fn from(err: HostError) -> Self {
        let (code, message) = match &err {
            HostError::InvalidInput(msg) => (-32602, msg.clone()),
            HostError::PassthroughFailed(msg) => (-32008, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
