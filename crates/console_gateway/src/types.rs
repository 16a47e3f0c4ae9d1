use console_core::RemoteError;
use serde::Deserialize;
use thiserror::Error;

/// Failure of a gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Rejected locally before anything was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Connection, DNS, TLS or timeout failure.
    #[error("network error: {0}")]
    Transport(String),
    #[error("http status {code}{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Status { code: u16, detail: Option<String> },
    #[error("unexpected response: {0}")]
    Malformed(String),
}

impl From<GatewayError> for RemoteError {
    fn from(err: GatewayError) -> Self {
        match err {
            // The server answers a bad filename with 400 and a detail; a local
            // rejection reads the same to the operator.
            GatewayError::InvalidInput(message) => RemoteError::Status {
                code: 400,
                detail: Some(message),
            },
            GatewayError::Transport(message) => RemoteError::Transport(message),
            GatewayError::Status { code, detail } => RemoteError::Status { code, detail },
            GatewayError::Malformed(message) => RemoteError::Malformed(message),
        }
    }
}

/// Error body of a non-success response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// The detail when it is a plain message; validation errors arrive as a
    /// list and are not shown verbatim.
    pub(crate) fn message(self) -> Option<String> {
        match self.detail? {
            serde_json::Value::String(text) if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }
}

/// `{"message": ...}` reply of mutating routes; other keys are ignored.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct MessageBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FilesBody {
    pub files: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PromptBody {
    pub content: String,
}
