use thiserror::Error;

use crate::types::error_types::Error as ApiError;

/// A unified error type for this library.
#[derive(Debug, Error)]
pub enum LusterError {
    /// HTTP request failed (network or protocol issue).
    #[error("Reqwest Error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    /// HTTP returned a non-2xx status and the body parsed as an API error.
    #[error("API Error ({status}): {error:?}")]
    ApiError { status: u16, error: ApiError },

    /// The server returned an error code we didn't parse as `ApiError`.
    /// Contains the HTTP status code and raw body.
    #[error("Non-success HTTP status {code}, body: {body}")]
    HttpStatus { code: u16, body: String },

    /// Serde (de)serialization error.
    #[error("Serde JSON error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("WebSocket not connected")]
    NotConnected,

    #[error("WebSocket is already running on this client")]
    AlreadyRunning,

    #[error("HTTP handler has been closed")]
    Closed,

    // Other
    #[error("Other error: {0}")]
    Other(String),
}

impl LusterError {
    /// HTTP status of a failed request, if this error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            Self::HttpStatus { code, .. } => Some(*code),
            Self::ReqwestError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// The caller lacks the permission needed for the request.
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// The parsed API error body, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::ApiError { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Convert an `Error` object from the API into a `LusterError::ApiError`.
pub fn handle_api_error(status: u16, err: ApiError) -> LusterError {
    LusterError::ApiError { status, error: err }
}
