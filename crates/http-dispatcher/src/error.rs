//! HTTP error types

use serde_json::Value;
use thiserror::Error;

/// Errors that can surface from a dispatched request
#[derive(Debug, Error)]
pub enum HttpError {
    /// Response received with a status outside 2xx
    #[error("HTTP error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message taken from the response body, or the reason phrase
        message: String,
        /// Parsed JSON body, when the response carried one
        body: Option<Value>,
    },
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),
    /// Request timeout
    #[error("Request timeout")]
    Timeout,
    /// Request aborted through its cancellation token
    #[error("Request aborted")]
    Aborted,
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Header name or value rejected
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    /// Client build error
    #[error("Client build error: {0}")]
    Build(String),
    /// Error raised by a hook or a custom transport
    #[error(transparent)]
    Custom(#[from] Box<dyn std::error::Error + Send + Sync>),
    /// Other error
    #[error("{0}")]
    Other(String),
}

impl HttpError {
    /// Wrap any error as [`HttpError::Custom`]
    pub fn custom<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        HttpError::Custom(Box::new(err))
    }

    /// Status code, when this is a status error
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Parsed response body attached to a status error
    pub fn body(&self) -> Option<&Value> {
        match self {
            HttpError::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Message of a status error, or the display form of any other error
    pub fn message(&self) -> String {
        match self {
            HttpError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        HttpError::Serialization(err.to_string())
    }
}
