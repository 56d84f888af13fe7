//! Prediction platform client errors.

use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    NotFound,
    Unauthorized,
    InvalidRequest,
    RateLimited,
    Timeout,
    Unavailable,
    Transport,
    Decode,
}

impl Display for ClientErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ClientErrorKind::NotFound => "not found",
            ClientErrorKind::Unauthorized => "unauthorized",
            ClientErrorKind::InvalidRequest => "invalid request",
            ClientErrorKind::RateLimited => "rate limited",
            ClientErrorKind::Timeout => "timeout",
            ClientErrorKind::Unavailable => "unavailable",
            ClientErrorKind::Transport => "transport error",
            ClientErrorKind::Decode => "decode error",
        };
        f.write_str(name)
    }
}

/// A call-level failure raised by the platform client.
///
/// Distinct from a prediction that ran and reported an error: that outcome
/// travels inside the prediction record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
    pub kind: ClientErrorKind,
    pub message: String,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::NotFound, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::InvalidRequest, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Transport, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Decode, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ClientErrorKind::NotFound
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ClientErrorKind::Timeout, err.to_string())
        } else if err.is_decode() {
            Self::decode(err.to_string())
        } else {
            Self::transport(err.to_string())
        }
    }
}
