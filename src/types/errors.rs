//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use crate::platform::ClientError;
use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the predictor MCP server.
#[derive(Error, Debug)]
pub enum Error {
    /// A typed value carried a `kind` that cannot be decoded.
    #[error("cannot deserialize value of kind '{0}' to a native value")]
    UnsupportedValueKind(String),

    /// A native value has no typed-value representation.
    #[error("cannot serialize value of type '{0}' to a typed value")]
    UnsupportedValueType(String),

    /// Referenced file does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed tool arguments or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Tensor byte length disagrees with its dtype and shape.
    #[error("invalid tensor: {0}")]
    InvalidTensor(String),

    /// Prediction record violates the results/error exclusivity.
    #[error("invalid prediction: {0}")]
    InvalidPrediction(String),

    /// Prediction platform client failure.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Image decoding or encoding failure.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable error code for logs and protocol error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnsupportedValueKind(_) => "UNSUPPORTED_VALUE_KIND",
            Error::UnsupportedValueType(_) => "UNSUPPORTED_VALUE_TYPE",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Validation(_) => "INVALID_ARGUMENT",
            Error::InvalidTensor(_) => "INVALID_TENSOR",
            Error::InvalidPrediction(_) => "INVALID_PREDICTION",
            Error::Client(_) => "EXTERNAL_CLIENT",
            Error::Image(_) => "IMAGE",
            Error::Serialization(_) => "SERIALIZATION",
            Error::Io(_) => "IO",
        }
    }

    /// Map a filesystem error on `path`, splitting out missing files.
    pub fn from_io_at(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(path.display().to_string())
        } else {
            Error::Io(err)
        }
    }
}

// Convenience constructors
impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_tensor(msg: impl Into<String>) -> Self {
        Self::InvalidTensor(msg.into())
    }

    pub fn invalid_prediction(msg: impl Into<String>) -> Self {
        Self::InvalidPrediction(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ClientErrorKind;

    #[test]
    fn test_missing_file_maps_to_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let mapped = Error::from_io_at(err, std::path::Path::new("/tmp/missing.png"));
        assert!(matches!(mapped, Error::NotFound(ref p) if p == "/tmp/missing.png"));
        assert_eq!(mapped.code(), "NOT_FOUND");
    }

    #[test]
    fn test_other_io_errors_stay_io() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let mapped = Error::from_io_at(err, std::path::Path::new("/root/secret.png"));
        assert!(matches!(mapped, Error::Io(_)));
    }

    #[test]
    fn test_client_error_message_is_transparent() {
        let err: Error = ClientError::new(ClientErrorKind::NotFound, "no predictor @a/b").into();
        assert_eq!(err.to_string(), "not found: no predictor @a/b");
        assert_eq!(err.code(), "EXTERNAL_CLIENT");
    }

    #[test]
    fn test_unsupported_kind_message_names_tag() {
        let err = Error::UnsupportedValueKind("tensor".to_string());
        assert!(err.to_string().contains("'tensor'"));
    }
}
