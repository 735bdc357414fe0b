//! Error types for the REST terminus.
//!
//! # Design
//! A 404 is not an error: every operation maps it to its own absent result
//! (`None`, `false`, empty `Vec`). Everything else that goes wrong surfaces
//! here unchanged, and nothing in the terminus retries.

use thiserror::Error;

/// Boxed error raised by a model's encoder or decoder.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by terminus operations.
#[derive(Debug, Error)]
pub enum TerminusError {
    /// The server answered with a status that is neither 2xx nor 404.
    #[error("Error {code} on SERVER: {detail}")]
    Protocol { code: u16, detail: String },

    /// The caller built a request the operation cannot carry. Raised before
    /// any connection is requested.
    #[error("{0}")]
    InvalidArgument(String),

    /// A success response could not be interpreted, e.g. no content type.
    #[error("{0}")]
    Parse(String),

    /// The model's decoder rejected the response body.
    #[error("{0}")]
    Decode(#[source] BoxError),

    /// The instance could not be rendered for a `save`.
    #[error("{0}")]
    Encode(#[source] BoxError),

    /// The body claimed a content encoding it could not be decoded with.
    #[error("failed to decompress response body: {0}")]
    Decompress(#[from] std::io::Error),

    /// A server or port setting is missing or unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// The connection provider or the connection itself failed.
    #[error("transport error: {0}")]
    Transport(String),
}

impl TerminusError {
    /// Status code carried by a protocol error.
    pub fn status(&self) -> Option<u16> {
        match self {
            TerminusError::Protocol { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TerminusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_message_names_the_server() {
        let err = TerminusError::Protocol {
            code: 500,
            detail: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Error 500 on SERVER: boom");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn decode_error_displays_its_source() {
        let source: BoxError = "bad payload".into();
        let err = TerminusError::Decode(source);
        assert_eq!(err.to_string(), "bad payload");
        assert_eq!(err.status(), None);
    }
}
