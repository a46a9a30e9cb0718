//! Error types for jsonecho-core

use thiserror::Error;

/// Diagnostic sent when the request body cannot be read
pub const READ_BODY_FAILED: &str = "Failed to read request body";

/// Diagnostic sent when the request body is not a JSON object
pub const PARSE_JSON_FAILED: &str = "Failed to parse JSON";

/// Result type alias for jsonecho operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the echo handlers
#[derive(Debug, Error)]
pub enum Error {
    /// Reading the request body failed
    #[error("Failed to read request body: {0}")]
    ReadBody(#[source] std::io::Error),

    /// Writing the response body failed
    #[error("Failed to write response body: {0}")]
    WriteBody(#[source] std::io::Error),

    /// The body relay thread could not be started
    #[error("Failed to start body relay: {0}")]
    Relay(#[source] std::io::Error),

    /// The body relay thread panicked
    #[error("Body relay panicked")]
    RelayPanicked,

    /// The JSON stream broke off while a decoder was pulling from it
    #[error("Failed to read JSON stream: {0}")]
    DecodeStream(#[source] std::io::Error),

    /// A `\uXXXX` escape names half of a surrogate pair without the other half
    #[error("lone surrogate escape at byte {offset}")]
    LoneSurrogate { offset: usize },

    /// serde_json decode or encode failure
    #[error("serde_json: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// simd-json decode or encode failure
    #[error("simd-json: {0}")]
    SimdJson(#[from] simd_json::Error),

    /// Invalid HTTP method
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// IO error (native only)
    #[cfg(feature = "native")]
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the failure happened before any JSON was looked at
    pub fn is_read_failure(&self) -> bool {
        matches!(self, Error::ReadBody(_) | Error::Relay(_) | Error::RelayPanicked)
    }

    /// The fixed diagnostic an HTTP caller sees for this error
    pub fn diagnostic(&self) -> &'static str {
        if self.is_read_failure() {
            READ_BODY_FAILED
        } else {
            PARSE_JSON_FAILED
        }
    }
}
