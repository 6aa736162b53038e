//! Error types for the AT protocol.

use thiserror::Error;

/// Errors that can occur when working with the AT protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The frame does not start with `+RCV=`.
    #[error("not a message frame")]
    NotAMessage,

    /// A field separator was missing where one was required.
    #[error("missing separator after {field} field")]
    MissingSeparator {
        /// Name of the field being parsed.
        field: &'static str,
    },

    /// A numeric field did not parse.
    #[error("invalid {field} field: {text:?}")]
    InvalidNumber {
        /// Name of the field being parsed.
        field: &'static str,
        /// The offending field text.
        text: String,
    },

    /// The payload is shorter than its declared length, or is not followed by
    /// a separator.
    #[error("payload does not match declared length {declared}")]
    LengthMismatch {
        /// Length announced in the length field.
        declared: usize,
    },

    /// Invalid command argument.
    #[error("invalid command: {0}")]
    InvalidCommand(String),
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
