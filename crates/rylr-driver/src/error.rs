//! Driver error types.

use rylr_protocol::{ProtocolError, Response, STATUS_NO_RESPONSE};
use thiserror::Error;

/// Errors returned by [`LoraModem`](crate::LoraModem) command operations.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No response from module")]
    NoResponse,

    #[error("Module reported error code {0}")]
    Device(u16),

    #[error("Unexpected response: {0:?}")]
    UnexpectedResponse(Response),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl DriverError {
    /// Status value in the `0 / >0 / -1` convention of
    /// [`result_value`](rylr_protocol::result_value).
    pub fn status_code(&self) -> i32 {
        match self {
            DriverError::Device(code) if *code > 0 => i32::from(*code),
            _ => STATUS_NO_RESPONSE,
        }
    }
}

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Most recent link fault seen by the receive path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFault {
    /// No byte arrived within the read timeout.
    Timeout,
    /// A message frame failed to parse.
    MalformedFrame,
    /// A frame was dropped for lack of buffer space.
    Overflow,
    /// Unsent outbound data was discarded.
    Overwrite,
    /// The transport reported an I/O error.
    Transport,
}
