//! Response classification.
//!
//! Responses from the module are single lines and can be:
//! - Success: `+OK`
//! - Device error: `+ERR=<code>`
//! - Query result: `+<KEY>=<value>` (e.g. `+VER=RYLR998_REYAX_V1.2.2`)
//! - Power-on notice: `+READY`

use crate::constants::{CR, ERR_PREFIX, LINE_TERMINATOR, OK_TOKEN, READY_TOKEN};

/// Status value for a response that is missing or not understood.
pub const STATUS_NO_RESPONSE: i32 = -1;

/// Status value for a successful command.
pub const STATUS_OK: i32 = 0;

/// Parsed response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Command accepted.
    Ok,

    /// Command rejected with a device error code.
    Error(u16),

    /// Module finished a reset.
    Ready,

    /// Query result.
    Value {
        /// Key without the leading `+`.
        key: String,
        /// Value text after `=`.
        value: String,
    },

    /// Unknown/unrecognized response.
    Unknown(String),
}

impl Response {
    /// Parse a response line (terminator optional).
    pub fn parse(frame: &[u8]) -> Response {
        let text = trim_terminator(frame);

        if text == OK_TOKEN {
            return Response::Ok;
        }

        if text == READY_TOKEN {
            return Response::Ready;
        }

        if let Some(code) = text.strip_prefix(ERR_PREFIX) {
            return match parse_code(code) {
                Some(code) => Response::Error(code),
                None => Response::Unknown(String::from_utf8_lossy(text).into_owned()),
            };
        }

        if let Some(rest) = text.strip_prefix(b"+") {
            if let Some(eq) = rest.iter().position(|&b| b == b'=') {
                return Response::Value {
                    key: String::from_utf8_lossy(&rest[..eq]).into_owned(),
                    value: String::from_utf8_lossy(&rest[eq + 1..]).into_owned(),
                };
            }
        }

        Response::Unknown(String::from_utf8_lossy(text).into_owned())
    }

    /// Check if this is an OK response.
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok)
    }

    /// Check if this is a device error response.
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }

    /// Get the device error code if this is an Error response.
    pub fn error_code(&self) -> Option<u16> {
        match self {
            Response::Error(code) => Some(*code),
            _ => None,
        }
    }

    /// Get the value if this is a query result for `key`.
    pub fn value_for(&self, key: &str) -> Option<&str> {
        match self {
            Response::Value { key: k, value } if k == key => Some(value),
            _ => None,
        }
    }

    /// Numeric status: `0` for OK, the device code for errors, `-1` otherwise.
    ///
    /// Device codes are positive; `+ERR=0` maps to `-1`.
    pub fn status_code(&self) -> i32 {
        match self {
            Response::Ok => STATUS_OK,
            Response::Error(code) if *code > 0 => i32::from(*code),
            _ => STATUS_NO_RESPONSE,
        }
    }
}

/// Map a response frame to a status value.
///
/// - `0`: `+OK`
/// - `>0`: error code reported by the module (`+ERR=<code>`)
/// - `-1`: no response (timeout) or anything else
pub fn result_value(frame: Option<&[u8]>) -> i32 {
    frame.map_or(STATUS_NO_RESPONSE, |frame| Response::parse(frame).status_code())
}

fn parse_code(digits: &[u8]) -> Option<u16> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

fn trim_terminator(mut frame: &[u8]) -> &[u8] {
    while let Some((&last, rest)) = frame.split_last() {
        if last == CR || last == LINE_TERMINATOR {
            frame = rest;
        } else {
            break;
        }
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ok() {
        let response = Response::parse(b"+OK");
        assert_eq!(response, Response::Ok);
        assert!(response.is_ok());
        assert_eq!(response.status_code(), 0);
    }

    #[test]
    fn test_parse_ok_with_terminator() {
        assert_eq!(Response::parse(b"+OK\r\n"), Response::Ok);
    }

    #[test]
    fn test_parse_error() {
        let response = Response::parse(b"+ERR=12");
        assert_eq!(response, Response::Error(12));
        assert!(response.is_error());
        assert_eq!(response.error_code(), Some(12));
        assert_eq!(response.status_code(), 12);
    }

    #[test]
    fn test_parse_error_without_code() {
        let response = Response::parse(b"+ERR=");
        assert_eq!(response, Response::Unknown("+ERR=".to_string()));
        assert_eq!(response.status_code(), -1);
    }

    #[test]
    fn test_parse_value() {
        let response = Response::parse(b"+VER=RYLR998_REYAX_V1.2.2");
        assert_eq!(response.value_for("VER"), Some("RYLR998_REYAX_V1.2.2"));
        assert_eq!(response.value_for("ADDRESS"), None);
        assert_eq!(response.status_code(), -1);
    }

    #[test]
    fn test_parse_ready() {
        assert_eq!(Response::parse(b"+READY"), Response::Ready);
    }

    #[test]
    fn test_parse_unknown() {
        let response = Response::parse(b"garbage");
        assert_eq!(response, Response::Unknown("garbage".to_string()));
    }

    #[test]
    fn test_result_value() {
        assert_eq!(result_value(Some(b"+OK")), 0);
        assert_eq!(result_value(Some(b"+ERR=4")), 4);
        assert_eq!(result_value(Some(b"+ERR=17")), 17);
        assert_eq!(result_value(Some(b"+OKAY")), -1);
        assert_eq!(result_value(Some(b"")), -1);
        assert_eq!(result_value(None), -1);
    }

    #[test]
    fn test_zero_error_code_is_not_success() {
        let response = Response::parse(b"+ERR=0");
        assert_eq!(response, Response::Error(0));
        assert_eq!(response.status_code(), -1);
        assert_eq!(result_value(Some(b"+ERR=0\r\n")), -1);
    }
}
