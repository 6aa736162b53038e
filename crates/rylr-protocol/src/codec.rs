//! Line framing for the AT protocol.
//!
//! Responses are plain `\r\n`-terminated lines. Message lines (`+RCV=`) carry
//! a length field followed by that many raw payload bytes, and those bytes are
//! exempt from separator counting and terminator detection. The scanner is fed
//! one byte at a time and decides where the current frame ends; it does not
//! store bytes itself.

use crate::constants::{
    COMMAND_TERMINATOR, CR, FIELD_SEPARATOR, LINE_TERMINATOR, MAX_LENGTH_FIELD, RCV_PREFIX,
};

/// Kind of frame recognized on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameKind {
    /// Response to a previously issued command.
    #[default]
    Response,
    /// Unsolicited received-message line (`+RCV=`).
    Message,
}

/// Outcome of feeding one byte to a [`FrameScanner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStep {
    /// The byte is part of the frame.
    Data,
    /// The byte is the frame terminator; the frame is complete.
    Complete,
}

/// Incremental frame boundary detector.
///
/// Tracks:
/// - the number of bytes seen since the start of the frame
/// - whether the first five bytes spell `+RCV=`
/// - unescaped field separators, and for message frames the length field
///   between the first and second separator
/// - the countdown of opaque payload bytes still to pass through
#[derive(Debug, Clone, Default)]
pub struct FrameScanner {
    read_count: usize,
    comma_count: usize,
    prefix_mismatch: bool,
    kind: FrameKind,
    length_value: usize,
    length_digits: usize,
    length_invalid: bool,
    declared_len: Option<usize>,
    payload_remaining: usize,
    last_was_cr: bool,
}

impl FrameScanner {
    /// Create a scanner positioned at the start of a frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to the start of a new frame.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed the next byte of the stream.
    pub fn feed(&mut self, byte: u8) -> ScanStep {
        self.read_count += 1;

        if self.payload_remaining > 0 {
            self.payload_remaining -= 1;
            self.last_was_cr = false;
            return ScanStep::Data;
        }

        if byte == LINE_TERMINATOR {
            return ScanStep::Complete;
        }

        if self.read_count <= RCV_PREFIX.len() && byte != RCV_PREFIX[self.read_count - 1] {
            self.prefix_mismatch = true;
        }
        if self.read_count == RCV_PREFIX.len() && !self.prefix_mismatch {
            self.kind = FrameKind::Message;
        }

        if byte == FIELD_SEPARATOR {
            self.comma_count += 1;
            if self.kind == FrameKind::Message && self.comma_count == 2 {
                self.start_payload();
            }
        } else if self.kind == FrameKind::Message && self.comma_count == 1 {
            self.push_length_byte(byte);
        }

        self.last_was_cr = byte == CR;
        ScanStep::Data
    }

    fn push_length_byte(&mut self, byte: u8) {
        if !byte.is_ascii_digit() {
            self.length_invalid = true;
            return;
        }
        self.length_digits += 1;
        self.length_value = self
            .length_value
            .saturating_mul(10)
            .saturating_add(usize::from(byte - b'0'));
    }

    fn start_payload(&mut self) {
        if self.length_invalid || self.length_digits == 0 || self.length_value > MAX_LENGTH_FIELD {
            // Leave the frame to end at the next terminator; the message parser
            // rejects it later.
            log::debug!("message frame with unusable length field");
            return;
        }
        self.declared_len = Some(self.length_value);
        self.payload_remaining = self.length_value;
    }

    /// Kind of the frame being scanned.
    ///
    /// Only meaningful once at least five bytes have been fed.
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Total bytes fed since the start of the frame, terminator included.
    pub fn read_count(&self) -> usize {
        self.read_count
    }

    /// Declared payload length, once the length field has been decoded.
    pub fn declared_len(&self) -> Option<usize> {
        self.declared_len
    }

    /// Whether the scanner is inside an opaque payload.
    pub fn in_payload(&self) -> bool {
        self.payload_remaining > 0
    }

    /// Length of the completed frame without its `\r\n` terminator.
    ///
    /// Valid after [`ScanStep::Complete`] was returned.
    pub fn content_len(&self) -> usize {
        let before_terminator = self.read_count.saturating_sub(1);
        if self.last_was_cr {
            before_terminator.saturating_sub(1)
        } else {
            before_terminator
        }
    }
}

/// Whether a frame is a received-message line.
pub fn is_message_frame(frame: &[u8]) -> bool {
    frame.starts_with(RCV_PREFIX)
}

/// Encode a command line for transmission.
///
/// Appends the `\r\n` terminator.
pub fn encode_command(cmd: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(cmd.len() + COMMAND_TERMINATOR.len());
    buf.extend_from_slice(cmd.as_bytes());
    buf.extend_from_slice(COMMAND_TERMINATOR);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed bytes until a frame completes; returns the scanner and bytes consumed.
    fn scan(input: &[u8]) -> (FrameScanner, Option<usize>) {
        let mut scanner = FrameScanner::new();
        for (i, &byte) in input.iter().enumerate() {
            if scanner.feed(byte) == ScanStep::Complete {
                return (scanner, Some(i + 1));
            }
        }
        (scanner, None)
    }

    #[test]
    fn test_encode_command() {
        assert_eq!(encode_command("AT"), b"AT\r\n");
    }

    #[test]
    fn test_response_frame() {
        let (scanner, used) = scan(b"+OK\r\n+ERR=4\r\n");
        assert_eq!(used, Some(5));
        assert_eq!(scanner.kind(), FrameKind::Response);
        assert_eq!(scanner.content_len(), 3);
    }

    #[test]
    fn test_response_without_cr() {
        let (scanner, used) = scan(b"+OK\n");
        assert_eq!(used, Some(4));
        assert_eq!(scanner.content_len(), 3);
    }

    #[test]
    fn test_message_prefix_detected_after_five_bytes() {
        let mut scanner = FrameScanner::new();
        for &b in b"+RCV" {
            scanner.feed(b);
        }
        assert_eq!(scanner.kind(), FrameKind::Response);
        scanner.feed(b'=');
        assert_eq!(scanner.kind(), FrameKind::Message);
    }

    #[test]
    fn test_near_prefix_is_response() {
        let (scanner, _) = scan(b"+RCX=1,2,ab,-1,2\r\n");
        assert_eq!(scanner.kind(), FrameKind::Response);
        assert_eq!(scanner.declared_len(), None);
    }

    #[test]
    fn test_message_payload_with_terminators() {
        let input = b"+RCV=3,6,a\r\n,b\n,-40,9\r\n";
        let (scanner, used) = scan(input);
        assert_eq!(used, Some(input.len()));
        assert_eq!(scanner.kind(), FrameKind::Message);
        assert_eq!(scanner.declared_len(), Some(6));
        assert_eq!(scanner.content_len(), input.len() - 2);
    }

    #[test]
    fn test_payload_ending_in_newline() {
        let input = b"+RCV=3,2,a\n,-40,9\r\n";
        let (_, used) = scan(input);
        assert_eq!(used, Some(input.len()));
    }

    #[test]
    fn test_payload_ending_in_cr_is_not_trimmed_early() {
        let input = b"+RCV=3,1,\r,-40,9\r\n";
        let (scanner, used) = scan(input);
        assert_eq!(used, Some(input.len()));
        assert_eq!(scanner.content_len(), input.len() - 2);
    }

    #[test]
    fn test_invalid_length_falls_back_to_line() {
        let (scanner, used) = scan(b"+RCV=3,x,ab\r\nrest");
        assert_eq!(used, Some(13));
        assert_eq!(scanner.kind(), FrameKind::Message);
        assert_eq!(scanner.declared_len(), None);
    }

    #[test]
    fn test_blank_line() {
        let (scanner, used) = scan(b"\r\n");
        assert_eq!(used, Some(2));
        assert_eq!(scanner.content_len(), 0);
    }

    #[test]
    fn test_reset() {
        let mut scanner = FrameScanner::new();
        for &b in b"+RCV=1,5,ab" {
            scanner.feed(b);
        }
        assert!(scanner.in_payload());
        scanner.reset();
        assert!(!scanner.in_payload());
        assert_eq!(scanner.read_count(), 0);
        assert_eq!(scanner.kind(), FrameKind::Response);
    }

    #[test]
    fn test_is_message_frame() {
        assert!(is_message_frame(b"+RCV=1,1,a,-1,1"));
        assert!(!is_message_frame(b"+OK"));
        assert!(!is_message_frame(b"+RCV"));
    }
}
