//! Received-message parsing.
//!
//! A message line has the form:
//!
//! ```text
//! +RCV=<address>,<length>,<data>,<rssi>,<snr>
//! ```
//!
//! `<data>` is exactly `<length>` raw bytes and is located by count, never by
//! searching for separators. Fields are parsed strictly in order and a missing
//! separator rejects the whole frame.

use std::ops::Range;

use crate::constants::{FIELD_SEPARATOR, RCV_PREFIX};
use crate::error::{ProtocolError, ProtocolResult};

/// Frames inside the receive buffer are separated by a NUL byte.
const FRAME_SEPARATOR: u8 = 0;

/// Field positions of a parsed message frame.
///
/// Holds offsets rather than borrows so the caller can update its own
/// bookkeeping before handing out a [`RxMessage`] view with
/// [`MessageLayout::view`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLayout {
    /// Sender address.
    pub from_address: u16,
    /// Declared payload length.
    pub data_len: u16,
    /// Received signal strength in dBm.
    pub rssi: i32,
    /// Signal-to-noise ratio in dB.
    pub snr: i32,
    /// Payload position relative to the start of the frame.
    pub data: Range<usize>,
    /// Bytes occupied by the frame, including its NUL separator when present.
    pub frame_len: usize,
}

impl MessageLayout {
    /// Parse the message frame at the start of `frame`.
    ///
    /// `frame` may be followed by further NUL-separated frames; parsing stops at
    /// the NUL that ends the `<snr>` field.
    pub fn parse(frame: &[u8]) -> ProtocolResult<MessageLayout> {
        if !frame.starts_with(RCV_PREFIX) {
            return Err(ProtocolError::NotAMessage);
        }

        let (address, pos) = next_field(frame, RCV_PREFIX.len(), "address")?;
        let from_address = parse_number(address, "address")?;

        let (length, pos) = next_field(frame, pos, "length")?;
        let data_len: u16 = parse_number(length, "length")?;

        let data = pos..pos + usize::from(data_len);
        if frame.get(data.end) != Some(&FIELD_SEPARATOR) {
            return Err(ProtocolError::LengthMismatch {
                declared: usize::from(data_len),
            });
        }

        let (rssi, pos) = next_field(frame, data.end + 1, "rssi")?;
        let rssi = parse_number(rssi, "rssi")?;

        let end = frame[pos..]
            .iter()
            .position(|&b| b == FRAME_SEPARATOR)
            .map(|i| pos + i);
        let snr = parse_number(&frame[pos..end.unwrap_or(frame.len())], "snr")?;
        let frame_len = end.map_or(frame.len(), |e| e + 1);

        Ok(MessageLayout {
            from_address,
            data_len,
            rssi,
            snr,
            data,
            frame_len,
        })
    }

    /// Borrow the payload out of the frame this layout was parsed from.
    pub fn view<'a>(&self, frame: &'a [u8]) -> RxMessage<'a> {
        RxMessage {
            from_address: self.from_address,
            data_len: self.data_len,
            data: &frame[self.data.clone()],
            rssi: self.rssi,
            snr: self.snr,
        }
    }
}

/// A received message borrowing its payload from the receive buffer.
///
/// Valid until the next operation on the buffer it came from; copy it with
/// [`RxMessage::to_owned_message`] to keep it longer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxMessage<'a> {
    /// Sender address.
    pub from_address: u16,
    /// Declared payload length.
    pub data_len: u16,
    /// Payload bytes, exactly `data_len` long.
    pub data: &'a [u8],
    /// Received signal strength in dBm.
    pub rssi: i32,
    /// Signal-to-noise ratio in dB.
    pub snr: i32,
}

impl<'a> RxMessage<'a> {
    /// Parse a single message frame.
    pub fn parse(frame: &'a [u8]) -> ProtocolResult<RxMessage<'a>> {
        Ok(MessageLayout::parse(frame)?.view(frame))
    }

    /// Payload as text, if it is valid UTF-8.
    pub fn data_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.data).ok()
    }

    /// Copy the message out of the receive buffer.
    pub fn to_owned_message(&self) -> OwnedMessage {
        OwnedMessage {
            from_address: self.from_address,
            data: self.data.to_vec(),
            rssi: self.rssi,
            snr: self.snr,
        }
    }
}

/// A received message that owns its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedMessage {
    /// Sender address.
    pub from_address: u16,
    /// Payload bytes.
    pub data: Vec<u8>,
    /// Received signal strength in dBm.
    pub rssi: i32,
    /// Signal-to-noise ratio in dB.
    pub snr: i32,
}

/// Split off the field starting at `pos`, which must end in a separator
/// before the end of the frame.
fn next_field<'a>(
    frame: &'a [u8],
    pos: usize,
    field: &'static str,
) -> ProtocolResult<(&'a [u8], usize)> {
    let rest = frame.get(pos..).unwrap_or_default();
    match rest
        .iter()
        .position(|&b| b == FIELD_SEPARATOR || b == FRAME_SEPARATOR)
    {
        Some(i) if rest[i] == FIELD_SEPARATOR => Ok((&rest[..i], pos + i + 1)),
        _ => Err(ProtocolError::MissingSeparator { field }),
    }
}

fn parse_number<T: std::str::FromStr>(text: &[u8], field: &'static str) -> ProtocolResult<T> {
    std::str::from_utf8(text)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ProtocolError::InvalidNumber {
            field,
            text: String::from_utf8_lossy(text).into_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_message() {
        let msg = RxMessage::parse(b"+RCV=7,3,abc,-52,11").unwrap();
        assert_eq!(msg.from_address, 7);
        assert_eq!(msg.data_len, 3);
        assert_eq!(msg.data, b"abc");
        assert_eq!(msg.rssi, -52);
        assert_eq!(msg.snr, 11);
        assert_eq!(msg.data_str(), Some("abc"));
    }

    #[test]
    fn test_parse_payload_with_separators() {
        let msg = RxMessage::parse(b"+RCV=12,6,hel,lo,-40,9").unwrap();
        assert_eq!(msg.data, b"hel,lo");
    }

    #[test]
    fn test_length_mismatch() {
        let err = RxMessage::parse(b"+RCV=12,5,hel,lo,-40,9").unwrap_err();
        assert_eq!(err, ProtocolError::LengthMismatch { declared: 5 });
    }

    #[test]
    fn test_payload_past_end() {
        let err = RxMessage::parse(b"+RCV=12,50,abc,-40,9").unwrap_err();
        assert_eq!(err, ProtocolError::LengthMismatch { declared: 50 });
    }

    #[test]
    fn test_not_a_message() {
        assert_eq!(RxMessage::parse(b"+OK"), Err(ProtocolError::NotAMessage));
    }

    #[test]
    fn test_missing_separators() {
        assert_eq!(
            RxMessage::parse(b"+RCV=12"),
            Err(ProtocolError::MissingSeparator { field: "address" })
        );
        assert_eq!(
            RxMessage::parse(b"+RCV=12,3"),
            Err(ProtocolError::MissingSeparator { field: "length" })
        );
        assert_eq!(
            RxMessage::parse(b"+RCV=12,3,abc,-40"),
            Err(ProtocolError::MissingSeparator { field: "rssi" })
        );
    }

    #[test]
    fn test_separator_search_stops_at_nul() {
        assert_eq!(
            RxMessage::parse(b"+RCV=12\0,3,abc,-40,9"),
            Err(ProtocolError::MissingSeparator { field: "address" })
        );
    }

    #[test]
    fn test_invalid_number() {
        let err = RxMessage::parse(b"+RCV=x,3,abc,-40,9").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidNumber { field: "address", .. }));
    }

    #[test]
    fn test_layout_followed_by_frames() {
        let buffer = b"+RCV=1,2,\0\0,-9,4\0+RCV=2,1,z,-1,1\0";
        let first = MessageLayout::parse(buffer).unwrap();
        assert_eq!(first.view(buffer).data, b"\0\0");
        assert_eq!(first.frame_len, 17);

        let rest = &buffer[first.frame_len..];
        let second = RxMessage::parse(rest).unwrap();
        assert_eq!(second.from_address, 2);
        assert_eq!(second.data, b"z");
    }

    #[test]
    fn test_to_owned_message() {
        let owned = RxMessage::parse(b"+RCV=3,2,hi,-20,7").unwrap().to_owned_message();
        assert_eq!(
            owned,
            OwnedMessage {
                from_address: 3,
                data: b"hi".to_vec(),
                rssi: -20,
                snr: 7,
            }
        );
    }

    proptest! {
        #[test]
        fn prop_payload_is_byte_exact(
            address in any::<u16>(),
            data in proptest::collection::vec(any::<u8>(), 0..100),
            rssi in -140i32..0,
            snr in -20i32..20,
        ) {
            let mut frame = format!("+RCV={},{},", address, data.len()).into_bytes();
            frame.extend_from_slice(&data);
            frame.extend_from_slice(format!(",{},{}", rssi, snr).as_bytes());

            let msg = RxMessage::parse(&frame).unwrap();
            prop_assert_eq!(msg.from_address, address);
            prop_assert_eq!(usize::from(msg.data_len), data.len());
            prop_assert_eq!(msg.data, &data[..]);
            prop_assert_eq!(msg.rssi, rssi);
            prop_assert_eq!(msg.snr, snr);
        }
    }
}
