//! Reyax RYLR AT Protocol
//!
//! This crate provides types and utilities for talking to Reyax RYLR-series
//! LoRa modules (RYLR896, RYLR998, ...) over their UART AT-command interface.
//! It is pure protocol: no I/O, no timing. The driver crate owns the serial
//! link and the receive buffer.
//!
//! # Protocol Overview
//!
//! The link is a single ASCII byte stream, every line terminated by `\r\n`:
//!
//! - **Commands** (host → module): `AT`, `AT+ADDRESS=5`, `AT+SEND=2,5,HELLO`, ...
//! - **Responses** (module → host): `+OK`, `+ERR=<code>`, `+<KEY>=<value>`
//! - **Messages** (module → host, unsolicited):
//!   `+RCV=<address>,<length>,<data>,<rssi>,<snr>`
//!
//! Messages can arrive at any time, including between a command and its
//! response. The `<data>` field is raw bytes of exactly `<length>` bytes and
//! may itself contain `,`, `\r` or `\n`, so a message line cannot be split on
//! separators or terminators alone. [`FrameScanner`] tracks the length field
//! so the payload passes through untouched.
//!
//! # Example
//!
//! ```rust
//! use rylr_protocol::{Command, FrameScanner, RxMessage, ScanStep, result_value};
//!
//! // Build a command
//! let line = Command::SetAddress { address: 5 }.encode();
//! assert_eq!(&line[..], b"AT+ADDRESS=5\r\n");
//!
//! // Classify a response
//! assert_eq!(result_value(Some(b"+OK")), 0);
//! assert_eq!(result_value(Some(b"+ERR=4")), 4);
//!
//! // Parse a message frame
//! let msg = RxMessage::parse(b"+RCV=7,3,a,c,-52,11").unwrap();
//! assert_eq!(msg.data, b"a,c");
//! ```

mod codec;
mod commands;
mod constants;
mod error;
mod message;
mod responses;

pub use codec::*;
pub use commands::*;
pub use constants::*;
pub use error::*;
pub use message::*;
pub use responses::*;
