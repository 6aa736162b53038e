//! Serial link driver for Reyax RYLR LoRa modules.
//!
//! The module shares one UART between command responses and unsolicited
//! `+RCV=` message lines. [`LoraModem`] reads that stream one frame at a time
//! into a fixed-size [`ReceiveBuffer`] and separates the two:
//!
//! - [`LoraModem::await_response`] blocks for the next response, leaving any
//!   message frames that arrive first queued in the buffer.
//! - [`LoraModem::poll_message`] returns the next queued message without
//!   blocking, as an [`RxMessage`] borrowing its payload from the buffer.
//!
//! Faults on the receive side never surface as errors. They are counted in
//! [`LinkStats`], the buffer is reset and the call returns `None`.
//!
//! # Example
//!
//! ```rust
//! use rylr_driver::{LoraModem, ManualClock, ModemConfig, ScriptedTransport};
//!
//! let mut transport = ScriptedTransport::new();
//! transport.reply_to(b"AT\r\n", b"+RCV=7,3,abc,-52,11\r\n+OK\r\n");
//!
//! let mut modem = LoraModem::with_clock(transport, ModemConfig::default(), ManualClock::new());
//! assert_eq!(modem.send_command("AT"), 0);
//!
//! let msg = modem.poll_message().unwrap();
//! assert_eq!(msg.from_address, 7);
//! assert_eq!(msg.data, b"abc");
//! ```

mod buffer;
mod clock;
mod config;
mod error;
pub mod metrics;
mod modem;
mod reader;
mod stats;
mod transport;

pub use buffer::ReceiveBuffer;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, ModemConfig};
pub use error::{DriverError, DriverResult, LinkFault};
pub use modem::LoraModem;
pub use stats::LinkStats;
pub use transport::{ScriptedTransport, Transport};

pub use rylr_protocol as protocol;
pub use rylr_protocol::{OwnedMessage, Response, RxMessage};
