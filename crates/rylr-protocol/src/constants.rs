//! Wire constants for the RYLR AT protocol.

/// Prefix of an unsolicited received-message line.
pub const RCV_PREFIX: &[u8] = b"+RCV=";

/// Success response token.
pub const OK_TOKEN: &[u8] = b"+OK";

/// Prefix of an error response (`+ERR=<code>`).
pub const ERR_PREFIX: &[u8] = b"+ERR=";

/// Token emitted by the module after a reset.
pub const READY_TOKEN: &[u8] = b"+READY";

/// Field separator inside message and command lines.
pub const FIELD_SEPARATOR: u8 = b',';

/// Carriage return, first half of the line terminator.
pub const CR: u8 = b'\r';

/// Line terminator byte. Lines end in `\r\n`; `\n` ends the frame.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Terminator appended to outbound commands.
pub const COMMAND_TERMINATOR: &[u8] = b"\r\n";

/// Default maximum payload carried by one `AT+SEND` / `+RCV`.
pub const MAX_DATA_LEN: usize = 100;

/// Largest payload the module firmware accepts.
pub const MODULE_MAX_DATA_LEN: usize = 240;

/// Header and trailer overhead of an `AT+SEND=<addr>,<len>,` line.
pub const TX_OVERHEAD: usize = 20;

/// Header and trailer overhead of a `+RCV=<addr>,<len>,...,<rssi>,<snr>` line.
pub const RX_OVERHEAD: usize = 28;

/// Upper bound on the value accepted in a message length field.
pub const MAX_LENGTH_FIELD: usize = 9999;

/// Maximum size of an outbound frame for the default payload size.
pub const MAX_TX_MSG: usize = MAX_DATA_LEN + TX_OVERHEAD;

/// Maximum size of an inbound frame for the default payload size.
pub const MAX_RX_MSG: usize = MAX_DATA_LEN + RX_OVERHEAD;

/// Default receive buffer capacity, room for a burst of three frames each
/// followed by its NUL separator.
pub const RX_BUFFER_LEN: usize = (MAX_RX_MSG + 1) * 3;

/// Maximum module address.
pub const MAX_ADDRESS: u16 = u16::MAX;

/// Maximum RF output power in dBm accepted by `AT+CRFOP`.
pub const MAX_RF_POWER: u8 = 22;
