//! Commands that can be sent to the module.
//!
//! Every command is a single `AT...` line. Setters answer `+OK` or
//! `+ERR=<code>`; queries answer `+<KEY>=<value>`.

use bytes::{BufMut, BytesMut};

use crate::codec::encode_command;
use crate::constants::{COMMAND_TERMINATOR, MAX_RF_POWER, MODULE_MAX_DATA_LEN};
use crate::error::{ProtocolError, ProtocolResult};

/// Commands understood by the RYLR AT firmware.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Check that the module is responding (`AT`).
    Test,

    /// Set the module address (`AT+ADDRESS=<n>`).
    SetAddress {
        /// Address, 0 to 65535.
        address: u16,
    },

    /// Query the module address (`AT+ADDRESS?`).
    QueryAddress,

    /// Set the RF parameters (`AT+PARAMETER=<sf>,<bw>,<cr>,<preamble>`).
    SetParameters {
        /// Spreading factor (5-11).
        spread: u8,
        /// Bandwidth index (7-9).
        bandwidth: u8,
        /// Coding rate (1-4).
        coding_rate: u8,
        /// Programmed preamble length.
        preamble: u8,
    },

    /// Set the RF output power in dBm (`AT+CRFOP=<p>`).
    SetRfPower {
        /// Power, 0 to 22 (14 to comply with CE certification).
        power: u8,
    },

    /// Set the network password (`AT+CPIN=<password>`).
    SetPassword {
        /// Eight hex digits, 00000001 to FFFFFFFF.
        password: String,
    },

    /// Query the firmware version (`AT+VER?`).
    Version,

    /// Transmit a payload (`AT+SEND=<address>,<len>,<data>`).
    Send {
        /// Destination address.
        address: u16,
        /// Raw payload bytes.
        data: Vec<u8>,
    },

    /// Send a raw command string.
    Raw {
        /// The raw command text, without terminator.
        command: String,
    },
}

impl Command {
    /// Check the command arguments against the ranges the module accepts.
    pub fn validate(&self) -> ProtocolResult<()> {
        match self {
            Command::SetRfPower { power } if *power > MAX_RF_POWER => Err(
                ProtocolError::InvalidCommand(format!("rf power {} exceeds {}", power, MAX_RF_POWER)),
            ),
            Command::SetPassword { password } => validate_password(password),
            Command::Send { data, .. } if data.len() > MODULE_MAX_DATA_LEN => {
                Err(ProtocolError::InvalidCommand(format!(
                    "payload of {} bytes exceeds {}",
                    data.len(),
                    MODULE_MAX_DATA_LEN
                )))
            }
            Command::Raw { command } if command.contains(|c| c == '\r' || c == '\n') => Err(
                ProtocolError::InvalidCommand("raw command contains a line terminator".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Encode the command as a line to send to the module.
    /// Returns the bytes to send (including the `\r\n` terminator).
    pub fn encode(&self) -> BytesMut {
        match self {
            Command::Send { address, data } => encode_send(*address, data),
            _ => BytesMut::from(&encode_command(&self.to_command_string())[..]),
        }
    }

    /// Get the command string without the terminator.
    ///
    /// For [`Command::Send`] the payload is rendered lossily; use
    /// [`Command::encode`] for the exact bytes.
    pub fn to_command_string(&self) -> String {
        match self {
            Command::Test => "AT".to_string(),
            Command::SetAddress { address } => format!("AT+ADDRESS={}", address),
            Command::QueryAddress => "AT+ADDRESS?".to_string(),
            Command::SetParameters {
                spread,
                bandwidth,
                coding_rate,
                preamble,
            } => format!(
                "AT+PARAMETER={},{},{},{}",
                spread, bandwidth, coding_rate, preamble
            ),
            Command::SetRfPower { power } => format!("AT+CRFOP={}", power),
            Command::SetPassword { password } => format!("AT+CPIN={}", password),
            Command::Version => "AT+VER?".to_string(),
            Command::Send { address, data } => format!(
                "AT+SEND={},{},{}",
                address,
                data.len(),
                String::from_utf8_lossy(data)
            ),
            Command::Raw { command } => command.clone(),
        }
    }
}

/// Encode an `AT+SEND` line carrying raw payload bytes.
pub fn encode_send(address: u16, data: &[u8]) -> BytesMut {
    let header = format!("AT+SEND={},{},", address, data.len());
    let mut buf = BytesMut::with_capacity(header.len() + data.len() + COMMAND_TERMINATOR.len());
    buf.put_slice(header.as_bytes());
    buf.put_slice(data);
    buf.put_slice(COMMAND_TERMINATOR);
    buf
}

fn validate_password(password: &str) -> ProtocolResult<()> {
    let well_formed = password.len() == 8 && password.bytes().all(|b| b.is_ascii_hexdigit());
    if !well_formed {
        return Err(ProtocolError::InvalidCommand(format!(
            "password must be 8 hex digits, got {:?}",
            password
        )));
    }
    match u32::from_str_radix(password, 16) {
        Ok(0) | Err(_) => Err(ProtocolError::InvalidCommand(
            "password must be between 00000001 and FFFFFFFF".to_string(),
        )),
        Ok(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_test() {
        assert_eq!(&Command::Test.encode()[..], b"AT\r\n");
    }

    #[test]
    fn test_encode_set_address() {
        let cmd = Command::SetAddress { address: 65535 };
        assert_eq!(&cmd.encode()[..], b"AT+ADDRESS=65535\r\n");
    }

    #[test]
    fn test_encode_parameters() {
        let cmd = Command::SetParameters {
            spread: 9,
            bandwidth: 7,
            coding_rate: 1,
            preamble: 12,
        };
        assert_eq!(&cmd.encode()[..], b"AT+PARAMETER=9,7,1,12\r\n");
    }

    #[test]
    fn test_encode_queries() {
        assert_eq!(&Command::Version.encode()[..], b"AT+VER?\r\n");
        assert_eq!(&Command::QueryAddress.encode()[..], b"AT+ADDRESS?\r\n");
    }

    #[test]
    fn test_encode_send_binary() {
        let cmd = Command::Send {
            address: 2,
            data: vec![b'a', b',', b'\r', b'\n', 0xff],
        };
        assert_eq!(&cmd.encode()[..], b"AT+SEND=2,5,a,\r\n\xff\r\n");
    }

    #[test]
    fn test_validate_rf_power() {
        assert!(Command::SetRfPower { power: 22 }.validate().is_ok());
        assert!(Command::SetRfPower { power: 23 }.validate().is_err());
    }

    #[test]
    fn test_validate_password() {
        let ok = Command::SetPassword { password: "CA0043A7".to_string() };
        assert!(ok.validate().is_ok());

        for bad in ["00000000", "CA0043A", "CA0043AZ", "CA0043A77"] {
            let cmd = Command::SetPassword { password: bad.to_string() };
            assert!(cmd.validate().is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_validate_send_length() {
        let cmd = Command::Send { address: 1, data: vec![0; MODULE_MAX_DATA_LEN + 1] };
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn test_validate_raw_rejects_terminator() {
        let cmd = Command::Raw { command: "AT\r\nAT".to_string() };
        assert!(cmd.validate().is_err());
    }
}
