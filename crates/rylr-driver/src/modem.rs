//! The driver: command/response exchange, message polling and the outbound
//! payload builder.

use bytes::BytesMut;
use rylr_protocol::{
    encode_command, encode_send, result_value, Command, FrameKind, MessageLayout, Response,
    RxMessage,
};
use tracing::{debug, trace, warn};

use crate::buffer::ReceiveBuffer;
use crate::clock::{Clock, SystemClock};
use crate::config::ModemConfig;
use crate::error::{DriverError, DriverResult, LinkFault};
use crate::stats::LinkStats;
use crate::transport::Transport;

/// Driver for one RYLR module on one serial link.
///
/// Owns the receive buffer, the outbound payload and the link counters.
/// Nothing is shared between instances.
#[derive(Debug)]
pub struct LoraModem<T, C = SystemClock> {
    pub(crate) transport: T,
    pub(crate) clock: C,
    pub(crate) config: ModemConfig,
    pub(crate) rx: ReceiveBuffer,
    tx: BytesMut,
    pub(crate) stats: LinkStats,
    pub(crate) last_fault: Option<LinkFault>,
}

impl<T: Transport> LoraModem<T, SystemClock> {
    /// Create a driver with the default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ModemConfig::default())
    }

    /// Create a driver with a custom configuration.
    pub fn with_config(transport: T, config: ModemConfig) -> Self {
        Self::with_clock(transport, config, SystemClock::new())
    }
}

impl<T: Transport, C: Clock> LoraModem<T, C> {
    /// Create a driver with a custom clock.
    pub fn with_clock(transport: T, config: ModemConfig, clock: C) -> Self {
        LoraModem {
            rx: ReceiveBuffer::new(config.rx_buffer_len()),
            tx: BytesMut::with_capacity(config.max_data_len),
            transport,
            clock,
            config,
            stats: LinkStats::default(),
            last_fault: None,
        }
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    /// Counters since construction.
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// The receive buffer, for inspecting its cursors.
    pub fn buffer(&self) -> &ReceiveBuffer {
        &self.rx
    }

    /// Most recent receive or overwrite fault, if any.
    pub fn last_fault(&self) -> Option<LinkFault> {
        self.last_fault
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    // ------------------------------------------------------------------
    // Receive side
    // ------------------------------------------------------------------

    /// Block until a response frame arrives and return its text.
    ///
    /// Message frames read while waiting stay queued for
    /// [`poll_message`](Self::poll_message). Returns `None` if the link times
    /// out or fails, in which case the receive buffer has been reset.
    pub fn await_response(&mut self) -> Option<&[u8]> {
        loop {
            let frame = self.read_frame().ok()?;
            match frame.kind {
                FrameKind::Message => {
                    debug!("LoraModem: queued message frame while awaiting response");
                }
                FrameKind::Response => {
                    self.rx.truncate(frame.start);
                    return Some(self.rx.slice(frame.start..frame.start + frame.len));
                }
            }
        }
    }

    /// Return the next received message, if one is buffered or waiting.
    ///
    /// Never blocks when the link is idle. At most one message is returned per
    /// call. A frame that fails to parse discards the whole receive buffer.
    pub fn poll_message(&mut self) -> Option<RxMessage<'_>> {
        if self.rx.is_empty() {
            match self.transport.bytes_available() {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => {
                    warn!("LoraModem: transport error while polling: {}", err);
                    self.fail_rx(LinkFault::Transport);
                    return None;
                }
            }
            self.read_frame().ok()?;
        }

        let start = self.rx.read_cursor();
        let layout = match MessageLayout::parse(self.rx.pending()) {
            Ok(layout) => layout,
            Err(err) => {
                warn!("LoraModem: discarding malformed message frame: {}", err);
                self.stats.record_rx_error();
                self.last_fault = Some(LinkFault::MalformedFrame);
                self.rx.reset();
                return None;
            }
        };

        self.rx.consume(layout.frame_len);
        self.stats.record_rx_message();
        trace!(
            "LoraModem: message from {} ({} bytes, rssi {}, snr {})",
            layout.from_address,
            layout.data_len,
            layout.rssi,
            layout.snr
        );
        Some(layout.view(self.rx.slice_from(start)))
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Send a raw command line and classify the response.
    ///
    /// `command` is sent as-is followed by `\r\n`. Returns `0` for `+OK`, the
    /// module's code for `+ERR=<code>` and `-1` for anything else.
    pub fn send_command(&mut self, command: &str) -> i32 {
        if let Err(err) = self.write_line(&encode_command(command)) {
            warn!("LoraModem: failed to write command '{}': {}", command, err);
            return result_value(None);
        }
        result_value(self.await_response())
    }

    /// Validate and send a typed command, returning the parsed response.
    pub fn execute(&mut self, command: &Command) -> DriverResult<Response> {
        command.validate()?;
        trace!("LoraModem: executing {}", command.to_command_string());
        self.write_line(&command.encode())?;
        self.await_response()
            .map(Response::parse)
            .ok_or(DriverError::NoResponse)
    }

    /// Check that the module answers `AT`.
    pub fn check_status(&mut self) -> DriverResult<()> {
        self.execute_ok(&Command::Test)
    }

    /// Set the module's network address.
    pub fn set_address(&mut self, address: u16) -> DriverResult<()> {
        self.execute_ok(&Command::SetAddress { address })
    }

    /// Set spreading factor, bandwidth, coding rate and preamble.
    pub fn set_rf_parameters(
        &mut self,
        spread: u8,
        bandwidth: u8,
        coding_rate: u8,
        preamble: u8,
    ) -> DriverResult<()> {
        self.execute_ok(&Command::SetParameters {
            spread,
            bandwidth,
            coding_rate,
            preamble,
        })
    }

    /// Set RF output power in dBm (0..=22).
    pub fn set_rf_power(&mut self, power: u8) -> DriverResult<()> {
        self.execute_ok(&Command::SetRfPower { power })
    }

    /// Set the network password (eight hex digits).
    pub fn set_password(&mut self, password: &str) -> DriverResult<()> {
        self.execute_ok(&Command::SetPassword {
            password: password.to_string(),
        })
    }

    /// Query the module's network address.
    pub fn address(&mut self) -> DriverResult<u16> {
        let response = self.execute(&Command::QueryAddress)?;
        let value = query_value(response, "ADDRESS")?;
        let parsed: Result<u16, _> = value.trim().parse();
        parsed.map_err(|_| {
            DriverError::UnexpectedResponse(Response::Value {
                key: "ADDRESS".to_string(),
                value,
            })
        })
    }

    /// Query the module's firmware version.
    pub fn version(&mut self) -> DriverResult<String> {
        let response = self.execute(&Command::Version)?;
        query_value(response, "VER")
    }

    fn execute_ok(&mut self, command: &Command) -> DriverResult<()> {
        let response = self.execute(command)?;
        expect_ok(response)
    }

    fn write_line(&mut self, line: &[u8]) -> std::io::Result<()> {
        self.transport.write_all(line)?;
        self.transport.flush()
    }

    // ------------------------------------------------------------------
    // Outbound payload
    // ------------------------------------------------------------------

    /// Begin a new outbound payload.
    ///
    /// Unsent data from a previous payload is discarded and counted as an
    /// overwrite.
    pub fn start_tx_message(&mut self) {
        if !self.tx.is_empty() {
            warn!(
                "LoraModem: discarding {} unsent payload bytes",
                self.tx.len()
            );
            self.stats.record_overwrite();
            self.last_fault = Some(LinkFault::Overwrite);
        }
        self.tx.clear();
    }

    /// Append raw bytes, truncated at the payload limit.
    ///
    /// Returns the number of bytes appended.
    pub fn add_tx_bytes(&mut self, data: &[u8]) -> usize {
        let room = self.config.max_data_len.saturating_sub(self.tx.len());
        let len = data.len().min(room);
        self.tx.extend_from_slice(&data[..len]);
        if len < data.len() {
            debug!(
                "LoraModem: payload truncated, {} of {} bytes appended",
                len,
                data.len()
            );
        }
        len
    }

    /// Append text.
    pub fn add_tx_str(&mut self, text: &str) -> usize {
        self.add_tx_bytes(text.as_bytes())
    }

    /// Append an integer in decimal.
    pub fn add_tx_int(&mut self, value: i64) -> usize {
        self.add_tx_bytes(value.to_string().as_bytes())
    }

    /// Append a float with four decimals.
    pub fn add_tx_float(&mut self, value: f64) -> usize {
        self.add_tx_bytes(format!("{:.4}", value).as_bytes())
    }

    /// Payload accumulated so far.
    pub fn tx_payload(&self) -> &[u8] {
        &self.tx
    }

    /// Send the accumulated payload to `to_address` and wait for the
    /// module's acknowledgement.
    ///
    /// The payload is cleared whether or not the send succeeds.
    pub fn send_tx_message(&mut self, to_address: u16) -> DriverResult<()> {
        self.stats.record_tx_message();
        let line = encode_send(to_address, &self.tx);
        self.tx.clear();

        trace!(
            "LoraModem: sending {} byte payload to {}",
            line.len(),
            to_address
        );
        self.write_line(&line)?;

        let budget = self.config.send_timeout();
        if !self.wait_for_data(budget)? {
            debug!("LoraModem: no reply within {:?} of send", budget);
        }

        let response = self
            .await_response()
            .map(Response::parse)
            .ok_or(DriverError::NoResponse)?;
        expect_ok(response)
    }
}

fn expect_ok(response: Response) -> DriverResult<()> {
    match response {
        Response::Ok => Ok(()),
        Response::Error(code) => Err(DriverError::Device(code)),
        other => Err(DriverError::UnexpectedResponse(other)),
    }
}

fn query_value(response: Response, key: &str) -> DriverResult<String> {
    match response {
        Response::Value { key: k, value } if k == key => Ok(value),
        Response::Error(code) => Err(DriverError::Device(code)),
        other => Err(DriverError::UnexpectedResponse(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::transport::ScriptedTransport;

    fn modem(transport: ScriptedTransport) -> LoraModem<ScriptedTransport, ManualClock> {
        LoraModem::with_clock(transport, ModemConfig::default(), ManualClock::new())
    }

    #[test]
    fn test_await_response_plain() {
        let mut transport = ScriptedTransport::new();
        transport.push_rx(b"+OK\r\n");
        let mut modem = modem(transport);
        assert_eq!(modem.await_response(), Some(&b"+OK"[..]));
        assert!(modem.buffer().is_empty());
    }

    #[test]
    fn test_await_response_timeout() {
        let mut modem = modem(ScriptedTransport::new());
        assert_eq!(modem.await_response(), None);
        assert_eq!(modem.stats().rx_errors, 1);
        assert_eq!(modem.last_fault(), Some(LinkFault::Timeout));
    }

    #[test]
    fn test_poll_idle_does_not_block() {
        let clock = ManualClock::new();
        let mut modem =
            LoraModem::with_clock(ScriptedTransport::new(), ModemConfig::default(), clock.clone());
        assert!(modem.poll_message().is_none());
        assert_eq!(clock.now(), std::time::Duration::ZERO);
        assert_eq!(modem.stats(), LinkStats::default());
    }

    #[test]
    fn test_tx_builder_formats() {
        let mut modem = modem(ScriptedTransport::new());
        modem.start_tx_message();
        assert_eq!(modem.add_tx_str("t="), 2);
        assert_eq!(modem.add_tx_int(-12), 3);
        assert_eq!(modem.add_tx_str(","), 1);
        assert_eq!(modem.add_tx_float(1.5), 6);
        assert_eq!(modem.tx_payload(), b"t=-12,1.5000");
    }

    #[test]
    fn test_start_tx_counts_overwrite() {
        let mut modem = modem(ScriptedTransport::new());
        modem.start_tx_message();
        assert_eq!(modem.stats().overwrite, 0);
        modem.add_tx_str("pending");
        modem.start_tx_message();
        assert_eq!(modem.stats().overwrite, 1);
        assert_eq!(modem.last_fault(), Some(LinkFault::Overwrite));
        assert!(modem.tx_payload().is_empty());
    }

    #[test]
    fn test_expect_ok_mapping() {
        assert!(expect_ok(Response::Ok).is_ok());
        assert!(matches!(expect_ok(Response::Error(5)), Err(DriverError::Device(5))));
        assert!(matches!(
            expect_ok(Response::Ready),
            Err(DriverError::UnexpectedResponse(Response::Ready))
        ));
    }
}
