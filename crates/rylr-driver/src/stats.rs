//! Link counters.

use std::fmt;

use serde::Serialize;

use crate::metrics::{RX_ERRORS, RX_MESSAGES, RX_OVERFLOW, TX_MESSAGES, TX_OVERWRITE};

/// Counters kept by a driver instance since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    /// Frames dropped because the receive buffer had no room.
    pub overflow: u32,
    /// Outbound payloads restarted before being sent.
    pub overwrite: u32,
    /// Frames discarded after a timeout or parse failure.
    pub rx_errors: u32,
    /// Messages sent.
    pub tx_messages: u32,
    /// Messages received.
    pub rx_messages: u32,
}

impl LinkStats {
    pub(crate) fn record_overflow(&mut self) {
        self.overflow = self.overflow.saturating_add(1);
        RX_OVERFLOW.increment();
    }

    pub(crate) fn record_overwrite(&mut self) {
        self.overwrite = self.overwrite.saturating_add(1);
        TX_OVERWRITE.increment();
    }

    pub(crate) fn record_rx_error(&mut self) {
        self.rx_errors = self.rx_errors.saturating_add(1);
        RX_ERRORS.increment();
    }

    pub(crate) fn record_tx_message(&mut self) {
        self.tx_messages = self.tx_messages.saturating_add(1);
        TX_MESSAGES.increment();
    }

    pub(crate) fn record_rx_message(&mut self) {
        self.rx_messages = self.rx_messages.saturating_add(1);
        RX_MESSAGES.increment();
    }
}

impl fmt::Display for LinkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Overflow count: {}", self.overflow)?;
        writeln!(f, "Buffer overwrite count: {}", self.overwrite)?;
        writeln!(f, "RX Errors: {}", self.rx_errors)?;
        writeln!(f, "TX Messages: {}", self.tx_messages)?;
        write!(f, "RX Messages: {}", self.rx_messages)
    }
}
