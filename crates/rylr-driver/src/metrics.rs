//! Metric declarations for the link counters.
//!
//! Each counter in [`LinkStats`](crate::LinkStats) is mirrored to the
//! `metrics` facade under the names below. Without an installed recorder the
//! increments are no-ops.
//!
//! ```rust
//! use rylr_driver::metrics::{describe_metrics, RX_ERRORS};
//!
//! describe_metrics();
//! assert_eq!(RX_ERRORS.name, "rylr.rx.errors");
//! ```

use metrics::{counter, describe_counter, Unit};

/// A counter declaration with its metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metric {
    /// The metric name.
    pub name: &'static str,
    /// Human-readable description of the metric.
    pub description: &'static str,
}

impl Metric {
    /// Declare a counter.
    pub const fn counter(name: &'static str, description: &'static str) -> Self {
        Metric { name, description }
    }

    /// Register the description with the installed recorder.
    pub fn describe(&self) {
        describe_counter!(self.name, Unit::Count, self.description);
    }

    /// Increment the counter by one.
    pub fn increment(&self) {
        counter!(self.name).increment(1);
    }
}

/// Receive buffer reset for lack of space, or oversize frame dropped.
pub const RX_OVERFLOW: Metric = Metric::counter(
    "rylr.rx.overflow",
    "Frames dropped because the receive buffer had no room",
);

/// Outbound payload restarted before it was sent.
pub const TX_OVERWRITE: Metric = Metric::counter(
    "rylr.tx.overwrite",
    "Outbound payloads discarded before being sent",
);

/// Frames discarded after a timeout or parse failure.
pub const RX_ERRORS: Metric = Metric::counter(
    "rylr.rx.errors",
    "Frames discarded after a timeout or parse failure",
);

/// Messages handed to the module for transmission.
pub const TX_MESSAGES: Metric = Metric::counter("rylr.tx.messages", "Messages sent");

/// Messages received and parsed.
pub const RX_MESSAGES: Metric = Metric::counter("rylr.rx.messages", "Messages received");

/// All driver metrics.
pub const ALL_METRICS: &[Metric] = &[RX_OVERFLOW, TX_OVERWRITE, RX_ERRORS, TX_MESSAGES, RX_MESSAGES];

/// Register descriptions for all driver metrics.
pub fn describe_metrics() {
    for metric in ALL_METRICS {
        metric.describe();
    }
}
