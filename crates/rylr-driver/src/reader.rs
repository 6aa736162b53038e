//! Frame reader: pulls one frame from the transport into the receive buffer.

use std::time::Duration;

use rylr_protocol::{FrameKind, FrameScanner, ScanStep, MAX_LENGTH_FIELD};
use tracing::{trace, warn};

use crate::clock::Clock;
use crate::error::LinkFault;
use crate::modem::LoraModem;
use crate::transport::Transport;

/// A frame committed to the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Frame {
    /// Buffer offset of the first byte.
    pub start: usize,
    /// Length without the NUL separator.
    pub len: usize,
    pub kind: FrameKind,
}

impl<T: Transport, C: Clock> LoraModem<T, C> {
    /// Read bytes until one complete frame is stored.
    ///
    /// On any fault the receive buffer is reset and the matching counter
    /// incremented before the fault is returned.
    pub(crate) fn read_frame(&mut self) -> Result<Frame, LinkFault> {
        let max_frame = self.config.max_rx_frame();

        if self.rx.free() < max_frame + 1 {
            warn!(
                "LoraModem: receive buffer full ({} of {} bytes used), resetting",
                self.rx.write_cursor(),
                self.rx.capacity()
            );
            self.stats.record_overflow();
            self.last_fault = Some(LinkFault::Overflow);
            self.rx.reset();
        }

        // Oversize frames are read through to their terminator, but no
        // further than the longest payload the scanner will honour.
        let read_through_limit = max_frame + MAX_LENGTH_FIELD;
        let mut scanner = FrameScanner::new();
        let mut stored = 0usize;

        loop {
            let byte = self.next_byte()?;
            if scanner.feed(byte) == ScanStep::Complete {
                break;
            }
            if stored < max_frame {
                self.rx.stage(stored, byte);
            }
            stored += 1;
            if stored > read_through_limit {
                warn!(
                    "LoraModem: no terminator within {} bytes, dropping frame",
                    read_through_limit
                );
                return Err(self.fail_overflow());
            }
        }

        let len = scanner.content_len();
        if len > max_frame {
            warn!(
                "LoraModem: dropped {} byte frame, limit is {}",
                len, max_frame
            );
            return Err(self.fail_overflow());
        }

        match self.rx.commit(len) {
            Some(start) => {
                trace!(
                    "LoraModem: {:?} frame of {} bytes at offset {}",
                    scanner.kind(),
                    len,
                    start
                );
                Ok(Frame {
                    start,
                    len,
                    kind: scanner.kind(),
                })
            }
            None => Err(self.fail_overflow()),
        }
    }

    /// Wait up to the read timeout for one byte.
    fn next_byte(&mut self) -> Result<u8, LinkFault> {
        let budget = self.config.read_timeout();
        match self.wait_for_data(budget) {
            Ok(true) => {}
            Ok(false) => return Err(self.fail_rx(LinkFault::Timeout)),
            Err(err) => {
                warn!("LoraModem: transport error while waiting: {}", err);
                return Err(self.fail_rx(LinkFault::Transport));
            }
        }

        match self.transport.read_byte() {
            Ok(Some(byte)) => Ok(byte),
            Ok(None) => Err(self.fail_rx(LinkFault::Timeout)),
            Err(err) => {
                warn!("LoraModem: transport read failed: {}", err);
                Err(self.fail_rx(LinkFault::Transport))
            }
        }
    }

    /// Poll the transport until data is available or `budget` elapses.
    pub(crate) fn wait_for_data(&mut self, budget: Duration) -> std::io::Result<bool> {
        let started = self.clock.now();
        loop {
            if self.transport.bytes_available()? > 0 {
                return Ok(true);
            }
            if self.clock.now().saturating_sub(started) >= budget {
                return Ok(false);
            }
            self.clock.pause(self.config.poll_interval());
        }
    }

    /// Count a receive error and drop everything buffered.
    pub(crate) fn fail_rx(&mut self, fault: LinkFault) -> LinkFault {
        if fault == LinkFault::Timeout {
            warn!("LoraModem: read timed out, discarding buffered frames");
        }
        self.stats.record_rx_error();
        self.last_fault = Some(fault);
        self.rx.reset();
        fault
    }

    fn fail_overflow(&mut self) -> LinkFault {
        self.stats.record_overflow();
        self.last_fault = Some(LinkFault::Overflow);
        self.rx.reset();
        LinkFault::Overflow
    }
}
