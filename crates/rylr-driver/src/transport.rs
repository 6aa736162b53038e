//! Byte transport abstraction.
//!
//! The driver needs three things from the serial link: how many bytes are
//! waiting, one byte at a time, and a way to write a whole command. Any
//! timeout handling is done by the driver against its [`Clock`](crate::Clock),
//! so implementations should return promptly.

use std::collections::VecDeque;
use std::io;

/// Byte source/sink connected to the module's UART.
pub trait Transport {
    /// Number of bytes that can be read without waiting.
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Read one byte. `Ok(None)` means nothing arrived in time.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Write all of `data` to the link.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush any buffered output.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn bytes_available(&mut self) -> io::Result<usize> {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn bytes_available(&mut self) -> io::Result<usize> {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// In-memory transport that plays back scripted module output.
///
/// Inbound bytes are queued with [`push_rx`](Self::push_rx). Canned replies
/// registered with [`reply_to`](Self::reply_to) are queued when a matching
/// write arrives, in registration order.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    rx: VecDeque<u8>,
    written: Vec<u8>,
    replies: VecDeque<(Vec<u8>, Vec<u8>)>,
}

impl ScriptedTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if the module had sent them.
    pub fn push_rx(&mut self, data: &[u8]) {
        self.rx.extend(data);
    }

    /// Queue `reply` once a write starting with `command` is seen.
    pub fn reply_to(&mut self, command: &[u8], reply: &[u8]) {
        self.replies.push_back((command.to_vec(), reply.to_vec()));
    }

    /// Everything written so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Take everything written so far.
    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }

    /// Inbound bytes not yet read.
    pub fn pending_rx(&self) -> usize {
        self.rx.len()
    }

    /// Replies registered but not yet triggered.
    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }
}

impl Transport for ScriptedTransport {
    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.rx.pop_front())
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.written.extend_from_slice(data);
        let matched = self
            .replies
            .front()
            .is_some_and(|(command, _)| data.starts_with(command));
        if matched {
            if let Some((_, reply)) = self.replies.pop_front() {
                self.rx.extend(reply);
            }
        }
        Ok(())
    }
}
