//! In-memory packet sink for tests.
//!
//! The real [`SerialTransport`](super::SerialTransport) needs a bridge device
//! on a serial port.  `RecordingSink` replaces it with a `Mutex<Vec<...>>`
//! so tests can assert exactly which packets were sent and in what order.
//!
//! # Usage in tests
//!
//! ```rust
//! use std::sync::Arc;
//! use lkvm_core::transport::mock::RecordingSink;
//! use lkvm_core::{KeyboardSender, Modifiers};
//!
//! let sink = Arc::new(RecordingSink::new());
//! let keyboard = KeyboardSender::new(sink.clone());
//!
//! keyboard.release().unwrap();
//!
//! let packets = sink.packets();
//! assert_eq!(packets.len(), 1);
//! assert_eq!(*packets[0].last().unwrap(), 0x0C);
//! ```
//!
//! # `fail_writes` flag
//!
//! Call [`RecordingSink::set_fail_writes`] to make every subsequent `send`
//! return a broken-pipe [`TransportError::Write`].  Failed packets are not
//! recorded.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{PacketSink, TransportError};

/// A sink that records every packet instead of writing it anywhere.
#[derive(Default)]
pub struct RecordingSink {
    packets: Mutex<Vec<Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every packet sent so far.
    pub fn packets(&self) -> Vec<Vec<u8>> {
        self.recorded().clone()
    }

    /// The most recent packet, if any.
    pub fn last(&self) -> Option<Vec<u8>> {
        self.recorded().last().cloned()
    }

    /// Drops all recorded packets.
    pub fn clear(&self) {
        self.recorded().clear();
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        self.packets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PacketSink for RecordingSink {
    fn send(&self, packet: &[u8]) -> Result<(), TransportError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TransportError::Write(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock failure",
            )));
        }
        self.recorded().push(packet.to_vec());
        Ok(())
    }
}
