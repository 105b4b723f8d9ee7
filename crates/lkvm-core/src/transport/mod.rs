//! Packet transport to the bridge device.
//!
//! The senders never touch the serial handle directly.  They hold an
//! `Arc<dyn PacketSink>` and call [`PacketSink::send`] once per packet, so the
//! same sender code runs against the real [`SerialTransport`] in production
//! and against [`mock::RecordingSink`] in tests.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub mod mock;
pub mod serial;

pub use serial::SerialTransport;

/// Errors raised while opening or writing to the transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The serial device could not be opened.  Fatal at startup.
    #[error("failed to open serial device {path} at {baud_rate} baud: {source}")]
    Open {
        path: PathBuf,
        baud_rate: u32,
        #[source]
        source: serialport::Error,
    },

    /// Writing a packet failed (device unplugged, broken pipe, ...).
    #[error("serial write failed: {0}")]
    Write(#[from] io::Error),
}

/// Destination for fully encoded packets.
///
/// Implementations must write each packet atomically with respect to other
/// callers: bytes from two `send` calls never interleave.
#[cfg_attr(test, mockall::automock)]
pub trait PacketSink: Send + Sync {
    /// Writes one packet.  No retries are attempted.
    fn send(&self, packet: &[u8]) -> Result<(), TransportError>;
}
