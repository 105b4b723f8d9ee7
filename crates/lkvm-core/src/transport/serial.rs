//! Serial port transport.
//!
//! One [`SerialTransport`] is opened at startup and shared by every sender.
//! Each [`send`](PacketSink::send) holds the port lock for the write *and* a
//! short settle delay afterwards, which gives the bridge time to consume a
//! command before the next one starts arriving.

use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, info};

use super::{PacketSink, TransportError};

/// Pause after each packet while the port lock is still held.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(1);

/// Read timeout configured on the port.  Acknowledgement frames from the
/// bridge are currently not consumed, so this only bounds stray reads.
pub const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Exclusive, settle-delayed writer over a serial handle.
pub struct SerialTransport {
    port: Mutex<Box<dyn Write + Send>>,
    settle: Duration,
}

impl SerialTransport {
    /// Opens the serial device at `path` with 8N1 framing.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Open`] if the device cannot be opened.  There
    /// is no operating mode without the transport, so callers treat this as
    /// fatal.
    pub fn open(
        path: impl AsRef<Path>,
        baud_rate: u32,
        settle: Duration,
    ) -> Result<Self, TransportError> {
        let path = path.as_ref();
        let port = serialport::new(path.to_string_lossy(), baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|source| TransportError::Open {
                path: path.to_path_buf(),
                baud_rate,
                source,
            })?;

        info!(
            "opened serial device {} at {baud_rate} baud (settle {settle:?})",
            path.display()
        );
        Ok(Self::from_writer(port, settle))
    }

    /// Wraps an already open writer.  Used for tests and for non-serial links
    /// such as a pty or a USB CDC device exposed as a plain file.
    pub fn from_writer<W>(writer: W, settle: Duration) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            port: Mutex::new(Box::new(writer)),
            settle,
        }
    }
}

impl PacketSink for SerialTransport {
    fn send(&self, packet: &[u8]) -> Result<(), TransportError> {
        // A panic in another writer cannot leave a half-written packet behind
        // the lock (write_all either finished or returned), so poisoning is
        // ignored.
        let mut port = self.port.lock().unwrap_or_else(PoisonError::into_inner);

        port.write_all(packet)?;
        port.flush()?;
        debug!("tx {packet:02X?}");

        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    use super::*;

    /// Writer that appends into a shared buffer.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Writer that always fails, like a device that was unplugged.
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "device gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_send_writes_all_bytes_in_order() {
        // Arrange
        let buf = SharedBuf::default();
        let transport = SerialTransport::from_writer(buf.clone(), Duration::ZERO);

        // Act
        transport.send(&[0x57, 0xAB, 0x00]).unwrap();
        transport.send(&[0x01, 0x02]).unwrap();

        // Assert
        assert_eq!(*buf.0.lock().unwrap(), vec![0x57, 0xAB, 0x00, 0x01, 0x02]);
    }

    #[test]
    fn test_send_surfaces_write_failure() {
        let transport = SerialTransport::from_writer(BrokenPipe, Duration::ZERO);

        let result = transport.send(&[0x57, 0xAB]);

        match result {
            Err(TransportError::Write(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected Write error, got {other:?}"),
        }
    }

    #[test]
    fn test_send_holds_for_settle_interval() {
        let transport =
            SerialTransport::from_writer(SharedBuf::default(), Duration::from_millis(5));

        let start = Instant::now();
        transport.send(&[0x00]).unwrap();

        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_default_settle_is_one_millisecond() {
        assert_eq!(DEFAULT_SETTLE, Duration::from_millis(1));
    }

    #[test]
    fn test_open_missing_device_returns_open_error() {
        let result = SerialTransport::open("/dev/lkvm-does-not-exist", 9600, DEFAULT_SETTLE);
        assert!(matches!(result, Err(TransportError::Open { baud_rate: 9600, .. })));
    }
}
