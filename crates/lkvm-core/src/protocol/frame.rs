//! Packet framing for the bridge device's serial command protocol.
//!
//! Wire format:
//! ```text
//! [0x57][0xAB][address:1][command:1][len:1][payload:len][checksum:1]
//! ```
//! The checksum is the sum of every preceding byte, modulo 256.

use thiserror::Error;

/// Two-byte sync header that starts every packet.
pub const SYNC_HEADER: [u8; 2] = [0x57, 0xAB];

/// Address byte of the bridge device.  Single-device links always use `0x00`.
pub const DEVICE_ADDRESS: u8 = 0x00;

/// Bytes before the payload: sync (2) + address (1) + command (1) + length (1).
pub const FRAME_PREFIX_LEN: usize = 5;

/// Command byte selecting which category of action a packet performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandCode {
    /// General keyboard report: modifiers, reserved byte, six key slots.
    KeyboardGeneral = 0x02,
    /// Consumer/media keyboard report.
    KeyboardMedia = 0x03,
    /// Absolute pointer report in the device's 0..4095 coordinate space.
    MouseAbsolute = 0x04,
    /// Relative pointer report with signed byte deltas.
    MouseRelative = 0x05,
}

impl TryFrom<u8> for CommandCode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x02 => Ok(CommandCode::KeyboardGeneral),
            0x03 => Ok(CommandCode::KeyboardMedia),
            0x04 => Ok(CommandCode::MouseAbsolute),
            0x05 => Ok(CommandCode::MouseRelative),
            _ => Err(()),
        }
    }
}

/// Errors returned by [`Frame::decode`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The byte slice ends before the frame does.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The first two bytes are not `0x57 0xAB`.
    #[error("bad sync header: {0:02X} {1:02X}")]
    BadHeader(u8, u8),

    /// The command byte is not one this crate emits.
    #[error("unknown command code: 0x{0:02X}")]
    UnknownCommand(u8),

    /// The trailing byte does not match the computed checksum.
    #[error("checksum mismatch: expected 0x{expected:02X}, found 0x{found:02X}")]
    ChecksumMismatch { expected: u8, found: u8 },
}

// ── Raw builder ───────────────────────────────────────────────────────────────

/// Sum of `bytes` modulo 256.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Turns a list of integer fields into bytes, optionally appending a checksum.
///
/// Each field is truncated to its low 8 bits.  No validation is performed:
/// callers are responsible for producing a well-formed field list.
///
/// # Examples
///
/// ```rust
/// use lkvm_core::build_packet;
///
/// let bytes = build_packet(&[0x57, 0xAB, 0x00, 0x05, 0x05, 0x01, 0, 0, 0, 0], true);
/// assert_eq!(bytes.last(), Some(&0x0D));
/// ```
pub fn build_packet(fields: &[i32], append_checksum: bool) -> Vec<u8> {
    let mut buf: Vec<u8> = fields.iter().map(|f| (*f & 0xFF) as u8).collect();
    if append_checksum {
        let sum = checksum(&buf);
        buf.push(sum);
    }
    buf
}

// ── Typed frame ───────────────────────────────────────────────────────────────

/// One command packet: a command code and its payload.
///
/// Encoding always emits the sync header, the device address, the payload
/// length and a trailing checksum, so the framing rules live in one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    command: CommandCode,
    payload: Vec<u8>,
}

impl Frame {
    /// Creates a frame.  Payloads longer than 255 bytes cannot be framed; every
    /// packet the senders build carries at most 8.
    pub fn new(command: CommandCode, payload: impl Into<Vec<u8>>) -> Self {
        let payload = payload.into();
        debug_assert!(payload.len() <= u8::MAX as usize);
        Self { command, payload }
    }

    pub fn command(&self) -> CommandCode {
        self.command
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Total encoded length including header and checksum.
    pub fn encoded_len(&self) -> usize {
        FRAME_PREFIX_LEN + self.payload.len() + 1
    }

    /// Encodes the frame into wire bytes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lkvm_core::{CommandCode, Frame};
    ///
    /// let bytes = Frame::new(CommandCode::KeyboardGeneral, [0u8; 8]).encode();
    /// assert_eq!(
    ///     bytes,
    ///     [0x57, 0xAB, 0x00, 0x02, 0x08, 0, 0, 0, 0, 0, 0, 0, 0, 0x0C]
    /// );
    /// ```
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&SYNC_HEADER);
        buf.push(DEVICE_ADDRESS);
        buf.push(self.command as u8);
        buf.push(self.payload.len() as u8);
        buf.extend_from_slice(&self.payload);
        buf.push(checksum(&buf));
        buf
    }

    /// Decodes one frame from the start of `bytes`.
    ///
    /// Returns the frame and the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] if the bytes are truncated or malformed.
    pub fn decode(bytes: &[u8]) -> Result<(Frame, usize), FrameError> {
        if bytes.len() < FRAME_PREFIX_LEN {
            return Err(FrameError::InsufficientData {
                needed: FRAME_PREFIX_LEN,
                available: bytes.len(),
            });
        }
        if bytes[..2] != SYNC_HEADER {
            return Err(FrameError::BadHeader(bytes[0], bytes[1]));
        }
        let command =
            CommandCode::try_from(bytes[3]).map_err(|_| FrameError::UnknownCommand(bytes[3]))?;

        let payload_len = bytes[4] as usize;
        let total = FRAME_PREFIX_LEN + payload_len + 1;
        if bytes.len() < total {
            return Err(FrameError::InsufficientData {
                needed: total,
                available: bytes.len(),
            });
        }

        let expected = checksum(&bytes[..total - 1]);
        let found = bytes[total - 1];
        if expected != found {
            return Err(FrameError::ChecksumMismatch { expected, found });
        }

        let payload = bytes[FRAME_PREFIX_LEN..total - 1].to_vec();
        Ok((Frame { command, payload }, total))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
