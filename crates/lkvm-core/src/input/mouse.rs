//! Mouse sender: relative and absolute pointer reports.
//!
//! Relative report payload (command `0x05`, 5 bytes):
//!
//! ```text
//! [0x01][buttons][dx:i8][dy:i8][wheel:i8]
//! ```
//!
//! Absolute report payload (command `0x04`, 7 bytes):
//!
//! ```text
//! [0x02][buttons][x:u16 LE][y:u16 LE][wheel:i8]
//! ```
//!
//! Both reports carry the full button byte.  A move sent with a zero button
//! byte would read as a release on the target, so every move includes the
//! buttons still held.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::error::InputError;
use crate::protocol::frame::{CommandCode, Frame};
use crate::transport::PacketSink;

/// Report id of a relative pointer payload.
const RELATIVE_REPORT_ID: u8 = 0x01;

/// Report id of an absolute pointer payload.
const ABSOLUTE_REPORT_ID: u8 = 0x02;

/// Size of the device's absolute coordinate space along each axis.
pub const ABSOLUTE_RANGE: i64 = 4096;

/// Largest absolute coordinate the device accepts.
pub const ABSOLUTE_MAX: u16 = (ABSOLUTE_RANGE - 1) as u16;

/// A mouse button as encoded in the report's button byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MouseButton {
    None = 0x00,
    Left = 0x01,
    Right = 0x02,
    Middle = 0x04,
}

impl MouseButton {
    pub fn bits(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MouseButton::None => "none",
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        })
    }
}

impl TryFrom<u8> for MouseButton {
    type Error = InputError;

    fn try_from(value: u8) -> Result<Self, InputError> {
        match value {
            0x00 => Ok(MouseButton::None),
            0x01 => Ok(MouseButton::Left),
            0x02 => Ok(MouseButton::Right),
            0x04 => Ok(MouseButton::Middle),
            other => Err(InputError::InvalidButton(format!("0x{other:02X}"))),
        }
    }
}

impl FromStr for MouseButton {
    type Err = InputError;

    /// Parses a button name, case-insensitively.  `center` is an alias for
    /// `middle` and `null` an alias for `none`.
    fn from_str(s: &str) -> Result<Self, InputError> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "null" => Ok(MouseButton::None),
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" | "center" | "centre" => Ok(MouseButton::Middle),
            _ => Err(InputError::InvalidButton(s.to_string())),
        }
    }
}

/// Clamps a delta to the signed-byte range and returns its two's-complement byte.
pub fn relative_byte(delta: i32) -> u8 {
    delta.clamp(i8::MIN as i32, i8::MAX as i32) as i8 as u8
}

/// Scales a screen-pixel coordinate into the device's absolute coordinate space.
///
/// `round(pos * 4096 / extent)`, clamped to `0..=4095`.  `extent` must be
/// positive.
pub fn scale_absolute(pos: i32, extent: i32) -> u16 {
    debug_assert!(extent > 0);
    let pos = i64::from(pos.max(0));
    let extent = i64::from(extent);
    // Round half up without going through floating point.
    let scaled = (2 * pos * ABSOLUTE_RANGE + extent) / (2 * extent);
    scaled.min(i64::from(ABSOLUTE_MAX)) as u16
}

/// Builds and sends mouse packets, remembering which buttons are held.
pub struct MouseSender {
    sink: Arc<dyn PacketSink>,
    held: Mutex<u8>,
}

impl MouseSender {
    pub fn new(sink: Arc<dyn PacketSink>) -> Self {
        Self {
            sink,
            held: Mutex::new(0),
        }
    }

    /// Presses `button`.
    ///
    /// The report replaces whatever the device last saw, so pressing
    /// [`MouseButton::None`] while a button is held lifts it.  Later moves
    /// carry the pressed button.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Transport`] if the write fails; the held state
    /// is left unchanged.
    pub fn press(&self, button: MouseButton) -> Result<(), InputError> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        let buttons = button.bits();
        debug!("mouse press {button} (buttons=0x{buttons:02X})");
        self.send(Frame::new(
            CommandCode::MouseRelative,
            [RELATIVE_REPORT_ID, buttons, 0x00, 0x00, 0x00],
        ))?;
        *held = buttons;
        Ok(())
    }

    /// Releases every button.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Transport`] if the write fails.  The held state
    /// is cleared regardless, since the target may already have seen part of
    /// the release.
    pub fn release(&self) -> Result<(), InputError> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        *held = 0;
        debug!("mouse release all");
        self.send(Frame::new(
            CommandCode::MouseRelative,
            [RELATIVE_REPORT_ID, 0x00, 0x00, 0x00, 0x00],
        ))
    }

    /// Moves the pointer by `(dx, dy)`.
    ///
    /// Each delta is clamped to `-128..=127`; out-of-range values are not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Transport`] if the write fails.
    pub fn move_relative(&self, dx: i32, dy: i32) -> Result<(), InputError> {
        let held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        let (x, y) = (relative_byte(dx), relative_byte(dy));
        debug!("mouse move rel ({dx}, {dy}) -> ({x:#04X}, {y:#04X})");
        self.send(Frame::new(
            CommandCode::MouseRelative,
            [RELATIVE_REPORT_ID, *held, x, y, 0x00],
        ))
    }

    /// Moves the pointer to pixel `(x, y)` on a `screen_width` × `screen_height`
    /// screen.
    ///
    /// # Errors
    ///
    /// - [`InputError::InvalidScreenDimensions`] if either dimension is zero
    ///   or negative; nothing is sent.
    /// - [`InputError::Transport`] if the write fails.
    pub fn move_absolute(
        &self,
        x: i32,
        y: i32,
        screen_width: i32,
        screen_height: i32,
    ) -> Result<(), InputError> {
        if screen_width <= 0 || screen_height <= 0 {
            return Err(InputError::InvalidScreenDimensions {
                width: screen_width,
                height: screen_height,
            });
        }

        let dev_x = scale_absolute(x, screen_width);
        let dev_y = scale_absolute(y, screen_height);

        let held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        let [xl, xh] = dev_x.to_le_bytes();
        let [yl, yh] = dev_y.to_le_bytes();
        debug!("mouse move abs ({x}, {y}) -> ({dev_x}, {dev_y})");
        self.send(Frame::new(
            CommandCode::MouseAbsolute,
            [ABSOLUTE_REPORT_ID, *held, xl, xh, yl, yh, 0x00],
        ))
    }

    /// Button byte last reported as held.
    pub fn held(&self) -> u8 {
        *self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send(&self, frame: Frame) -> Result<(), InputError> {
        self.sink.send(&frame.encode())?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
