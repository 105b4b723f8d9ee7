//! # lkvm-core
//!
//! Protocol encoder and serial transport for a USB-HID bridge device.
//!
//! The bridge is a small serial-attached chip that presents itself to a target
//! computer as a real USB keyboard and mouse.  Every action is a short framed
//! command written over a UART:
//!
//! ```text
//! [0x57][0xAB][addr=0x00][command][len][payload: len bytes][checksum]
//! ```
//!
//! This crate has no knowledge of JSON, HTTP or WebSockets.  It is organised
//! in three modules:
//!
//! - **`protocol`** – The typed [`Frame`] builder, the checksum and the
//!   [`MediaKey`] payload table.  Pure functions, no I/O.
//!
//! - **`transport`** – The [`PacketSink`] seam and the [`SerialTransport`]
//!   that owns the serial handle and serializes every write.
//!
//! - **`input`** – The [`KeyboardSender`] and [`MouseSender`] that turn input
//!   actions into frames, plus the [`Command`] union and its [`Dispatcher`].

pub mod error;
pub mod input;
pub mod protocol;
pub mod transport;

pub use error::InputError;
pub use input::command::{Command, Dispatcher, ScreenSize};
pub use input::keyboard::{KeyboardSender, KeyboardState, Modifiers, MAX_PRESSED_KEYS};
pub use input::mouse::{MouseButton, MouseSender};
pub use protocol::frame::{build_packet, checksum, CommandCode, Frame};
pub use protocol::media::MediaKey;
pub use transport::{PacketSink, SerialTransport, TransportError};
