//! Input senders and the command dispatcher.
//!
//! ```text
//! Command ──► Dispatcher ──► KeyboardSender ─┐
//!                        └─► MouseSender ────┴─► Frame::encode ──► PacketSink
//! ```

pub mod command;
pub mod keyboard;
pub mod mouse;

pub use command::{Command, Dispatcher, ScreenSize};
pub use keyboard::{KeyboardSender, KeyboardState, Modifiers};
pub use mouse::{MouseButton, MouseSender};
