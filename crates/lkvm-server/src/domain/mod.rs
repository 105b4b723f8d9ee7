//! Domain layer for lkvm-server.
//!
//! Plain types shared by the other layers: the runtime configuration, the
//! JSON schema spoken with the browser, and the table that maps browser key
//! names to HID usage codes.  Nothing here touches a socket or the serial port.

pub mod config;
pub mod keymap;
pub mod messages;

pub use config::{ConfigError, MouseMode, ServerConfig};
pub use messages::{EventKind, EventReply, InboundEvent, KeyField};
