//! Application layer for lkvm-server: turns decoded browser events into
//! [`lkvm_core::Command`] values.

pub mod translate;

pub use translate::{EventError, EventTranslator};
