//! Error type shared by the input senders and the dispatcher.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors returned by sender operations.
///
/// Every variant except [`InputError::Transport`] is raised before any byte is
/// written, so a failed call never leaves a partial packet on the wire.
#[derive(Debug, Error)]
pub enum InputError {
    /// More distinct key codes than the six slots of a keyboard report.
    #[error("too many keys: {count} requested, at most {max} can be held")]
    TooManyKeys { count: usize, max: usize },

    /// The identifier does not name one of the eight media keys.
    #[error("invalid media key: {0}")]
    InvalidMediaKey(String),

    /// The identifier does not name a supported mouse button.
    #[error("invalid mouse button: {0}")]
    InvalidButton(String),

    /// Absolute moves need a positive screen width and height to scale against.
    #[error("invalid screen dimensions: {width}x{height}")]
    InvalidScreenDimensions { width: i32, height: i32 },

    /// The packet was built but could not be written.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
