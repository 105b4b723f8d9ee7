//! Translation from browser events to core commands.
//!
//! This is the only place that knows both the JSON schema and the
//! [`Command`] set.  It does no I/O, so every rule here is unit-tested
//! without a socket or a serial port.
//!
//! | `type`         | Command                                          |
//! |----------------|--------------------------------------------------|
//! | `keydown`      | `KeyDown` from `key`/`keys` plus modifier flags  |
//! | `keyup`        | `KeyUp`                                          |
//! | `mousemove`    | `MouseMove` or `MouseMoveRelative` per mode      |
//! | `mousedown`    | `MousePress` (`button` defaults to left)         |
//! | `mouseup`      | `MouseRelease`                                   |
//! | `mediakeydown` | `MediaKey` from `key` (name or table index)      |
//! | `mediakeyup`   | `MediaKeyUp`                                     |

use lkvm_core::{Command, InputError, MediaKey, Modifiers, MouseButton};
use thiserror::Error;

use crate::domain::config::MouseMode;
use crate::domain::keymap;
use crate::domain::messages::{EventKind, InboundEvent, KeyField};

// ── Error type ────────────────────────────────────────────────────────────────

/// Reasons an event cannot be turned into a command.
///
/// The `Display` text is sent back to the browser as `error_msg`.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("unknown key '{0}'")]
    UnknownKey(String),

    #[error("key code {0} is outside 0..=255")]
    KeyCodeOutOfRange(i64),

    /// Button or media key identifiers rejected by the core parsers.
    #[error(transparent)]
    Input(#[from] InputError),
}

// ── Translator ────────────────────────────────────────────────────────────────

/// Stateless event translator configured with the server's mouse mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventTranslator {
    mouse_mode: MouseMode,
}

impl EventTranslator {
    pub fn new(mouse_mode: MouseMode) -> Self {
        Self { mouse_mode }
    }

    pub fn mouse_mode(&self) -> MouseMode {
        self.mouse_mode
    }

    /// Converts one inbound event into a [`Command`].
    ///
    /// # Errors
    ///
    /// Returns [`EventError`] if a required field is missing or a key,
    /// button or media key identifier is not recognized.
    pub fn translate(&self, event: &InboundEvent) -> Result<Command, EventError> {
        match event.kind {
            EventKind::KeyDown => key_down(event),
            EventKind::KeyUp => Ok(Command::KeyUp),
            EventKind::MouseMove => {
                let x = event.x.ok_or(EventError::MissingField("x"))?;
                let y = event.y.ok_or(EventError::MissingField("y"))?;
                Ok(match self.mouse_mode {
                    MouseMode::Absolute => Command::MouseMove { x, y },
                    MouseMode::Relative => Command::MouseMoveRelative { dx: x, dy: y },
                })
            }
            EventKind::MouseDown => {
                let button = match event.button.as_deref() {
                    Some(name) => name.parse::<MouseButton>()?,
                    None => MouseButton::Left,
                };
                Ok(Command::MousePress(button))
            }
            EventKind::MouseUp => Ok(Command::MouseRelease),
            EventKind::MediaKeyDown => {
                let key = event.key.as_ref().ok_or(EventError::MissingField("key"))?;
                Ok(Command::MediaKey(media_key(key)?))
            }
            EventKind::MediaKeyUp => Ok(Command::MediaKeyUp),
        }
    }
}

fn key_down(event: &InboundEvent) -> Result<Command, EventError> {
    if event.key.is_none() && event.keys.is_empty() {
        return Err(EventError::MissingField("key"));
    }

    let mut modifiers = Modifiers::from_flags(event.control, event.shift, event.alt);
    let mut keys = Vec::with_capacity(1 + event.keys.len());
    for field in event.key.iter().chain(event.keys.iter()) {
        let stroke = key_stroke(field)?;
        modifiers = modifiers | stroke.modifiers;
        if stroke.code != 0 {
            keys.push(stroke.code);
        }
    }

    Ok(Command::KeyDown { keys, modifiers })
}

fn key_stroke(field: &KeyField) -> Result<keymap::KeyStroke, EventError> {
    let code = match field {
        KeyField::Code(n) => code_from_int(*n)?,
        // A lone character is a character, so "7" types the 7 key.
        KeyField::Name(name) if name.chars().count() > 1 && is_decimal(name) => {
            let n = name
                .parse::<i64>()
                .map_err(|_| EventError::UnknownKey(name.clone()))?;
            code_from_int(n)?
        }
        KeyField::Name(name) => {
            return keymap::resolve(name).ok_or_else(|| EventError::UnknownKey(name.clone()))
        }
    };
    Ok(keymap::KeyStroke {
        code,
        modifiers: Modifiers::NONE,
    })
}

fn code_from_int(n: i64) -> Result<u8, EventError> {
    u8::try_from(n).map_err(|_| EventError::KeyCodeOutOfRange(n))
}

fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn media_key(field: &KeyField) -> Result<MediaKey, EventError> {
    let key = match field {
        KeyField::Code(n) => {
            let index =
                u8::try_from(*n).map_err(|_| InputError::InvalidMediaKey(n.to_string()))?;
            MediaKey::try_from(index)?
        }
        KeyField::Name(name) => match name.parse::<u8>() {
            Ok(index) => MediaKey::try_from(index)?,
            Err(_) => name.parse::<MediaKey>()?,
        },
    };
    Ok(key)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
