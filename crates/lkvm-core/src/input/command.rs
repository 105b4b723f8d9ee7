//! Closed set of input commands and the dispatcher that executes them.
//!
//! The network boundary decodes whatever it receives (JSON over WebSocket,
//! query strings, ...) into a [`Command`].  From here on nothing knows about
//! the wire format the command arrived in.

use std::sync::Arc;

use tracing::debug;

use crate::error::InputError;
use crate::input::keyboard::{KeyboardSender, Modifiers};
use crate::input::mouse::{MouseButton, MouseSender};
use crate::protocol::media::MediaKey;
use crate::transport::PacketSink;

/// One decoded input action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Press the given HID key codes with modifiers.
    KeyDown { keys: Vec<u8>, modifiers: Modifiers },
    /// Release every general key and modifier.
    KeyUp,
    /// Move to a pixel position on the configured target screen.
    MouseMove { x: i32, y: i32 },
    /// Move by a pixel delta.
    MouseMoveRelative { dx: i32, dy: i32 },
    MousePress(MouseButton),
    /// Release every mouse button.
    MouseRelease,
    MediaKey(MediaKey),
    /// Release every media key.
    MediaKeyUp,
}

impl Command {
    /// Short variant name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Command::KeyDown { .. } => "KeyDown",
            Command::KeyUp => "KeyUp",
            Command::MouseMove { .. } => "MouseMove",
            Command::MouseMoveRelative { .. } => "MouseMoveRelative",
            Command::MousePress(_) => "MousePress",
            Command::MouseRelease => "MouseRelease",
            Command::MediaKey(_) => "MediaKey",
            Command::MediaKeyUp => "MediaKeyUp",
        }
    }
}

/// Resolution of the target screen, used to scale absolute moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: i32,
    pub height: i32,
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Routes each [`Command`] to the keyboard or mouse sender.
///
/// Both senders share one [`PacketSink`], so packets from either reach the
/// device in the order commands are dispatched.
pub struct Dispatcher {
    keyboard: KeyboardSender,
    mouse: MouseSender,
    screen: ScreenSize,
}

impl Dispatcher {
    pub fn new(sink: Arc<dyn PacketSink>, screen: ScreenSize) -> Self {
        Self {
            keyboard: KeyboardSender::new(Arc::clone(&sink)),
            mouse: MouseSender::new(sink),
            screen,
        }
    }

    /// Executes one command.  Blocks for the write plus the transport's
    /// settle delay.
    ///
    /// # Errors
    ///
    /// Propagates the sender's [`InputError`]; nothing is retried.
    pub fn dispatch(&self, command: &Command) -> Result<(), InputError> {
        debug!("dispatch {}", command.name());
        match command {
            Command::KeyDown { keys, modifiers } => self.keyboard.press(keys, *modifiers),
            Command::KeyUp => self.keyboard.release(),
            Command::MouseMove { x, y } => {
                self.mouse
                    .move_absolute(*x, *y, self.screen.width, self.screen.height)
            }
            Command::MouseMoveRelative { dx, dy } => self.mouse.move_relative(*dx, *dy),
            Command::MousePress(button) => self.mouse.press(*button),
            Command::MouseRelease => self.mouse.release(),
            Command::MediaKey(key) => self.keyboard.press_media(*key),
            Command::MediaKeyUp => self.keyboard.release_media(),
        }
    }

    /// Releases every key, media key and mouse button.
    ///
    /// All three releases are attempted even if one fails; the first error
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns the first [`InputError::Transport`] encountered.
    pub fn release_all(&self) -> Result<(), InputError> {
        let results = [
            self.keyboard.release(),
            self.keyboard.release_media(),
            self.mouse.release(),
        ];
        results.into_iter().collect()
    }

    pub fn keyboard(&self) -> &KeyboardSender {
        &self.keyboard
    }

    pub fn mouse(&self) -> &MouseSender {
        &self.mouse
    }

    pub fn screen(&self) -> ScreenSize {
        self.screen
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::{CommandCode, Frame};
    use crate::transport::mock::RecordingSink;

    fn dispatcher() -> (Arc<RecordingSink>, Dispatcher) {
        let sink = Arc::new(RecordingSink::new());
        let dispatcher = Dispatcher::new(sink.clone(), ScreenSize::default());
        (sink, dispatcher)
    }

    fn command_of(packet: &[u8]) -> CommandCode {
        Frame::decode(packet).unwrap().0.command()
    }

    #[test]
    fn test_each_command_sends_one_packet_with_matching_code() {
        let cases = [
            (
                Command::KeyDown {
                    keys: vec![0x04],
                    modifiers: Modifiers::NONE,
                },
                CommandCode::KeyboardGeneral,
            ),
            (Command::KeyUp, CommandCode::KeyboardGeneral),
            (Command::MouseMove { x: 10, y: 10 }, CommandCode::MouseAbsolute),
            (
                Command::MouseMoveRelative { dx: 1, dy: 1 },
                CommandCode::MouseRelative,
            ),
            (Command::MousePress(MouseButton::Left), CommandCode::MouseRelative),
            (Command::MouseRelease, CommandCode::MouseRelative),
            (Command::MediaKey(MediaKey::Mute), CommandCode::KeyboardMedia),
            (Command::MediaKeyUp, CommandCode::KeyboardMedia),
        ];

        for (command, expected) in cases {
            let (sink, dispatcher) = dispatcher();

            dispatcher.dispatch(&command).unwrap();

            let packets = sink.packets();
            assert_eq!(packets.len(), 1, "{} must send exactly one packet", command.name());
            assert_eq!(command_of(&packets[0]), expected);
        }
    }

    #[test]
    fn test_mouse_move_uses_configured_screen() {
        // Arrange: a 1280x720 target
        let sink = Arc::new(RecordingSink::new());
        let dispatcher = Dispatcher::new(
            sink.clone(),
            ScreenSize {
                width: 1280,
                height: 720,
            },
        );

        // Act
        dispatcher
            .dispatch(&Command::MouseMove { x: 1280, y: 720 })
            .unwrap();

        // Assert: full scale on both axes
        assert_eq!(dispatcher.screen().width, 1280);
        let packet = sink.last().unwrap();
        assert_eq!(u16::from_le_bytes([packet[7], packet[8]]), 4095);
        assert_eq!(u16::from_le_bytes([packet[9], packet[10]]), 4095);
    }

    #[test]
    fn test_dispatch_preserves_order() {
        let (sink, dispatcher) = dispatcher();

        dispatcher
            .dispatch(&Command::MousePress(MouseButton::Left))
            .unwrap();
        dispatcher
            .dispatch(&Command::MouseMoveRelative { dx: 5, dy: 0 })
            .unwrap();
        dispatcher.dispatch(&Command::MouseRelease).unwrap();

        let packets = sink.packets();
        assert_eq!(packets[0][6], 0x01);
        assert_eq!(packets[1][6], 0x01);
        assert_eq!(packets[1][7], 5);
        assert_eq!(packets[2][6], 0x00);
    }

    #[test]
    fn test_too_many_keys_surfaces_from_dispatch() {
        let (sink, dispatcher) = dispatcher();

        let result = dispatcher.dispatch(&Command::KeyDown {
            keys: (1..=7).collect(),
            modifiers: Modifiers::NONE,
        });

        assert!(matches!(result, Err(InputError::TooManyKeys { .. })));
        assert!(sink.packets().is_empty());
    }

    #[test]
    fn test_release_all_sends_three_releases_and_clears_state() {
        let (sink, dispatcher) = dispatcher();
        dispatcher
            .dispatch(&Command::KeyDown {
                keys: vec![0x04],
                modifiers: Modifiers::CTRL,
            })
            .unwrap();
        dispatcher
            .dispatch(&Command::MousePress(MouseButton::Left))
            .unwrap();
        sink.clear();

        dispatcher.release_all().unwrap();

        let codes: Vec<_> = sink.packets().iter().map(|p| command_of(p)).collect();
        assert_eq!(
            codes,
            vec![
                CommandCode::KeyboardGeneral,
                CommandCode::KeyboardMedia,
                CommandCode::MouseRelative
            ]
        );
        assert!(dispatcher.keyboard().state().is_idle());
        assert_eq!(dispatcher.mouse().held(), 0);
    }

    #[test]
    fn test_release_all_reports_transport_failure() {
        let (sink, dispatcher) = dispatcher();
        sink.set_fail_writes(true);

        assert!(matches!(
            dispatcher.release_all(),
            Err(InputError::Transport(_))
        ));
    }
}
