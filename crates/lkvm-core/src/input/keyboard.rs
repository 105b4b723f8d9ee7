//! Keyboard sender: general key reports and media key reports.
//!
//! A general report is 8 payload bytes:
//!
//! ```text
//! [modifiers][reserved=0x00][k1][k2][k3][k4][k5][k6]
//! ```
//!
//! The bridge is stateless per report: each packet replaces the whole set of
//! held keys on the target, and an all-zero report releases everything.

use std::ops::BitOr;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::error::InputError;
use crate::protocol::frame::{CommandCode, Frame};
use crate::protocol::media::{MediaKey, MEDIA_RELEASE_PAYLOAD};
use crate::transport::PacketSink;

/// Number of non-modifier key slots in a general keyboard report.
pub const MAX_PRESSED_KEYS: usize = 6;

/// Modifier byte of a keyboard report (left-hand HID modifier bits).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(pub u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0x00);
    pub const CTRL: Modifiers = Modifiers(0x01);
    pub const SHIFT: Modifiers = Modifiers(0x02);
    pub const ALT: Modifiers = Modifiers(0x04);

    /// Builds the modifier byte from the three boolean flags an input event carries.
    pub fn from_flags(ctrl: bool, shift: bool, alt: bool) -> Self {
        let mut m = Modifiers::NONE;
        if ctrl {
            m = m | Modifiers::CTRL;
        }
        if shift {
            m = m | Modifiers::SHIFT;
        }
        if alt {
            m = m | Modifiers::ALT;
        }
        m
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

/// Keys and modifiers most recently transmitted as held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardState {
    /// Non-modifier key codes, unique, at most [`MAX_PRESSED_KEYS`].
    pub keys: Vec<u8>,
    pub modifiers: Modifiers,
}

impl KeyboardState {
    /// `true` when nothing is held.
    pub fn is_idle(&self) -> bool {
        self.keys.is_empty() && self.modifiers.is_empty()
    }
}

/// Builds and sends keyboard packets.
///
/// Every operation performs exactly one write through the shared sink.
pub struct KeyboardSender {
    sink: Arc<dyn PacketSink>,
    state: Mutex<KeyboardState>,
}

impl KeyboardSender {
    pub fn new(sink: Arc<dyn PacketSink>) -> Self {
        Self {
            sink,
            state: Mutex::new(KeyboardState::default()),
        }
    }

    /// Presses `keys` together with `modifiers`.
    ///
    /// Duplicate codes collapse into one slot and `0x00` (the empty slot) is
    /// ignored.  The report replaces whatever was held before.
    ///
    /// # Errors
    ///
    /// - [`InputError::TooManyKeys`] if more than six distinct codes remain;
    ///   nothing is sent.
    /// - [`InputError::Transport`] if the write fails; the held state is
    ///   left unchanged.
    pub fn press(&self, keys: &[u8], modifiers: Modifiers) -> Result<(), InputError> {
        let mut unique: Vec<u8> = Vec::with_capacity(keys.len());
        for &key in keys {
            if key != 0 && !unique.contains(&key) {
                unique.push(key);
            }
        }
        if unique.len() > MAX_PRESSED_KEYS {
            return Err(InputError::TooManyKeys {
                count: unique.len(),
                max: MAX_PRESSED_KEYS,
            });
        }

        let mut payload = [0u8; 2 + MAX_PRESSED_KEYS];
        payload[0] = modifiers.bits();
        payload[2..2 + unique.len()].copy_from_slice(&unique);

        // The state lock is held across the write so the recorded state
        // always matches the last report on the wire.
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        debug!("key press {unique:02X?} modifiers=0x{:02X}", modifiers.bits());
        self.send(Frame::new(CommandCode::KeyboardGeneral, payload))?;
        *state = KeyboardState {
            keys: unique,
            modifiers,
        };
        Ok(())
    }

    /// Presses a single key.  One network event carries one key.
    ///
    /// # Errors
    ///
    /// See [`KeyboardSender::press`].
    pub fn press_key(&self, key: u8, modifiers: Modifiers) -> Result<(), InputError> {
        self.press(&[key], modifiers)
    }

    /// Releases every general key and modifier.
    ///
    /// There is no partial release: the bridge only understands a complete
    /// report, so this always sends the all-zero report.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Transport`] if the write fails.
    pub fn release(&self) -> Result<(), InputError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        debug!("key release all");
        self.send(Frame::new(
            CommandCode::KeyboardGeneral,
            [0u8; 2 + MAX_PRESSED_KEYS],
        ))?;
        *state = KeyboardState::default();
        Ok(())
    }

    /// Presses a media key.
    ///
    /// Media keys do not affect [`KeyboardState`]; they travel on their own
    /// report.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Transport`] if the write fails.  Unknown media
    /// identifiers are rejected earlier, when parsing into [`MediaKey`].
    pub fn press_media(&self, key: MediaKey) -> Result<(), InputError> {
        debug!("media press {key}");
        self.send(Frame::new(CommandCode::KeyboardMedia, key.payload()))
    }

    /// Releases every media key.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Transport`] if the write fails.
    pub fn release_media(&self) -> Result<(), InputError> {
        debug!("media release all");
        self.send(Frame::new(CommandCode::KeyboardMedia, MEDIA_RELEASE_PAYLOAD))
    }

    /// Snapshot of the keys and modifiers last reported as held.
    pub fn state(&self) -> KeyboardState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn send(&self, frame: Frame) -> Result<(), InputError> {
        self.sink.send(&frame.encode())?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::checksum;
    use crate::transport::mock::RecordingSink;
    use crate::transport::{MockPacketSink, TransportError};

    fn keyboard() -> (Arc<RecordingSink>, KeyboardSender) {
        let sink = Arc::new(RecordingSink::new());
        let keyboard = KeyboardSender::new(sink.clone());
        (sink, keyboard)
    }

    #[test]
    fn test_modifiers_from_flags() {
        assert_eq!(Modifiers::from_flags(false, false, false), Modifiers::NONE);
        assert_eq!(Modifiers::from_flags(true, false, false).bits(), 0x01);
        assert_eq!(Modifiers::from_flags(false, true, false).bits(), 0x02);
        assert_eq!(Modifiers::from_flags(false, false, true).bits(), 0x04);
        assert_eq!(Modifiers::from_flags(true, true, true).bits(), 0x07);
    }

    #[test]
    fn test_modifiers_bitor() {
        let m = Modifiers::CTRL | Modifiers::ALT;
        assert_eq!(m.bits(), 0x05);
        assert!(!m.is_empty());
    }

    #[test]
    fn test_press_single_key_layout() {
        // Arrange
        let (sink, keyboard) = keyboard();

        // Act: 'a' (HID 0x04) with no modifiers
        keyboard.press_key(0x04, Modifiers::NONE).unwrap();

        // Assert
        let packet = sink.last().unwrap();
        assert_eq!(
            &packet[..13],
            &[0x57, 0xAB, 0x00, 0x02, 0x08, 0x00, 0x00, 0x04, 0, 0, 0, 0, 0]
        );
        assert_eq!(packet[13], checksum(&packet[..13]));
    }

    #[test]
    fn test_press_places_modifier_byte_first() {
        let (sink, keyboard) = keyboard();

        keyboard
            .press_key(0x06, Modifiers::CTRL | Modifiers::SHIFT)
            .unwrap();

        let packet = sink.last().unwrap();
        assert_eq!(packet[5], 0x03);
        assert_eq!(packet[6], 0x00);
        assert_eq!(packet[7], 0x06);
    }

    #[test]
    fn test_press_then_release_sequence() {
        let (sink, keyboard) = keyboard();

        keyboard.press_key(0x28, Modifiers::NONE).unwrap();
        keyboard.release().unwrap();

        let packets = sink.packets();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0][5], 0x00);
        assert_eq!(packets[0][7], 0x28);
        assert_eq!(
            packets[1],
            vec![0x57, 0xAB, 0x00, 0x02, 0x08, 0, 0, 0, 0, 0, 0, 0, 0, 0x0C]
        );
    }

    #[test]
    fn test_press_six_keys_fills_every_slot() {
        let (sink, keyboard) = keyboard();

        keyboard
            .press(&[0x04, 0x05, 0x06, 0x07, 0x08, 0x09], Modifiers::NONE)
            .unwrap();

        let packet = sink.last().unwrap();
        assert_eq!(&packet[7..13], &[0x04, 0x05, 0x06, 0x07, 0x08, 0x09]);
    }

    #[test]
    fn test_press_seven_keys_is_rejected_without_sending() {
        let (sink, keyboard) = keyboard();

        let result = keyboard.press(&[4, 5, 6, 7, 8, 9, 10], Modifiers::NONE);

        assert!(matches!(
            result,
            Err(InputError::TooManyKeys { count: 7, max: 6 })
        ));
        assert!(sink.packets().is_empty());
        assert!(keyboard.state().is_idle());
    }

    #[test]
    fn test_press_collapses_duplicate_codes() {
        let (sink, keyboard) = keyboard();

        keyboard
            .press(&[4, 4, 4, 4, 4, 4, 4, 5], Modifiers::NONE)
            .unwrap();

        assert_eq!(keyboard.state().keys, vec![4, 5]);
        assert_eq!(&sink.last().unwrap()[7..10], &[4, 5, 0]);
    }

    #[test]
    fn test_press_updates_state_and_release_clears_it() {
        let (_sink, keyboard) = keyboard();

        keyboard.press_key(0x1E, Modifiers::SHIFT).unwrap();
        assert_eq!(
            keyboard.state(),
            KeyboardState {
                keys: vec![0x1E],
                modifiers: Modifiers::SHIFT
            }
        );

        keyboard.release().unwrap();
        assert!(keyboard.state().is_idle());
    }

    #[test]
    fn test_second_press_overwrites_first() {
        let (_sink, keyboard) = keyboard();

        keyboard.press_key(0x04, Modifiers::NONE).unwrap();
        keyboard.press_key(0x05, Modifiers::ALT).unwrap();

        let state = keyboard.state();
        assert_eq!(state.keys, vec![0x05]);
        assert_eq!(state.modifiers, Modifiers::ALT);
    }

    #[test]
    fn test_press_media_frames_payload_with_media_command() {
        let (sink, keyboard) = keyboard();

        keyboard.press_media(MediaKey::Mute).unwrap();

        let packet = sink.last().unwrap();
        assert_eq!(
            &packet[..9],
            &[0x57, 0xAB, 0x00, 0x03, 0x04, 0x02, 0x04, 0x00, 0x00]
        );
        assert_eq!(packet[9], checksum(&packet[..9]));
    }

    #[test]
    fn test_press_media_succeeds_for_every_key() {
        let (sink, keyboard) = keyboard();

        for key in MediaKey::ALL {
            keyboard.press_media(key).unwrap();
        }

        assert_eq!(sink.packets().len(), 8);
    }

    #[test]
    fn test_release_media_packet() {
        let (sink, keyboard) = keyboard();

        keyboard.release_media().unwrap();

        assert_eq!(
            sink.last().unwrap(),
            vec![0x57, 0xAB, 0x00, 0x03, 0x04, 0x02, 0x00, 0x00, 0x00, 0x0B]
        );
    }

    #[test]
    fn test_failed_write_keeps_previous_state() {
        // Arrange
        let (sink, keyboard) = keyboard();
        keyboard.press_key(0x04, Modifiers::NONE).unwrap();
        sink.set_fail_writes(true);

        // Act
        let result = keyboard.press_key(0x05, Modifiers::NONE);

        // Assert
        assert!(matches!(result, Err(InputError::Transport(_))));
        assert_eq!(keyboard.state().keys, vec![0x04]);
    }

    #[test]
    fn test_transport_error_is_not_retried() {
        let mut sink = MockPacketSink::new();
        sink.expect_send().times(1).returning(|_| {
            Err(TransportError::Write(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "unplugged",
            )))
        });
        let keyboard = KeyboardSender::new(Arc::new(sink));

        let result = keyboard.release();

        assert!(matches!(result, Err(InputError::Transport(TransportError::Write(_)))));
    }
}
