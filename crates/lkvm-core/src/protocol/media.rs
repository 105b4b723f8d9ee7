//! Media (consumer control) key table.
//!
//! Media keys are not sent as HID keyboard usages.  The bridge takes a fixed
//! 4-byte consumer report per key, framed with [`CommandCode::KeyboardMedia`]
//! (`0x03`).  The first byte is the report id `0x02`, the second a one-hot
//! bit selecting the key.
//!
//! [`CommandCode::KeyboardMedia`]: crate::protocol::frame::CommandCode::KeyboardMedia

use std::fmt;
use std::str::FromStr;

use crate::error::InputError;

/// Report id prefix shared by every media payload.
pub const MEDIA_REPORT_ID: u8 = 0x02;

/// Payload that releases every media key.
pub const MEDIA_RELEASE_PAYLOAD: [u8; 4] = [MEDIA_REPORT_ID, 0x00, 0x00, 0x00];

/// One of the eight media keys the bridge supports.
///
/// Variants are listed in table order; [`MediaKey::index`] and
/// `MediaKey::try_from(u8)` use that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKey {
    Eject,
    Stop,
    PrevTrack,
    NextTrack,
    PlayPause,
    Mute,
    VolumeDown,
    VolumeUp,
}

/// Static key → payload table.
const MEDIA_KEY_TABLE: [(MediaKey, [u8; 4]); 8] = [
    (MediaKey::Eject, [MEDIA_REPORT_ID, 0x80, 0x00, 0x00]),
    (MediaKey::Stop, [MEDIA_REPORT_ID, 0x40, 0x00, 0x00]),
    (MediaKey::PrevTrack, [MEDIA_REPORT_ID, 0x20, 0x00, 0x00]),
    (MediaKey::NextTrack, [MEDIA_REPORT_ID, 0x10, 0x00, 0x00]),
    (MediaKey::PlayPause, [MEDIA_REPORT_ID, 0x08, 0x00, 0x00]),
    (MediaKey::Mute, [MEDIA_REPORT_ID, 0x04, 0x00, 0x00]),
    (MediaKey::VolumeDown, [MEDIA_REPORT_ID, 0x02, 0x00, 0x00]),
    (MediaKey::VolumeUp, [MEDIA_REPORT_ID, 0x01, 0x00, 0x00]),
];

impl MediaKey {
    /// All media keys in table order.
    pub const ALL: [MediaKey; 8] = [
        MediaKey::Eject,
        MediaKey::Stop,
        MediaKey::PrevTrack,
        MediaKey::NextTrack,
        MediaKey::PlayPause,
        MediaKey::Mute,
        MediaKey::VolumeDown,
        MediaKey::VolumeUp,
    ];

    /// The fixed 4-byte payload for this key.
    pub fn payload(self) -> [u8; 4] {
        MEDIA_KEY_TABLE[self.index() as usize].1
    }

    /// Position of this key in the table.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Canonical snake_case name, as accepted by [`MediaKey::from_str`].
    pub fn name(self) -> &'static str {
        match self {
            MediaKey::Eject => "eject",
            MediaKey::Stop => "stop",
            MediaKey::PrevTrack => "prev_track",
            MediaKey::NextTrack => "next_track",
            MediaKey::PlayPause => "play_pause",
            MediaKey::Mute => "mute",
            MediaKey::VolumeDown => "volume_down",
            MediaKey::VolumeUp => "volume_up",
        }
    }
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for MediaKey {
    type Error = InputError;

    fn try_from(value: u8) -> Result<Self, InputError> {
        MediaKey::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| InputError::InvalidMediaKey(value.to_string()))
    }
}

impl FromStr for MediaKey {
    type Err = InputError;

    /// Parses a media key name.
    ///
    /// Matching ignores case, and `-`/`_` separators are optional, so
    /// `"volume_up"`, `"VolumeUp"` and `"volume-up"` all resolve to
    /// [`MediaKey::VolumeUp`].  Browser `KeyboardEvent.key` names such as
    /// `"MediaPlayPause"` and `"AudioVolumeMute"` are accepted too.
    fn from_str(s: &str) -> Result<Self, InputError> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        let key = match normalized.as_str() {
            "eject" | "mediaeject" => MediaKey::Eject,
            "stop" | "cdstop" | "mediastop" => MediaKey::Stop,
            "prevtrack" | "previoustrack" | "mediatrackprevious" => MediaKey::PrevTrack,
            "nexttrack" | "mediatracknext" => MediaKey::NextTrack,
            "playpause" | "mediaplaypause" => MediaKey::PlayPause,
            "mute" | "audiovolumemute" | "volumemute" => MediaKey::Mute,
            "volumedown" | "audiovolumedown" => MediaKey::VolumeDown,
            "volumeup" | "audiovolumeup" => MediaKey::VolumeUp,
            _ => return Err(InputError::InvalidMediaKey(s.to_string())),
        };
        Ok(key)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
