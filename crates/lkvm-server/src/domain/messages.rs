//! JSON messages exchanged with the browser.
//!
//! Every WebSocket text frame from the browser is one [`InboundEvent`]:
//!
//! ```json
//! { "type": "keydown", "key": "KeyA", "shift": true }
//! { "type": "mousemove", "x": 640, "y": 360 }
//! { "type": "mousedown", "button": "left" }
//! { "type": "mediakeydown", "key": "volume_up" }
//! ```
//!
//! Each one gets exactly one [`EventReply`] back, either `{"status":"ok"}` or
//! `{"error_msg":"..."}`.

use serde::{Deserialize, Serialize};

/// Reply text for frames that are not a valid [`InboundEvent`].
pub const INVALID_EVENT_FORMAT: &str = "Invalid event format";

/// The `type` discriminator of an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    KeyDown,
    KeyUp,
    MouseMove,
    MouseDown,
    MouseUp,
    MediaKeyDown,
    MediaKeyUp,
}

/// A key as the browser sent it.
///
/// Older clients send the HID usage code as a number; newer ones send the
/// `KeyboardEvent.code` name, a single character, or the code as a decimal
/// string.  Normalization to a HID code happens in the application layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyField {
    Code(i64),
    Name(String),
}

/// One input event from the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyField>,

    /// Additional keys held together with `key`, for chords.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<KeyField>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<String>,

    #[serde(default)]
    pub control: bool,

    #[serde(default)]
    pub shift: bool,

    #[serde(default)]
    pub alt: bool,
}

impl InboundEvent {
    /// An event of `kind` with every optional field empty.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            x: None,
            y: None,
            key: None,
            keys: Vec::new(),
            button: None,
            control: false,
            shift: false,
            alt: false,
        }
    }
}

/// The single reply sent for each inbound frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventReply {
    Ok { status: String },
    Error { error_msg: String },
}

impl EventReply {
    pub fn ok() -> Self {
        EventReply::Ok {
            status: "ok".to_string(),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        EventReply::Error {
            error_msg: msg.into(),
        }
    }

    pub fn invalid_format() -> Self {
        Self::error(INVALID_EVENT_FORMAT)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, EventReply::Ok { .. })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keydown_with_integer_key() {
        // Arrange
        let json = r#"{"type":"keydown","key":4}"#;

        // Act
        let event: InboundEvent = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(event.kind, EventKind::KeyDown);
        assert_eq!(event.key, Some(KeyField::Code(4)));
        assert!(!event.control && !event.shift && !event.alt);
    }

    #[test]
    fn test_keydown_with_string_key_and_modifiers() {
        let json = r#"{"type":"keydown","key":"KeyA","control":true,"alt":true}"#;

        let event: InboundEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.key, Some(KeyField::Name("KeyA".to_string())));
        assert!(event.control);
        assert!(!event.shift);
        assert!(event.alt);
    }

    #[test]
    fn test_mousemove_coordinates() {
        let event: InboundEvent =
            serde_json::from_str(r#"{"type":"mousemove","x":100,"y":-20}"#).unwrap();
        assert_eq!(event.kind, EventKind::MouseMove);
        assert_eq!((event.x, event.y), (Some(100), Some(-20)));
    }

    #[test]
    fn test_all_type_names() {
        let cases = [
            ("keydown", EventKind::KeyDown),
            ("keyup", EventKind::KeyUp),
            ("mousemove", EventKind::MouseMove),
            ("mousedown", EventKind::MouseDown),
            ("mouseup", EventKind::MouseUp),
            ("mediakeydown", EventKind::MediaKeyDown),
            ("mediakeyup", EventKind::MediaKeyUp),
        ];
        for (name, kind) in cases {
            let json = format!(r#"{{"type":"{name}"}}"#);
            let event: InboundEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(event.kind, kind, "type {name}");
        }
    }

    #[test]
    fn test_unknown_type_fails_to_parse() {
        let result = serde_json::from_str::<InboundEvent>(r#"{"type":"scroll"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_type_fails_to_parse() {
        let result = serde_json::from_str::<InboundEvent>(r#"{"x":1,"y":2}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let event: InboundEvent =
            serde_json::from_str(r#"{"type":"keyup","timestamp":123}"#).unwrap();
        assert_eq!(event, InboundEvent::new(EventKind::KeyUp));
    }

    #[test]
    fn test_chord_keys_array() {
        let event: InboundEvent =
            serde_json::from_str(r#"{"type":"keydown","key":"KeyC","keys":[4,"KeyB"]}"#).unwrap();
        assert_eq!(
            event.keys,
            vec![KeyField::Code(4), KeyField::Name("KeyB".to_string())]
        );
    }

    #[test]
    fn test_reply_json_shapes() {
        assert_eq!(
            serde_json::to_string(&EventReply::ok()).unwrap(),
            r#"{"status":"ok"}"#
        );
        assert_eq!(
            serde_json::to_string(&EventReply::invalid_format()).unwrap(),
            r#"{"error_msg":"Invalid event format"}"#
        );
    }

    #[test]
    fn test_reply_parses_back_into_matching_variant() {
        let ok: EventReply = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
        let err: EventReply = serde_json::from_str(r#"{"error_msg":"boom"}"#).unwrap();
        assert!(ok.is_ok());
        assert_eq!(err, EventReply::error("boom"));
    }
}
