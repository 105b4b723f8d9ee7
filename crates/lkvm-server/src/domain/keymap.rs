//! Browser key names to USB HID usage IDs (page 0x07, Keyboard/Keypad).
//!
//! Browsers identify keys two ways: `KeyboardEvent.code` names the physical
//! key (`"KeyA"`, `"Digit1"`, `"ArrowUp"`), while `KeyboardEvent.key` is the
//! produced character (`"a"`, `"!"`).  Both resolve here to a [`KeyStroke`]:
//! a HID code plus any modifier the character implies on a US layout.
//!
//! Modifier keys themselves (`"ShiftLeft"`, `"ControlRight"`, ...) resolve to
//! a modifier bit with no key code, since the device report carries modifiers
//! in their own byte.

use lkvm_core::Modifiers;

/// A resolved key: HID code `0` means "modifier only".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    pub code: u8,
    pub modifiers: Modifiers,
}

impl KeyStroke {
    const fn plain(code: u8) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
        }
    }

    const fn shifted(code: u8) -> Self {
        Self {
            code,
            modifiers: Modifiers::SHIFT,
        }
    }

    const fn modifier(modifiers: Modifiers) -> Self {
        Self { code: 0, modifiers }
    }
}

const KEY_A: u8 = 0x04;
const DIGIT_1: u8 = 0x1E;
const DIGIT_0: u8 = 0x27;
const F1: u8 = 0x3A;
const NUMPAD_1: u8 = 0x59;
const NUMPAD_0: u8 = 0x62;

/// Named keys outside the letter, digit, function and numpad-digit runs.
const NAMED_KEYS: &[(&str, u8)] = &[
    // Control keys (HID 0x28–0x38)
    ("Enter", 0x28),
    ("Escape", 0x29),
    ("Backspace", 0x2A),
    ("Tab", 0x2B),
    ("Space", 0x2C),
    ("Minus", 0x2D),
    ("Equal", 0x2E),
    ("BracketLeft", 0x2F),
    ("BracketRight", 0x30),
    ("Backslash", 0x31),
    ("Semicolon", 0x33),
    ("Quote", 0x34),
    ("Backquote", 0x35),
    ("Comma", 0x36),
    ("Period", 0x37),
    ("Slash", 0x38),
    ("CapsLock", 0x39),
    // Navigation cluster (HID 0x46–0x52)
    ("PrintScreen", 0x46),
    ("ScrollLock", 0x47),
    ("Pause", 0x48),
    ("Insert", 0x49),
    ("Home", 0x4A),
    ("PageUp", 0x4B),
    ("Delete", 0x4C),
    ("End", 0x4D),
    ("PageDown", 0x4E),
    ("ArrowRight", 0x4F),
    ("ArrowLeft", 0x50),
    ("ArrowDown", 0x51),
    ("ArrowUp", 0x52),
    // Numpad operators (HID 0x53–0x58, 0x63)
    ("NumLock", 0x53),
    ("NumpadDivide", 0x54),
    ("NumpadMultiply", 0x55),
    ("NumpadSubtract", 0x56),
    ("NumpadAdd", 0x57),
    ("NumpadEnter", 0x58),
    ("NumpadDecimal", 0x63),
    ("IntlBackslash", 0x64),
    ("ContextMenu", 0x65),
    // `KeyboardEvent.key` spellings that differ from the code names
    ("Esc", 0x29),
    ("Del", 0x4C),
    ("Up", 0x52),
    ("Down", 0x51),
    ("Left", 0x50),
    ("Right", 0x4F),
];

/// Resolves a key name or a single character.
///
/// Returns `None` for names with no HID mapping.
pub fn resolve(name: &str) -> Option<KeyStroke> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return char_stroke(c);
    }
    modifier_stroke(name).or_else(|| code_for_name(name).map(KeyStroke::plain))
}

/// HID code for a `KeyboardEvent.code`-style name, matched case-insensitively.
pub fn code_for_name(name: &str) -> Option<u8> {
    if let Some(code) = indexed(name, "Key", 26, |c| {
        c.is_ascii_alphabetic().then(|| c.to_ascii_uppercase() as u8 - b'A')
    }) {
        return Some(KEY_A + code);
    }
    if let Some(n) = indexed(name, "Digit", 10, digit) {
        return Some(digit_code(n));
    }
    if let Some(n) = indexed(name, "Numpad", 10, digit) {
        return Some(if n == 0 { NUMPAD_0 } else { NUMPAD_1 + n - 1 });
    }
    if let Some(rest) = strip_prefix_ignore_case(name, "F") {
        if let Ok(n @ 1..=12) = rest.parse::<u8>() {
            return Some(F1 + n - 1);
        }
    }
    NAMED_KEYS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, code)| *code)
}

fn modifier_stroke(name: &str) -> Option<KeyStroke> {
    let lower = name.to_ascii_lowercase();
    let modifiers = match lower.as_str() {
        "control" | "controlleft" | "controlright" | "ctrl" => Modifiers::CTRL,
        "shift" | "shiftleft" | "shiftright" => Modifiers::SHIFT,
        "alt" | "altleft" | "altright" => Modifiers::ALT,
        _ => return None,
    };
    Some(KeyStroke::modifier(modifiers))
}

/// Matches `<prefix><one char>` and maps the trailing char through `f`.
fn indexed(name: &str, prefix: &str, limit: u8, f: impl Fn(char) -> Option<u8>) -> Option<u8> {
    let rest = strip_prefix_ignore_case(name, prefix)?;
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => f(c).filter(|n| *n < limit),
        _ => None,
    }
}

fn strip_prefix_ignore_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let head = name.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &name[prefix.len()..])
}

fn digit(c: char) -> Option<u8> {
    c.to_digit(10).map(|d| d as u8)
}

fn digit_code(n: u8) -> u8 {
    if n == 0 {
        DIGIT_0
    } else {
        DIGIT_1 + n - 1
    }
}

/// US-layout mapping from a produced character to the key that types it.
fn char_stroke(c: char) -> Option<KeyStroke> {
    if c.is_ascii_lowercase() {
        return Some(KeyStroke::plain(KEY_A + (c as u8 - b'a')));
    }
    if c.is_ascii_uppercase() {
        return Some(KeyStroke::shifted(KEY_A + (c as u8 - b'A')));
    }
    if let Some(n) = digit(c) {
        return Some(KeyStroke::plain(digit_code(n)));
    }
    let stroke = match c {
        '\n' | '\r' => KeyStroke::plain(0x28),
        '\t' => KeyStroke::plain(0x2B),
        ' ' => KeyStroke::plain(0x2C),
        '-' => KeyStroke::plain(0x2D),
        '_' => KeyStroke::shifted(0x2D),
        '=' => KeyStroke::plain(0x2E),
        '+' => KeyStroke::shifted(0x2E),
        '[' => KeyStroke::plain(0x2F),
        '{' => KeyStroke::shifted(0x2F),
        ']' => KeyStroke::plain(0x30),
        '}' => KeyStroke::shifted(0x30),
        '\\' => KeyStroke::plain(0x31),
        '|' => KeyStroke::shifted(0x31),
        ';' => KeyStroke::plain(0x33),
        ':' => KeyStroke::shifted(0x33),
        '\'' => KeyStroke::plain(0x34),
        '"' => KeyStroke::shifted(0x34),
        '`' => KeyStroke::plain(0x35),
        '~' => KeyStroke::shifted(0x35),
        ',' => KeyStroke::plain(0x36),
        '<' => KeyStroke::shifted(0x36),
        '.' => KeyStroke::plain(0x37),
        '>' => KeyStroke::shifted(0x37),
        '/' => KeyStroke::plain(0x38),
        '?' => KeyStroke::shifted(0x38),
        // Shifted digit row
        '!' => KeyStroke::shifted(digit_code(1)),
        '@' => KeyStroke::shifted(digit_code(2)),
        '#' => KeyStroke::shifted(digit_code(3)),
        '$' => KeyStroke::shifted(digit_code(4)),
        '%' => KeyStroke::shifted(digit_code(5)),
        '^' => KeyStroke::shifted(digit_code(6)),
        '&' => KeyStroke::shifted(digit_code(7)),
        '*' => KeyStroke::shifted(digit_code(8)),
        '(' => KeyStroke::shifted(digit_code(9)),
        ')' => KeyStroke::shifted(digit_code(0)),
        _ => return None,
    };
    Some(stroke)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
