// Tickpress Key Type
// Key codes from Linux input-event-codes.h and their user-facing names

use std::fmt;
use std::str::FromStr;

/// Represents a single keyboard key code.
///
/// This is a newtype wrapper around u16 for type safety.
/// The numeric values match Linux input-event-codes.h definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Key(pub u16);

/// Canonical names, in code order.
const KEY_TABLE: &[(&str, u16)] = &[
    ("ESC", 1),
    ("1", 2),
    ("2", 3),
    ("3", 4),
    ("4", 5),
    ("5", 6),
    ("6", 7),
    ("7", 8),
    ("8", 9),
    ("9", 10),
    ("0", 11),
    ("MINUS", 12),
    ("EQUAL", 13),
    ("BACKSPACE", 14),
    ("TAB", 15),
    ("Q", 16),
    ("W", 17),
    ("E", 18),
    ("R", 19),
    ("T", 20),
    ("Y", 21),
    ("U", 22),
    ("I", 23),
    ("O", 24),
    ("P", 25),
    ("LEFT_BRACE", 26),
    ("RIGHT_BRACE", 27),
    ("ENTER", 28),
    ("LEFT_CTRL", 29),
    ("A", 30),
    ("S", 31),
    ("D", 32),
    ("F", 33),
    ("G", 34),
    ("H", 35),
    ("J", 36),
    ("K", 37),
    ("L", 38),
    ("SEMICOLON", 39),
    ("APOSTROPHE", 40),
    ("GRAVE", 41),
    ("LEFT_SHIFT", 42),
    ("BACKSLASH", 43),
    ("Z", 44),
    ("X", 45),
    ("C", 46),
    ("V", 47),
    ("B", 48),
    ("N", 49),
    ("M", 50),
    ("COMMA", 51),
    ("DOT", 52),
    ("SLASH", 53),
    ("RIGHT_SHIFT", 54),
    ("LEFT_ALT", 56),
    ("SPACE", 57),
    ("CAPSLOCK", 58),
    ("F1", 59),
    ("F2", 60),
    ("F3", 61),
    ("F4", 62),
    ("F5", 63),
    ("F6", 64),
    ("F7", 65),
    ("F8", 66),
    ("F9", 67),
    ("F10", 68),
    ("F11", 87),
    ("F12", 88),
    ("RIGHT_CTRL", 97),
    ("RIGHT_ALT", 100),
    ("HOME", 102),
    ("UP", 103),
    ("PAGE_UP", 104),
    ("LEFT", 105),
    ("RIGHT", 106),
    ("END", 107),
    ("DOWN", 108),
    ("PAGE_DOWN", 109),
    ("INSERT", 110),
    ("DELETE", 111),
];

/// Alternate spellings accepted from users.
const KEY_ALIASES: &[(&str, &str)] = &[
    ("ESCAPE", "ESC"),
    ("RETURN", "ENTER"),
    ("CTRL", "LEFT_CTRL"),
    ("CONTROL", "LEFT_CTRL"),
    ("SHIFT", "LEFT_SHIFT"),
    ("ALT", "LEFT_ALT"),
    ("PERIOD", "DOT"),
    ("PAGEUP", "PAGE_UP"),
    ("PAGEDOWN", "PAGE_DOWN"),
    ("DEL", "DELETE"),
    ("INS", "INSERT"),
    ("CAPS_LOCK", "CAPSLOCK"),
];

impl Key {
    /// Get the raw numeric code value
    pub fn code(self) -> u16 {
        self.0
    }

    /// Get the canonical name of this key
    pub fn name(self) -> &'static str {
        key_name(self.0)
    }
}

impl From<u16> for Key {
    fn from(code: u16) -> Self {
        Key(code)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when a key name cannot be resolved
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key name: '{0}'")]
pub struct UnknownKey(pub String);

impl FromStr for Key {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        key_from_name(s).ok_or_else(|| UnknownKey(s.to_string()))
    }
}

/// Display name for a key code
pub fn key_name(code: u16) -> &'static str {
    KEY_TABLE
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(name, _)| *name)
        .unwrap_or("UNKNOWN")
}

/// Resolve a user-supplied key name to a key code.
///
/// Matching is case-insensitive, ignores a leading `KEY_` prefix and treats
/// `-` and spaces like `_`, so `"f"`, `"KEY_F"`, `"page up"` and `"Page-Up"`
/// all resolve.
pub fn key_from_name(name: &str) -> Option<Key> {
    let mut normalized = name.trim().to_ascii_uppercase().replace(['-', ' '], "_");
    if normalized.is_empty() {
        return None;
    }
    if let Some(stripped) = normalized.strip_prefix("KEY_") {
        if !stripped.is_empty() {
            normalized = stripped.to_string();
        }
    }

    let canonical = KEY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, target)| *target)
        .unwrap_or(normalized.as_str());

    KEY_TABLE
        .iter()
        .find(|(n, _)| *n == canonical)
        .map(|(_, code)| Key(*code))
}
