//! Chord key to Linux input event code translation for the uinput backend.
//!
//! Codes are the `KEY_*` values from `linux/input-event-codes.h`. Unlike X11
//! KeySyms they name physical key positions, so letters follow the QWERTY
//! rows instead of the alphabet.

use super::{ChordKey, Key, Modifier};

const KEY_LEFTCTRL: u16 = 29;
const KEY_LEFTSHIFT: u16 = 42;
const KEY_LEFTALT: u16 = 56;
const KEY_LEFTMETA: u16 = 125;

/// `KEY_A`..`KEY_Z` in alphabetical order.
const LETTERS: [u16; 26] = [
    30, 48, 46, 32, 18, 33, 34, 35, 23, 36, 37, 38, 50, // a..m
    49, 24, 25, 16, 19, 31, 20, 22, 47, 17, 45, 21, 44, // n..z
];

pub fn modifier_to_code(modifier: Modifier) -> u16 {
    match modifier {
        Modifier::Ctrl => KEY_LEFTCTRL,
        Modifier::Shift => KEY_LEFTSHIFT,
        Modifier::Alt => KEY_LEFTALT,
        Modifier::Super => KEY_LEFTMETA,
    }
}

/// Translates a base key to its input event code.
///
/// F1..F10, F11..F12 and F13..F24 sit in three separate blocks.
pub fn key_to_code(key: Key) -> Option<u16> {
    match key {
        Key::Function(n @ 1..=10) => Some(59 + u16::from(n) - 1),
        Key::Function(11) => Some(87),
        Key::Function(12) => Some(88),
        Key::Function(n @ 13..=24) => Some(183 + u16::from(n) - 13),
        Key::Letter(c) if c.is_ascii_lowercase() => Some(LETTERS[usize::from(c as u8 - b'a')]),
        _ => None,
    }
}

pub fn chord_key_to_code(key: ChordKey) -> Option<u16> {
    match key {
        ChordKey::Modifier(m) => Some(modifier_to_code(m)),
        ChordKey::Key(k) => key_to_code(k),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_key_blocks() {
        assert_eq!(key_to_code(Key::Function(1)), Some(59)); // KEY_F1
        assert_eq!(key_to_code(Key::Function(10)), Some(68)); // KEY_F10
        assert_eq!(key_to_code(Key::Function(11)), Some(87)); // KEY_F11
        assert_eq!(key_to_code(Key::Function(12)), Some(88)); // KEY_F12
        assert_eq!(key_to_code(Key::Function(13)), Some(183)); // KEY_F13
        assert_eq!(key_to_code(Key::Function(24)), Some(194)); // KEY_F24
        assert_eq!(key_to_code(Key::Function(0)), None);
        assert_eq!(key_to_code(Key::Function(25)), None);
    }

    #[test]
    fn test_letters_follow_physical_rows() {
        assert_eq!(key_to_code(Key::Letter('q')), Some(16)); // KEY_Q
        assert_eq!(key_to_code(Key::Letter('a')), Some(30)); // KEY_A
        assert_eq!(key_to_code(Key::Letter('z')), Some(44)); // KEY_Z
        assert_eq!(key_to_code(Key::Letter('m')), Some(50)); // KEY_M
        assert_eq!(key_to_code(Key::Letter('A')), None);
    }

    #[test]
    fn test_modifiers_use_left_hand_keys() {
        assert_eq!(chord_key_to_code(ChordKey::Modifier(Modifier::Ctrl)), Some(29));
        assert_eq!(chord_key_to_code(ChordKey::Modifier(Modifier::Super)), Some(125));
    }
}
