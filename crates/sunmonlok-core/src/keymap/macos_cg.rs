//! Chord key to macOS `CGKeyCode` translation.
//!
//! `CGKeyCode` values are the `kVK_*` constants from
//! `HIToolbox/Events.h`. They name positions on an ANSI keyboard and are
//! neither alphabetical nor contiguous, so both tables are spelled out.
//! macOS has no virtual key for F21..F24.

use super::{ChordKey, Key, Modifier};

/// `kVK_F1`..`kVK_F20`.
const FUNCTION_KEYS: [u16; 20] = [
    0x7A, 0x78, 0x63, 0x76, 0x60, 0x61, 0x62, 0x64, 0x65, 0x6D, // F1..F10
    0x67, 0x6F, 0x69, 0x6B, 0x71, 0x6A, 0x40, 0x4F, 0x50, 0x5A, // F11..F20
];

/// `kVK_ANSI_A`..`kVK_ANSI_Z`.
const LETTERS: [u16; 26] = [
    0x00, 0x0B, 0x08, 0x02, 0x0E, 0x03, 0x05, 0x04, 0x22, 0x26, 0x28, 0x25, 0x2E, // a..m
    0x2D, 0x1F, 0x23, 0x0C, 0x0F, 0x01, 0x11, 0x20, 0x09, 0x0D, 0x07, 0x10, 0x06, // n..z
];

pub fn modifier_to_cgkeycode(modifier: Modifier) -> u16 {
    match modifier {
        Modifier::Ctrl => 0x3B,  // kVK_Control
        Modifier::Shift => 0x38, // kVK_Shift
        Modifier::Alt => 0x3A,   // kVK_Option
        Modifier::Super => 0x37, // kVK_Command
    }
}

pub fn key_to_cgkeycode(key: Key) -> Option<u16> {
    match key {
        Key::Function(n @ 1..=20) => Some(FUNCTION_KEYS[usize::from(n - 1)]),
        Key::Letter(c) if c.is_ascii_lowercase() => Some(LETTERS[usize::from(c as u8 - b'a')]),
        _ => None,
    }
}

pub fn chord_key_to_cgkeycode(key: ChordKey) -> Option<u16> {
    match key {
        ChordKey::Modifier(m) => Some(modifier_to_cgkeycode(m)),
        ChordKey::Key(k) => key_to_cgkeycode(k),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_keys() {
        assert_eq!(key_to_cgkeycode(Key::Function(1)), Some(0x7A)); // kVK_F1
        assert_eq!(key_to_cgkeycode(Key::Function(11)), Some(0x67)); // kVK_F11
        assert_eq!(key_to_cgkeycode(Key::Function(20)), Some(0x5A)); // kVK_F20
        assert_eq!(key_to_cgkeycode(Key::Function(21)), None);
    }

    #[test]
    fn test_letters_use_ansi_positions() {
        assert_eq!(key_to_cgkeycode(Key::Letter('a')), Some(0x00));
        assert_eq!(key_to_cgkeycode(Key::Letter('q')), Some(0x0C));
        assert_eq!(key_to_cgkeycode(Key::Letter('z')), Some(0x06));
    }

    #[test]
    fn test_command_modifier() {
        assert_eq!(chord_key_to_cgkeycode(ChordKey::Modifier(Modifier::Super)), Some(0x37));
    }
}
