//! Chord key to Windows Virtual-Key code translation.
//!
//! Values are the `VK_*` constants from `<winuser.h>`. Letters use the
//! uppercase ASCII value (`VK_A` is 0x41) whatever the keyboard layout.

use super::{ChordKey, Key, Modifier};

/// `VK_F1`. `VK_F2`..`VK_F24` follow consecutively.
const VK_F1: u16 = 0x70;

pub fn modifier_to_vk(modifier: Modifier) -> u16 {
    match modifier {
        Modifier::Ctrl => 0xA2,  // VK_LCONTROL
        Modifier::Shift => 0xA0, // VK_LSHIFT
        Modifier::Alt => 0xA4,   // VK_LMENU
        Modifier::Super => 0x5B, // VK_LWIN
    }
}

pub fn key_to_vk(key: Key) -> Option<u16> {
    match key {
        Key::Function(n) if (1..=super::MAX_FUNCTION_KEY).contains(&n) => {
            Some(VK_F1 + u16::from(n) - 1)
        }
        Key::Letter(c) if c.is_ascii_lowercase() => Some(u16::from(c.to_ascii_uppercase() as u8)),
        _ => None,
    }
}

pub fn chord_key_to_vk(key: ChordKey) -> Option<u16> {
    match key {
        ChordKey::Modifier(m) => Some(modifier_to_vk(m)),
        ChordKey::Key(k) => key_to_vk(k),
    }
}

/// Whether `SendInput` needs `KEYEVENTF_EXTENDEDKEY` for this key.
pub fn is_extended(vk: u16) -> bool {
    matches!(vk, 0x5B | 0x5C) // VK_LWIN, VK_RWIN
}
