//! Chord key to X11 KeySym translation for Linux clients.
//!
//! X11 KeySym values are defined in X11/keysymdef.h.
//! Reference: https://gitlab.freedesktop.org/xorg/proto/xorgproto/-/blob/master/include/X11/keysymdef.h
//!
//! # What is an X11 KeySym? (for beginners)
//!
//! X11 identifies keys by **KeySym** (Key Symbol) rather than by physical
//! position. Letters use their ASCII value (`XK_a` is 0x61), while special
//! keys live in the 0xFF00 block (`XK_F1` is 0xFFBE). The XTest extension
//! needs a *keycode*, so the injector asks the X server to translate each
//! KeySym with `XKeysymToKeycode` before faking the event.
//!
//! Letters are mapped to their *lowercase* KeySym. The Shift modifier in a
//! chord is a separate key event, so the base form is always what we want.

use super::{ChordKey, Key, Modifier};

/// `XK_F1`. `XK_F2`..`XK_F24` follow consecutively.
const XK_F1: u32 = 0xFFBE;

/// Translates a modifier to its left-hand X11 KeySym.
pub fn modifier_to_keysym(modifier: Modifier) -> u32 {
    match modifier {
        Modifier::Ctrl => 0xFFE3,  // XK_Control_L
        Modifier::Shift => 0xFFE1, // XK_Shift_L
        Modifier::Alt => 0xFFE9,   // XK_Alt_L
        Modifier::Super => 0xFFEB, // XK_Super_L
    }
}

/// Translates a base key to its X11 KeySym.
///
/// Returns `None` for values a parsed [`Key`] never holds (function key 0 or
/// above 24, non-letter characters).
pub fn key_to_keysym(key: Key) -> Option<u32> {
    match key {
        Key::Function(n) if (1..=super::MAX_FUNCTION_KEY).contains(&n) => {
            Some(XK_F1 + u32::from(n) - 1)
        }
        Key::Letter(c) if c.is_ascii_lowercase() => Some(c as u32),
        _ => None,
    }
}

/// Translates either half of a chord.
pub fn chord_key_to_keysym(key: ChordKey) -> Option<u32> {
    match key {
        ChordKey::Modifier(m) => Some(modifier_to_keysym(m)),
        ChordKey::Key(k) => key_to_keysym(k),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_keys_follow_xk_f1() {
        assert_eq!(key_to_keysym(Key::Function(1)), Some(0xFFBE)); // XK_F1
        assert_eq!(key_to_keysym(Key::Function(11)), Some(0xFFC8)); // XK_F11
        assert_eq!(key_to_keysym(Key::Function(24)), Some(0xFFD5)); // XK_F24
    }

    #[test]
    fn test_invalid_function_numbers_have_no_keysym() {
        assert_eq!(key_to_keysym(Key::Function(0)), None);
        assert_eq!(key_to_keysym(Key::Function(25)), None);
    }

    #[test]
    fn test_letters_map_to_lowercase_ascii() {
        assert_eq!(key_to_keysym(Key::Letter('a')), Some(0x0061));
        assert_eq!(key_to_keysym(Key::Letter('z')), Some(0x007A));
        assert_eq!(key_to_keysym(Key::Letter('A')), None);
    }

    #[test]
    fn test_all_modifiers_have_distinct_keysyms() {
        let syms = [
            modifier_to_keysym(Modifier::Ctrl),
            modifier_to_keysym(Modifier::Alt),
            modifier_to_keysym(Modifier::Shift),
            modifier_to_keysym(Modifier::Super),
        ];
        for (i, a) in syms.iter().enumerate() {
            for b in &syms[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_chord_key_dispatches_to_both_tables() {
        assert_eq!(chord_key_to_keysym(ChordKey::Modifier(Modifier::Ctrl)), Some(0xFFE3));
        assert_eq!(chord_key_to_keysym(ChordKey::Key(Key::Function(2))), Some(0xFFBF));
    }
}
