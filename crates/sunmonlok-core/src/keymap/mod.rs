//! Hotkey chords that a client presses when the active monitor changes.
//!
//! Each monitor index maps to one chord: a fixed set of modifiers held down
//! while one base key is tapped. With the default table, index 0 is
//! `ctrl+alt+shift+super+F1`, index 1 is the same modifiers with F2, and so on
//! up to F11.
//!
//! Chords are described with platform-neutral names here. Backends translate
//! them into their own key codes: [`linux_x11`] for X11 KeySyms,
//! [`linux_evdev`] for kernel input codes, [`windows_vk`] for Virtual-Key codes
//! and [`macos_cg`] for `CGKeyCode`s.

pub mod linux_evdev;
pub mod linux_x11;
pub mod macos_cg;
pub mod windows_vk;

use std::fmt;

use thiserror::Error;

use crate::domain::layout::MonitorId;

/// Modifier names used when no configuration overrides them.
pub const DEFAULT_MODIFIERS: [&str; 4] = ["ctrl", "alt", "shift", "cmd"];

/// Base key names used when no configuration overrides them (F1..F11).
pub const DEFAULT_BASE_KEYS: [&str; 11] = [
    "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11",
];

/// Highest function key number accepted in a key name.
pub const MAX_FUNCTION_KEY: u8 = 24;

/// Errors produced while parsing key names.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeymapError {
    #[error("unknown modifier: {0:?}")]
    UnknownModifier(String),

    #[error("unknown key: {0:?} (expected f1-f24 or a single letter)")]
    UnknownKey(String),

    #[error("hotkey table needs at least one base key")]
    EmptyTable,
}

/// A held modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Ctrl,
    Alt,
    Shift,
    /// The Windows / Command / Super key.
    Super,
}

impl Modifier {
    /// Parses a modifier name, case-insensitively.
    ///
    /// Accepts `ctrl`, `control`, `alt`, `option`, `shift`, `cmd`, `command`
    /// and `super`.
    pub fn parse(name: &str) -> Result<Self, KeymapError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "ctrl" | "control" => Ok(Self::Ctrl),
            "alt" | "option" => Ok(Self::Alt),
            "shift" => Ok(Self::Shift),
            "cmd" | "command" | "super" => Ok(Self::Super),
            _ => Err(KeymapError::UnknownModifier(name.to_string())),
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ctrl => "ctrl",
            Self::Alt => "alt",
            Self::Shift => "shift",
            Self::Super => "super",
        };
        f.write_str(name)
    }
}

/// The key tapped while the modifiers are held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// `F1`..`F24`, stored as the function key number.
    Function(u8),
    /// A lowercase ASCII letter.
    Letter(char),
}

impl Key {
    /// Parses a key name such as `f3` or `k`, case-insensitively.
    pub fn parse(name: &str) -> Result<Self, KeymapError> {
        let lowered = name.trim().to_ascii_lowercase();

        if let Some(number) = lowered.strip_prefix('f') {
            if let Ok(n) = number.parse::<u8>() {
                if (1..=MAX_FUNCTION_KEY).contains(&n) {
                    return Ok(Self::Function(n));
                }
            }
        }

        let mut chars = lowered.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_lowercase() {
                return Ok(Self::Letter(c));
            }
        }

        Err(KeymapError::UnknownKey(name.to_string()))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(n) => write!(f, "f{n}"),
            Self::Letter(c) => write!(f, "{c}"),
        }
    }
}

/// Either half of a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChordKey {
    Modifier(Modifier),
    Key(Key),
}

/// One step of pressing a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStroke {
    Down(ChordKey),
    Up(ChordKey),
}

/// Modifiers plus one base key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyChord {
    pub modifiers: Vec<Modifier>,
    pub key: Key,
}

impl HotkeyChord {
    /// The event sequence for pressing this chord.
    ///
    /// Modifiers go down in order, the key is pressed and released, then the
    /// modifiers are released in reverse order.
    pub fn strokes(&self) -> Vec<KeyStroke> {
        let mut strokes = Vec::with_capacity(self.modifiers.len() * 2 + 2);
        strokes.extend(
            self.modifiers
                .iter()
                .map(|m| KeyStroke::Down(ChordKey::Modifier(*m))),
        );
        strokes.push(KeyStroke::Down(ChordKey::Key(self.key)));
        strokes.push(KeyStroke::Up(ChordKey::Key(self.key)));
        strokes.extend(
            self.modifiers
                .iter()
                .rev()
                .map(|m| KeyStroke::Up(ChordKey::Modifier(*m))),
        );
        strokes
    }
}

impl fmt::Display for HotkeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.modifiers {
            write!(f, "{m}+")?;
        }
        write!(f, "{}", self.key)
    }
}

/// Monitor index to chord table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyTable {
    chords: Vec<HotkeyChord>,
}

impl HotkeyTable {
    /// Builds a table where index `i` uses `base_keys[i]` with every modifier.
    ///
    /// Modifier aliases that resolve to the same key (`cmd` and `super`) are
    /// only held once.
    ///
    /// # Errors
    ///
    /// Returns the first name that fails to parse, or
    /// [`KeymapError::EmptyTable`] if `base_keys` is empty.
    pub fn from_names<M, K>(modifiers: &[M], base_keys: &[K]) -> Result<Self, KeymapError>
    where
        M: AsRef<str>,
        K: AsRef<str>,
    {
        let mut parsed_modifiers: Vec<Modifier> = Vec::with_capacity(modifiers.len());
        for name in modifiers {
            let modifier = Modifier::parse(name.as_ref())?;
            if !parsed_modifiers.contains(&modifier) {
                parsed_modifiers.push(modifier);
            }
        }

        if base_keys.is_empty() {
            return Err(KeymapError::EmptyTable);
        }

        let chords = base_keys
            .iter()
            .map(|name| {
                Key::parse(name.as_ref()).map(|key| HotkeyChord {
                    modifiers: parsed_modifiers.clone(),
                    key,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { chords })
    }

    /// Chord for `id`, or `None` if the table has no entry that far.
    pub fn chord_for(&self, id: MonitorId) -> Option<&HotkeyChord> {
        self.chords.get(usize::from(id.get()))
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }
}

impl Default for HotkeyTable {
    fn default() -> Self {
        let chords = DEFAULT_BASE_KEYS
            .iter()
            .enumerate()
            .map(|(i, _)| HotkeyChord {
                modifiers: vec![Modifier::Ctrl, Modifier::Alt, Modifier::Shift, Modifier::Super],
                key: Key::Function(i as u8 + 1),
            })
            .collect();
        Self { chords }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
