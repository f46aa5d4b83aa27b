//! Linux key injection through a uinput virtual keyboard.
//!
//! # What is uinput? (for beginners)
//!
//! `/dev/uinput` lets a process create a virtual input device that the kernel
//! treats like a real keyboard. Its events flow through evdev to whatever is
//! running above: a Wayland compositor, an X server or a bare console. That
//! makes it the one backend that reaches native Wayland applications.
//!
//! Every key event is followed by a `SYN_REPORT` so the compositor sees each
//! stroke separately, in the same order [`HotkeyChord::strokes`] gives.
//!
//! # Permissions
//!
//! Creating the device needs write access to `/dev/uinput`, usually through
//! membership of the `input` group or a udev rule. Without it
//! [`UinputEmitter::open`] fails and the backend chain moves on.

use std::sync::{Mutex, PoisonError};

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key};
use sunmonlok_core::keymap::linux_evdev::chord_key_to_code;
use sunmonlok_core::keymap::{ChordKey, Key as ChordBaseKey, Modifier, MAX_FUNCTION_KEY};
use sunmonlok_core::HotkeyChord;

use super::{resolve_strokes, send_strokes};
use crate::application::inject_hotkey::{InjectionError, KeyEmitter};

const DEVICE_NAME: &str = "SunMonLok virtual keyboard";

pub struct UinputEmitter {
    device: Mutex<VirtualDevice>,
}

impl UinputEmitter {
    /// Creates the virtual keyboard.
    ///
    /// The device advertises every key a chord can contain: the four
    /// modifiers, F1..F24 and the letters.
    ///
    /// # Errors
    ///
    /// [`InjectionError::Platform`] if `/dev/uinput` cannot be opened or the
    /// device cannot be registered.
    pub fn open() -> Result<Self, InjectionError> {
        let mut keys = AttributeSet::<Key>::new();
        for code in supported_codes() {
            keys.insert(Key::new(code));
        }

        let device = VirtualDeviceBuilder::new()
            .map_err(|e| platform("cannot open /dev/uinput", e))?
            .name(DEVICE_NAME)
            .with_keys(&keys)
            .map_err(|e| platform("cannot register keys", e))?
            .build()
            .map_err(|e| platform("cannot create virtual keyboard", e))?;

        Ok(Self {
            device: Mutex::new(device),
        })
    }
}

impl KeyEmitter for UinputEmitter {
    fn name(&self) -> &'static str {
        "uinput"
    }

    fn emit(&self, chord: &HotkeyChord) -> Result<(), InjectionError> {
        let strokes = resolve_strokes(chord, |key| {
            chord_key_to_code(key)
                .ok_or_else(|| InjectionError::Platform(format!("no input event code for {key:?}")))
        })?;

        let mut device = self.device.lock().unwrap_or_else(PoisonError::into_inner);
        send_strokes(&strokes, |code, pressed| {
            let events = [
                InputEvent::new(EventType::KEY, code, i32::from(pressed)),
                InputEvent::new(EventType::SYNCHRONIZATION, 0, 0),
            ];
            device
                .emit(&events)
                .map_err(|e| platform(&format!("write failed for key {code}"), e))
        })
    }
}

/// Every input event code a parsed chord can translate to.
fn supported_codes() -> Vec<u16> {
    let modifiers = [Modifier::Ctrl, Modifier::Alt, Modifier::Shift, Modifier::Super]
        .into_iter()
        .map(ChordKey::Modifier);
    let functions = (1..=MAX_FUNCTION_KEY).map(|n| ChordKey::Key(ChordBaseKey::Function(n)));
    let letters = ('a'..='z').map(|c| ChordKey::Key(ChordBaseKey::Letter(c)));

    modifiers
        .chain(functions)
        .chain(letters)
        .filter_map(chord_key_to_code)
        .collect()
}

fn platform(context: &str, error: std::io::Error) -> InjectionError {
    InjectionError::Platform(format!("uinput: {context}: {error}"))
}
