//! Windows key injection via the `SendInput` API.
//!
//! Each stroke becomes one `KEYBDINPUT` carrying a Virtual-Key code (see
//! `sunmonlok_core::keymap::windows_vk`). The Windows key needs
//! `KEYEVENTF_EXTENDEDKEY`; the left-hand modifiers and function keys do not.
//!
//! `SendInput` returns how many events it inserted. Anything less than one
//! means the input was blocked, typically by UIPI when the foreground window
//! belongs to an elevated process.

use sunmonlok_core::keymap::windows_vk::{chord_key_to_vk, is_extended};
use sunmonlok_core::HotkeyChord;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS, KEYEVENTF_EXTENDEDKEY,
    KEYEVENTF_KEYUP, VIRTUAL_KEY,
};

use super::{resolve_strokes, send_strokes};
use crate::application::inject_hotkey::{InjectionError, KeyEmitter};

/// Stateless; every call goes straight to `SendInput`.
#[derive(Default)]
pub struct SendInputEmitter;

impl SendInputEmitter {
    pub fn new() -> Self {
        Self
    }
}

impl KeyEmitter for SendInputEmitter {
    fn name(&self) -> &'static str {
        "sendinput"
    }

    fn emit(&self, chord: &HotkeyChord) -> Result<(), InjectionError> {
        let strokes = resolve_strokes(chord, |key| {
            chord_key_to_vk(key)
                .ok_or_else(|| InjectionError::Platform(format!("no Virtual-Key code for {key:?}")))
        })?;
        send_strokes(&strokes, send_key)
    }
}

fn send_key(vk: u16, pressed: bool) -> Result<(), InjectionError> {
    let input = keyboard_input(vk, pressed);
    // SAFETY: `input` is a fully initialised INPUT on the stack and the size
    // argument matches its type.
    let inserted = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
    if inserted != 1 {
        return Err(InjectionError::Platform(format!(
            "SendInput rejected Virtual-Key {vk:#04x}: {}",
            std::io::Error::last_os_error()
        )));
    }
    Ok(())
}

fn keyboard_input(vk: u16, pressed: bool) -> INPUT {
    let mut flags = KEYBD_EVENT_FLAGS(0);
    if !pressed {
        flags |= KEYEVENTF_KEYUP;
    }
    if is_extended(vk) {
        flags |= KEYEVENTF_EXTENDEDKEY;
    }
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(vk),
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}
