//! Linux X11 key injection via the XTest extension.
//!
//! # What is XTest? (for beginners)
//!
//! XTest is an X11 protocol extension that lets a process synthesize keyboard
//! events as if the user had pressed the keys. They are delivered exactly like
//! real input, which is what global hotkey listeners need to see.
//!
//! `XTestFakeKeyEvent` takes an X11 *keycode*, not a KeySym, so every chord
//! key goes through:
//! ```text
//! ChordKey → X11 KeySym (sunmonlok_core::keymap::linux_x11) → XKeysymToKeycode → keycode
//! ```
//!
//! # Permissions
//!
//! The process needs access to the X display named by `DISPLAY`. If it cannot
//! be opened, or the server lacks XTest, [`XTestEmitter::open`] fails and the
//! backend chain moves on.

use std::os::raw::{c_int, c_uint, c_ulong};
use std::ptr;
use std::sync::{Mutex, PoisonError};

use sunmonlok_core::keymap::linux_x11::chord_key_to_keysym;
use sunmonlok_core::keymap::ChordKey;
use sunmonlok_core::HotkeyChord;
use x11::{xlib, xtest};

use super::{resolve_strokes, send_strokes};
use crate::application::inject_hotkey::{InjectionError, KeyEmitter};

/// `CurrentTime`: let the server timestamp the synthetic events.
const CURRENT_TIME: c_ulong = 0;

/// Owned Xlib connection, closed on drop.
struct DisplayHandle(*mut xlib::Display);

// SAFETY: the pointer is only used by Xlib calls made while holding the
// `Mutex` in `XTestEmitter`, never from two threads at once.
unsafe impl Send for DisplayHandle {}

impl Drop for DisplayHandle {
    fn drop(&mut self) {
        // SAFETY: `self.0` came from a successful `XOpenDisplay` and is closed once.
        unsafe {
            xlib::XCloseDisplay(self.0);
        }
    }
}

pub struct XTestEmitter {
    display: Mutex<DisplayHandle>,
}

impl XTestEmitter {
    /// Connects to `$DISPLAY` and checks for the XTest extension.
    ///
    /// # Errors
    ///
    /// [`InjectionError::Platform`] if the display cannot be opened or does
    /// not support XTest.
    pub fn open() -> Result<Self, InjectionError> {
        // SAFETY: a null name makes Xlib read `$DISPLAY`; the result is checked for null.
        let display = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display.is_null() {
            return Err(InjectionError::Platform(
                "cannot open X display (is $DISPLAY set?)".to_string(),
            ));
        }
        let handle = DisplayHandle(display);

        let (mut event_base, mut error_base, mut major, mut minor): (c_int, c_int, c_int, c_int) = (0, 0, 0, 0);
        // SAFETY: `handle.0` is a live display; the out-pointers are locals.
        let has_xtest = unsafe {
            xtest::XTestQueryExtension(handle.0, &mut event_base, &mut error_base, &mut major, &mut minor)
        };
        if has_xtest == 0 {
            return Err(InjectionError::Platform("X server lacks the XTest extension".to_string()));
        }

        Ok(Self {
            display: Mutex::new(handle),
        })
    }

    fn keycode(display: *mut xlib::Display, key: ChordKey) -> Result<c_uint, InjectionError> {
        let keysym = chord_key_to_keysym(key)
            .ok_or_else(|| InjectionError::Platform(format!("no X11 KeySym for {key:?}")))?;
        // SAFETY: `display` is a live connection owned by the caller's guard.
        let keycode = unsafe { xlib::XKeysymToKeycode(display, c_ulong::from(keysym)) };
        if keycode == 0 {
            return Err(InjectionError::Platform(format!(
                "KeySym {keysym:#06x} is not mapped to any keycode"
            )));
        }
        Ok(c_uint::from(keycode))
    }
}

impl KeyEmitter for XTestEmitter {
    fn name(&self) -> &'static str {
        "xtest"
    }

    fn emit(&self, chord: &HotkeyChord) -> Result<(), InjectionError> {
        let handle = self.display.lock().unwrap_or_else(PoisonError::into_inner);
        let display = handle.0;

        let strokes = resolve_strokes(chord, |key| Self::keycode(display, key))?;
        let sent = send_strokes(&strokes, |keycode, pressed| {
            // SAFETY: live display under the mutex guard.
            let ok = unsafe { xtest::XTestFakeKeyEvent(display, keycode, c_int::from(pressed), CURRENT_TIME) };
            if ok == 0 {
                return Err(InjectionError::Platform(format!(
                    "XTestFakeKeyEvent failed for keycode {keycode}"
                )));
            }
            Ok(())
        });

        // SAFETY: live display under the mutex guard.
        unsafe {
            xlib::XFlush(display);
        }
        sent
    }
}
