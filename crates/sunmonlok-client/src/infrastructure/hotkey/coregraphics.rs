//! macOS key injection via CoreGraphics.
//!
//! # What is CoreGraphics event injection? (for beginners)
//!
//! `CGEventPost` pushes a synthesized event into the HID event stream, the
//! same level physical keyboards feed. Applications cannot tell the
//! difference. Each stroke is one keyboard event built from a `CGKeyCode`
//! (see `sunmonlok_core::keymap::macos_cg`).
//!
//! Modifier key events alone do not reliably change the modifier state seen
//! by the receiving app, so the base key events also carry the chord's
//! modifier flags.
//!
//! # Accessibility permission
//!
//! Posting at the HID tap needs the **Accessibility** permission (System
//! Settings → Privacy & Security → Accessibility). Without it the events are
//! dropped silently, so [`CoreGraphicsEmitter::open`] refuses to start when
//! the process is not trusted.

use core_graphics::event::{CGEvent, CGEventFlags, CGEventTapLocation, CGKeyCode};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use sunmonlok_core::keymap::macos_cg::{chord_key_to_cgkeycode, modifier_to_cgkeycode};
use sunmonlok_core::keymap::Modifier;
use sunmonlok_core::HotkeyChord;

use super::{resolve_strokes, send_strokes};
use crate::application::inject_hotkey::{InjectionError, KeyEmitter};

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXIsProcessTrusted() -> bool;
}

/// Holds no CoreFoundation objects; an event source is created per chord
/// because `CGEventSource` is not `Send`.
pub struct CoreGraphicsEmitter;

impl CoreGraphicsEmitter {
    /// # Errors
    ///
    /// [`InjectionError::Platform`] if the process lacks the Accessibility
    /// permission.
    pub fn open() -> Result<Self, InjectionError> {
        // SAFETY: takes no arguments and only reads the process trust state.
        if !unsafe { AXIsProcessTrusted() } {
            return Err(InjectionError::Platform(
                "Accessibility permission not granted".to_string(),
            ));
        }
        Ok(Self)
    }
}

impl KeyEmitter for CoreGraphicsEmitter {
    fn name(&self) -> &'static str {
        "coregraphics"
    }

    fn emit(&self, chord: &HotkeyChord) -> Result<(), InjectionError> {
        let strokes = resolve_strokes(chord, |key| {
            chord_key_to_cgkeycode(key)
                .ok_or_else(|| InjectionError::Platform(format!("no CGKeyCode for {key:?}")))
        })?;
        let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState)
            .map_err(|()| InjectionError::Platform("cannot create CGEventSource".to_string()))?;
        let base_flags = modifier_flags(&chord.modifiers);
        let modifier_codes: Vec<CGKeyCode> =
            chord.modifiers.iter().map(|m| modifier_to_cgkeycode(*m)).collect();

        send_strokes(&strokes, |code, pressed| {
            let event = CGEvent::new_keyboard_event(source.clone(), code, pressed)
                .map_err(|()| InjectionError::Platform(format!("cannot create key event {code:#04x}")))?;
            if !modifier_codes.contains(&code) {
                event.set_flags(base_flags);
            }
            event.post(CGEventTapLocation::HID);
            Ok(())
        })
    }
}

fn modifier_flags(modifiers: &[Modifier]) -> CGEventFlags {
    modifiers
        .iter()
        .fold(CGEventFlags::CGEventFlagNull, |flags, m| {
            flags
                | match m {
                    Modifier::Ctrl => CGEventFlags::CGEventFlagControl,
                    Modifier::Shift => CGEventFlags::CGEventFlagShift,
                    Modifier::Alt => CGEventFlags::CGEventFlagAlternate,
                    Modifier::Super => CGEventFlags::CGEventFlagCommand,
                }
        })
}
