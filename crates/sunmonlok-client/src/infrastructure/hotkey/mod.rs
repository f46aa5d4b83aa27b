//! Key emitter backends.
//!
//! - **`uinput`** – A virtual keyboard created through `/dev/uinput` (Linux).
//!   Works under Wayland and X11 alike, but needs write access to the device.
//! - **`xtest`** – Key events through the X11 XTest extension (Linux).
//! - **`sendinput`** – The Win32 `SendInput` API (Windows).
//! - **`coregraphics`** – `CGEventPost` at the HID tap (macOS).
//! - **`log`** – Only logs the chord; useful on machines without a display
//!   and as the last entry of the default chain.
//! - **`mock`** – Records chords for tests.
//!
//! [`select_emitter`] walks the configured names in order and keeps the first
//! backend that opens successfully. Backends for another platform always
//! fail to open, so one default chain serves every OS.

use std::sync::Arc;

use sunmonlok_core::keymap::{ChordKey, KeyStroke};
use sunmonlok_core::HotkeyChord;
use tracing::{debug, info, warn};

use crate::application::inject_hotkey::{InjectionError, KeyEmitter};

#[cfg(target_os = "macos")]
pub mod coregraphics;
pub mod log;
pub mod mock;
#[cfg(target_os = "windows")]
pub mod sendinput;
#[cfg(target_os = "linux")]
pub mod uinput;
#[cfg(target_os = "linux")]
pub mod xtest;

/// Default emitter order.
pub const DEFAULT_EMITTERS: &[&str] = &["uinput", "xtest", "sendinput", "coregraphics", "log"];

/// Opens the first available emitter named in `order`.
///
/// # Errors
///
/// [`InjectionError::BackendUnavailable`] if none of them can be opened.
pub fn select_emitter(order: &[String]) -> Result<Arc<dyn KeyEmitter>, InjectionError> {
    for name in order {
        match open_emitter(name) {
            Ok(emitter) => {
                info!(backend = emitter.name(), "key injection backend selected");
                return Ok(emitter);
            }
            Err(e) => debug!(backend = %name, "key injection backend unavailable: {e}"),
        }
    }
    warn!(tried = ?order, "no key injection backend available");
    Err(InjectionError::BackendUnavailable)
}

fn open_emitter(name: &str) -> Result<Arc<dyn KeyEmitter>, InjectionError> {
    match name {
        #[cfg(target_os = "linux")]
        "uinput" => Ok(Arc::new(uinput::UinputEmitter::open()?)),
        #[cfg(target_os = "linux")]
        "xtest" => Ok(Arc::new(xtest::XTestEmitter::open()?)),
        #[cfg(target_os = "windows")]
        "sendinput" => Ok(Arc::new(sendinput::SendInputEmitter::new())),
        #[cfg(target_os = "macos")]
        "coregraphics" => Ok(Arc::new(coregraphics::CoreGraphicsEmitter::open()?)),
        "uinput" | "xtest" | "sendinput" | "coregraphics" => Err(InjectionError::Platform(format!(
            "{name} is not available on {}",
            std::env::consts::OS
        ))),
        "log" => Ok(Arc::new(log::LogEmitter)),
        other => Err(InjectionError::Platform(format!("unknown backend {other:?}"))),
    }
}

// ── Stroke helpers ────────────────────────────────────────────────────────────

/// Translates every stroke of `chord` to a backend key code, as
/// `(code, pressed)` pairs.
///
/// All codes are resolved before anything is sent, so an untranslatable key
/// never leaves modifiers held.
pub(crate) fn resolve_strokes<C>(
    chord: &HotkeyChord,
    mut translate: impl FnMut(ChordKey) -> Result<C, InjectionError>,
) -> Result<Vec<(C, bool)>, InjectionError> {
    chord
        .strokes()
        .into_iter()
        .map(|stroke| match stroke {
            KeyStroke::Down(key) => translate(key).map(|code| (code, true)),
            KeyStroke::Up(key) => translate(key).map(|code| (code, false)),
        })
        .collect()
}

/// Sends `strokes` in order through `send`.
///
/// If a send fails partway, every key still held is released in reverse
/// order before the error is returned. Release failures are only logged.
pub(crate) fn send_strokes<C: Copy + PartialEq + std::fmt::Debug>(
    strokes: &[(C, bool)],
    mut send: impl FnMut(C, bool) -> Result<(), InjectionError>,
) -> Result<(), InjectionError> {
    let mut held: Vec<C> = Vec::with_capacity(strokes.len());
    for &(code, pressed) in strokes {
        if let Err(e) = send(code, pressed) {
            for &stuck in held.iter().rev() {
                if let Err(release) = send(stuck, false) {
                    warn!(key = ?stuck, "could not release key after failed chord: {release}");
                }
            }
            return Err(e);
        }
        if pressed {
            held.push(code);
        } else {
            held.retain(|k| *k != code);
        }
    }
    Ok(())
}
