//! Logging-only key emitter.

use sunmonlok_core::HotkeyChord;
use tracing::info;

use crate::application::inject_hotkey::{InjectionError, KeyEmitter};

/// Logs the chord instead of pressing it.
pub struct LogEmitter;

impl KeyEmitter for LogEmitter {
    fn name(&self) -> &'static str {
        "log"
    }

    fn emit(&self, chord: &HotkeyChord) -> Result<(), InjectionError> {
        info!(chord = %chord, "simulated hotkey (no injection backend)");
        Ok(())
    }
}
