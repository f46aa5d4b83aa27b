//! InjectHotkeyUseCase: presses the chord assigned to a received monitor index.
//!
//! This use case sits at the application layer and delegates to a
//! [`KeyEmitter`] trait object for the OS-level key events. The emitter
//! implementations (XTest, logging) are in the infrastructure layer.
//!
//! The receiver only sees the [`HotkeyInjector`] trait, so tests can swap the
//! whole use case for a recording double.

use std::sync::Arc;

use sunmonlok_core::{HotkeyChord, HotkeyTable, MonitorId};
use thiserror::Error;
use tracing::{debug, info};

/// Error type for hotkey injection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InjectionError {
    #[error("platform error: {0}")]
    Platform(String),

    #[error("no hotkey chord configured for monitor {0}")]
    NoChord(MonitorId),

    #[error("no key injection backend available")]
    BackendUnavailable,
}

/// Reacts to a monitor switch received from the server.
#[cfg_attr(test, mockall::automock)]
pub trait HotkeyInjector: Send + Sync {
    fn inject(&self, monitor: MonitorId) -> Result<(), InjectionError>;
}

/// Presses a whole chord on the local machine.
///
/// Each supported backend provides an implementation in the infrastructure
/// layer.
pub trait KeyEmitter: Send + Sync {
    /// Short backend name for logs, e.g. `"xtest"`.
    fn name(&self) -> &'static str;

    /// Emits the chord's key events in [`HotkeyChord::strokes`] order.
    fn emit(&self, chord: &HotkeyChord) -> Result<(), InjectionError>;
}

/// The Inject Hotkey use case.
pub struct InjectHotkeyUseCase {
    table: HotkeyTable,
    emitter: Arc<dyn KeyEmitter>,
}

impl InjectHotkeyUseCase {
    pub fn new(table: HotkeyTable, emitter: Arc<dyn KeyEmitter>) -> Self {
        Self { table, emitter }
    }

    pub fn table(&self) -> &HotkeyTable {
        &self.table
    }
}

impl HotkeyInjector for InjectHotkeyUseCase {
    /// Looks up the chord for `monitor` and emits it.
    ///
    /// # Errors
    ///
    /// [`InjectionError::NoChord`] when the table is shorter than `monitor`,
    /// otherwise whatever the emitter reports.
    fn inject(&self, monitor: MonitorId) -> Result<(), InjectionError> {
        let chord = self
            .table
            .chord_for(monitor)
            .ok_or(InjectionError::NoChord(monitor))?;
        info!(monitor = monitor.get(), chord = %chord, "pressing hotkey");
        self.emitter.emit(chord)?;
        debug!(backend = self.emitter.name(), "hotkey emitted");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
