//! Mock key emitter for unit testing.
//!
//! Records every chord in a `Mutex<Vec<...>>` so assertions can inspect
//! exactly what was pressed and in what order. Set `should_fail` to exercise
//! error paths.

use std::sync::{Mutex, PoisonError};

use sunmonlok_core::HotkeyChord;

use crate::application::inject_hotkey::{InjectionError, KeyEmitter};

#[derive(Default)]
pub struct MockKeyEmitter {
    /// Chords emitted so far, in order.
    pub chords: Mutex<Vec<HotkeyChord>>,
    /// When `true`, every call returns [`InjectionError::Platform`].
    pub should_fail: bool,
}

impl MockKeyEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose every call fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Display strings of the recorded chords.
    pub fn emitted(&self) -> Vec<String> {
        self.chords
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

impl KeyEmitter for MockKeyEmitter {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn emit(&self, chord: &HotkeyChord) -> Result<(), InjectionError> {
        if self.should_fail {
            return Err(InjectionError::Platform("mock failure".to_string()));
        }
        self.chords
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(chord.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sunmonlok_core::{HotkeyTable, MonitorId};

    #[test]
    fn test_mock_records_chords_in_order() {
        // Arrange
        let table = HotkeyTable::from_names(&["alt"], &["f1", "f2"]).unwrap();
        let mock = MockKeyEmitter::new();

        // Act
        mock.emit(table.chord_for(MonitorId::new(1)).unwrap()).unwrap();
        mock.emit(table.chord_for(MonitorId::new(0)).unwrap()).unwrap();

        // Assert
        assert_eq!(mock.emitted(), vec!["alt+f2", "alt+f1"]);
    }

    #[test]
    fn test_failing_mock_records_nothing() {
        let table = HotkeyTable::default();
        let mock = MockKeyEmitter::failing();

        let result = mock.emit(table.chord_for(MonitorId::new(0)).unwrap());

        assert!(result.is_err());
        assert!(mock.emitted().is_empty());
    }
}
