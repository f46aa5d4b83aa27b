//! Mock display backends for unit testing.
//!
//! Let tests move a synthetic cursor and swap the monitor layout without a
//! running compositor or X server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use sunmonlok_core::{CursorSample, MonitorRect};

use crate::application::poll_monitor::CursorPositionProvider;
use crate::application::resolve_monitor::{MonitorLayoutProvider, ProviderError};

/// A cursor whose position is set by the test.
///
/// With no position set, sampling fails with
/// [`ProviderError::PositionUnavailable`].
pub struct MockCursorProvider {
    position: Mutex<Option<CursorSample>>,
    samples: AtomicUsize,
}

impl MockCursorProvider {
    /// Creates a cursor parked at `(x, y)`.
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            position: Mutex::new(Some(CursorSample::new(x, y))),
            samples: AtomicUsize::new(0),
        }
    }

    /// Creates a cursor that cannot be sampled until [`move_to`](Self::move_to).
    pub fn unavailable() -> Self {
        Self {
            position: Mutex::new(None),
            samples: AtomicUsize::new(0),
        }
    }

    pub fn move_to(&self, x: i32, y: i32) {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner) = Some(CursorSample::new(x, y));
    }

    /// Makes subsequent samples fail.
    pub fn disconnect(&self) {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Number of `sample_position` calls so far.
    pub fn sample_count(&self) -> usize {
        self.samples.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CursorPositionProvider for MockCursorProvider {
    async fn sample_position(&self) -> Result<CursorSample, ProviderError> {
        self.samples.fetch_add(1, Ordering::SeqCst);
        let position = *self.position.lock().unwrap_or_else(PoisonError::into_inner);
        position.ok_or_else(|| ProviderError::PositionUnavailable("mock cursor disconnected".to_string()))
    }
}

/// A layout provider returning a fixed list, or a fixed error.
pub struct MockLayoutProvider {
    monitors: Mutex<Result<Vec<MonitorRect>, ProviderError>>,
    calls: AtomicUsize,
}

impl MockLayoutProvider {
    pub fn new(monitors: Vec<MonitorRect>) -> Self {
        Self {
            monitors: Mutex::new(Ok(monitors)),
            calls: AtomicUsize::new(0),
        }
    }

    /// A provider whose every call fails with `reason`.
    pub fn failing(reason: &str) -> Self {
        Self {
            monitors: Mutex::new(Err(ProviderError::LayoutUnavailable(reason.to_string()))),
            calls: AtomicUsize::new(0),
        }
    }

    /// Replaces the layout, as if a monitor was plugged or unplugged.
    pub fn set_monitors(&self, monitors: Vec<MonitorRect>) {
        *self.monitors.lock().unwrap_or_else(PoisonError::into_inner) = Ok(monitors);
    }

    /// Number of `list_monitors` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MonitorLayoutProvider for MockLayoutProvider {
    async fn list_monitors(&self) -> Result<Vec<MonitorRect>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.monitors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
