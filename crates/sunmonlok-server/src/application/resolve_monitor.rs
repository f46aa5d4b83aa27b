//! MonitorMapper: turns a cursor position into a broadcast monitor index.
//!
//! Two strategies exist:
//!
//! - **Positional**: the index is the monitor's place in the left-to-right
//!   [`MonitorLayout`].
//! - **Override**: the containing monitor's *name* is looked up in a
//!   [`MonitorIndexResolver`] (for example the numbering a streaming host
//!   uses), so the index follows the host's idea of "monitor 2" rather than
//!   physical order.
//!
//! The mode is picked once at startup: override only when the resolver loaded
//! a non-empty map.
//!
//! Fallback rules are asymmetric. An override resolver that never
//! initialized falls back to positional indices, but a monitor that is
//! present and missing from an initialized map resolves to nothing.

use std::sync::Arc;

use async_trait::async_trait;
use sunmonlok_core::{CursorSample, MonitorId, MonitorIndexResolver, MonitorLayout, MonitorRect};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors reported by display backends.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("cursor position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("monitor layout unavailable: {0}")]
    LayoutUnavailable(String),

    #[error("backend {backend} unavailable: {reason}")]
    BackendUnavailable { backend: String, reason: String },
}

/// Source of the current monitor rectangles.
///
/// Infrastructure implementations ask the compositor or X server; test
/// implementations return fixed data.
#[async_trait]
pub trait MonitorLayoutProvider: Send + Sync {
    /// Checks once, at startup, that this backend can work at all.
    async fn probe(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Returns the monitors in any order. Sizes must already be scaled.
    async fn list_monitors(&self) -> Result<Vec<MonitorRect>, ProviderError>;
}

/// How indices are produced. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingMode {
    Positional,
    Override,
}

/// Maps cursor positions to monitor indices.
pub struct MonitorMapper {
    layout: Arc<dyn MonitorLayoutProvider>,
    resolver: Option<MonitorIndexResolver>,
}

impl MonitorMapper {
    /// A mapper that only uses positional indices.
    pub fn new(layout: Arc<dyn MonitorLayoutProvider>) -> Self {
        Self {
            layout,
            resolver: None,
        }
    }

    /// A mapper with an override resolver. The resolver should already have
    /// been initialized; an uninitialized one makes every override lookup
    /// fall back to positional.
    pub fn with_resolver(layout: Arc<dyn MonitorLayoutProvider>, resolver: MonitorIndexResolver) -> Self {
        Self {
            layout,
            resolver: Some(resolver),
        }
    }

    /// The mode this mapper supports: `Override` only with a loaded map.
    pub fn mode(&self) -> MappingMode {
        if self.override_ready() {
            MappingMode::Override
        } else {
            MappingMode::Positional
        }
    }

    /// Resolves with the given strategy.
    pub async fn resolve_for(&mut self, mode: MappingMode, point: CursorSample) -> Option<MonitorId> {
        match mode {
            MappingMode::Positional => self.resolve(point).await,
            MappingMode::Override => self.resolve_with_override(point).await,
        }
    }

    /// Positional index of the monitor containing `point`.
    pub async fn resolve(&self, point: CursorSample) -> Option<MonitorId> {
        let layout = self.current_layout().await?;
        let (position, rect) = layout.locate(point)?;
        let id = MonitorId::from_position(position);
        if id.is_none() {
            warn!(monitor = %rect.name, position, "monitor position does not fit a monitor index");
        }
        id
    }

    /// Override index of the monitor containing `point`.
    ///
    /// On a miss the resolver is refreshed (subject to its cooldown) and the
    /// lookup retried once.
    pub async fn resolve_with_override(&mut self, point: CursorSample) -> Option<MonitorId> {
        if !self.override_ready() {
            return self.resolve(point).await;
        }

        let layout = self.current_layout().await?;
        let (_, rect) = layout.locate(point)?;
        let name = rect.name.as_str();

        let resolver = self.resolver.as_mut()?;
        if let Some(id) = resolver.lookup(name) {
            return Some(id);
        }

        if resolver.refresh().await {
            if let Some(id) = resolver.lookup(name) {
                debug!(monitor = name, index = %id, "monitor mapped after refresh");
                return Some(id);
            }
        }

        warn!(monitor = name, "monitor present but unmapped in override index");
        None
    }

    /// Logs every monitor's name and horizontal span.
    pub async fn log_layout(&self) {
        let Some(layout) = self.current_layout().await else {
            return;
        };
        if layout.is_empty() {
            warn!("no monitors detected");
            return;
        }
        info!("detected {} monitor(s):", layout.len());
        for (position, m) in layout.monitors().iter().enumerate() {
            let mapped = self
                .resolver
                .as_ref()
                .and_then(|r| r.lookup(&m.name))
                .map(|id| format!(" -> index {id}"))
                .unwrap_or_default();
            info!("  {position}: {} x=[{}-{}){mapped}", m.name, m.x, m.right());
        }
    }

    fn override_ready(&self) -> bool {
        self.resolver.as_ref().is_some_and(MonitorIndexResolver::is_initialized)
    }

    async fn current_layout(&self) -> Option<MonitorLayout> {
        match self.layout.list_monitors().await {
            Ok(monitors) => Some(MonitorLayout::new(monitors)),
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
