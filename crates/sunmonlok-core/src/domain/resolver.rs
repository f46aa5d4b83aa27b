//! Override mapping from monitor names to broadcast indices.
//!
//! Some hosts number their monitors differently from the left-to-right order
//! of the layout (a streaming host, for instance, may enumerate outputs in its
//! own order and the remote side wants *that* number). A
//! [`MonitorIndexSource`] produces such a name-to-index map, and
//! [`MonitorIndexResolver`] caches it.
//!
//! Rebuilding the map is expensive (it may shell out and scan logs), so a
//! cache miss may trigger a refresh at most once per cooldown window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::layout::MonitorId;

/// Minimum time between two refresh attempts.
pub const DEFAULT_REFRESH_COOLDOWN: Duration = Duration::from_secs(10);

/// Errors returned by a [`MonitorIndexSource`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexSourceError {
    /// The source could not be read at all.
    #[error("monitor index source unavailable: {0}")]
    Unavailable(String),

    /// The source named an index that does not fit a [`MonitorId`].
    #[error("monitor {name} has index {index}, which does not fit in one byte")]
    InvalidIndex { name: String, index: u64 },
}

/// Builds a fresh name-to-index map.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MonitorIndexSource: Send + Sync {
    async fn load_index_map(&self) -> Result<HashMap<String, MonitorId>, IndexSourceError>;
}

/// Cached, cooldown-gated view of a [`MonitorIndexSource`].
pub struct MonitorIndexResolver {
    source: Arc<dyn MonitorIndexSource>,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
    cache: Option<HashMap<String, MonitorId>>,
    last_refresh: Option<Instant>,
}

impl MonitorIndexResolver {
    pub fn new(source: Arc<dyn MonitorIndexSource>, clock: Arc<dyn Clock>) -> Self {
        Self::with_cooldown(source, clock, DEFAULT_REFRESH_COOLDOWN)
    }

    pub fn with_cooldown(
        source: Arc<dyn MonitorIndexSource>,
        clock: Arc<dyn Clock>,
        cooldown: Duration,
    ) -> Self {
        Self {
            source,
            clock,
            cooldown,
            cache: None,
            last_refresh: None,
        }
    }

    /// Performs the first load.
    ///
    /// Returns `true` only when the source produced a non-empty map. On
    /// `false` the cache stays uninitialized and callers fall back to
    /// positional indices.
    pub async fn initialize(&mut self) -> bool {
        self.last_refresh = Some(self.clock.now());
        match self.source.load_index_map().await {
            Ok(map) if !map.is_empty() => {
                info!(entries = map.len(), "monitor index map loaded");
                self.cache = Some(map);
                true
            }
            Ok(_) => {
                info!("monitor index source returned no entries");
                false
            }
            Err(e) => {
                warn!("monitor index source failed: {e}");
                false
            }
        }
    }

    /// `true` once a non-empty map has been loaded.
    pub fn is_initialized(&self) -> bool {
        self.cache.is_some()
    }

    /// Looks up the override index for `name`.
    pub fn lookup(&self, name: &str) -> Option<MonitorId> {
        self.cache.as_ref().and_then(|map| map.get(name).copied())
    }

    /// Number of cached entries (0 when uninitialized).
    pub fn len(&self) -> usize {
        self.cache.as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuilds the map if the cooldown has elapsed since the last attempt.
    ///
    /// Every attempt that gets past the cooldown check restarts the cooldown,
    /// whether or not it succeeds. A result that is empty or an error keeps
    /// the previous cache. Returns `true` only when the cache was replaced.
    pub async fn refresh(&mut self) -> bool {
        let now = self.clock.now();
        if let Some(last) = self.last_refresh {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.cooldown {
                debug!(
                    remaining_ms = (self.cooldown - elapsed).as_millis() as u64,
                    "monitor index refresh skipped (cooldown)"
                );
                return false;
            }
        }
        self.last_refresh = Some(now);

        match self.source.load_index_map().await {
            Ok(map) if !map.is_empty() => {
                debug!(entries = map.len(), "monitor index map refreshed");
                self.cache = Some(map);
                true
            }
            Ok(_) => {
                warn!("monitor index refresh returned no entries; keeping previous map");
                false
            }
            Err(e) => {
                warn!("monitor index refresh failed: {e}");
                false
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::ManualClock;

    fn map(entries: &[(&str, u8)]) -> HashMap<String, MonitorId> {
        entries
            .iter()
            .map(|(name, idx)| (name.to_string(), MonitorId::new(*idx)))
            .collect()
    }

    fn resolver_with(mock: MockMonitorIndexSource, clock: Arc<ManualClock>) -> MonitorIndexResolver {
        MonitorIndexResolver::new(Arc::new(mock), clock)
    }

    #[tokio::test]
    async fn test_initialize_with_entries_returns_true_and_caches() {
        // Arrange
        let mut mock = MockMonitorIndexSource::new();
        mock.expect_load_index_map()
            .times(1)
            .returning(|| Ok(map(&[("DP-1", 1), ("DP-2", 0)])));
        let mut resolver = resolver_with(mock, Arc::new(ManualClock::new()));

        // Act
        let ok = resolver.initialize().await;

        // Assert
        assert!(ok);
        assert!(resolver.is_initialized());
        assert_eq!(resolver.lookup("DP-1"), Some(MonitorId::new(1)));
        assert_eq!(resolver.lookup("DP-2"), Some(MonitorId::new(0)));
        assert_eq!(resolver.lookup("HDMI-A-1"), None);
    }

    #[tokio::test]
    async fn test_initialize_with_empty_map_stays_uninitialized() {
        let mut mock = MockMonitorIndexSource::new();
        mock.expect_load_index_map().returning(|| Ok(HashMap::new()));
        let mut resolver = resolver_with(mock, Arc::new(ManualClock::new()));

        assert!(!resolver.initialize().await);
        assert!(!resolver.is_initialized());
        assert!(resolver.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_with_source_error_stays_uninitialized() {
        let mut mock = MockMonitorIndexSource::new();
        mock.expect_load_index_map()
            .returning(|| Err(IndexSourceError::Unavailable("no journal".to_string())));
        let mut resolver = resolver_with(mock, Arc::new(ManualClock::new()));

        assert!(!resolver.initialize().await);
        assert_eq!(resolver.lookup("DP-1"), None);
    }

    #[tokio::test]
    async fn test_refresh_inside_cooldown_does_not_call_source() {
        // Arrange: one load for initialize, none for the refresh.
        let mut mock = MockMonitorIndexSource::new();
        mock.expect_load_index_map()
            .times(1)
            .returning(|| Ok(map(&[("DP-1", 0)])));
        let clock = Arc::new(ManualClock::new());
        let mut resolver = resolver_with(mock, Arc::clone(&clock));
        resolver.initialize().await;

        // Act
        clock.advance(Duration::from_secs(9));
        let refreshed = resolver.refresh().await;

        // Assert
        assert!(!refreshed);
    }

    #[tokio::test]
    async fn test_refresh_after_cooldown_replaces_cache() {
        let mut mock = MockMonitorIndexSource::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_load_index_map()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(map(&[("DP-1", 0)])));
        mock.expect_load_index_map()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(map(&[("DP-1", 0), ("DP-3", 2)])));
        let clock = Arc::new(ManualClock::new());
        let mut resolver = resolver_with(mock, Arc::clone(&clock));
        resolver.initialize().await;

        clock.advance(DEFAULT_REFRESH_COOLDOWN);
        let refreshed = resolver.refresh().await;

        assert!(refreshed);
        assert_eq!(resolver.lookup("DP-3"), Some(MonitorId::new(2)));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cache_and_restarts_cooldown() {
        // Arrange: initialize, one failing refresh, and nothing more.
        let mut mock = MockMonitorIndexSource::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_load_index_map()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(map(&[("DP-1", 4)])));
        mock.expect_load_index_map()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(IndexSourceError::Unavailable("gone".to_string())));
        let clock = Arc::new(ManualClock::new());
        let mut resolver = resolver_with(mock, Arc::clone(&clock));
        resolver.initialize().await;

        // Act
        clock.advance(Duration::from_secs(11));
        let first = resolver.refresh().await;
        clock.advance(Duration::from_secs(1));
        let second = resolver.refresh().await;

        // Assert
        assert!(!first);
        assert!(!second, "second attempt is inside the restarted cooldown");
        assert_eq!(resolver.lookup("DP-1"), Some(MonitorId::new(4)));
    }

    #[tokio::test]
    async fn test_empty_refresh_keeps_previous_map() {
        let mut mock = MockMonitorIndexSource::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_load_index_map()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(map(&[("DP-1", 1)])));
        mock.expect_load_index_map()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(HashMap::new()));
        let clock = Arc::new(ManualClock::new());
        let mut resolver = resolver_with(mock, Arc::clone(&clock));
        resolver.initialize().await;

        clock.advance(Duration::from_secs(30));

        assert!(!resolver.refresh().await);
        assert_eq!(resolver.len(), 1);
    }

    #[tokio::test]
    async fn test_custom_cooldown_is_honoured() {
        let mut mock = MockMonitorIndexSource::new();
        mock.expect_load_index_map()
            .times(2)
            .returning(|| Ok(map(&[("DP-1", 0)])));
        let clock = Arc::new(ManualClock::new());
        let mut resolver = MonitorIndexResolver::with_cooldown(
            Arc::new(mock),
            Arc::clone(&clock) as Arc<dyn Clock>,
            Duration::from_millis(500),
        );
        resolver.initialize().await;

        clock.advance(Duration::from_millis(500));

        assert!(resolver.refresh().await);
    }
}
