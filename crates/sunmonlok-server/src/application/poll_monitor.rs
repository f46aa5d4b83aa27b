//! MonitorPoller: the debounced cursor-following control loop.
//!
//! Every poll interval the poller:
//!
//! 1. samples the cursor,
//! 2. ignores the sample if it moved less than the movement threshold,
//! 3. resolves the monitor index for the new position,
//! 4. fires the [`SwitchAction`] when the index changed *and* the last switch
//!    is at least one debounce window old.
//!
//! The state machine lives in [`MonitorPoller::tick`], which takes the current
//! time as a parameter so tests can drive it without sleeping. [`MonitorPoller::spawn`]
//! runs ticks on a Tokio task and returns a [`PollerHandle`] for shutdown.
//!
//! # Lifecycle (for beginners)
//!
//! ```text
//! Unstarted ──spawn()──▶ Running ──stop()──▶ Stopped
//! ```
//!
//! The lifecycle is a single atomic byte shared between the task and the
//! handle. `stop()` only moves `Running` to `Stopped`; calling it before
//! `spawn()` or twice is a no-op.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sunmonlok_core::{CursorSample, MonitorId, ProtocolError};
use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::resolve_monitor::{MappingMode, MonitorMapper, ProviderError};

/// Default time between two samples.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);
/// Default minimum time between two accepted switches.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
/// Default movement (in pixels) below which a sample is ignored.
pub const DEFAULT_MOVE_THRESHOLD: f64 = 1.0;
/// Default pause after a failed sample or a failed switch action.
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(1);

const UNSTARTED: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

// ── Collaborator traits ───────────────────────────────────────────────────────

/// Source of the current cursor position.
#[async_trait]
pub trait CursorPositionProvider: Send + Sync {
    /// Checks once, at startup, that this backend can work at all.
    async fn probe(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn sample_position(&self) -> Result<CursorSample, ProviderError>;
}

/// Error type for [`SwitchAction`].
#[derive(Debug, Error)]
pub enum SwitchError {
    #[error("monitor index cannot be sent: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("switch action failed: {0}")]
    Failed(String),
}

/// What to do when the active monitor changes.
///
/// The production implementation broadcasts the index to every connected
/// client; test implementations record calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwitchAction: Send + Sync {
    async fn on_switch(&self, monitor: MonitorId) -> Result<(), SwitchError>;
}

// ── Configuration and state ───────────────────────────────────────────────────

/// Timing and filtering parameters for the poller.
#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    pub poll_interval: Duration,
    pub debounce: Duration,
    /// Pixels. Samples closer than this to the last accepted one are ignored.
    pub move_threshold: f64,
    pub error_backoff: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            debounce: DEFAULT_DEBOUNCE,
            move_threshold: DEFAULT_MOVE_THRESHOLD,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }
}

/// Owned by the poller, never shared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollerState {
    pub last_accepted_position: Option<CursorSample>,
    /// `None` until the first switch: the monitor is unknown.
    pub last_accepted_monitor: Option<MonitorId>,
    /// `None` means no switch yet, so the first switch is never debounced.
    pub last_switch_at: Option<Instant>,
}

/// Result of one [`MonitorPoller::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The cursor could not be sampled; state unchanged.
    SampleFailed,
    /// Movement was below the threshold; the mapper was not consulted.
    BelowThreshold,
    /// No monitor contains the position (or the layout was unavailable).
    Unresolved,
    /// Same monitor as before.
    Unchanged,
    /// A different monitor, but still inside the debounce window.
    Debounced,
    /// Switch accepted and the action succeeded.
    Switched {
        from: Option<MonitorId>,
        to: MonitorId,
    },
    /// Switch accepted but the action failed. State was still updated.
    SwitchFailed {
        from: Option<MonitorId>,
        to: MonitorId,
    },
}

impl TickOutcome {
    /// Whether the run loop should wait `error_backoff` instead of the poll interval.
    pub fn needs_backoff(&self) -> bool {
        matches!(self, Self::SampleFailed | Self::SwitchFailed { .. })
    }
}

// ── Poller ────────────────────────────────────────────────────────────────────

/// The debounced monitor-following state machine.
pub struct MonitorPoller {
    cursor: Arc<dyn CursorPositionProvider>,
    mapper: MonitorMapper,
    mode: MappingMode,
    action: Arc<dyn SwitchAction>,
    config: PollerConfig,
    state: PollerState,
}

impl MonitorPoller {
    /// Creates a poller. The mapping mode is fixed here from
    /// [`MonitorMapper::mode`].
    pub fn new(
        cursor: Arc<dyn CursorPositionProvider>,
        mapper: MonitorMapper,
        action: Arc<dyn SwitchAction>,
        config: PollerConfig,
    ) -> Self {
        let mode = mapper.mode();
        Self {
            cursor,
            mapper,
            mode,
            action,
            config,
            state: PollerState::default(),
        }
    }

    pub fn mode(&self) -> MappingMode {
        self.mode
    }

    pub fn state(&self) -> &PollerState {
        &self.state
    }

    /// Runs one sample/resolve/debounce step as of `now`.
    pub async fn tick(&mut self, now: Instant) -> TickOutcome {
        let sample = match self.cursor.sample_position().await {
            Ok(sample) => sample,
            Err(e) => {
                warn!("{e}");
                return TickOutcome::SampleFailed;
            }
        };

        if let Some(previous) = self.state.last_accepted_position {
            let threshold = self.config.move_threshold;
            if (sample.distance_squared(&previous) as f64) < threshold * threshold {
                return TickOutcome::BelowThreshold;
            }
        }
        self.state.last_accepted_position = Some(sample);

        let Some(monitor) = self.mapper.resolve_for(self.mode, sample).await else {
            debug!(x = sample.x, y = sample.y, "position not on any known monitor");
            return TickOutcome::Unresolved;
        };

        let from = self.state.last_accepted_monitor;
        if from == Some(monitor) {
            return TickOutcome::Unchanged;
        }

        let window_open = self
            .state
            .last_switch_at
            .map_or(true, |at| now.saturating_duration_since(at) >= self.config.debounce);
        if !window_open {
            return TickOutcome::Debounced;
        }

        let result = self.action.on_switch(monitor).await;
        self.state.last_accepted_monitor = Some(monitor);
        self.state.last_switch_at = Some(now);

        match result {
            Ok(()) => {
                info!(from = ?from.map(MonitorId::get), to = monitor.get(), "monitor switch");
                TickOutcome::Switched { from, to: monitor }
            }
            Err(e) => {
                warn!(to = monitor.get(), "monitor switch action failed: {e}");
                TickOutcome::SwitchFailed { from, to: monitor }
            }
        }
    }

    /// Starts the poll loop on a Tokio task.
    pub fn spawn(self) -> PollerHandle {
        let control = Arc::new(PollerControl {
            lifecycle: AtomicU8::new(UNSTARTED),
            wake: Notify::new(),
        });
        control.lifecycle.store(RUNNING, Ordering::SeqCst);

        let task = tokio::spawn(self.run(Arc::clone(&control)));
        PollerHandle {
            control,
            task: Mutex::new(Some(task)),
        }
    }

    async fn run(mut self, control: Arc<PollerControl>) {
        info!(
            mode = ?self.mode,
            interval_ms = self.config.poll_interval.as_millis() as u64,
            debounce_ms = self.config.debounce.as_millis() as u64,
            "poller started"
        );

        while control.is_running() {
            let outcome = self.tick(Instant::now()).await;
            let delay = if outcome.needs_backoff() {
                self.config.error_backoff
            } else {
                self.config.poll_interval
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = control.wake.notified() => {}
            }
        }

        info!("poller stopped");
    }
}

// ── Handle ────────────────────────────────────────────────────────────────────

struct PollerControl {
    lifecycle: AtomicU8,
    wake: Notify,
}

impl PollerControl {
    fn is_running(&self) -> bool {
        self.lifecycle.load(Ordering::SeqCst) == RUNNING
    }
}

/// Controls a spawned [`MonitorPoller`].
pub struct PollerHandle {
    control: Arc<PollerControl>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PollerHandle {
    /// Asks the loop to exit. Idempotent.
    pub fn stop(&self) {
        let stopped = self
            .control
            .lifecycle
            .compare_exchange(RUNNING, STOPPED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if stopped {
            self.control.wake.notify_one();
        }
    }

    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }

    /// Waits up to `timeout` for the loop to exit, aborting it otherwise.
    ///
    /// Returns `true` if the loop exited on its own. A second call returns
    /// `true` immediately.
    pub async fn join(&self, timeout: Duration) -> bool {
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut task) = task else {
            return true;
        };

        match tokio::time::timeout(timeout, &mut task).await {
            Ok(_) => true,
            Err(_) => {
                warn!("poller did not stop within {timeout:?}; aborting");
                task.abort();
                false
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use sunmonlok_core::MonitorRect;

    use crate::infrastructure::display::mock::{MockCursorProvider, MockLayoutProvider};

    // ── Test doubles ──────────────────────────────────────────────────────────

    /// Records every switch; optionally fails.
    struct RecordingSwitchAction {
        switches: Mutex<Vec<MonitorId>>,
        should_fail: bool,
    }

    impl RecordingSwitchAction {
        fn new() -> Self {
            Self {
                switches: Mutex::new(Vec::new()),
                should_fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                switches: Mutex::new(Vec::new()),
                should_fail: true,
            }
        }

        fn switches(&self) -> Vec<MonitorId> {
            self.switches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SwitchAction for RecordingSwitchAction {
        async fn on_switch(&self, monitor: MonitorId) -> Result<(), SwitchError> {
            self.switches.lock().unwrap().push(monitor);
            if self.should_fail {
                Err(SwitchError::Failed("mock failure".to_string()))
            } else {
                Ok(())
            }
        }
    }

    /// Two 100px-wide monitors side by side: x in [0,100) is 0, [100,200) is 1.
    fn layout() -> Arc<MockLayoutProvider> {
        Arc::new(MockLayoutProvider::new(vec![
            MonitorRect::new("A", 0, 0, 100, 100),
            MonitorRect::new("B", 100, 0, 100, 100),
        ]))
    }

    fn make_poller(
        cursor: Arc<MockCursorProvider>,
        layout: Arc<MockLayoutProvider>,
        action: Arc<RecordingSwitchAction>,
    ) -> MonitorPoller {
        MonitorPoller::new(
            cursor,
            MonitorMapper::new(layout),
            action,
            PollerConfig::default(),
        )
    }

    fn x_of(monitor: u8) -> i32 {
        i32::from(monitor) * 100 + 50
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    // ── tick ──────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_first_resolved_sample_switches_from_unknown() {
        // Arrange
        let cursor = Arc::new(MockCursorProvider::at(50, 50));
        let action = Arc::new(RecordingSwitchAction::new());
        let mut poller = make_poller(cursor, layout(), Arc::clone(&action));

        // Act
        let outcome = poller.tick(Instant::now()).await;

        // Assert
        assert_eq!(
            outcome,
            TickOutcome::Switched {
                from: None,
                to: MonitorId::new(0)
            }
        );
        assert_eq!(action.switches(), vec![MonitorId::new(0)]);
    }

    #[tokio::test]
    async fn test_rapid_oscillation_inside_window_only_broadcasts_first() {
        // Arrange: indices 0,1,0,1 sampled 100ms apart, window is 500ms
        let cursor = Arc::new(MockCursorProvider::at(0, 0));
        let action = Arc::new(RecordingSwitchAction::new());
        let mut poller = make_poller(Arc::clone(&cursor), layout(), Arc::clone(&action));
        let t0 = Instant::now();

        // Act
        let mut outcomes = Vec::new();
        for (i, monitor) in [0u8, 1, 0, 1].into_iter().enumerate() {
            cursor.move_to(x_of(monitor) + i as i32, 50);
            outcomes.push(poller.tick(t0 + ms(100 * i as u64)).await);
        }

        // Assert
        assert_eq!(action.switches(), vec![MonitorId::new(0)]);
        assert_eq!(
            outcomes,
            vec![
                TickOutcome::Switched {
                    from: None,
                    to: MonitorId::new(0)
                },
                TickOutcome::Debounced,
                TickOutcome::Unchanged,
                TickOutcome::Debounced,
            ]
        );
        assert_eq!(poller.state().last_accepted_monitor, Some(MonitorId::new(0)));
    }

    #[tokio::test]
    async fn test_switch_after_window_elapses_broadcasts_once() {
        let cursor = Arc::new(MockCursorProvider::at(x_of(0), 50));
        let action = Arc::new(RecordingSwitchAction::new());
        let mut poller = make_poller(Arc::clone(&cursor), layout(), Arc::clone(&action));
        let t0 = Instant::now();
        poller.tick(t0).await;

        // Still inside the window
        cursor.move_to(x_of(1), 50);
        assert_eq!(poller.tick(t0 + ms(499)).await, TickOutcome::Debounced);

        // Window elapsed: exactly one switch
        cursor.move_to(x_of(1) + 1, 50);
        let released = poller.tick(t0 + ms(500)).await;
        cursor.move_to(x_of(1) + 2, 50);
        let after = poller.tick(t0 + ms(2000)).await;

        assert_eq!(
            released,
            TickOutcome::Switched {
                from: Some(MonitorId::new(0)),
                to: MonitorId::new(1)
            }
        );
        assert_eq!(after, TickOutcome::Unchanged);
        assert_eq!(action.switches(), vec![MonitorId::new(0), MonitorId::new(1)]);
    }

    #[tokio::test]
    async fn test_sub_threshold_move_skips_mapper_and_keeps_state() {
        // Arrange: threshold of 10px
        let cursor = Arc::new(MockCursorProvider::at(50, 50));
        let layout = layout();
        let action = Arc::new(RecordingSwitchAction::new());
        let mut poller = MonitorPoller::new(
            Arc::clone(&cursor) as Arc<dyn CursorPositionProvider>,
            MonitorMapper::new(layout.clone()),
            Arc::clone(&action) as Arc<dyn SwitchAction>,
            PollerConfig {
                move_threshold: 10.0,
                ..PollerConfig::default()
            },
        );
        let t0 = Instant::now();
        poller.tick(t0).await;
        let state_before = poller.state().clone();
        let mapper_calls_before = layout.call_count();

        // Act: a 3-4-5 triangle, so the move is 5px
        cursor.move_to(53, 54);
        let outcome = poller.tick(t0 + ms(1000)).await;

        // Assert
        assert_eq!(outcome, TickOutcome::BelowThreshold);
        assert_eq!(layout.call_count(), mapper_calls_before, "mapper not consulted");
        assert_eq!(poller.state(), &state_before);
    }

    #[tokio::test]
    async fn test_move_of_exactly_threshold_is_accepted() {
        let cursor = Arc::new(MockCursorProvider::at(50, 50));
        let action = Arc::new(RecordingSwitchAction::new());
        let mut poller = MonitorPoller::new(
            Arc::clone(&cursor) as Arc<dyn CursorPositionProvider>,
            MonitorMapper::new(layout()),
            action,
            PollerConfig {
                move_threshold: 10.0,
                ..PollerConfig::default()
            },
        );
        let t0 = Instant::now();
        poller.tick(t0).await;

        cursor.move_to(56, 58);
        let outcome = poller.tick(t0 + ms(10)).await;

        assert_eq!(outcome, TickOutcome::Unchanged);
        assert_eq!(poller.state().last_accepted_position, Some(CursorSample::new(56, 58)));
    }

    #[tokio::test]
    async fn test_sample_failure_leaves_state_untouched() {
        let cursor = Arc::new(MockCursorProvider::unavailable());
        let action = Arc::new(RecordingSwitchAction::new());
        let mut poller = make_poller(cursor, layout(), Arc::clone(&action));

        let outcome = poller.tick(Instant::now()).await;

        assert_eq!(outcome, TickOutcome::SampleFailed);
        assert!(outcome.needs_backoff());
        assert_eq!(poller.state(), &PollerState::default());
        assert!(action.switches().is_empty());
    }

    #[tokio::test]
    async fn test_unresolved_position_keeps_monitor() {
        let cursor = Arc::new(MockCursorProvider::at(x_of(1), 50));
        let action = Arc::new(RecordingSwitchAction::new());
        let mut poller = make_poller(Arc::clone(&cursor), layout(), Arc::clone(&action));
        let t0 = Instant::now();
        poller.tick(t0).await;

        // Into the void to the right of both monitors
        cursor.move_to(500, 50);
        let outcome = poller.tick(t0 + ms(1000)).await;

        assert_eq!(outcome, TickOutcome::Unresolved);
        assert_eq!(poller.state().last_accepted_monitor, Some(MonitorId::new(1)));
        assert_eq!(poller.state().last_accepted_position, Some(CursorSample::new(500, 50)));
    }

    #[tokio::test]
    async fn test_failed_action_still_updates_state_and_backs_off() {
        let cursor = Arc::new(MockCursorProvider::at(x_of(1), 50));
        let action = Arc::new(RecordingSwitchAction::failing());
        let mut poller = make_poller(cursor, layout(), Arc::clone(&action));
        let now = Instant::now();

        let outcome = poller.tick(now).await;

        assert_eq!(
            outcome,
            TickOutcome::SwitchFailed {
                from: None,
                to: MonitorId::new(1)
            }
        );
        assert!(outcome.needs_backoff());
        assert_eq!(poller.state().last_accepted_monitor, Some(MonitorId::new(1)));
        assert_eq!(poller.state().last_switch_at, Some(now));
    }

    #[tokio::test]
    async fn test_same_monitor_never_retriggers_regardless_of_time() {
        let cursor = Arc::new(MockCursorProvider::at(10, 10));
        let mut action = MockSwitchAction::new();
        action.expect_on_switch().times(1).returning(|_| Ok(()));
        let mut poller = MonitorPoller::new(
            Arc::clone(&cursor) as Arc<dyn CursorPositionProvider>,
            MonitorMapper::new(layout()),
            Arc::new(action),
            PollerConfig::default(),
        );
        let t0 = Instant::now();

        for i in 0..5u64 {
            cursor.move_to(10 + i as i32 * 5, 10);
            poller.tick(t0 + Duration::from_secs(i * 10)).await;
        }
    }

    // ── spawn / stop ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_spawned_poller_switches_then_stops_within_timeout() {
        // Arrange
        let cursor = Arc::new(MockCursorProvider::at(x_of(0), 50));
        let action = Arc::new(RecordingSwitchAction::new());
        let poller = MonitorPoller::new(
            Arc::clone(&cursor) as Arc<dyn CursorPositionProvider>,
            MonitorMapper::new(layout()),
            Arc::clone(&action) as Arc<dyn SwitchAction>,
            PollerConfig {
                poll_interval: ms(5),
                ..PollerConfig::default()
            },
        );

        // Act
        let handle = poller.spawn();
        tokio::time::sleep(ms(50)).await;
        handle.stop();
        let clean = handle.join(Duration::from_secs(2)).await;

        // Assert
        assert!(clean);
        assert!(!handle.is_running());
        assert_eq!(action.switches(), vec![MonitorId::new(0)]);
    }

    fn timed_poller(
        cursor: &Arc<MockCursorProvider>,
        action: &Arc<RecordingSwitchAction>,
    ) -> MonitorPoller {
        MonitorPoller::new(
            Arc::clone(cursor) as Arc<dyn CursorPositionProvider>,
            MonitorMapper::new(layout()),
            Arc::clone(action) as Arc<dyn SwitchAction>,
            PollerConfig {
                poll_interval: ms(100),
                error_backoff: ms(1000),
                ..PollerConfig::default()
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_samples_once_per_poll_interval() {
        // Arrange
        let cursor = Arc::new(MockCursorProvider::at(x_of(0), 50));
        let action = Arc::new(RecordingSwitchAction::new());
        let handle = timed_poller(&cursor, &action).spawn();

        // Act / Assert: samples at t = 0, 100, 200, 300
        tokio::time::sleep(ms(1)).await;
        assert_eq!(cursor.sample_count(), 1);
        tokio::time::sleep(ms(100)).await;
        assert_eq!(cursor.sample_count(), 2);
        tokio::time::sleep(ms(200)).await;
        assert_eq!(cursor.sample_count(), 4);

        handle.stop();
        assert!(handle.join(Duration::from_secs(2)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_waits_error_backoff_after_failed_sample() {
        // Arrange: the cursor cannot be sampled at first
        let cursor = Arc::new(MockCursorProvider::unavailable());
        let action = Arc::new(RecordingSwitchAction::new());
        let handle = timed_poller(&cursor, &action).spawn();

        // Act / Assert: no retry before the backoff elapses
        tokio::time::sleep(ms(1)).await;
        assert_eq!(cursor.sample_count(), 1);
        tokio::time::sleep(ms(900)).await;
        assert_eq!(cursor.sample_count(), 1);

        // Recovery at t = 1000, then back to the poll interval
        cursor.move_to(x_of(1), 50);
        tokio::time::sleep(ms(100)).await;
        assert_eq!(cursor.sample_count(), 2);
        assert_eq!(action.switches(), vec![MonitorId::new(1)]);
        tokio::time::sleep(ms(100)).await;
        assert_eq!(cursor.sample_count(), 3);

        handle.stop();
        assert!(handle.join(Duration::from_secs(2)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_backs_off_after_failed_switch_action() {
        let cursor = Arc::new(MockCursorProvider::at(x_of(0), 50));
        let action = Arc::new(RecordingSwitchAction::failing());
        let handle = timed_poller(&cursor, &action).spawn();

        tokio::time::sleep(ms(1)).await;
        assert_eq!(action.switches(), vec![MonitorId::new(0)]);
        tokio::time::sleep(ms(500)).await;
        assert_eq!(cursor.sample_count(), 1, "still backing off");
        tokio::time::sleep(ms(500)).await;
        assert_eq!(cursor.sample_count(), 2);

        handle.stop();
        assert!(handle.join(Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let cursor = Arc::new(MockCursorProvider::at(0, 0));
        let action = Arc::new(RecordingSwitchAction::new());
        let handle = make_poller(cursor, layout(), action).spawn();

        handle.stop();
        handle.stop();

        assert!(handle.join(Duration::from_secs(2)).await);
        assert!(handle.join(Duration::from_secs(2)).await, "second join returns at once");
    }

    #[tokio::test]
    async fn test_stop_interrupts_long_backoff() {
        // Arrange: sampling fails, so the loop sits in a 60s backoff
        let cursor = Arc::new(MockCursorProvider::unavailable());
        let action = Arc::new(RecordingSwitchAction::new());
        let poller = MonitorPoller::new(
            Arc::clone(&cursor) as Arc<dyn CursorPositionProvider>,
            MonitorMapper::new(layout()),
            action,
            PollerConfig {
                error_backoff: Duration::from_secs(60),
                ..PollerConfig::default()
            },
        );
        let handle = poller.spawn();
        tokio::time::sleep(ms(20)).await;

        // Act
        handle.stop();
        let clean = handle.join(Duration::from_secs(2)).await;

        // Assert
        assert!(clean);
        assert_eq!(cursor.sample_count(), 1);
    }
}
