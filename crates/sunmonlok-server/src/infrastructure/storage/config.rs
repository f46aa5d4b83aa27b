//! Server configuration schema.
//!
//! The server and client share one TOML file (see
//! [`sunmonlok_core::config`]); this module declares the sections the server
//! reads and ignores the rest.
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0"
//! port = 9876
//! log_level = "info"
//!
//! [poller]
//! poll_interval_secs = 0.2
//! debounce_secs = 0.5
//! move_threshold_px = 1.0
//! error_backoff_secs = 1.0
//!
//! [mapping]
//! mode = "override"          # or "positional"
//! refresh_cooldown_secs = 10.0
//!
//! [backends]
//! cursor = ["hyprland", "x11"]
//! layout = ["hyprland", "x11", "static"]
//!
//! [[layout.monitors]]
//! name = "DP-1"
//! x = 0
//! y = 0
//! width = 2560
//! height = 1440
//! ```
//!
//! # Serde default values
//!
//! Every field has a `#[serde(default = "...")]` helper, so an empty or
//! missing file is a valid configuration and older files keep working when
//! fields are added.

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sunmonlok_core::config::load_config;
use sunmonlok_core::protocol::DEFAULT_PORT;
use sunmonlok_core::{ConfigError, MonitorRect};

use crate::application::poll_monitor::PollerConfig;
use crate::application::resolve_monitor::MappingMode;
use crate::infrastructure::display::{DEFAULT_CURSOR_BACKENDS, DEFAULT_LAYOUT_BACKENDS};

// ── Config schema types ───────────────────────────────────────────────────────

/// Everything the server reads from the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub poller: PollerSection,
    #[serde(default)]
    pub mapping: MappingSection,
    #[serde(default)]
    pub backends: BackendsSection,
    #[serde(default)]
    pub layout: LayoutSection,
}

/// Listening socket and log verbosity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    /// IP address to bind.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// `tracing` level used when `RUST_LOG` is unset: `"info"` or `"debug"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollerSection {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: f64,
    #[serde(default = "default_debounce")]
    pub debounce_secs: f64,
    #[serde(default = "default_move_threshold")]
    pub move_threshold_px: f64,
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: f64,
}

/// Index mapping mode as written in the file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MappingModeSetting {
    Positional,
    Override,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MappingSection {
    #[serde(default = "default_mode")]
    pub mode: MappingModeSetting,
    /// Minimum time between two reloads of the override map.
    #[serde(default = "default_refresh_cooldown")]
    pub refresh_cooldown_secs: f64,
}

/// Backend names in preference order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendsSection {
    #[serde(default = "default_cursor_backends")]
    pub cursor: Vec<String>,
    #[serde(default = "default_layout_backends")]
    pub layout: Vec<String>,
}

/// Monitors for the `static` layout backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LayoutSection {
    #[serde(default)]
    pub monitors: Vec<MonitorRect>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_poll_interval() -> f64 {
    0.2
}
fn default_debounce() -> f64 {
    0.5
}
fn default_move_threshold() -> f64 {
    1.0
}
fn default_error_backoff() -> f64 {
    1.0
}
fn default_mode() -> MappingModeSetting {
    MappingModeSetting::Override
}
fn default_refresh_cooldown() -> f64 {
    10.0
}
fn default_cursor_backends() -> Vec<String> {
    DEFAULT_CURSOR_BACKENDS.iter().map(|s| s.to_string()).collect()
}
fn default_layout_backends() -> Vec<String> {
    DEFAULT_LAYOUT_BACKENDS.iter().map(|s| s.to_string()).collect()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

impl Default for PollerSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            debounce_secs: default_debounce(),
            move_threshold_px: default_move_threshold(),
            error_backoff_secs: default_error_backoff(),
        }
    }
}

impl Default for MappingSection {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            refresh_cooldown_secs: default_refresh_cooldown(),
        }
    }
}

impl Default for BackendsSection {
    fn default() -> Self {
        Self {
            cursor: default_cursor_backends(),
            layout: default_layout_backends(),
        }
    }
}

// ── Loading and validation ────────────────────────────────────────────────────

impl ServerConfig {
    /// Loads the config (explicit path, env var, or XDG default) and validates it.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`]; a missing file is not an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = load_config(explicit)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that the TOML types alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(invalid("server.port must be in 1..=65535"));
        }
        self.bind_addr()?;

        let p = &self.poller;
        if duration("poller.poll_interval_secs", p.poll_interval_secs)?.is_zero() {
            return Err(invalid("poller.poll_interval_secs must be > 0"));
        }
        duration("poller.debounce_secs", p.debounce_secs)?;
        non_negative("poller.move_threshold_px", p.move_threshold_px)?;
        duration("poller.error_backoff_secs", p.error_backoff_secs)?;
        duration("mapping.refresh_cooldown_secs", self.mapping.refresh_cooldown_secs)?;

        if self.backends.cursor.is_empty() {
            return Err(invalid("backends.cursor must name at least one backend"));
        }
        if self.backends.layout.is_empty() {
            return Err(invalid("backends.layout must name at least one backend"));
        }
        Ok(())
    }

    /// The parsed `server.bind` address.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] when `bind` is not an IP address.
    pub fn bind_addr(&self) -> Result<IpAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|_| invalid(&format!("server.bind {:?} is not an IP address", self.server.bind)))
    }

    /// Poller timings. Call after [`validate`](Self::validate).
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            poll_interval: secs(self.poller.poll_interval_secs),
            debounce: secs(self.poller.debounce_secs),
            move_threshold: self.poller.move_threshold_px,
            error_backoff: secs(self.poller.error_backoff_secs),
        }
    }

    pub fn mapping_mode(&self) -> MappingMode {
        match self.mapping.mode {
            MappingModeSetting::Positional => MappingMode::Positional,
            MappingModeSetting::Override => MappingMode::Override,
        }
    }

    pub fn refresh_cooldown(&self) -> Duration {
        secs(self.mapping.refresh_cooldown_secs)
    }

    /// Whether debug logging was requested in the file.
    pub fn debug_logging(&self) -> bool {
        self.server.log_level.eq_ignore_ascii_case("debug")
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid(message.to_string())
}

fn non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(&format!("{field} must be >= 0")))
    }
}

/// A non-negative number of seconds that fits a `Duration`.
fn duration(field: &str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| invalid(&format!("{field} must be a finite number of seconds >= 0, got {value}")))
}

/// Seconds to `Duration`; out-of-range values (already rejected by
/// `validate`) collapse to zero.
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
