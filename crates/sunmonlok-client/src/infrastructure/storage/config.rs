//! Client configuration schema.
//!
//! ```toml
//! [client]
//! port = 9876
//! reconnect_delay_secs = 5.0
//! recv_timeout_secs = 1.0
//! log_level = "info"
//!
//! [hotkey]
//! modifiers = ["ctrl", "alt", "shift", "cmd"]
//! base_keys = ["f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11"]
//! backends = ["uinput", "xtest", "sendinput", "coregraphics", "log"]
//! ```
//!
//! The server host is not part of the file; it is a required command-line
//! argument.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sunmonlok_core::config::load_config;
use sunmonlok_core::keymap::{DEFAULT_BASE_KEYS, DEFAULT_MODIFIERS};
use sunmonlok_core::protocol::DEFAULT_PORT;
use sunmonlok_core::{ConfigError, HotkeyTable};

use crate::infrastructure::hotkey::DEFAULT_EMITTERS;
use crate::infrastructure::network::ReceiverConfig;

/// Everything the client reads from the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub client: ClientSection,
    #[serde(default)]
    pub hotkey: HotkeySection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientSection {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: f64,
    #[serde(default = "default_recv_timeout")]
    pub recv_timeout_secs: f64,
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Chord table and injection backends.
///
/// Chord `i` is every modifier held plus `base_keys[i]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HotkeySection {
    #[serde(default = "default_modifiers")]
    pub modifiers: Vec<String>,
    #[serde(default = "default_base_keys")]
    pub base_keys: Vec<String>,
    #[serde(default = "default_backends")]
    pub backends: Vec<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_reconnect_delay() -> f64 {
    5.0
}
fn default_recv_timeout() -> f64 {
    1.0
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_modifiers() -> Vec<String> {
    DEFAULT_MODIFIERS.iter().map(|s| s.to_string()).collect()
}
fn default_base_keys() -> Vec<String> {
    DEFAULT_BASE_KEYS.iter().map(|s| s.to_string()).collect()
}
fn default_backends() -> Vec<String> {
    DEFAULT_EMITTERS.iter().map(|s| s.to_string()).collect()
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            reconnect_delay_secs: default_reconnect_delay(),
            recv_timeout_secs: default_recv_timeout(),
            log_level: default_log_level(),
        }
    }
}

impl Default for HotkeySection {
    fn default() -> Self {
        Self {
            modifiers: default_modifiers(),
            base_keys: default_base_keys(),
            backends: default_backends(),
        }
    }
}

impl ClientConfig {
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

    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client.port == 0 {
            return Err(invalid("client.port must be in 1..=65535"));
        }
        duration("client.reconnect_delay_secs", self.client.reconnect_delay_secs)?;
        if duration("client.recv_timeout_secs", self.client.recv_timeout_secs)?.is_zero() {
            return Err(invalid("client.recv_timeout_secs must be > 0"));
        }
        if self.hotkey.backends.is_empty() {
            return Err(invalid("hotkey.backends must name at least one backend"));
        }
        self.hotkey_table()?;
        Ok(())
    }

    /// Builds the chord table from `[hotkey]`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] for unknown key names or an empty key list.
    pub fn hotkey_table(&self) -> Result<HotkeyTable, ConfigError> {
        HotkeyTable::from_names(&self.hotkey.modifiers, &self.hotkey.base_keys)
            .map_err(|e| invalid(&format!("hotkey: {e}")))
    }

    pub fn receiver_config(&self) -> ReceiverConfig {
        ReceiverConfig {
            recv_timeout: secs(self.client.recv_timeout_secs),
            reconnect_delay: secs(self.client.reconnect_delay_secs),
        }
    }

    pub fn debug_logging(&self) -> bool {
        self.client.log_level.eq_ignore_ascii_case("debug")
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid(message.to_string())
}

/// A non-negative number of seconds that fits a `Duration`.
fn duration(field: &str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| invalid(&format!("{field} must be a finite number of seconds >= 0, got {value}")))
}

/// Seconds to `Duration`; values `validate` rejects collapse to zero.
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use sunmonlok_core::MonitorId;

    #[test]
    fn test_client_config_default_values() {
        // Arrange / Act
        let cfg = ClientConfig::default();

        // Assert
        assert_eq!(cfg.client.port, 9876);
        assert_eq!(cfg.hotkey.backends, vec!["uinput", "xtest", "sendinput", "coregraphics", "log"]);
        assert_eq!(cfg.receiver_config(), ReceiverConfig::default());
        assert_eq!(cfg.hotkey_table().unwrap(), HotkeyTable::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let cfg: ClientConfig = toml::from_str("").expect("empty is valid");
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn test_custom_hotkeys_and_timings_parse() {
        // Arrange
        let text = r#"
            [client]
            port = 7000
            reconnect_delay_secs = 0.5
            log_level = "debug"

            [hotkey]
            modifiers = ["ctrl", "shift"]
            base_keys = ["a", "b", "c"]
            backends = ["log"]

            [server]
            bind = "0.0.0.0"
        "#;

        // Act
        let cfg: ClientConfig = toml::from_str(text).expect("valid TOML");

        // Assert
        assert!(cfg.validate().is_ok());
        assert!(cfg.debug_logging());
        assert_eq!(cfg.receiver_config().reconnect_delay, Duration::from_millis(500));
        let table = cfg.hotkey_table().unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.chord_for(MonitorId::new(1)).unwrap().to_string(), "ctrl+shift+b");
    }

    #[test]
    fn test_validate_rejects_unknown_key_name() {
        let mut cfg = ClientConfig::default();
        cfg.hotkey.base_keys = vec!["f1".to_string(), "escape-hatch".to_string()];

        let result = cfg.validate();

        assert!(matches!(result, Err(ConfigError::Invalid(msg)) if msg.contains("escape-hatch")));
    }

    #[test]
    fn test_validate_rejects_empty_base_keys() {
        let mut cfg = ClientConfig::default();
        cfg.hotkey.base_keys.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_port_zero_and_negative_delay() {
        let mut cfg = ClientConfig::default();
        cfg.client.port = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = ClientConfig::default();
        cfg.client.reconnect_delay_secs = -1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_delays_too_large_for_a_duration() {
        // Arrange
        let mut cfg = ClientConfig::default();
        cfg.client.reconnect_delay_secs = 1e30;

        // Act
        let result = cfg.validate();

        // Assert
        assert!(matches!(result, Err(ConfigError::Invalid(msg)) if msg.contains("reconnect_delay_secs")));

        let mut cfg = ClientConfig::default();
        cfg.client.recv_timeout_secs = f64::INFINITY;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_recv_timeout() {
        let mut cfg = ClientConfig::default();
        cfg.client.recv_timeout_secs = 0.0;
        assert!(cfg.validate().is_err());
    }
}
