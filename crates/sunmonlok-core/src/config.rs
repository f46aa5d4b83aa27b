//! Shared TOML configuration loading.
//!
//! Both binaries read the same file and each picks out the sections it cares
//! about, so this module only knows *where* the file lives and *how* to turn it
//! into a typed struct. The schemas themselves live in each binary's
//! `infrastructure::storage::config` module.
//!
//! Lookup order for the file:
//! 1. An explicit path (the `--config` flag).
//! 2. The `SUNMONLOK_CONFIG` environment variable.
//! 3. `$XDG_CONFIG_HOME/sunmonlok/config.toml`, or `~/.config/sunmonlok/config.toml`.
//!
//! A missing file is not an error: it yields `T::default()`, so the apps run
//! out of the box before anyone writes a config.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "SUNMONLOK_CONFIG";

const APP_DIR: &str = "sunmonlok";
const FILE_NAME: &str = "config.toml";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The file parsed but a value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Determines the directory that holds the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when neither `XDG_CONFIG_HOME`
/// nor `HOME` is set.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the config file path, honouring [`CONFIG_PATH_ENV`].
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the env var is unset and the
/// base directory cannot be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    Ok(config_dir()?.join(FILE_NAME))
}

/// Loads `T` from `explicit` if given, otherwise from [`config_file_path`].
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config<T>(explicit: Option<&Path>) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    match explicit {
        Some(path) => load_config_from(path),
        None => load_config_from(&config_file_path()?),
    }
}

/// Loads `T` from `path`, returning `T::default()` if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from<T>(path: &Path) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// `XDG_CONFIG_HOME/sunmonlok`, falling back to `~/.config/sunmonlok`.
fn platform_config_dir() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(base.join(APP_DIR))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
