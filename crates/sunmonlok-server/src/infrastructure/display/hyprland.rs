//! Hyprland backends, driven through the `hyprctl` command.
//!
//! - cursor: `hyprctl cursorpos` prints `"X, Y"` in layout coordinates.
//! - layout: `hyprctl monitors -j` prints a JSON array. Hyprland positions
//!   monitors in *scaled* coordinates, so the effective width of a monitor is
//!   `floor(width / scale)`.
//!
//! Both backends probe by checking `HYPRLAND_INSTANCE_SIGNATURE` and running
//! `hyprctl version`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use sunmonlok_core::{CursorSample, MonitorRect};

use crate::application::poll_monitor::CursorPositionProvider;
use crate::application::resolve_monitor::{MonitorLayoutProvider, ProviderError};

use super::run_command;

const HYPRCTL: &str = "hyprctl";
const INSTANCE_ENV: &str = "HYPRLAND_INSTANCE_SIGNATURE";
const BACKEND: &str = "hyprland";

async fn probe_hyprctl(timeout: Duration) -> Result<(), ProviderError> {
    if std::env::var_os(INSTANCE_ENV).is_none() {
        return Err(ProviderError::BackendUnavailable {
            backend: BACKEND.to_string(),
            reason: format!("${INSTANCE_ENV} is not set"),
        });
    }
    run_command(HYPRCTL, &["version"], timeout)
        .await
        .map(|_| ())
        .map_err(|reason| ProviderError::BackendUnavailable {
            backend: BACKEND.to_string(),
            reason,
        })
}

// ── Cursor ────────────────────────────────────────────────────────────────────

pub struct HyprlandCursorProvider {
    timeout: Duration,
}

impl HyprlandCursorProvider {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CursorPositionProvider for HyprlandCursorProvider {
    async fn probe(&self) -> Result<(), ProviderError> {
        probe_hyprctl(self.timeout).await?;
        // A working compositor must also answer the actual query.
        self.sample_position()
            .await
            .map(|_| ())
            .map_err(|e| ProviderError::BackendUnavailable {
                backend: BACKEND.to_string(),
                reason: e.to_string(),
            })
    }

    async fn sample_position(&self) -> Result<CursorSample, ProviderError> {
        let stdout = run_command(HYPRCTL, &["cursorpos"], self.timeout)
            .await
            .map_err(ProviderError::PositionUnavailable)?;
        parse_cursorpos(&stdout).map_err(ProviderError::PositionUnavailable)
    }
}

/// Parses `hyprctl cursorpos` output such as `"1920, 540"`.
///
/// Fractional coordinates are floored.
pub fn parse_cursorpos(output: &str) -> Result<CursorSample, String> {
    let trimmed = output.trim();
    let (x, y) = trimmed
        .split_once(',')
        .ok_or_else(|| format!("unexpected cursorpos output: {trimmed:?}"))?;
    Ok(CursorSample::new(parse_coordinate(x)?, parse_coordinate(y)?))
}

fn parse_coordinate(raw: &str) -> Result<i32, String> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i32>() {
        return Ok(value);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.floor() as i32)
        .ok_or_else(|| format!("invalid coordinate {raw:?}"))
}

// ── Layout ────────────────────────────────────────────────────────────────────

pub struct HyprlandLayoutProvider {
    timeout: Duration,
}

impl HyprlandLayoutProvider {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl MonitorLayoutProvider for HyprlandLayoutProvider {
    async fn probe(&self) -> Result<(), ProviderError> {
        probe_hyprctl(self.timeout).await
    }

    async fn list_monitors(&self) -> Result<Vec<MonitorRect>, ProviderError> {
        let stdout = run_command(HYPRCTL, &["monitors", "-j"], self.timeout)
            .await
            .map_err(ProviderError::LayoutUnavailable)?;
        parse_monitors_json(&stdout).map_err(ProviderError::LayoutUnavailable)
    }
}

/// One entry of `hyprctl monitors -j`; unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct HyprMonitor {
    name: String,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    #[serde(default = "default_scale")]
    scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl HyprMonitor {
    fn scaled(extent: u32, scale: f64) -> u32 {
        if scale.is_finite() && scale > 0.0 {
            (f64::from(extent) / scale).floor() as u32
        } else {
            extent
        }
    }

    fn into_rect(self) -> MonitorRect {
        MonitorRect::new(
            self.name,
            self.x,
            self.y,
            Self::scaled(self.width, self.scale),
            Self::scaled(self.height, self.scale),
        )
    }
}

/// Parses `hyprctl monitors -j` into rectangles in layout coordinates.
pub fn parse_monitors_json(output: &str) -> Result<Vec<MonitorRect>, String> {
    let monitors: Vec<HyprMonitor> =
        serde_json::from_str(output).map_err(|e| format!("invalid hyprctl monitors JSON: {e}"))?;
    Ok(monitors.into_iter().map(HyprMonitor::into_rect).collect())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
