//! Display backends: where the cursor is and which monitors exist.
//!
//! # Sub-modules
//!
//! - **`hyprland`** – Queries the Hyprland compositor through `hyprctl`.
//! - **`x11`** – `XQueryPointer` for the cursor and `xrandr --listmonitors`
//!   for the layout (Linux only).
//! - **`static_layout`** – A fixed layout from the config file.
//! - **`mock`** – In-memory doubles for tests.
//!
//! # Backend chains
//!
//! The config lists backends in preference order, separately for the cursor
//! and for the layout. [`select_cursor_provider`] and
//! [`select_layout_provider`] construct each candidate in turn and call its
//! `probe()`; the first that passes is kept for the rest of the process and
//! logged once. Per-call failures afterwards are ordinary
//! `PositionUnavailable`/`LayoutUnavailable` errors, never a re-probe.

use std::sync::Arc;
use std::time::Duration;

use sunmonlok_core::MonitorRect;
use tracing::{debug, info};

use crate::application::poll_monitor::CursorPositionProvider;
use crate::application::resolve_monitor::{MonitorLayoutProvider, ProviderError};

pub mod hyprland;
pub mod mock;
pub mod static_layout;
#[cfg(target_os = "linux")]
pub mod x11;

/// Default cursor backend order.
pub const DEFAULT_CURSOR_BACKENDS: &[&str] = &["hyprland", "x11"];
/// Default layout backend order.
pub const DEFAULT_LAYOUT_BACKENDS: &[&str] = &["hyprland", "x11", "static"];

/// Upper bound on one cursor or layout subprocess call.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

/// A named backend that is constructed only when its turn comes.
pub type Candidate<P> = (String, Box<dyn FnOnce() -> Result<Arc<P>, ProviderError> + Send>);

// ── Chain selection ───────────────────────────────────────────────────────────

/// Builds the cursor backends named in `order` and returns the first whose
/// probe succeeds.
pub async fn select_cursor_provider(
    order: &[String],
) -> Result<Arc<dyn CursorPositionProvider>, ProviderError> {
    let candidates = order
        .iter()
        .map(|name| {
            let owned = name.clone();
            let build: Candidate<dyn CursorPositionProvider> =
                (name.clone(), Box::new(move || build_cursor_backend(&owned)));
            build
        })
        .collect();
    first_available_cursor(candidates).await
}

/// Builds the layout backends named in `order` and returns the first whose
/// probe succeeds. `static_monitors` feeds the `static` backend.
pub async fn select_layout_provider(
    order: &[String],
    static_monitors: &[MonitorRect],
) -> Result<Arc<dyn MonitorLayoutProvider>, ProviderError> {
    let candidates = order
        .iter()
        .map(|name| {
            let owned = name.clone();
            let monitors = static_monitors.to_vec();
            let build: Candidate<dyn MonitorLayoutProvider> =
                (name.clone(), Box::new(move || build_layout_backend(&owned, monitors)));
            build
        })
        .collect();
    first_available_layout(candidates).await
}

/// Probes `candidates` in order; the first that passes wins.
pub async fn first_available_cursor(
    candidates: Vec<Candidate<dyn CursorPositionProvider>>,
) -> Result<Arc<dyn CursorPositionProvider>, ProviderError> {
    let mut tried = Vec::new();
    for (name, build) in candidates {
        let outcome = match build() {
            Ok(provider) => provider.probe().await.map(|()| provider),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(provider) => {
                info!(backend = %name, "cursor backend selected");
                return Ok(provider);
            }
            Err(e) => {
                debug!(backend = %name, "cursor backend unavailable: {e}");
                tried.push(format!("{name}: {e}"));
            }
        }
    }
    Err(exhausted("cursor", tried))
}

/// Probes `candidates` in order; the first that passes wins.
pub async fn first_available_layout(
    candidates: Vec<Candidate<dyn MonitorLayoutProvider>>,
) -> Result<Arc<dyn MonitorLayoutProvider>, ProviderError> {
    let mut tried = Vec::new();
    for (name, build) in candidates {
        let outcome = match build() {
            Ok(provider) => provider.probe().await.map(|()| provider),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(provider) => {
                info!(backend = %name, "layout backend selected");
                return Ok(provider);
            }
            Err(e) => {
                debug!(backend = %name, "layout backend unavailable: {e}");
                tried.push(format!("{name}: {e}"));
            }
        }
    }
    Err(exhausted("layout", tried))
}

fn exhausted(kind: &str, tried: Vec<String>) -> ProviderError {
    let reason = if tried.is_empty() {
        "no backends configured".to_string()
    } else {
        tried.join("; ")
    };
    ProviderError::BackendUnavailable {
        backend: kind.to_string(),
        reason,
    }
}

fn build_cursor_backend(name: &str) -> Result<Arc<dyn CursorPositionProvider>, ProviderError> {
    match name {
        "hyprland" => Ok(Arc::new(hyprland::HyprlandCursorProvider::new(COMMAND_TIMEOUT))),
        #[cfg(target_os = "linux")]
        "x11" => Ok(Arc::new(x11::X11CursorProvider::open()?)),
        #[cfg(not(target_os = "linux"))]
        "x11" => Err(unsupported_platform("x11")),
        other => Err(unknown_backend(other)),
    }
}

fn build_layout_backend(
    name: &str,
    static_monitors: Vec<MonitorRect>,
) -> Result<Arc<dyn MonitorLayoutProvider>, ProviderError> {
    match name {
        "hyprland" => Ok(Arc::new(hyprland::HyprlandLayoutProvider::new(COMMAND_TIMEOUT))),
        #[cfg(target_os = "linux")]
        "x11" => Ok(Arc::new(x11::XrandrLayoutProvider::new(COMMAND_TIMEOUT))),
        #[cfg(not(target_os = "linux"))]
        "x11" => Err(unsupported_platform("x11")),
        "static" => Ok(Arc::new(static_layout::StaticLayoutProvider::new(static_monitors))),
        other => Err(unknown_backend(other)),
    }
}

fn unknown_backend(name: &str) -> ProviderError {
    ProviderError::BackendUnavailable {
        backend: name.to_string(),
        reason: "unknown backend name".to_string(),
    }
}

#[cfg(not(target_os = "linux"))]
fn unsupported_platform(name: &str) -> ProviderError {
    ProviderError::BackendUnavailable {
        backend: name.to_string(),
        reason: "only available on Linux".to_string(),
    }
}

// ── Subprocess helper ─────────────────────────────────────────────────────────

/// Runs `program args…` and returns its stdout, bounded by `timeout`.
///
/// The child is killed if the timeout fires. A non-zero exit status is an
/// error carrying the first line of stderr.
pub(crate) async fn run_command(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<String, String> {
    let child = tokio::process::Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(timeout, child).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(format!("{program}: {e}")),
        Err(_) => return Err(format!("{program} timed out after {timeout:?}")),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let first = stderr.lines().next().unwrap_or("").trim();
        return Err(format!("{program} exited with {}: {first}", output.status));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
