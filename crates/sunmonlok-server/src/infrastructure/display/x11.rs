//! X11 backends.
//!
//! - cursor: `XQueryPointer` on the default root window.
//! - layout: `xrandr --listmonitors`, which reports RandR monitors (one per
//!   logical monitor, with connector names) as
//!   ` 0: +*DP-1 2560/597x1440/336+0+0  DP-1`.

use std::os::raw::{c_int, c_uint, c_ulong};
use std::ptr;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use sunmonlok_core::{CursorSample, MonitorRect};
use x11::xlib;

use crate::application::poll_monitor::CursorPositionProvider;
use crate::application::resolve_monitor::{MonitorLayoutProvider, ProviderError};

use super::run_command;

const BACKEND: &str = "x11";

// ── Cursor ────────────────────────────────────────────────────────────────────

/// Owned Xlib connection, closed on drop.
struct DisplayHandle(*mut xlib::Display);

// SAFETY: the pointer is only dereferenced by Xlib calls made while holding
// the `Mutex` in `X11CursorProvider`, so the connection is never used from two
// threads at once.
unsafe impl Send for DisplayHandle {}

impl Drop for DisplayHandle {
    fn drop(&mut self) {
        // SAFETY: `self.0` came from a successful `XOpenDisplay` and is closed once.
        unsafe {
            xlib::XCloseDisplay(self.0);
        }
    }
}

pub struct X11CursorProvider {
    display: Mutex<DisplayHandle>,
}

impl X11CursorProvider {
    /// Connects to the display named by `$DISPLAY`.
    pub fn open() -> Result<Self, ProviderError> {
        // SAFETY: a null name makes Xlib read `$DISPLAY`; the result is checked for null.
        let display = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display.is_null() {
            return Err(ProviderError::BackendUnavailable {
                backend: BACKEND.to_string(),
                reason: "cannot open X display (is $DISPLAY set?)".to_string(),
            });
        }
        Ok(Self {
            display: Mutex::new(DisplayHandle(display)),
        })
    }

    fn query_pointer(&self) -> Result<CursorSample, ProviderError> {
        let handle = self.display.lock().unwrap_or_else(PoisonError::into_inner);
        let mut root_return: c_ulong = 0;
        let mut child_return: c_ulong = 0;
        let (mut root_x, mut root_y): (c_int, c_int) = (0, 0);
        let (mut win_x, mut win_y): (c_int, c_int) = (0, 0);
        let mut mask: c_uint = 0;

        // SAFETY: `handle.0` is a live display guarded by the mutex; every
        // out-pointer refers to a local that outlives the call.
        let on_screen = unsafe {
            let root = xlib::XDefaultRootWindow(handle.0);
            xlib::XQueryPointer(
                handle.0,
                root,
                &mut root_return,
                &mut child_return,
                &mut root_x,
                &mut root_y,
                &mut win_x,
                &mut win_y,
                &mut mask,
            )
        };

        if on_screen == 0 {
            return Err(ProviderError::PositionUnavailable(
                "pointer is on another X screen".to_string(),
            ));
        }
        Ok(CursorSample::new(root_x, root_y))
    }
}

#[async_trait]
impl CursorPositionProvider for X11CursorProvider {
    async fn probe(&self) -> Result<(), ProviderError> {
        self.query_pointer()
            .map(|_| ())
            .map_err(|e| ProviderError::BackendUnavailable {
                backend: BACKEND.to_string(),
                reason: e.to_string(),
            })
    }

    async fn sample_position(&self) -> Result<CursorSample, ProviderError> {
        self.query_pointer()
    }
}

// ── Layout ────────────────────────────────────────────────────────────────────

pub struct XrandrLayoutProvider {
    timeout: Duration,
}

impl XrandrLayoutProvider {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl MonitorLayoutProvider for XrandrLayoutProvider {
    async fn probe(&self) -> Result<(), ProviderError> {
        if std::env::var_os("DISPLAY").is_none() {
            return Err(ProviderError::BackendUnavailable {
                backend: BACKEND.to_string(),
                reason: "$DISPLAY is not set".to_string(),
            });
        }
        match self.list_monitors().await {
            Ok(monitors) if !monitors.is_empty() => Ok(()),
            Ok(_) => Err(ProviderError::BackendUnavailable {
                backend: BACKEND.to_string(),
                reason: "xrandr reported no monitors".to_string(),
            }),
            Err(e) => Err(ProviderError::BackendUnavailable {
                backend: BACKEND.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn list_monitors(&self) -> Result<Vec<MonitorRect>, ProviderError> {
        let stdout = run_command("xrandr", &["--listmonitors"], self.timeout)
            .await
            .map_err(ProviderError::LayoutUnavailable)?;
        parse_listmonitors(&stdout).map_err(ProviderError::LayoutUnavailable)
    }
}

/// Parses `xrandr --listmonitors` output.
///
/// The `Monitors: N` header is skipped. Each remaining line has the shape
/// `<idx>: [+][*]<name> <w>/<mmw>x<h>/<mmh>+<x>+<y> <outputs…>`.
pub fn parse_listmonitors(output: &str) -> Result<Vec<MonitorRect>, String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("Monitors:"))
        .map(parse_monitor_line)
        .collect()
}

fn parse_monitor_line(line: &str) -> Result<MonitorRect, String> {
    let mut tokens = line.split_whitespace();
    let _index = tokens.next();
    let name = tokens
        .next()
        .map(|raw| raw.trim_start_matches(['+', '*']))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| format!("missing monitor name in {line:?}"))?;
    let geometry = tokens
        .next()
        .ok_or_else(|| format!("missing geometry in {line:?}"))?;

    let bad = || format!("invalid geometry {geometry:?}");
    let (width_part, rest) = geometry.split_once('x').ok_or_else(bad)?;
    let mut offsets = rest.split('+');
    let height_part = offsets.next().ok_or_else(bad)?;
    let x = offsets.next().and_then(|v| v.parse::<i32>().ok()).ok_or_else(bad)?;
    let y = offsets.next().and_then(|v| v.parse::<i32>().ok()).ok_or_else(bad)?;
    let width = physical_pixels(width_part).ok_or_else(bad)?;
    let height = physical_pixels(height_part).ok_or_else(bad)?;

    Ok(MonitorRect::new(name, x, y, width, height))
}

/// `"2560/597"` → 2560 (pixels before the millimetre size).
fn physical_pixels(part: &str) -> Option<u32> {
    part.split('/').next()?.parse().ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
