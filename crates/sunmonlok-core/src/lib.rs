//! # sunmonlok-core
//!
//! Shared library for SunMonLok containing the wire codec, the monitor layout
//! domain, the override index resolver, hotkey chord tables and config
//! loading helpers.
//!
//! This crate is used by both the server and client applications.
//! It has zero dependencies on OS APIs, UI frameworks, or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! SunMonLok watches which physical monitor the mouse cursor is on and tells
//! remote machines about it, so that each of them can press a
//! monitor-specific hotkey (typically to switch which screen a game stream or
//! remote desktop shows). The server polls the cursor, turns the position into
//! a small monitor index and pushes that index over TCP. Clients receive the
//! index and press a key chord such as `ctrl+alt+shift+super+F2`.
//!
//! This crate (`sunmonlok-core`) is the shared foundation. It defines:
//!
//! - **`protocol`** – How bytes travel over the network. A message is exactly
//!   one byte: the monitor index.
//!
//! - **`domain`** – Pure logic with no OS dependencies. `MonitorLayout` orders
//!   monitors left to right and answers "which monitor contains this point?".
//!   `MonitorIndexResolver` caches an optional name-to-index override map.
//!
//! - **`keymap`** – Key chord definitions and their X11 KeySym translation.
//!
//! - **`config`** – Where the TOML config file lives and how it is read.

pub mod config;
pub mod domain;
pub mod keymap;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `sunmonlok_core::MonitorId` instead of `sunmonlok_core::domain::layout::MonitorId`.
pub use config::ConfigError;
pub use domain::clock::{Clock, ManualClock, SystemClock};
pub use domain::layout::{CursorSample, MonitorId, MonitorLayout, MonitorRect};
pub use domain::resolver::{IndexSourceError, MonitorIndexResolver, MonitorIndexSource};
pub use keymap::{HotkeyChord, HotkeyTable, KeymapError, Modifier};
pub use protocol::codec::{decode_monitor_switch, encode_monitor_switch, ProtocolError};
