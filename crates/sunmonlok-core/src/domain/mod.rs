//! Domain entities for SunMonLok.
//!
//! This module contains pure logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers. The innermost
//! layer is the **domain**. Domain code has no imports from OS APIs, network
//! libraries or UI frameworks, and can be compiled and tested on any platform
//! without external setup.
//!
//! Here the domain is the idea of a monitor layout (rectangles in desktop
//! space, ordered left to right) and the optional override map that renames
//! those positions into the indices a streaming host uses. Everything that
//! talks to a compositor or a log file lives in the server's infrastructure
//! layer and only hands plain values to this module.

/// Time source used by cooldown and debounce logic.
pub mod clock;

/// Monitor rectangles, cursor samples and the positional layout.
///
/// See [`layout::MonitorLayout`] for the main type.
pub mod layout;

/// Cached name-to-index override map.
pub mod resolver;
