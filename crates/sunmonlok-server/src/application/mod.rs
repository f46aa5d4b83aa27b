//! Application layer use cases for the server.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure rules in `sunmonlok-core`) and the infrastructure (compositor
//! queries, sockets, files).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a goal, here "tell every client
//!   which monitor the cursor is on".
//! - **Depend on abstractions** (traits) rather than concrete implementations,
//!   so a Hyprland backend and an X11 backend are interchangeable.
//! - **Contain no OS calls and no network I/O**.
//!
//! # Sub-modules
//!
//! - **`resolve_monitor`** – Turns a cursor point into a monitor index, either
//!   by left-to-right position or through the name-based override map.
//!
//! - **`poll_monitor`** – The periodic loop: sample, threshold, resolve,
//!   debounce, and hand accepted switches to a `SwitchAction`.

pub mod poll_monitor;
pub mod resolve_monitor;
