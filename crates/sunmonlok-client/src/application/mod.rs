//! Application layer use cases for the client.
//!
//! # Sub-modules
//!
//! - **`inject_hotkey`** – Turns a received monitor index into a key chord and
//!   hands it to a platform key emitter.

pub mod inject_hotkey;
