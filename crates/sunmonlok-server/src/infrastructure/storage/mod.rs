//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module declares the server's sections of the shared TOML
//! file, their defaults, and the range checks applied at startup.

pub mod config;
