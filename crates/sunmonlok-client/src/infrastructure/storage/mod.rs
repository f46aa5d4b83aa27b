//! Storage infrastructure: the client's sections of the shared config file.

pub mod config;
