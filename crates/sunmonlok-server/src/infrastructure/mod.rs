//! Infrastructure layer for the server.
//!
//! Contains OS-facing adapters: cursor and layout backends, the TCP broadcast
//! server, the Sunshine log reader and file-system config storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `sunmonlok_core`, but MUST NOT be imported by the `application` layer.

pub mod display;
pub mod network;
pub mod storage;
pub mod sunshine;
