//! Infrastructure layer for the client application.
//!
//! Contains OS-facing adapters: key emitters (XTest, logging), the
//! reconnecting TCP receiver, and file-system config storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `sunmonlok_core`, but MUST NOT be imported by the `application` layer.

pub mod hotkey;
pub mod network;
pub mod storage;
