//! meshkv: an embedded, cached, digest-addressed key-value store.
//!
//! - [`kv`] - the store itself: [`kv::KvService`] and its engines
//! - [`digest`] - BLAKE3 key digests
//! - [`config`] - TOML configuration and validation
//! - [`paths`] - default on-disk locations
//! - [`logging`] - tracing subscriber setup
//! - [`error`] - typed errors

#![deny(unsafe_code)]

pub mod config;
pub mod constants;
pub mod digest;
pub mod error;
pub mod kv;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};
