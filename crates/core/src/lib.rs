//! # Stash Core
//!
//! Startup configuration for the Stash upload service.
//!
//! This crate resolves everything that is read from the process environment once, before any
//! request is served, and opens the blob store described by that configuration:
//! - Storage root location (defaults to `<system temp dir>/uploads`)
//! - REST bind address
//! - Upload body size limit
//!
//! **No API concerns**: HTTP routing and response mapping belong in `api-rest`.

pub mod config;
pub mod constants;
mod error;

pub use config::CoreConfig;
pub use constants::*;
pub use error::{ConfigError, ConfigResult};
