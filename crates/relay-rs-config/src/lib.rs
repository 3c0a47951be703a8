//! Configuration models and layered config loading.
//!
//! This crate owns the relay config schema, validation, layer merging and
//! environment overrides.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Layered config types and loader options.
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
/// Environment variable names recognised as overrides.
pub use loader::env::{
    ENV_CLEANUP_INTERVAL_SECS, ENV_CONTEXT_DB_PATH, ENV_CONTEXT_TTL_HOURS,
    ENV_USE_DATABASE_CONTEXT,
};
/// Configuration schema models.
pub use model::*;
