//! Environment variable overrides.

use crate::{ConfigError, RelayConfig, StoreBackend};
use log::{debug, warn};

/// Selects the sqlite backend when truthy.
pub const ENV_USE_DATABASE_CONTEXT: &str = "USE_DATABASE_CONTEXT";
/// Overrides `store.path`.
pub const ENV_CONTEXT_DB_PATH: &str = "CONTEXT_DB_PATH";
/// Overrides `store.ttl_hours`.
pub const ENV_CONTEXT_TTL_HOURS: &str = "CONTEXT_TTL_HOURS";
/// Overrides `cleanup.interval_secs`.
pub const ENV_CLEANUP_INTERVAL_SECS: &str = "CONTEXT_CLEANUP_INTERVAL_SECS";

impl RelayConfig {
    /// Apply overrides from the process environment.
    ///
    /// Returns how many settings were overridden.
    pub fn apply_env_overrides(&mut self) -> Result<usize, ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<usize, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = 0;

        if let Some(raw) = lookup(ENV_USE_DATABASE_CONTEXT) {
            self.store.backend = if parse_flag(ENV_USE_DATABASE_CONTEXT, &raw) {
                StoreBackend::Sqlite
            } else {
                StoreBackend::Memory
            };
            applied += 1;
        }
        if let Some(raw) = lookup(ENV_CONTEXT_DB_PATH) {
            self.store.path = raw;
            applied += 1;
        }
        if let Some(raw) = lookup(ENV_CONTEXT_TTL_HOURS) {
            self.store.ttl_hours = Some(parse_number(ENV_CONTEXT_TTL_HOURS, &raw)?);
            applied += 1;
        }
        if let Some(raw) = lookup(ENV_CLEANUP_INTERVAL_SECS) {
            self.cleanup.interval_secs = parse_number(ENV_CLEANUP_INTERVAL_SECS, &raw)?;
            applied += 1;
        }

        if applied > 0 {
            debug!("applied environment overrides (count={applied})");
        }
        Ok(applied)
    }
}

/// Unrecognised values fall back to the in-memory backend.
fn parse_flag(key: &str, raw: &str) -> bool {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" | "" => false,
        _ => {
            warn!("unrecognised {key} value {raw:?}; using in-memory context storage");
            false
        }
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|err| ConfigError::InvalidField {
            path: key.to_string(),
            message: format!("expected a non-negative integer, got {raw:?}: {err}"),
        })
}
