//! Config resolution for operator entry points.
//!
//! Precedence (low -> high): config file or layered stack, environment
//! overrides, command-line flags. Validation runs once, on the final result.

use log::debug;
use relay_rs_config::{ConfigError, LayeredConfigOptions, RelayConfig, StoreBackend};
use std::path::PathBuf;

/// Settings given on the command line; unset fields leave config untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub backend: Option<StoreBackend>,
    pub db_path: Option<String>,
    pub ttl_hours: Option<u64>,
}

/// Where the base config comes from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// A single explicit file, no layering.
    File(PathBuf),
    /// The user, cwd and runtime layer stack.
    Layered(LayeredConfigOptions),
}

/// Apply command-line overrides, then validate the result.
pub fn apply_cli_overrides(
    config: &mut RelayConfig,
    overrides: &CliOverrides,
) -> Result<(), ConfigError> {
    if let Some(backend) = overrides.backend {
        config.store.backend = backend;
    }
    if let Some(path) = overrides.db_path.as_ref() {
        config.store.path = path.clone();
    }
    if let Some(ttl_hours) = overrides.ttl_hours {
        config.store.ttl_hours = Some(ttl_hours);
    }
    config.validate()
}

/// Resolve config against the process environment.
pub fn resolve_config(
    source: ConfigSource,
    overrides: &CliOverrides,
) -> Result<RelayConfig, ConfigError> {
    resolve_config_with(source, overrides, |key| std::env::var(key).ok())
}

/// Resolve config with an explicit environment lookup.
pub fn resolve_config_with<F>(
    source: ConfigSource,
    overrides: &CliOverrides,
    lookup: F,
) -> Result<RelayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match source {
        ConfigSource::File(path) => RelayConfig::parse_from_path(path)?,
        ConfigSource::Layered(options) => {
            let layered = RelayConfig::merge_layered_with_options(options.without_env())?;
            debug!("merged config layers (layers={})", layered.layers.len());
            layered.config
        }
    };
    config.apply_overrides_from(lookup)?;
    apply_cli_overrides(&mut config, overrides)?;
    Ok(config)
}
