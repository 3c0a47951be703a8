//! Layered configuration loader.
//!
//! Discovers configuration layers (user, cwd, runtime overrides), merges them,
//! applies environment overrides and produces a validated `RelayConfig`.

pub(crate) mod env;
mod layer_io;
mod merge;


use crate::{ConfigError, RelayConfig, StoreBackend};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename in local layers.
const DEFAULT_CONFIG_FILE: &str = "relay.json5";
/// Default config directory under the home directory.
const DEFAULT_CONFIG_DIR: &str = ".relay";

/// Effective config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged config; validated unless produced by a `merge_*` call.
    pub config: RelayConfig,
    /// Metadata for each layer applied during load.
    pub layers: Vec<ConfigLayer>,
}

/// Origin for a single config layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// User-specific configuration.
    User,
    /// Current working directory configuration.
    Cwd,
    /// Runtime override files.
    Runtime,
    /// Environment variable overrides (highest precedence).
    Environment,
}

/// Metadata about an applied config layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    /// Layer origin.
    pub source: ConfigLayerSource,
    /// Location on disk if file-backed.
    pub path: Option<PathBuf>,
}

/// Options controlling layered config discovery and overrides.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Working directory used to find the cwd layer.
    pub cwd: PathBuf,
    /// Optional user config path (defaults to `~/.relay/relay.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Runtime override config paths applied after file layers.
    pub runtime_paths: Vec<PathBuf>,
    /// Whether to apply process environment overrides last.
    pub use_env: bool,
}

impl LayeredConfigOptions {
    /// Create options with default layer locations for the provided cwd.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            user_config_path: layer_io::default_user_config_path(),
            runtime_paths: Vec::new(),
            use_env: true,
        }
    }

    /// Add a runtime override config path.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Skip the user layer.
    pub fn without_user_layer(mut self) -> Self {
        self.user_config_path = None;
        self
    }

    /// Skip environment overrides.
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }
}

impl RelayConfig {
    /// Load a single config from a path (no layering).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::parse_from_path(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Decode a single config file without validating it.
    ///
    /// Callers that apply further overrides must call [`RelayConfig::validate`]
    /// once they are done.
    pub fn parse_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        let value: Value = json5::from_str(&contents)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Load a single config from JSON5 contents (no layering).
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        config_from_value(value)
    }

    /// Load a layered config stack using the default layer locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        info!(
            "loading layered config with defaults (cwd={})",
            cwd.as_ref().display()
        );
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load a layered config stack using explicit layer locations.
    ///
    /// Layer precedence (low -> high): user, cwd, runtime overrides,
    /// environment.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let layered = Self::merge_layered_with_options(options)?;
        layered.config.validate()?;
        info!("layered config loaded (layers={})", layered.layers.len());
        Ok(layered)
    }

    /// Merge the layer stack like [`RelayConfig::load_layered_with_options`]
    /// but leave validation to the caller.
    pub fn merge_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let mut layers = Vec::new();
        let mut merged = Value::Object(serde_json::Map::new());
        let mut seen_paths = HashSet::new();

        let file_layers = [
            (ConfigLayerSource::User, options.user_config_path.clone()),
            (
                ConfigLayerSource::Cwd,
                Some(options.cwd.join(DEFAULT_CONFIG_FILE)),
            ),
        ];
        for (source, path) in file_layers {
            let Some(path) = path else { continue };
            if !seen_paths.insert(layer_io::unique_path(&path)) {
                debug!(
                    "skipping duplicate layer (source={:?}, path={})",
                    source,
                    path.display()
                );
                continue;
            }
            if let Some(value) = layer_io::load_optional_layer(source, &path)? {
                merge::merge_json_values(&mut merged, &value);
                layers.push(ConfigLayer {
                    source,
                    path: Some(path),
                });
            }
        }

        for runtime_path in &options.runtime_paths {
            let value = layer_io::load_required_layer(ConfigLayerSource::Runtime, runtime_path)?;
            merge::merge_json_values(&mut merged, &value);
            debug!("loaded runtime layer (path={})", runtime_path.display());
            layers.push(ConfigLayer {
                source: ConfigLayerSource::Runtime,
                path: Some(runtime_path.clone()),
            });
        }

        let mut config: RelayConfig = serde_json::from_value(merged)?;
        if options.use_env && config.apply_env_overrides()? > 0 {
            layers.push(ConfigLayer {
                source: ConfigLayerSource::Environment,
                path: None,
            });
        }
        Ok(LayeredConfig { config, layers })
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.backend == StoreBackend::Sqlite && self.store.path.trim().is_empty() {
            return Err(ConfigError::InvalidField {
                path: "store.path".to_string(),
                message: "sqlite backend requires a database path".to_string(),
            });
        }
        if self.cleanup.interval_secs == 0 {
            return Err(ConfigError::InvalidField {
                path: "cleanup.interval_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn config_from_value(value: Value) -> Result<RelayConfig, ConfigError> {
    let config: RelayConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
