//! Config to store mapping.

use log::info;
use relay_rs_config::{CleanupConfig, StoreBackend, StoreConfig};
use relay_rs_context::expiry::hours_to_duration;
use relay_rs_context::{
    CleanupTask, ContextError, ContextManager, StoreSelection, spawn_cleanup_task,
};
use std::time::Duration;

/// Translate store config into a backend selection.
pub fn selection_from_config(config: &StoreConfig) -> StoreSelection {
    StoreSelection::from_flag(
        config.backend == StoreBackend::Sqlite,
        config.path.as_str(),
        config.ttl_hours.map(hours_to_duration),
    )
}

/// Open the configured context store behind the facade.
pub fn open_context_manager(config: &StoreConfig) -> Result<ContextManager, ContextError> {
    let selection = selection_from_config(config);
    let ttl_hours = selection.ttl().num_hours();
    let manager = ContextManager::open(selection)?;
    info!("context storage: {} (ttl_hours={ttl_hours})", manager.kind());
    Ok(manager)
}

/// Start the periodic sweep when enabled. Requires a tokio runtime.
pub fn start_cleanup(manager: &ContextManager, config: &CleanupConfig) -> Option<CleanupTask> {
    if !config.enabled {
        info!("context cleanup task disabled");
        return None;
    }
    Some(spawn_cleanup_task(
        manager.clone(),
        Duration::from_secs(config.interval_secs),
    ))
}

#[cfg(test)]
mod tests {
    use super::selection_from_config;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use relay_rs_config::{StoreBackend, StoreConfig};
    use relay_rs_context::StoreSelection;
    use std::path::PathBuf;

    #[test]
    fn memory_config_maps_to_in_memory_selection() {
        let selection = selection_from_config(&StoreConfig::default());
        assert_eq!(
            selection,
            StoreSelection::InMemory {
                ttl: Duration::hours(1)
            }
        );
    }

    #[test]
    fn sqlite_config_without_ttl_uses_durable_default() {
        let config = StoreConfig {
            backend: StoreBackend::Sqlite,
            ..StoreConfig::default()
        };
        assert_eq!(
            selection_from_config(&config),
            StoreSelection::Sqlite {
                path: PathBuf::from("relay_context.db"),
                ttl: Duration::hours(24)
            }
        );
    }

    #[test]
    fn sqlite_config_maps_path_and_ttl() {
        let config = StoreConfig {
            backend: StoreBackend::Sqlite,
            path: "data/ctx.db".to_string(),
            ttl_hours: Some(6),
        };
        assert_eq!(
            selection_from_config(&config),
            StoreSelection::Sqlite {
                path: PathBuf::from("data/ctx.db"),
                ttl: Duration::hours(6)
            }
        );
    }
}
