//! Public surface for relay.
//!
//! Re-exports the context store and config crates and maps configuration
//! onto a concrete store so callers never branch on the backend.

/// Re-export for convenience.
pub use relay_rs_config as config;
/// Re-export for convenience.
pub use relay_rs_context as context;

mod overrides;
mod store;

pub use overrides::{
    CliOverrides, ConfigSource, apply_cli_overrides, resolve_config, resolve_config_with,
};
pub use store::{open_context_manager, selection_from_config, start_cleanup};

/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// Honours `RUST_LOG`; timestamps carry milliseconds. A no-op without the
/// feature or when a logger is already installed.
#[inline]
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}
