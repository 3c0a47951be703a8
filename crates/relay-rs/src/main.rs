//! Operator CLI for inspecting and maintaining the call context store.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use relay_rs::config::{LayeredConfigOptions, RelayConfig, StoreBackend};
use relay_rs::context::handoff::TRIAGE_STAGE;
use relay_rs::context::{
    CallerDetails, ContextManager, IntakeOutcome, record_intake, resume_for_stage,
};
use relay_rs::{
    CliOverrides, ConfigSource, init_logging, open_context_manager, resolve_config,
    start_cleanup,
};
use std::path::PathBuf;

/// Command-line options for the relay CLI.
#[derive(Debug, Parser)]
#[command(name = "relay", version, about = "Call context store tooling")]
struct Cli {
    /// Config file to load instead of the layered defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Storage backend override
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,
    /// SQLite database path override
    #[arg(long)]
    db_path: Option<String>,
    /// Record TTL override in hours
    #[arg(long)]
    ttl_hours: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Memory,
    Sqlite,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record intake details for a call
    Save {
        call_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        need: Option<String>,
        #[arg(long)]
        info: Option<String>,
        /// Stage tag written to the path
        #[arg(long, default_value = TRIAGE_STAGE)]
        stage: String,
    },
    /// Print the context for a call
    Show {
        call_id: String,
        /// Print the full record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resume a call from a later stage, tagging the path
    Resume {
        call_id: String,
        #[arg(long)]
        stage: String,
    },
    /// Delete the context for a call
    Delete { call_id: String },
    /// Remove expired contexts once
    Sweep,
    /// Run the periodic cleanup task until interrupted
    Watch,
}

/// Entry point for the relay CLI.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let manager = open_context_manager(&config.store).context("failed to open context store")?;

    match cli.command {
        Command::Save {
            call_id,
            name,
            need,
            info,
            stage,
        } => {
            let details = CallerDetails {
                customer_name: name,
                need_type: need,
                basic_info: info,
            };
            match record_intake(&manager, Some(&call_id), details, &stage) {
                IntakeOutcome::Saved => println!("saved context for {call_id}"),
                IntakeOutcome::NotSaved => bail!("failed to save context for {call_id}"),
                IntakeOutcome::MissingCallId => bail!("call id must not be empty"),
            }
        }
        Command::Show { call_id, json } => match manager.get(&call_id) {
            Some(record) if json => println!("{}", record.to_json()?),
            Some(record) => {
                println!("{}", record.summary());
                println!("Path: {}", record.agent_path.join(" -> "));
            }
            None => println!("no context for {call_id}"),
        },
        Command::Resume { call_id, stage } => {
            match resume_for_stage(&manager, Some(&call_id), &stage) {
                Some(record) => println!("{}", record.summary()),
                None => println!("no context for {call_id}"),
            }
        }
        Command::Delete { call_id } => {
            if !manager.delete(&call_id) {
                bail!("failed to delete context for {call_id}");
            }
            println!("deleted context for {call_id}");
        }
        Command::Sweep => {
            let removed = manager.cleanup_expired();
            println!("removed {removed} expired contexts");
        }
        Command::Watch => watch(&manager, &config).await?,
    }
    Ok(())
}

/// Resolve config: file or layered defaults, then env, then CLI flags.
fn load_config(cli: &Cli) -> anyhow::Result<RelayConfig> {
    let source = match cli.config.as_ref() {
        Some(path) => ConfigSource::File(path.clone()),
        None => {
            let cwd = std::env::current_dir().context("cwd")?;
            ConfigSource::Layered(LayeredConfigOptions::new(cwd))
        }
    };
    let overrides = CliOverrides {
        backend: cli.backend.map(|backend| match backend {
            BackendArg::Memory => StoreBackend::Memory,
            BackendArg::Sqlite => StoreBackend::Sqlite,
        }),
        db_path: cli.db_path.clone(),
        ttl_hours: cli.ttl_hours,
    };
    resolve_config(source, &overrides).context("failed to load config")
}

async fn watch(manager: &ContextManager, config: &RelayConfig) -> anyhow::Result<()> {
    let Some(task) = start_cleanup(manager, &config.cleanup) else {
        bail!("cleanup is disabled in config");
    };
    info!("watching for expired contexts; press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    task.stop().await.context("cleanup task failed")?;
    Ok(())
}
