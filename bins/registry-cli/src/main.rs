//! Component Registry CLI
//!
//! Loads a component manifest and drives it through the lifecycle registry:
//! - `order`  print the resolved initialization order
//! - `check`  report unregistered dependencies and cycles
//! - `run`    initialize, start and stop every component, printing states

mod manifest;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use component_registry::{ComponentRegistry, LifecycleEvent, RegistryError};
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::manifest::Manifest;
use crate::output::{render_order, render_states, state_rows};

#[derive(Parser, Debug)]
#[command(name = "component-registry")]
#[command(about = "Resolve and drive component lifecycles from a manifest")]
struct Cli {
    /// Path to the component manifest
    #[arg(short, long, env = "COMPONENT_MANIFEST", default_value = "components.toml")]
    manifest: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print machine-readable JSON instead of tables
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the dependency-resolved initialization order
    Order,
    /// Report unregistered dependencies and dependency cycles
    Check,
    /// Initialize, start and then stop every component
    Run {
        /// Also run destroy hooks after stopping
        #[arg(long)]
        shutdown: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let manifest = Manifest::load(&cli.manifest)?;
    info!(
        manifest = %cli.manifest.display(),
        components = manifest.components.len(),
        "Loaded component manifest"
    );

    match cli.command {
        Commands::Order => cmd_order(&manifest, cli.json),
        Commands::Check => cmd_check(&manifest, cli.json),
        Commands::Run { shutdown } => cmd_run(&manifest, cli.json, shutdown).await,
    }
}

// ==================== Subcommand Handlers ====================

fn cmd_order(manifest: &Manifest, json: bool) -> Result<()> {
    let registry = manifest.build_registry()?;
    let order = registry.resolve_order()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&order)?);
    } else {
        println!("{}", render_order(&order));
    }
    Ok(())
}

fn cmd_check(manifest: &Manifest, json: bool) -> Result<()> {
    let registry = manifest.build_registry()?;
    let missing = registry.missing_dependencies();
    let cycle = match registry.resolve_order() {
        Ok(_) => None,
        Err(RegistryError::CircularDependency { cycle }) => Some(cycle),
        Err(e) => return Err(e.into()),
    };

    if json {
        let report = serde_json::json!({
            "missing_dependencies": missing
                .iter()
                .map(|(name, deps)| serde_json::json!({ "component": name, "missing": deps }))
                .collect::<Vec<_>>(),
            "cycle": cycle,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (name, deps) in &missing {
            println!("{} depends on unregistered: {}", name, deps.join(", "));
        }
        if let Some(cycle) = &cycle {
            println!("Dependency cycle: {}", cycle.join(" -> "));
        }
        if missing.is_empty() && cycle.is_none() {
            println!("All {} components resolve cleanly", registry.count());
        }
    }

    if !missing.is_empty() || cycle.is_some() {
        anyhow::bail!("Manifest has unresolved dependencies");
    }
    Ok(())
}

async fn cmd_run(manifest: &Manifest, json: bool, shutdown: bool) -> Result<()> {
    let registry = manifest.build_registry()?;
    registry.on_event(|event| {
        if let LifecycleEvent::StateChanged {
            name,
            old_state,
            new_state,
        } = event
        {
            debug!(component = %name, from = %old_state, to = %new_state, "State changed");
        }
    });

    let result = drive(&registry, shutdown).await;
    if let Err(e) = &result {
        error!(error = %e, "Lifecycle run halted");
    }

    print_states(&registry, json)?;
    result
}

async fn drive(registry: &ComponentRegistry, shutdown: bool) -> Result<()> {
    let order = registry
        .initialize_all()
        .await
        .context("Initialization failed")?;
    info!(order = ?order, "All components initialized");

    registry.start_all().await.context("Start failed")?;
    info!("All components running");

    if shutdown {
        registry.shutdown().await.context("Shutdown failed")?;
    } else {
        registry.stop_all().await.context("Stop failed")?;
    }
    info!("All components stopped");
    Ok(())
}

fn print_states(registry: &ComponentRegistry, json: bool) -> Result<()> {
    let rows = state_rows(registry);
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("{}", render_states(&rows));
    }
    Ok(())
}
