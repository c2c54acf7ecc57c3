//! projsetup - Main entry point
//!
//! Each setup command reports success or failure through the log only; the
//! process exit code reflects argument and configuration problems, not the
//! outcome of the setup steps.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use projsetup::cli::{Cli, Commands, PrefsCommands};
use projsetup::{HostEnvironment, LocalOrchestrator, PreferenceSource, Preferences, SetupConfig};

/// Initialize the logger with appropriate settings
fn init_logger() {
    // RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logger();

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed: {:?}", cli);

    let prefs_path = match cli.prefs.clone() {
        Some(path) => path,
        None => Preferences::default_path()?,
    };

    match &cli.command {
        Commands::InitConfig { path } => {
            SetupConfig::default().save_to_file(path)?;
            info!("Wrote default setup plan to {}", path.display());
            return Ok(());
        }
        Commands::Prefs { action } => return run_prefs_command(action, &prefs_path),
        _ => {}
    }

    let project_root = match &cli.project {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    let config = load_config(cli.config.as_deref())?;
    let host = HostEnvironment::detect()?;
    let mut orchestrator = LocalOrchestrator::for_project(
        &project_root,
        config,
        host,
        PreferenceSource::File(prefs_path),
    );

    info!("Project root: {}", project_root.display());

    // Single-threaded: the install queue yields between polls instead of blocking
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start async runtime")?;

    match cli.command {
        Commands::ImportAssets => {
            if let Err(e) = orchestrator.import_assets() {
                error!("{}", e);
            }
        }
        Commands::InstallPackages => {
            runtime.block_on(orchestrator.install_packages());
        }
        Commands::CreateFolders => {
            if let Err(e) = orchestrator.create_folders() {
                error!("Folder setup failed: {}", e);
            }
        }
        Commands::All => {
            if let Err(e) = runtime.block_on(orchestrator.run_all()) {
                error!("Setup failed: {}", e);
            }
        }
        Commands::InitConfig { .. } | Commands::Prefs { .. } => {}
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SetupConfig> {
    let config = match path {
        Some(path) => {
            info!("Loading setup plan from {}", path.display());
            SetupConfig::load_from_file(path)?
        }
        None => SetupConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn run_prefs_command(action: &PrefsCommands, prefs_path: &Path) -> Result<()> {
    let mut prefs = Preferences::load(prefs_path)?;

    match action {
        PrefsCommands::Get { key } => match prefs.get(key) {
            Some(value) => println!("{value}"),
            None => info!("{} is not set", key),
        },
        PrefsCommands::Set { key, value } => {
            prefs.set(key.clone(), value.clone());
            prefs.save(prefs_path)?;
            info!("Set {} = {}", key, value);
        }
        PrefsCommands::Unset { key } => {
            if prefs.remove(key).is_some() {
                prefs.save(prefs_path)?;
                info!("Removed {}", key);
            } else {
                info!("{} was not set", key);
            }
        }
    }

    Ok(())
}
