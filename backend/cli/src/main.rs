mod doctor_cmd;
mod process_cmd;
mod watch_cmd;
mod wiring;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use paperforge_config::{config_file_path, load_with_warnings};
use paperforge_logging::{init_logger, LoggerGuard};
use paperforge_pipeline::{ensure_folders, Pipeline};

#[derive(Parser)]
#[command(name = "paperforge")]
#[command(about = "PaperForge: scanned-PDF intake with OCR, AI classification, and filing")]
#[command(version)]
struct Cli {
    /// YAML config file (overrides PAPERFORGE_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the inbox and process every PDF that lands in it
    Watch {
        /// Also process PDFs already in the inbox at startup
        #[arg(long)]
        sweep: bool,
    },
    /// Process the given PDFs once and exit
    Process {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Check configuration, folders, and external tools
    Doctor,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let env: HashMap<String, String> = std::env::vars().collect();
    let config_file = cli.config.clone().or_else(|| config_file_path(&env));

    match cli.command {
        Commands::Doctor => {
            if !doctor_cmd::run(&env, config_file.as_deref()).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Watch { sweep } => {
            let (pipeline, _guard) = startup(&env, config_file.as_deref()).await?;
            watch_cmd::run(&pipeline, sweep).await
        }
        Commands::Process { files } => {
            let (pipeline, _guard) = startup(&env, config_file.as_deref()).await?;
            process_cmd::run(&pipeline, &files).await
        }
    }
}

/// Load config, start logging, create folders, wire the pipeline.
async fn startup(
    env: &HashMap<String, String>,
    config_file: Option<&Path>,
) -> Result<(Pipeline, LoggerGuard)> {
    let (config, warnings) = load_with_warnings(env, config_file).await?;
    let guard = init_logger(config.logging.log_dir.as_deref(), &config.logging.level)?;

    for warning in &warnings {
        warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    info!(config = %config.redacted(), "Configuration loaded");

    ensure_folders(&config.folders).await?;
    let pipeline = wiring::build_pipeline(Arc::new(config))?;
    Ok((pipeline, guard))
}
