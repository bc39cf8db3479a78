//! Toaster CLI, the main entry point.
//!
//! Commands:
//! - `onboard` writes a starter config file
//! - `run` starts the relay server and the bot event loop
//! - `models` lists the models the backend serves
//! - `config` validates, shows, or locates the configuration
//! - `doctor` diagnoses configuration and connectivity

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "toaster",
    about = "Toaster: an opinionated LLM chat bot for Open WebUI channels",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.toaster/config.toml)
    #[arg(short, long, global = true, env = "TOASTER_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter configuration file
    Onboard,

    /// Start the bot
    Run {
        /// Override the relay port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List models available on the backend
    Models,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose configuration and connectivity
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate the configuration
    Validate,
    /// Print the effective configuration (secrets redacted)
    Show,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli
        .config
        .unwrap_or_else(|| toaster_config::BotConfig::config_dir().join("config.toml"));

    match cli.command {
        Commands::Onboard => commands::onboard::run(&config_path).await?,
        Commands::Run { port } => commands::run::run(&config_path, port).await?,
        Commands::Models => commands::models::run(&config_path).await?,
        Commands::Config { action } => match action {
            ConfigAction::Validate => commands::config::validate(&config_path).await?,
            ConfigAction::Show => commands::config::show(&config_path).await?,
            ConfigAction::Path => commands::config::path(&config_path).await?,
        },
        Commands::Doctor => commands::doctor::run(&config_path).await?,
    }

    Ok(())
}
