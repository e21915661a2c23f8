use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docs_qa::commands::{chat, configure, serve, show_status, update};
use docs_qa::config::{Config, get_config_dir};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docs-qa")]
#[command(about = "Question answering over a folder of documents")]
#[command(version)]
struct Cli {
    /// Configuration directory (defaults to ~/.docs-qa)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Address to bind, overriding the config file
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, overriding the config file
        #[arg(long)]
        port: Option<u16>,
    },
    /// Ask questions interactively in the terminal
    Chat,
    /// Clear the index and re-process the documents folder
    Update,
    /// Show configuration and backend health
    Status,
    /// Show the configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => get_config_dir().context("Failed to determine config directory")?,
    };

    if let Commands::Config { init } = cli.command {
        return configure(&config_dir, init);
    }

    let config = Config::load(&config_dir)?;

    match cli.command {
        Commands::Serve { host, port } => serve(config, host, port).await,
        Commands::Chat => chat(&config).await,
        Commands::Update => update(&config).await,
        Commands::Status => show_status(&config).await,
        Commands::Config { .. } => Ok(()),
    }
}
