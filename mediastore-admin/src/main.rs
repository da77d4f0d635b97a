use anyhow::Result;
use clap::{Parser, Subcommand};
use mediastore_core::{init_logging, StoreConfig};
use std::path::PathBuf;
use tracing::{debug, error};

mod commands;

use commands::*;

#[derive(Parser)]
#[command(name = "mediastore-admin")]
#[command(about = "Media content query tool")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "mediastore.toml", env = "MEDIASTORE_CONFIG")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List queryable attributes
    Attributes,
    #[command(flatten)]
    Query(QueryCommands),
    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = StoreConfig::load(&cli.config)?;

    let mut logging = config.logging_config();
    if cli.verbose {
        logging.level = "DEBUG".to_string();
    }
    init_logging(&logging)?;

    debug!(config = %cli.config.display(), "mediastore-admin starting");

    let result = match cli.command {
        Commands::Attributes => execute_attributes_command(),
        Commands::Query(action) => execute_query_command(&config, action),
        Commands::Config { action } => execute_config_command(&config, &cli.config, action),
    };

    if let Err(e) = &result {
        error!("Command failed: {:#}", e);
    }
    result
}
