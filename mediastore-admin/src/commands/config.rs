use anyhow::{bail, Result};
use clap::Subcommand;
use mediastore_core::StoreConfig;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Output path (defaults to the --config path)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the configuration file
    Validate,
}

pub fn execute_config_command(config: &StoreConfig, config_path: &Path, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            println!("# {}", config_path.display());
            print!("{}", config.to_toml()?);
        }

        ConfigCommands::Init { output, force } => {
            let path = output.unwrap_or_else(|| config_path.to_path_buf());
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            StoreConfig::default().save(&path)?;
            println!("✓ Wrote default configuration to {}", path.display());
        }

        ConfigCommands::Validate => {
            config.validate()?;
            println!("✓ {} is valid", config_path.display());
        }
    }

    Ok(())
}
