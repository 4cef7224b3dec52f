//! `loopshare config`: inspect the layered configuration

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::config::ConfigLoader;

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the merged configuration as TOML
    Show,
    /// List the config files that are read, and the smbd state paths
    Path,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show(),
        ConfigCommands::Path => paths(),
    }
}

fn show() -> Result<()> {
    let config = ConfigLoader::load()?;
    let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;
    print!("{rendered}");
    Ok(())
}

fn paths() -> Result<()> {
    let smbd = ConfigLoader::load()?.smbd;

    println!("User config:    {}", describe(&ConfigLoader::user_config_path()));
    println!("Project config: {}", describe(&ConfigLoader::project_config_path()));
    println!("State dir:      {}", smbd.state_dir.display());
    println!("smb.conf:       {}", describe(&smbd.smb_conf_path()));
    Ok(())
}

fn describe(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (missing)", path.display())
    }
}
