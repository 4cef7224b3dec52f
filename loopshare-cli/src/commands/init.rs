//! `loopshare init`: bootstrap the state directory without starting smbd

use anyhow::{Context, Result};
use clap::Args;
use loopshare_smbd::SmbConf;

use super::StateDirArgs;
use crate::config::ConfigLoader;

/// Arguments for the init command
#[derive(Debug, Args)]
pub struct InitArgs {
    #[command(flatten)]
    pub state: StateDirArgs,
}

/// Run the init command
pub fn run(args: InitArgs) -> Result<()> {
    let config = args.state.apply(ConfigLoader::load()?.smbd);
    let path = config.smb_conf_path();

    let created = SmbConf::new(&config.state_dir)
        .with_log_level(config.log_level)
        .ensure(&path)
        .context("Failed to bootstrap smbd state")?;

    if created {
        println!("Created {}", path.display());
    } else {
        println!("{} already exists, left unchanged", path.display());
    }
    Ok(())
}
