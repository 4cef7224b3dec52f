pub mod check;
pub mod config;
pub mod init;
pub mod serve;
pub mod status;

use std::path::PathBuf;

use clap::Args;
use loopshare_smbd::SmbdConfig;

/// State directory override shared by commands that touch smbd state
#[derive(Debug, Args)]
pub struct StateDirArgs {
    /// Base directory for smb.conf and daemon state (overrides config)
    #[arg(long, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,
}

impl StateDirArgs {
    /// Apply the override to a loaded config
    pub fn apply(&self, config: SmbdConfig) -> SmbdConfig {
        match &self.state_dir {
            Some(dir) => config.with_state_dir(dir),
            None => config,
        }
    }
}
