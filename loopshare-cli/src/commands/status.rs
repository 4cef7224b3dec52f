//! `loopshare status`: report the supervisor recorded in a state directory

use std::path::Path;

use anyhow::Result;
use clap::Args;

use super::StateDirArgs;
use crate::config::ConfigLoader;
use crate::supervisor::{
    SupervisorState, clear_supervisor_state, is_process_alive, read_supervisor_state,
    state_file_path,
};

/// Arguments for the status command
#[derive(Debug, Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub state: StateDirArgs,
}

/// What the state file says about a supervisor
#[derive(Debug, PartialEq)]
enum Status {
    Running(SupervisorState),
    Stale(SupervisorState),
    NotRunning,
}

/// Run the status command
pub fn run(args: StatusArgs) -> Result<()> {
    let config = args.state.apply(ConfigLoader::load()?.smbd);

    match status(&config.state_dir) {
        Status::Running(state) => {
            let uptime = chrono::Utc::now() - state.started_at;
            println!("loopshare is running");
            println!("  PID:     {}", state.pid);
            println!("  Port:    {}", state.port);
            println!("  Uptime:  {}s", uptime.num_seconds());
        }
        Status::Stale(state) => {
            println!(
                "loopshare is not running (stale state file for PID {})",
                state.pid
            );
            // Clean up stale state file
            clear_supervisor_state(&config.state_dir)?;
        }
        Status::NotRunning => {
            println!(
                "loopshare is not running (no {})",
                state_file_path(&config.state_dir).display()
            );
        }
    }
    Ok(())
}

fn status(state_dir: &Path) -> Status {
    match read_supervisor_state(state_dir) {
        Some(state) if is_process_alive(state.pid) => Status::Running(state),
        Some(state) => Status::Stale(state),
        None => Status::NotRunning,
    }
}
