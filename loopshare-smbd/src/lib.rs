//! Provisioning and supervision of a loopback smbd.
//!
//! This crate never speaks SMB. It prepares a Samba state directory, writes a
//! minimal `smb.conf` on first run, and keeps an `smbd` subprocess running on
//! an ephemeral loopback port so a host application can expose files over SMB.
//!
//! # Key Types
//!
//! - [`SmbdServer`] - Starts smbd and relaunches it whenever it exits
//! - [`SmbdConfig`] - State directory, binary path, restart and output options
//! - [`SmbConf`] / [`ensure_config`] - First-run bootstrap of the state tree
//! - [`RestartPolicy`] - Backoff and optional restart budget

pub mod bootstrap;
pub mod command;
pub mod config;
pub mod directories;
pub mod error;
pub mod lock;
pub mod manager;
pub mod port;
pub mod preflight;
mod relay;
pub mod restart;

// Re-exports
pub use bootstrap::{SmbConf, ensure_config};
pub use command::SmbdCommand;
pub use config::{OutputRelay, SMB_CONF_FILE, SmbdConfig};
pub use directories::{DIRECTORY_SETTINGS, DirectorySetting};
pub use error::{Error, Result};
pub use lock::StateLock;
pub use manager::{SmbdServer, SmbdState};
pub use port::reserve_port;
pub use preflight::{PreflightResult, check_binary, check_nofile_limit, run_preflight_checks};
pub use restart::{Backoff, RestartPolicy};
