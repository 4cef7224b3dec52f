//! Configuration for the smbd supervisor.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::restart::RestartPolicy;

/// File name of the generated daemon configuration inside the state directory.
pub const SMB_CONF_FILE: &str = "smb.conf";

/// Loopback address smbd is bound to.
pub const LOOPBACK_HOST: &str = "127.0.0.1";

/// Where the daemon's stdout and stderr go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputRelay {
    /// Copy raw bytes to this process's stdout and stderr.
    #[default]
    Passthrough,
    /// Emit each line as a tracing event under the `smbd` target.
    Tracing,
}

/// Configuration for the smbd subprocess and its supervisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmbdConfig {
    /// Path to the smbd binary.
    #[serde(default = "default_binary_path")]
    pub binary_path: PathBuf,

    /// Base directory for smb.conf and all daemon state.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Value written to `log level` in the generated smb.conf.
    #[serde(default = "default_log_level")]
    pub log_level: u8,

    /// How the daemon's output is relayed.
    #[serde(default)]
    pub output: OutputRelay,

    /// Restart behaviour after the daemon exits.
    #[serde(default)]
    pub restart: RestartPolicy,
}

fn default_binary_path() -> PathBuf {
    PathBuf::from("smbd")
}

fn default_state_dir() -> PathBuf {
    loopshare_paths::state_dir().join("smb")
}

fn default_log_level() -> u8 {
    5
}

impl Default for SmbdConfig {
    fn default() -> Self {
        Self {
            binary_path: default_binary_path(),
            state_dir: default_state_dir(),
            log_level: default_log_level(),
            output: OutputRelay::default(),
            restart: RestartPolicy::default(),
        }
    }
}

impl SmbdConfig {
    /// Create a new config with a custom binary path.
    #[must_use]
    pub fn with_binary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = path.into();
        self
    }

    /// Create a new config with a custom state directory.
    #[must_use]
    pub fn with_state_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_dir = path.into();
        self
    }

    /// Create a new config with a custom smb.conf log level.
    #[must_use]
    pub fn with_log_level(mut self, level: u8) -> Self {
        self.log_level = level;
        self
    }

    /// Create a new config with a custom output relay.
    #[must_use]
    pub fn with_output(mut self, output: OutputRelay) -> Self {
        self.output = output;
        self
    }

    /// Create a new config with a custom restart policy.
    #[must_use]
    pub fn with_restart(mut self, restart: RestartPolicy) -> Self {
        self.restart = restart;
        self
    }

    /// Path of the generated smb.conf.
    #[must_use]
    pub fn smb_conf_path(&self) -> PathBuf {
        self.state_dir.join(SMB_CONF_FILE)
    }

    /// Resolve the smbd binary, searching `PATH` for bare names.
    #[must_use]
    pub fn find_binary(&self) -> Option<PathBuf> {
        find_executable(&self.binary_path)
    }
}

fn find_executable(path: &Path) -> Option<PathBuf> {
    if path.components().count() > 1 {
        return path.is_file().then(|| path.to_path_buf());
    }
    which::which(path).ok()
}
