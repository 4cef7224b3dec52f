//! The smbd command line and process launch.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::info;

use crate::config::OutputRelay;
use crate::error::{Error, Result};
use crate::relay::{self, Stream};

/// Everything needed to (re)launch smbd. Each launch gets fresh pipes.
#[derive(Debug, Clone)]
pub struct SmbdCommand {
    binary: PathBuf,
    config_path: PathBuf,
    port: u16,
    output: OutputRelay,
}

impl SmbdCommand {
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>, config_path: impl Into<PathBuf>, port: u16) -> Self {
        Self {
            binary: binary.into(),
            config_path: config_path.into(),
            port,
            output: OutputRelay::default(),
        }
    }

    #[must_use]
    pub fn with_output(mut self, output: OutputRelay) -> Self {
        self.output = output;
        self
    }

    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Arguments passed to smbd: run in the foreground, in our process group,
    /// logging to stdout.
    #[must_use]
    pub fn args(&self) -> Vec<OsString> {
        let mut configfile = OsString::from("--configfile=");
        configfile.push(&self.config_path);

        vec![
            configfile,
            format!("--port={}", self.port).into(),
            "--foreground".into(),
            "--no-process-group".into(),
            "--debug-stdout".into(),
        ]
    }

    /// Launch smbd and start relaying its output.
    ///
    /// The child is killed if its handle is dropped. Must be called from
    /// within a tokio runtime.
    pub(crate) fn spawn(&self) -> Result<Child> {
        let mut child = Command::new(&self.binary)
            .args(self.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if let Some(stdout) = child.stdout.take() {
            relay::spawn(stdout, Stream::Stdout, self.output);
        }
        if let Some(stderr) = child.stderr.take() {
            relay::spawn(stderr, Stream::Stderr, self.output);
        }

        info!(
            pid = child.id(),
            port = self.port,
            binary = %self.binary.display(),
            "Launched smbd"
        );
        Ok(child)
    }
}
