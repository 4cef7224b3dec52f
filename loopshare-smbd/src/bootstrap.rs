//! First-run smb.conf generation.
//!
//! The configuration file doubles as the "already bootstrapped" marker: once it
//! exists nothing here touches the state tree again, even if
//! [`DIRECTORY_SETTINGS`] has changed since it was written. Delete the file to
//! regenerate it.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::LOOPBACK_HOST;
use crate::directories::{DIRECTORY_SETTINGS, DirectorySetting};
use crate::error::{Error, Result};

const DEFAULT_LOG_LEVEL: u8 = 5;

/// Renders the `[global]` section of smb.conf for a state directory.
#[derive(Debug, Clone)]
pub struct SmbConf {
    state_dir: PathBuf,
    log_level: u8,
}

impl SmbConf {
    /// smb.conf for `state_dir` with the default log level.
    #[must_use]
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            log_level: DEFAULT_LOG_LEVEL,
        }
    }

    #[must_use]
    pub fn with_log_level(mut self, log_level: u8) -> Self {
        self.log_level = log_level;
        self
    }

    /// Directory settings paired with their absolute paths, in file order.
    pub fn directories(&self) -> impl Iterator<Item = (&'static DirectorySetting, PathBuf)> + '_ {
        DIRECTORY_SETTINGS
            .iter()
            .map(|d| (d, d.resolve(&self.state_dir)))
    }

    /// Create the state tree and write smb.conf to `config_path`, unless a
    /// file is already there.
    ///
    /// Returns `true` if this call generated the file.
    pub fn ensure(&self, config_path: &Path) -> Result<bool> {
        match fs::metadata(config_path) {
            Ok(_) => {
                debug!(path = %config_path.display(), "smb.conf exists, skipping bootstrap");
                return Ok(false);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(Error::StatConfig {
                    path: config_path.to_path_buf(),
                    source,
                });
            }
        }

        for (setting, path) in self.directories() {
            create_dir(&path, setting.mode).map_err(|source| Error::CreateDir {
                path: path.clone(),
                source,
            })?;
        }

        self.write_new(config_path)
            .map_err(|source| Error::WriteConfig {
                path: config_path.to_path_buf(),
                source,
            })?;

        info!(
            path = %config_path.display(),
            directories = DIRECTORY_SETTINGS.len(),
            "Generated smb.conf"
        );
        Ok(true)
    }

    fn write_new(&self, config_path: &Path) -> io::Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(config_path)?;

        let mut writer = BufWriter::new(file);
        let written = write!(writer, "{self}").and_then(|()| writer.flush());
        if written.is_err() {
            // A truncated file would be taken as a finished bootstrap next time.
            drop(writer);
            let _ = fs::remove_file(config_path);
        }
        written
    }
}

impl fmt::Display for SmbConf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[global]")?;
        writeln!(f, "\tserver role = standalone server")?;
        writeln!(f, "\tinterfaces = {LOOPBACK_HOST}")?;
        writeln!(f, "\tregistry shares = no")?;
        writeln!(f, "\tconfig backend = file")?;
        writeln!(f, "\tlog level = {}", self.log_level)?;
        for (setting, path) in self.directories() {
            writeln!(f, "\t{} = {}", setting.setting, path.display())?;
        }
        Ok(())
    }
}

/// Ensure smb.conf exists at `config_path`, bootstrapping `state_dir` on first run.
///
/// Returns `true` if the file was generated by this call.
///
/// # Errors
///
/// [`Error::StatConfig`] if the existence check fails for a reason other than
/// absence, [`Error::CreateDir`] naming the first directory that could not be
/// created, [`Error::WriteConfig`] if the file cannot be written.
pub fn ensure_config(state_dir: &Path, config_path: &Path) -> Result<bool> {
    SmbConf::new(state_dir).ensure(config_path)
}

/// Create the state directory without touching the mode of an existing one.
#[cfg(unix)]
pub(crate) fn create_state_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new().recursive(true).mode(0o755).create(path)
}

#[cfg(not(unix))]
pub(crate) fn create_state_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

#[cfg(unix)]
pub(crate) fn create_dir(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

    fs::DirBuilder::new().recursive(true).mode(mode).create(path)?;
    // DirBuilder::mode is filtered through the umask.
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
pub(crate) fn create_dir(path: &Path, _mode: u32) -> io::Result<()> {
    fs::create_dir_all(path)
}
