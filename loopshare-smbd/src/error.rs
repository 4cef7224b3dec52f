//! Error types for SMB daemon provisioning and supervision.

use std::path::PathBuf;
use std::time::Duration;

/// Error type for smbd bootstrap and supervisor operations.
///
/// Every variant is produced on the startup path. Failures of the daemon
/// after it has been launched are logged and retried, never returned.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A state directory could not be created.
    #[error("create {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Checking for an existing smb.conf failed for a reason other than absence.
    #[error("check {} exists: {source}", path.display())]
    StatConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The generated smb.conf could not be created or written.
    #[error("write {}: {source}", path.display())]
    WriteConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Binding the loopback listener used to pick a port failed.
    #[error("listen: {0}")]
    Listen(#[source] std::io::Error),

    /// The smbd executable could not be launched.
    #[error("spawn {}: {source}", binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another supervisor already owns this state directory.
    #[error("state directory {} is in use by another supervisor", path.display())]
    StateDirLocked { path: PathBuf },

    /// The state directory lock file could not be opened or locked.
    #[error("lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// smbd did not accept connections within the allotted time.
    #[error("smbd on port {port} not ready within {timeout:?}")]
    NotReady { port: u16, timeout: Duration },

    /// A preflight check failed.
    #[error("{0}")]
    Preflight(String),
}

/// Result type alias for smbd operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_dir_error_names_the_path() {
        let err = Error::CreateDir {
            path: PathBuf::from("/state/log"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().starts_with("create /state/log: "));
    }

    #[test]
    fn spawn_error_keeps_source() {
        let err = Error::Spawn {
            binary: PathBuf::from("/usr/sbin/smbd"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let source = std::error::Error::source(&err).expect("source");
        assert!(source.to_string().contains("not found"));
    }
}
