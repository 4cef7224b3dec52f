//! Supervisor state file management
//!
//! A running `loopshare serve` records its PID and the smbd port in
//! `<state_dir>/supervisor.json` so other processes can find the daemon.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const STATE_FILE: &str = "supervisor.json";

/// State of a running supervisor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupervisorState {
    /// Process ID of the supervisor
    pub pid: u32,
    /// Loopback port smbd was started on
    pub port: u16,
    /// When the supervisor was started
    pub started_at: DateTime<Utc>,
}

impl SupervisorState {
    /// Create a new supervisor state for the current process
    pub fn new(port: u16) -> Self {
        Self {
            pid: std::process::id(),
            port,
            started_at: Utc::now(),
        }
    }
}

/// Get the path to the supervisor state file
pub fn state_file_path(state_dir: &Path) -> PathBuf {
    state_dir.join(STATE_FILE)
}

/// Read the supervisor state from the state file
///
/// Returns None if the file doesn't exist or is invalid JSON
pub fn read_supervisor_state(state_dir: &Path) -> Option<SupervisorState> {
    let content = fs::read_to_string(state_file_path(state_dir)).ok()?;
    serde_json::from_str(&content).ok()
}

/// Write the supervisor state to the state file
pub fn write_supervisor_state(state_dir: &Path, state: &SupervisorState) -> io::Result<()> {
    let content = serde_json::to_string_pretty(state)?;
    fs::write(state_file_path(state_dir), content)
}

/// Clear the supervisor state file
///
/// Removes the state file if it exists
pub fn clear_supervisor_state(state_dir: &Path) -> io::Result<()> {
    match fs::remove_file(state_file_path(state_dir)) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        result => result,
    }
}

/// Check if a process is still alive
///
/// Uses kill(pid, 0) on Unix to check if the process exists
#[cfg(unix)]
pub fn is_process_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: kill with signal 0 only checks if process exists, doesn't send a signal
    unsafe { libc::kill(pid, 0) == 0 }
}

/// Check if a process is still alive (non-Unix)
#[cfg(not(unix))]
pub fn is_process_alive(_pid: u32) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_supervisor_state_new() {
        let state = SupervisorState::new(44445);
        assert_eq!(state.port, 44445);
        assert_eq!(state.pid, std::process::id());
    }

    #[test]
    fn test_state_file_lives_in_state_dir() {
        let path = state_file_path(Path::new("/var/lib/loopshare"));
        assert_eq!(path, PathBuf::from("/var/lib/loopshare/supervisor.json"));
    }

    #[test]
    fn test_write_and_read_supervisor_state() {
        let temp = tempdir().unwrap();
        let state = SupervisorState::new(44445);

        write_supervisor_state(temp.path(), &state).unwrap();
        let read = read_supervisor_state(temp.path()).unwrap();

        assert_eq!(read, state);
    }

    #[test]
    fn test_read_missing_state_returns_none() {
        let temp = tempdir().unwrap();
        assert!(read_supervisor_state(temp.path()).is_none());
    }

    #[test]
    fn test_read_garbage_state_returns_none() {
        let temp = tempdir().unwrap();
        fs::write(state_file_path(temp.path()), "not json").unwrap();
        assert!(read_supervisor_state(temp.path()).is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let temp = tempdir().unwrap();
        write_supervisor_state(temp.path(), &SupervisorState::new(1)).unwrap();

        clear_supervisor_state(temp.path()).unwrap();
        clear_supervisor_state(temp.path()).unwrap();

        assert!(!state_file_path(temp.path()).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_is_process_alive_current_process() {
        assert!(is_process_alive(std::process::id()));
    }

    #[cfg(unix)]
    #[test]
    fn test_is_process_alive_nonexistent_process() {
        // PID 999999 is unlikely to exist
        assert!(!is_process_alive(999_999));
    }
}
