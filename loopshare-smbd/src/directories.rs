//! State directories smbd needs, and the smb.conf setting naming each one.

use std::path::{Path, PathBuf};

/// One smb.conf directory setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectorySetting {
    /// smb.conf parameter name.
    pub setting: &'static str,
    /// Path relative to the state directory. Empty means the state directory itself.
    pub relative_path: &'static str,
    /// Unix permission bits applied on creation.
    pub mode: u32,
}

impl DirectorySetting {
    /// Absolute location of this directory under `state_dir`.
    #[must_use]
    pub fn resolve(&self, state_dir: &Path) -> PathBuf {
        if self.relative_path.is_empty() {
            state_dir.to_path_buf()
        } else {
            state_dir.join(self.relative_path)
        }
    }
}

const fn dir(setting: &'static str, relative_path: &'static str) -> DirectorySetting {
    DirectorySetting {
        setting,
        relative_path,
        mode: 0o755,
    }
}

/// Every directory smbd is told about, in smb.conf order.
///
/// `lock directory` and `private dir` share a path.
pub static DIRECTORY_SETTINGS: [DirectorySetting; 11] = [
    dir("state directory", ""),
    dir("log file", "log"),
    dir("pid directory", "pid"),
    dir("lock directory", "private"),
    dir("private dir", "private"),
    dir("binddns dir", "bind-dns"),
    dir("cache directory", "cache"),
    dir("ncalrpc dir", "ncalrpc"),
    dir("ntp signed socket directory", "ntp_signd"),
    dir("usershare path", "usershares"),
    dir("winbindd socket directory", "winbindd"),
];
