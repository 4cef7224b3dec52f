//! XDG Base Directory paths for loopshare.
//!
//! The supervisor keeps its own settings under the config directory and
//! everything the SMB daemon writes (logs, locks, sockets, caches) under the
//! state directory. Both follow XDG on every platform.

use std::path::PathBuf;

const APP_NAME: &str = "loopshare";

/// Get the loopshare config directory.
///
/// Returns `$XDG_CONFIG_HOME/loopshare` if set, otherwise `~/.config/loopshare`.
///
/// # Examples
///
/// ```
/// use loopshare_paths::config_dir;
///
/// let config = config_dir();
/// let user_config = config.join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

/// Get the loopshare state directory.
///
/// Returns `$XDG_STATE_HOME/loopshare` if set, otherwise
/// `~/.local/state/loopshare`. The SMB daemon's runtime tree lives below it.
///
/// # Examples
///
/// ```
/// use loopshare_paths::state_dir;
///
/// let smb_state = state_dir().join("smb");
/// ```
pub fn state_dir() -> PathBuf {
    xdg_dir("XDG_STATE_HOME", ".local/state")
}

fn xdg_dir(env_var: &str, home_relative: &str) -> PathBuf {
    match std::env::var_os(env_var) {
        Some(base) if !base.is_empty() => PathBuf::from(base).join(APP_NAME),
        _ => match dirs::home_dir() {
            Some(home) => home.join(home_relative).join(APP_NAME),
            None => PathBuf::from(home_relative).join(APP_NAME),
        },
    }
}
