//! Pre-flight checks for running smbd.
//!
//! smbd raises its open file limit to the Windows default of 16384 at startup
//! and logs a complaint when the hard limit is lower. Neither check here is
//! required by [`crate::SmbdServer::start`]; they exist to explain failures
//! before the restart loop starts hiding them.

use tracing::warn;

use crate::config::SmbdConfig;
use crate::error::{Error, Result};

/// Open file limit smbd asks for.
const MIN_NOFILE: u64 = 16384;

/// Result of a pre-flight check.
#[derive(Debug, Clone)]
pub struct PreflightResult {
    /// Whether the check passed.
    pub passed: bool,
    /// Current value (human-readable).
    pub current: String,
    /// Required value (human-readable).
    pub required: String,
    /// Help message if the check failed.
    pub help: Option<String>,
}

/// Check that the configured smbd binary can be found.
pub fn check_binary(config: &SmbdConfig) -> PreflightResult {
    let required = config.binary_path.display().to_string();

    match config.find_binary() {
        Some(path) => PreflightResult {
            passed: true,
            current: path.display().to_string(),
            required,
            help: None,
        },
        None => PreflightResult {
            passed: false,
            current: "not found".to_string(),
            required,
            help: Some(BINARY_HELP.to_string()),
        },
    }
}

/// Check the soft open file limit against what smbd wants.
#[cfg(unix)]
pub fn check_nofile_limit() -> PreflightResult {
    use rlimit::{Resource, getrlimit};

    match getrlimit(Resource::NOFILE) {
        Ok((soft, _hard)) => {
            let passed = soft == rlimit::INFINITY || soft >= MIN_NOFILE;
            let current = if soft == rlimit::INFINITY {
                "unlimited".to_string()
            } else {
                soft.to_string()
            };

            PreflightResult {
                passed,
                current,
                required: MIN_NOFILE.to_string(),
                help: if passed {
                    None
                } else {
                    Some(NOFILE_HELP.to_string())
                },
            }
        }
        Err(_) => PreflightResult {
            passed: false,
            current: "unknown".to_string(),
            required: MIN_NOFILE.to_string(),
            help: Some("Could not query open file limit".to_string()),
        },
    }
}

/// Open file limits are not queried outside Unix.
#[cfg(not(unix))]
pub fn check_nofile_limit() -> PreflightResult {
    PreflightResult {
        passed: true,
        current: "N/A".to_string(),
        required: "N/A".to_string(),
        help: None,
    }
}

/// Run all pre-flight checks.
///
/// A low open file limit is only logged; smbd still runs with it.
///
/// # Errors
///
/// Returns [`Error::Preflight`] with a help message if the binary is missing.
pub fn run_preflight_checks(config: &SmbdConfig) -> Result<()> {
    let nofile = check_nofile_limit();
    if !nofile.passed {
        warn!(
            current = %nofile.current,
            required = %nofile.required,
            "Open file limit is below what smbd expects"
        );
    }

    let binary = check_binary(config);
    if !binary.passed {
        return Err(Error::Preflight(format!(
            "smbd binary not found: {}\n\n{}",
            binary.required,
            binary.help.unwrap_or_default()
        )));
    }

    Ok(())
}

const BINARY_HELP: &str = r#"loopshare needs Samba's smbd to serve files.

Install it with your package manager, for example:

  Debian/Ubuntu:  apt install samba
  Fedora:         dnf install samba
  macOS:          brew install samba

Or point loopshare at an existing binary:

  loopshare serve --smbd /path/to/smbd"#;

const NOFILE_HELP: &str = r#"smbd wants to keep up to 16384 files open.

To raise the limit, run one of the following:

  1. Temporary (current session only):
     ulimit -n 16384

  2. Persistent (add to /etc/security/limits.conf as root):
     * soft nofile 16384
     * hard nofile 16384
     (Then log out and back in)

  3. For systemd services (add to service file):
     LimitNOFILE=16384"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_nofile_returns_result() {
        let result = check_nofile_limit();
        assert!(!result.current.is_empty());
        assert!(!result.required.is_empty());
        assert_eq!(result.passed, result.help.is_none());
    }

    #[test]
    fn missing_binary_fails_check() {
        let config = SmbdConfig::default().with_binary_path("/nonexistent/sbin/smbd");
        let result = check_binary(&config);

        assert!(!result.passed);
        assert_eq!(result.current, "not found");
        assert!(result.help.is_some());
    }

    #[test]
    fn run_preflight_reports_missing_binary() {
        let config = SmbdConfig::default().with_binary_path("/nonexistent/sbin/smbd");
        let err = run_preflight_checks(&config).unwrap_err();

        assert!(matches!(err, Error::Preflight(ref msg) if msg.contains("/nonexistent/sbin/smbd")));
    }

    #[cfg(unix)]
    #[test]
    fn existing_binary_passes_check() {
        let config = SmbdConfig::default().with_binary_path("/bin/sh");
        let result = check_binary(&config);

        assert!(result.passed);
        assert!(result.help.is_none());
    }
}
