use loopshare_smbd::{OutputRelay, RestartPolicy, SmbdConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawLoopshareConfig {
    #[serde(default)]
    pub smbd: RawSmbdConfig,
}

/// smbd section as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSmbdConfig {
    /// Path to the smbd binary
    pub binary_path: Option<PathBuf>,

    /// Base directory for smb.conf and daemon state
    pub state_dir: Option<PathBuf>,

    /// smb.conf log level
    pub log_level: Option<u8>,

    /// How smbd output is relayed
    pub output: Option<OutputRelay>,

    /// Restart behaviour
    pub restart: Option<RestartPolicy>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoopshareConfig {
    #[serde(default)]
    pub smbd: SmbdConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_values() {
        let config = LoopshareConfig::default();
        assert_eq!(config.smbd.binary_path, PathBuf::from("smbd"));
        assert_eq!(config.smbd.log_level, 5);
        assert_eq!(config.smbd.output, OutputRelay::Passthrough);
        assert_eq!(config.smbd.restart, RestartPolicy::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = LoopshareConfig {
            smbd: SmbdConfig::default()
                .with_binary_path("/usr/sbin/smbd")
                .with_state_dir("/var/lib/loopshare")
                .with_output(OutputRelay::Tracing)
                .with_restart(
                    RestartPolicy::exponential(Duration::from_secs(1), Duration::from_secs(30))
                        .with_max_restarts(5),
                ),
        };

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: LoopshareConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.smbd.binary_path, PathBuf::from("/usr/sbin/smbd"));
        assert_eq!(parsed.smbd.state_dir, PathBuf::from("/var/lib/loopshare"));
        assert_eq!(parsed.smbd.output, OutputRelay::Tracing);
        assert_eq!(parsed.smbd.restart, config.smbd.restart);
    }

    #[test]
    fn test_raw_config_partial_parsing() {
        let toml_str = r#"
[smbd]
log_level = 2
"#;
        let raw: RawLoopshareConfig = toml::from_str(toml_str).unwrap();

        // Only log_level was set, the rest should be None
        assert_eq!(raw.smbd.log_level, Some(2));
        assert!(raw.smbd.binary_path.is_none());
        assert!(raw.smbd.restart.is_none());
    }

    #[test]
    fn test_raw_config_empty_uses_none() {
        let raw: RawLoopshareConfig = toml::from_str("").unwrap();

        assert!(raw.smbd.binary_path.is_none());
        assert!(raw.smbd.state_dir.is_none());
        assert!(raw.smbd.log_level.is_none());
        assert!(raw.smbd.output.is_none());
    }
}
