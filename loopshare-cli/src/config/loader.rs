use super::types::{LoopshareConfig, RawLoopshareConfig, RawSmbdConfig};
use anyhow::{Context, Result};
use loopshare_smbd::SmbdConfig;
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<LoopshareConfig> {
        Self::load_layers(&[Self::user_config_path(), Self::project_config_path()])
    }

    /// Get user config path
    pub fn user_config_path() -> PathBuf {
        loopshare_paths::config_dir().join("config.toml")
    }

    /// Get project config path
    /// Can be overridden with LOOPSHARE_PROJECT_CONFIG_DIR env var (useful for isolated e2e tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("LOOPSHARE_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".loopshare/config.toml")
        }
    }

    /// Merge config files in order, later files overriding earlier ones.
    /// Missing files are skipped.
    pub fn load_layers(paths: &[PathBuf]) -> Result<LoopshareConfig> {
        let mut raw = RawLoopshareConfig::default();

        for path in paths {
            if let Some(layer) = Self::read_raw(path)? {
                raw = Self::merge_raw(raw, layer);
            }
        }

        Ok(Self::finalize(raw))
    }

    fn read_raw(path: &Path) -> Result<Option<RawLoopshareConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let raw = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(raw))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawLoopshareConfig, overlay: RawLoopshareConfig) -> RawLoopshareConfig {
        RawLoopshareConfig {
            smbd: RawSmbdConfig {
                binary_path: overlay.smbd.binary_path.or(base.smbd.binary_path),
                state_dir: overlay.smbd.state_dir.or(base.smbd.state_dir),
                log_level: overlay.smbd.log_level.or(base.smbd.log_level),
                output: overlay.smbd.output.or(base.smbd.output),
                restart: overlay.smbd.restart.or(base.smbd.restart),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawLoopshareConfig) -> LoopshareConfig {
        let defaults = SmbdConfig::default();
        LoopshareConfig {
            smbd: SmbdConfig {
                binary_path: raw.smbd.binary_path.unwrap_or(defaults.binary_path),
                state_dir: raw.smbd.state_dir.unwrap_or(defaults.state_dir),
                log_level: raw.smbd.log_level.unwrap_or(defaults.log_level),
                output: raw.smbd.output.unwrap_or(defaults.output),
                restart: raw.smbd.restart.unwrap_or(defaults.restart),
            },
        }
    }
}
