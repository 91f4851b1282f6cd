use super::types::GlobalConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "./kithound.toml",
    "~/.config/kithound/kithound.toml",
    "/etc/kithound/kithound.toml",
];

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with a custom path, falling back to the
    /// default search chain, then to built-in defaults.
    pub fn load(custom_path: Option<&Path>) -> Result<GlobalConfig> {
        if let Some(path) = custom_path {
            if path.exists() {
                return Self::load_from_file(path)
                    .with_context(|| format!("Failed to load config from custom path: {:?}", path));
            }
            tracing::warn!(
                "Custom config path does not exist: {:?}, falling back to defaults",
                path
            );
        }

        for default_path in DEFAULT_CONFIG_PATHS {
            let path = Self::expand_path(default_path);
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from: {:?}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                        continue;
                    }
                }
            }
        }

        tracing::info!("No configuration file found, using default settings");
        Ok(GlobalConfig::default())
    }

    fn load_from_file(path: &Path) -> Result<GlobalConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: GlobalConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {:?}", path))?;

        Self::validate_config(&config)?;

        Ok(config)
    }

    fn validate_config(config: &GlobalConfig) -> Result<()> {
        if config.acquisition.max_concurrent == 0 {
            anyhow::bail!("max_concurrent must be greater than 0");
        }
        if config.acquisition.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than 0");
        }
        Ok(())
    }

    /// Expand a leading tilde against $HOME.
    fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Ok(home) = std::env::var("HOME") {
                return PathBuf::from(home).join(rest);
            }
        }
        PathBuf::from(path)
    }
}
