use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::schema::AnthroidConfig;

/// Loads the Anthroid configuration from disk and the environment.
pub struct ConfigLoader {
    config: AnthroidConfig,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path: explicit path > ANTHROID_CONFIG env > ~/.anthroid/anthroid.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("ANTHROID_CONFIG") {
            return PathBuf::from(p);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".anthroid")
            .join("anthroid.toml")
    }

    /// Load the config from disk, falling back to defaults.
    pub fn load(path: Option<&Path>) -> anthroid_core::Result<Self> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Same as [`ConfigLoader::load`] with an explicit environment lookup.
    pub fn load_with_env(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> anthroid_core::Result<Self> {
        let config_path = Self::resolve_path(path);
        let config = if config_path.exists() {
            info!(?config_path, "loading configuration");
            let raw = std::fs::read_to_string(&config_path)?;
            Self::parse(&raw, &config_path)?
        } else {
            warn!(?config_path, "config file not found, using defaults");
            AnthroidConfig::default()
        };

        let config = Self::apply_env_overrides(config, env);

        // Validate config: log warnings, fail on errors
        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
            }
            Err(e) => {
                return Err(anthroid_core::AnthroidError::Config(e));
            }
        }

        Ok(Self {
            config,
            config_path,
        })
    }

    fn parse(raw: &str, config_path: &Path) -> anthroid_core::Result<AnthroidConfig> {
        toml::from_str::<AnthroidConfig>(raw).map_err(|e| {
            anthroid_core::AnthroidError::Config(format!(
                "failed to parse {}: {}",
                config_path.display(),
                e
            ))
        })
    }

    /// Get a snapshot of the loaded config.
    pub fn get(&self) -> AnthroidConfig {
        self.config.clone()
    }

    /// Path the config was loaded from (it may not exist).
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply env var overrides (ANTHROID_LOG_LEVEL, ANTHROID_RESULT_FILE, etc.)
    pub fn apply_env_overrides(
        mut config: AnthroidConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> AnthroidConfig {
        if let Some(v) = env("ANTHROID_LOG_LEVEL") {
            config.logging.level = v;
        }
        if let Some(v) = env("ANTHROID_SHELL") {
            config.commands.shell = v;
        }
        if let Some(v) = env("ANTHROID_RESULT_FILE") {
            config.bridge.result_file = PathBuf::from(v);
        }
        if let Some(v) = env("ANTHROID_ADB_SERIAL")
            && !v.is_empty()
        {
            config.clicker.adb_serial = Some(v);
        }
        config
    }
}
