// Numbered Bookmarks Config Engine
// Loads, saves, and edits the engine configuration.
// The config is stored as a JSON file at the platform-specific config path.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::platform;
use crate::types::config::EngineConfig;
use crate::types::errors::ConfigError;

/// File name of the config inside the platform config directory.
pub const CONFIG_FILE: &str = "config.json";

/// Trait defining the config engine interface.
pub trait ConfigEngineTrait {
    fn load(&mut self) -> Result<EngineConfig, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
    fn get_config(&self) -> &EngineConfig;
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), ConfigError>;
    fn reset(&mut self) -> Result<(), ConfigError>;
    fn get_config_path(&self) -> &str;
}

/// Config engine that persists `EngineConfig` as JSON on disk.
pub struct ConfigEngine {
    config_path: String,
    config: EngineConfig,
}

impl ConfigEngine {
    /// Creates a new ConfigEngine.
    ///
    /// `path_override` replaces the default `<config dir>/config.json`.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = path_override.unwrap_or_else(|| {
            platform::get_config_dir()
                .join(CONFIG_FILE)
                .to_string_lossy()
                .to_string()
        });

        Self {
            config_path,
            config: EngineConfig::default(),
        }
    }
}

impl ConfigEngineTrait for ConfigEngine {
    /// Missing file gives defaults. A malformed file is an error; the
    /// in-memory config is left as it was.
    fn load(&mut self) -> Result<EngineConfig, ConfigError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            debug!("No config at {}, using defaults", self.config_path);
            self.config = EngineConfig::default();
            return Ok(self.config.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read config file: {}", e)))?;

        self.config = serde_json::from_str(&content).map_err(|e| {
            ConfigError::Serialization(format!("Failed to parse config file: {}", e))
        })?;

        info!("Loaded config from {}", self.config_path);
        Ok(self.config.clone())
    }

    fn save(&self) -> Result<(), ConfigError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Io(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.config).map_err(|e| {
            ConfigError::Serialization(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| ConfigError::Io(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_config(&self) -> &EngineConfig {
        &self.config
    }

    /// Updates one top-level field, validates by round-tripping through
    /// `EngineConfig`, then saves.
    ///
    /// e.g. `set_value("save_debounce_ms", json!(500))`
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        if key.is_empty() {
            return Err(ConfigError::InvalidKey("Key cannot be empty".to_string()));
        }

        let mut json_value = serde_json::to_value(&self.config).map_err(|e| {
            ConfigError::Serialization(format!("Failed to serialize config: {}", e))
        })?;

        match json_value.as_object_mut() {
            Some(map) if map.contains_key(key) => {
                map.insert(key.to_string(), value);
            }
            _ => {
                return Err(ConfigError::InvalidKey(format!(
                    "Key '{}' not found in config",
                    key
                )));
            }
        }

        let updated: EngineConfig = serde_json::from_value(json_value).map_err(|e| {
            ConfigError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;

        self.config = updated;
        self.save()
    }

    fn reset(&mut self) -> Result<(), ConfigError> {
        self.config = EngineConfig::default();
        self.save()
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
