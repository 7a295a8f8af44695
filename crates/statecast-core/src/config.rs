//! Configuration for registries and host storage
//!
//! Values come from defaults, an optional TOML file, then `STATECAST_*`
//! environment variables, in that order.

use crate::errors::{Result, StateError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "STATECAST_";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Channel registry settings
    pub registry: RegistryConfig,
    /// Host storage settings
    pub storage: StorageConfig,
}

/// Channel registry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Start the notification subscription on the first `listen`
    pub auto_start: bool,
    /// Drop an entry once its last lease is released
    pub evict_idle: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            auto_start: true,
            evict_idle: true,
        }
    }
}

/// Host storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Capacity of the change-notification bus
    pub event_buffer: usize,
    /// Byte quota per storage area (keys plus values)
    pub quota_bytes: Option<usize>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            event_buffer: 256,
            quota_bytes: None,
        }
    }
}

impl StateConfig {
    /// Parse a TOML document. Missing sections fall back to defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| StateError::invalid(format!("Invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StateError::internal(format!("Failed to read config file: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Apply `STATECAST_*` overrides from the process environment.
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply overrides from an explicit set of variables.
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref();
            match name {
                "REGISTRY_AUTO_START" => self.registry.auto_start = parse_flag(name, value)?,
                "REGISTRY_EVICT_IDLE" => self.registry.evict_idle = parse_flag(name, value)?,
                "STORAGE_EVENT_BUFFER" => {
                    self.storage.event_buffer = parse_number(name, value)?;
                }
                "STORAGE_QUOTA_BYTES" => {
                    self.storage.quota_bytes = if value.is_empty() {
                        None
                    } else {
                        Some(parse_number(name, value)?)
                    };
                }
                other => tracing::debug!(variable = other, "Ignoring unknown override"),
            }
        }
        self.validate()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.event_buffer == 0 {
            return Err(StateError::invalid(
                "storage.event_buffer must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(StateError::invalid(format!(
            "{ENV_PREFIX}{name}: expected a boolean, got {value:?}"
        ))),
    }
}

fn parse_number(name: &str, value: &str) -> Result<usize> {
    value.parse().map_err(|_| {
        StateError::invalid(format!(
            "{ENV_PREFIX}{name}: expected a number, got {value:?}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = StateConfig::default();
        assert!(config.registry.auto_start);
        assert!(config.registry.evict_idle);
        assert_eq!(config.storage.event_buffer, 256);
        assert_eq!(config.storage.quota_bytes, None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = StateConfig::from_toml_str(
            r#"
            [registry]
            auto_start = false
            "#,
        )
        .unwrap();
        assert!(!config.registry.auto_start);
        assert!(config.registry.evict_idle);
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_zero_event_buffer_rejected() {
        let result = StateConfig::from_toml_str("[storage]\nevent_buffer = 0\n");
        assert!(matches!(result, Err(StateError::Invalid { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = StateConfig::default();
        config
            .merge_with_vars([
                ("STATECAST_REGISTRY_EVICT_IDLE", "false"),
                ("STATECAST_STORAGE_QUOTA_BYTES", "4096"),
                ("UNRELATED", "x"),
            ])
            .unwrap();
        assert!(!config.registry.evict_idle);
        assert_eq!(config.storage.quota_bytes, Some(4096));
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = StateConfig::default();
        let result = config.merge_with_vars([("STATECAST_REGISTRY_AUTO_START", "maybe")]);
        assert!(matches!(result, Err(StateError::Invalid { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[storage]\nevent_buffer = 8\nquota_bytes = 100").unwrap();

        let config = StateConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.storage.event_buffer, 8);
        assert_eq!(config.storage.quota_bytes, Some(100));
    }
}
