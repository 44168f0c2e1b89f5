//! Configuration loading and the narrow persistent settings interface.
//!
//! [`ConfigLoader`] provides the boot-time TOML load path for
//! [`crate::model::SteerConfig`]/[`crate::model::SteerSettings`].
//! [`SettingsStore`] is the narrow `get`/`set`/`save` interface that the
//! router's frame 251/252 handlers use to persist accepted values; storage
//! layout is deliberately unspecified beyond "durable before ack".

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("configuration validation failed: {0}")]
    ValidationError(String),

    #[error("settings store I/O error: {0}")]
    StoreIoError(String),
}

/// Trait for loading a TOML-deserializable type from a file.
///
/// Blanket-implemented for every `DeserializeOwned` type.
pub trait ConfigLoader: Sized + DeserializeOwned {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.to_path_buf())
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: DeserializeOwned> ConfigLoader for T {}

/// Clamp a byte-valued setting to `[min, max]`, returning the accepted
/// value and whether clamping occurred. Out-of-range settings bytes are
/// clamped and counted, never rejected (see the router's 251/252 handlers).
pub fn clamp_u8(value: u8, min: u8, max: u8) -> (u8, bool) {
    let clamped = value.clamp(min, max);
    (clamped, clamped != value)
}

/// Clamp a float-valued setting to `[min, max]`.
pub fn clamp_f32(value: f32, min: f32, max: f32) -> (f32, bool) {
    let clamped = value.clamp(min, max);
    (clamped, clamped != value)
}

/// Narrow persistent key-value interface.
///
/// Storage layout is not specified; implementations only need to guarantee
/// that a completed `save()` is durable before the caller acknowledges the
/// settings frame that produced it.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn save(&mut self) -> Result<(), ConfigError>;
}

/// In-memory `SettingsStore`, used by tests and as a fallback when no
/// persistent path is configured. `save()` is a no-op.
#[derive(Debug, Default, Clone)]
pub struct MemorySettingsStore {
    values: BTreeMap<String, String>,
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn save(&mut self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// File-backed `SettingsStore`: a flat TOML table, written durably via a
/// write-to-temp-then-rename sequence so a crash mid-write cannot leave a
/// half-written file behind.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
    dirty: bool,
}

impl FileSettingsStore {
    /// Open (or create empty, if missing) the settings file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(ConfigError::StoreIoError(e.to_string())),
        };
        Ok(Self {
            path,
            values,
            dirty: false,
        })
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
        self.dirty = true;
    }

    fn save(&mut self) -> Result<(), ConfigError> {
        if !self.dirty {
            return Ok(());
        }
        let content = toml::to_string_pretty(&self.values)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, content).map_err(|e| ConfigError::StoreIoError(e.to_string()))?;
        std::fs::rename(&tmp_path, &self.path)
            .map_err(|e| ConfigError::StoreIoError(e.to_string()))?;
        self.dirty = false;
        Ok(())
    }
}

/// Typed convenience wrapper: serialize/deserialize a value into a single
/// settings-store key as TOML.
pub fn store_value<T: Serialize>(
    store: &mut (impl SettingsStore + ?Sized),
    key: &str,
    value: &T,
) -> Result<(), ConfigError> {
    let toml = toml::to_string(value).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    store.set(key, toml);
    Ok(())
}

pub fn load_value<T: DeserializeOwned>(
    store: &(impl SettingsStore + ?Sized),
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match store.get(key) {
        None => Ok(None),
        Some(raw) => toml::from_str(&raw)
            .map(Some)
            .map_err(|e| ConfigError::ParseError(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SteerSettings;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn clamp_u8_reports_clamping() {
        assert_eq!(clamp_u8(255, 0, 255), (255, false));
        assert_eq!(clamp_u8(10, 20, 255), (20, true));
        assert_eq!(clamp_u8(100, 0, 255), (100, false));
    }

    #[test]
    fn config_loader_file_not_found() {
        #[derive(Debug, serde::Deserialize)]
        struct T {
            #[allow(dead_code)]
            v: u8,
        }
        let result = T::load(Path::new("/nonexistent/path.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn config_loader_parses_steer_settings() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
kp = 2.0
high_pwm = 200
low_pwm = 60
min_pwm = 40
was_counts_per_degree = 100.0
was_offset = 5
ackerman_fix = 1.0
"#
        )
        .unwrap();
        file.flush().unwrap();

        let settings = SteerSettings::load(file.path()).unwrap();
        assert_eq!(settings.high_pwm, 200);
        assert_eq!(settings.was_offset, 5);
    }

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemorySettingsStore::default();
        store.set("k", "v".to_string());
        assert_eq!(store.get("k"), Some("v".to_string()));
        assert!(store.save().is_ok());
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let mut store = FileSettingsStore::open(&path).unwrap();
        store.set("kp", "1.5".to_string());
        store.save().unwrap();

        let reopened = FileSettingsStore::open(&path).unwrap();
        assert_eq!(reopened.get("kp"), Some("1.5".to_string()));
    }

    #[test]
    fn typed_store_value_round_trips() {
        let mut store = MemorySettingsStore::default();
        let settings = SteerSettings::default();
        store_value(&mut store, "steer_settings", &settings).unwrap();
        let loaded: SteerSettings = load_value(&store, "steer_settings").unwrap().unwrap();
        assert_eq!(loaded, settings);
    }
}
