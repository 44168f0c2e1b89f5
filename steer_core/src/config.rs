//! Boot-time configuration loading: `SteerConfig` + `SteerSettings` off
//! disk, plus the persistent `SettingsStore` used by the 251/252 frame
//! handlers afterward.

use std::path::Path;

use steer_common::config::{ConfigError, ConfigLoader, SettingsStore};
use steer_common::model::{SteerConfig, SteerSettings};

/// Everything loaded at boot before the control loop starts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub steer_config: SteerConfig,
    pub steer_settings: SteerSettings,
}

/// Load `steer_config`/`steer_settings` from the persistent store if
/// present, falling back to `boot_file` (if given) and then `Default` —
/// there is no reason to refuse to boot over a first-run machine with no
/// settings saved yet.
///
/// `boot_file`, when given, is the static TOML file used to seed
/// `steer_config` only: `steer_settings` (the 251/252-tunable values) has
/// no boot-file counterpart and always falls back straight to `Default`.
pub fn load(store: &dyn SettingsStore, boot_file: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let steer_config = match steer_common::config::load_value(store, "steer_config")? {
        Some(cfg) => cfg,
        None => match boot_file {
            Some(path) => load_boot_file(path)?,
            None => SteerConfig::default(),
        },
    };
    let steer_settings =
        steer_common::config::load_value(store, "steer_settings")?.unwrap_or_default();

    Ok(LoadedConfig {
        steer_config,
        steer_settings,
    })
}

/// Load the static TOML config file used to seed first-boot defaults
/// (device identity, backend selector) before any settings frame has
/// ever been received.
fn load_boot_file<T: ConfigLoader>(path: &Path) -> Result<T, ConfigError> {
    T::load(path)
}
