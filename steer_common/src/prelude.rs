//! Convenient re-exports so consumers can do `use steer_common::prelude::*;`
//! and get the most important types without listing individual paths.

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    clamp_f32, clamp_u8, ConfigError, ConfigLoader, FileSettingsStore, MemorySettingsStore,
    SettingsStore,
};

// ─── System constants ───────────────────────────────────────────────
pub use crate::consts::{CYCLE_HZ, CYCLE_PERIOD_US, STATUS_HZ};

// ─── Data model ─────────────────────────────────────────────────────
pub use crate::model::{
    GuidanceInputs, KickoutCause, MotorState, MotorStatus, SteerConfig, SteerSettings,
    SteerSwitchMode, SwitchState, WasReading,
};

// ─── Motor driver trait ─────────────────────────────────────────────
pub use crate::motor::{DriverError, MotorDriver, MotorKind};
