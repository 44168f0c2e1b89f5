//! Core data model: persistent configuration and runtime snapshots.
//!
//! Every type here is a plain-data struct or enum. Mutation happens only at
//! the router boundary (for [`SteerConfig`]/[`SteerSettings`]) or inside the
//! subsystem that owns a given snapshot; readers elsewhere hold copies.

use serde::{Deserialize, Serialize};

use crate::consts;

/// Operator-intent source for engaging autosteer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SteerSwitchMode {
    /// No physical switch; intent comes from the guidance bit alone.
    None,
    /// Maintained toggle switch.
    Switch,
    /// Momentary button.
    Button,
}

impl Default for SteerSwitchMode {
    fn default() -> Self {
        Self::None
    }
}

/// Persistent hardware/behavior configuration, received via frame 251.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteerConfig {
    pub invert_was: bool,
    pub motor_invert: bool,
    pub cytron_driver: bool,
    pub is_danfoss: bool,
    pub steer_switch_mode: SteerSwitchMode,
    pub shaft_encoder: bool,
    pub pressure_sensor: bool,
    pub current_sensor: bool,
    /// Encoder pulses per 100 ms before kickout.
    pub pulse_count_max: u8,
    pub min_speed_kmh: u8,
    /// Selects the motor-driver backend at boot (see `steer_hal`).
    pub motor_driver_selector: u8,
}

impl Default for SteerConfig {
    fn default() -> Self {
        Self {
            invert_was: false,
            motor_invert: false,
            cytron_driver: false,
            is_danfoss: false,
            steer_switch_mode: SteerSwitchMode::None,
            shaft_encoder: false,
            pressure_sensor: false,
            current_sensor: false,
            pulse_count_max: 5,
            min_speed_kmh: 0,
            motor_driver_selector: 0,
        }
    }
}

/// Persistent control-loop tuning, received via frame 252.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteerSettings {
    /// Proportional gain, already divided by 10 from the wire byte.
    pub kp: f32,
    pub high_pwm: u8,
    pub low_pwm: u8,
    pub min_pwm: u8,
    pub was_counts_per_degree: f32,
    pub was_offset: i16,
    pub ackerman_fix: f32,
}

impl Default for SteerSettings {
    fn default() -> Self {
        Self {
            kp: 1.0,
            high_pwm: 250,
            low_pwm: 60,
            min_pwm: 40,
            was_counts_per_degree: 100.0,
            was_offset: 0,
            ackerman_fix: 1.0,
        }
    }
}

/// A single wheel-angle-sensor reading, raw plus its derived angle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WasReading {
    pub raw_adc: u16,
    pub offset: i16,
    pub counts_per_degree: f32,
}

impl WasReading {
    /// `angle_deg = (raw - 2048 - offset) / counts_per_degree`.
    pub fn angle_deg(&self) -> f32 {
        if self.counts_per_degree.abs() < f32::EPSILON {
            return 0.0;
        }
        (self.raw_adc as i32 - consts::WAS_ADC_MIDPOINT - self.offset as i32) as f32
            / self.counts_per_degree
    }
}

/// Debounced digital switch state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SwitchState {
    pub current: bool,
    pub debounced: bool,
    pub last_change_ms: u32,
    pub changed: bool,
}

impl SwitchState {
    /// Feed one raw sample at `now_ms`; `debounce_ms` stability promotes
    /// `current` into `debounced`. `changed` is true for exactly the one
    /// call in which the promotion happens.
    pub fn sample(&mut self, raw: bool, now_ms: u32, debounce_ms: u32) {
        self.changed = false;
        if raw != self.current {
            self.current = raw;
            self.last_change_ms = now_ms;
            return;
        }
        if self.current != self.debounced && now_ms.wrapping_sub(self.last_change_ms) >= debounce_ms {
            self.debounced = self.current;
            self.changed = true;
        }
    }
}

/// Control-loop state machine states (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotorState {
    Disabled,
    SoftStart,
    NormalControl,
}

impl Default for MotorState {
    fn default() -> Self {
        Self::Disabled
    }
}

/// Maximum length of [`MotorStatus::error_msg`].
pub const MOTOR_ERROR_MSG_MAX: usize = 64;

/// Snapshot of motor-driver state, produced by the backend each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorStatus {
    pub enabled: bool,
    pub target_pwm: i16,
    pub actual_pwm: i16,
    pub current_draw_a: f32,
    pub has_error: bool,
    error_msg: [u8; MOTOR_ERROR_MSG_MAX],
    error_msg_len: u8,
}

impl Default for MotorStatus {
    fn default() -> Self {
        Self {
            enabled: false,
            target_pwm: 0,
            actual_pwm: 0,
            current_draw_a: 0.0,
            has_error: false,
            error_msg: [0; MOTOR_ERROR_MSG_MAX],
            error_msg_len: 0,
        }
    }
}

impl MotorStatus {
    /// Set the error message, truncating to [`MOTOR_ERROR_MSG_MAX`] bytes.
    pub fn set_error_msg(&mut self, msg: &str) {
        let bytes = msg.as_bytes();
        let len = bytes.len().min(MOTOR_ERROR_MSG_MAX);
        self.error_msg[..len].copy_from_slice(&bytes[..len]);
        self.error_msg[len..].fill(0);
        self.error_msg_len = len as u8;
    }

    pub fn error_msg(&self) -> &str {
        std::str::from_utf8(&self.error_msg[..self.error_msg_len as usize]).unwrap_or("")
    }
}

/// Tagged cause of a kickout latch (§4.5).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KickoutCause {
    None,
    /// Encoder pulses observed in the last evaluation window.
    EncoderOverspeed(u16),
    /// Raw pressure ADC value that tripped the threshold.
    PressureHigh(u16),
    /// Raw current ADC value that tripped the threshold.
    CurrentHigh(u16),
    /// Commanded vs. actual RPM at the moment slip was confirmed.
    MotorSlip(f32, f32),
    Timeout,
}

impl Default for KickoutCause {
    fn default() -> Self {
        Self::None
    }
}

/// Guidance inputs decoded from the latest frame 254 (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GuidanceInputs {
    pub target_angle_deg: f32,
    pub vehicle_speed_kmh: f32,
    pub guidance_active: bool,
    pub autosteer_enable_request: bool,
    pub cross_track_error: i8,
    pub machine_sections: u16,
    pub arrival_ms: u32,
}
