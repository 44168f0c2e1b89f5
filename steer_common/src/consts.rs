//! System-wide constants for the autosteer workspace.
//!
//! Single source of truth for every numeric limit, default, and protocol
//! constant used by more than one crate. Imported by all crates — no
//! duplication permitted.

/// Control loop rate.
pub const CYCLE_HZ: u32 = 100;

/// Control loop period, microseconds (derived from [`CYCLE_HZ`]).
pub const CYCLE_PERIOD_US: u64 = 1_000_000 / CYCLE_HZ as u64;

/// Status-frame (253) emission rate.
pub const STATUS_HZ: u32 = 10;

/// Number of 100 Hz ticks between status-frame emissions.
pub const STATUS_PERIOD_TICKS: u32 = CYCLE_HZ / STATUS_HZ;

/// Default debounce window for digital switches, milliseconds.
pub const DEBOUNCE_MS_DEFAULT: u32 = 50;

/// Default watchdog timeout on frame 254 (SteerData), milliseconds.
pub const WATCHDOG_MS_DEFAULT: u32 = 1500;

/// Default kickout latch/cooldown duration, milliseconds.
pub const KICKOUT_COOLDOWN_MS_DEFAULT: u32 = 2000;

/// Default soft-start ramp duration, milliseconds.
pub const SOFT_START_DURATION_MS_DEFAULT: u32 = 250;

/// Default soft-start peak fraction (of `low_pwm` expressed as a percent).
///
/// Not numerically specified upstream; chosen so the soft-start ramp's
/// final value is continuous with the `low_pwm` floor that the PWM-shaping
/// stage uses as its breakaway point, avoiding a torque step at the
/// SoftStart -> NormalControl boundary.
pub const SOFT_START_PEAK_FRACTION_DEFAULT: f32 = 1.0;

/// Minimum vehicle speed for `should_steer()` to hold, km/h.
pub const MIN_STEER_SPEED_KMH: f32 = 0.1;

/// PID output clamp, percent.
pub const PID_OUTPUT_CLAMP: f32 = 100.0;

/// PID dead zone, percent.
pub const PID_DEAD_ZONE: f32 = 0.1;

// ─── Sensor acquisition ──────────────────────────────────────────────

/// WAS analog sampling period, milliseconds.
pub const WAS_PERIOD_MS: u32 = 5;
/// Number of ADC samples averaged per WAS reading.
pub const WAS_AVG_SAMPLES: usize = 4;
/// WAS zero-angle ADC midpoint.
pub const WAS_ADC_MIDPOINT: i32 = 2048;

/// Motor-current sampling period, milliseconds.
pub const CURRENT_PERIOD_MS: u32 = 1;
/// Fixed zero-offset subtracted from raw current ADC counts.
pub const CURRENT_ZERO_OFFSET: f32 = 77.0;
/// Ring-buffer length for current averaging.
pub const CURRENT_RING_SIZE: usize = 50;

/// Switch sampling period, milliseconds.
pub const SWITCH_PERIOD_MS: u32 = 10;

/// Pressure sampling period, milliseconds.
pub const PRESSURE_PERIOD_MS: u32 = 10;
/// Pressure raw-to-percent scale factor.
pub const PRESSURE_SCALE: f32 = 0.15;
/// Pressure IIR filter weight applied to the new sample.
pub const PRESSURE_IIR_ALPHA: f32 = 0.2;
/// Pressure saturation ceiling.
pub const PRESSURE_SATURATE: f32 = 255.0;

// ─── Kickout monitor ─────────────────────────────────────────────────

/// Encoder overspeed evaluation window, milliseconds.
pub const ENCODER_WINDOW_MS: u32 = 100;
/// Default pressure-high kickout threshold, raw ADC counts.
pub const PRESSURE_THRESHOLD_DEFAULT: u16 = 800;
/// Default current-high kickout threshold, raw ADC counts.
pub const CURRENT_THRESHOLD_DEFAULT: u16 = 1000;
/// Grace period after a commanded-RPM change before slip is evaluated, ms.
pub const MOTOR_SLIP_GRACE_MS: u32 = 50;
/// RPM tolerance added to `|rpm_cmd|` in the slip comparison.
pub const MOTOR_SLIP_RPM_TOLERANCE: f32 = 10.0;
/// Consecutive out-of-tolerance ticks required to latch `MotorSlip`.
pub const MOTOR_SLIP_CONSECUTIVE_TICKS: u8 = 8;

// ─── Motor-driver backends ───────────────────────────────────────────

/// PWM H-bridge carrier frequency, Hz.
pub const PWM_CARRIER_HZ: u32 = 18_000;
/// Sleep-pin wake sequence settle time, microseconds.
pub const PWM_WAKE_SETTLE_US: u32 = 100;

/// CAN bitrate, bit/s.
pub const CAN_BITRATE: u32 = 250_000;
/// CAN extended command frame ID.
pub const CAN_COMMAND_ID: u32 = 0x0600_0001;
/// CAN extended heartbeat frame ID.
pub const CAN_HEARTBEAT_ID: u32 = 0x0700_0001;
/// CAN command/keepalive transmission period, milliseconds.
pub const CAN_TX_PERIOD_MS: u32 = 20;
/// CAN heartbeat-loss timeout, milliseconds.
pub const CAN_HEARTBEAT_TIMEOUT_MS: u32 = 500;
/// CAN current-feedback IIR filter weight applied to the new sample.
pub const CAN_CURRENT_IIR_ALPHA: f32 = 0.1;

// ─── Protocol router ─────────────────────────────────────────────────

/// Fixed frame magic bytes.
pub const FRAME_MAGIC: [u8; 2] = [0x80, 0x81];
/// Maximum number of handler registrations (non-broadcast + broadcast).
pub const MAX_HANDLERS: usize = 16;
/// Maximum payload length (LEN is a single byte).
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/autosteer/config.toml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_and_status_rates_are_consistent() {
        assert!(CYCLE_HZ > 0);
        assert!(STATUS_HZ > 0);
        assert_eq!(CYCLE_HZ % STATUS_HZ, 0);
        assert_eq!(STATUS_PERIOD_TICKS, 10);
        assert_eq!(CYCLE_PERIOD_US, 10_000);
    }

    #[test]
    fn thresholds_are_sane() {
        assert!(WATCHDOG_MS_DEFAULT > 0);
        assert!(KICKOUT_COOLDOWN_MS_DEFAULT > 0);
        assert!(SOFT_START_DURATION_MS_DEFAULT > 0);
        assert!(SOFT_START_PEAK_FRACTION_DEFAULT > 0.0 && SOFT_START_PEAK_FRACTION_DEFAULT <= 1.0);
    }
}
