//! Kickout monitor (§4.5): fuses encoder overspeed, pressure/current
//! thresholds, and CAN motor slip into a single disengage signal.
//!
//! Evaluated once per tick, in priority order; the first true cause wins
//! and latches until [`steer_common::consts::KICKOUT_COOLDOWN_MS_DEFAULT`]
//! (or a caller-supplied cooldown) has elapsed. A second cause arriving
//! during an active latch does not override the first, but is still
//! counted for diagnostics.

use steer_common::model::KickoutCause;

/// Per-tick inputs the monitor evaluates against configured thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct KickoutInputs {
    pub shaft_encoder_enabled: bool,
    pub encoder_pulses_in_window: u16,
    pub pulse_count_max: u8,

    pub pressure_sensor_enabled: bool,
    pub pressure_raw: u16,
    pub pressure_threshold: u16,

    pub current_sensor_enabled: bool,
    pub current_raw: u16,
    pub current_threshold: u16,

    /// `Some((commanded, actual))` when the CAN backend reports RPM
    /// feedback and autosteer is currently driving the motor.
    pub motor_rpm: Option<(f32, f32)>,
    /// True if a commanded-RPM change happened within the last
    /// `MOTOR_SLIP_GRACE_MS` (the slip check is suppressed during it).
    pub rpm_command_settled: bool,
}

/// Monitor state: an optional latched cause plus the slip consecutive-tick
/// counter and the auto-clear timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct KickoutMonitor {
    cause: KickoutCause,
    latch_ms: u32,
    slip_consecutive_ticks: u8,
    /// Diagnostics-only: a cause that arrived while already latched.
    pub suppressed_causes: u32,
}

impl KickoutMonitor {
    pub const fn new() -> Self {
        Self {
            cause: KickoutCause::None,
            latch_ms: 0,
            slip_consecutive_ticks: 0,
            suppressed_causes: 0,
        }
    }

    /// Currently-latched cause, if any.
    pub fn cause(&self) -> KickoutCause {
        self.cause
    }

    /// True while a latch is active (regardless of cooldown progress).
    pub fn is_latched(&self) -> bool {
        self.cause != KickoutCause::None
    }

    /// `now_ms` at the moment the current latch took effect, or `None` if
    /// nothing is latched. Feeds `should_steer()`'s cooldown guard (I6).
    pub fn latch_ms(&self) -> Option<u32> {
        self.is_latched().then_some(self.latch_ms)
    }

    /// Evaluate one tick. Returns the cause that just latched this tick,
    /// or `None` if nothing newly latched (whether because nothing
    /// tripped, or because a latch was already active).
    pub fn evaluate(
        &mut self,
        inputs: &KickoutInputs,
        now_ms: u32,
        cooldown_ms: u32,
    ) -> Option<KickoutCause> {
        if self.is_latched() {
            if now_ms.wrapping_sub(self.latch_ms) >= cooldown_ms {
                self.clear();
            } else {
                if self.detect(inputs) != KickoutCause::None {
                    self.suppressed_causes += 1;
                }
                return None;
            }
        }

        let detected = self.detect(inputs);
        if detected == KickoutCause::None {
            self.slip_consecutive_ticks = 0;
            return None;
        }

        self.cause = detected;
        self.latch_ms = now_ms;
        Some(detected)
    }

    fn detect(&mut self, inputs: &KickoutInputs) -> KickoutCause {
        if inputs.shaft_encoder_enabled && inputs.encoder_pulses_in_window > inputs.pulse_count_max as u16
        {
            return KickoutCause::EncoderOverspeed(inputs.encoder_pulses_in_window);
        }

        if inputs.pressure_sensor_enabled && inputs.pressure_raw > inputs.pressure_threshold {
            return KickoutCause::PressureHigh(inputs.pressure_raw);
        }

        if inputs.current_sensor_enabled && inputs.current_raw > inputs.current_threshold {
            return KickoutCause::CurrentHigh(inputs.current_raw);
        }

        if let Some((commanded, actual)) = inputs.motor_rpm {
            if inputs.rpm_command_settled {
                let tolerance = commanded.abs() + steer_common::consts::MOTOR_SLIP_RPM_TOLERANCE;
                if (actual - commanded).abs() > tolerance {
                    self.slip_consecutive_ticks = self.slip_consecutive_ticks.saturating_add(1);
                    if self.slip_consecutive_ticks >= steer_common::consts::MOTOR_SLIP_CONSECUTIVE_TICKS
                    {
                        return KickoutCause::MotorSlip(commanded, actual);
                    }
                    return KickoutCause::None;
                }
            }
            self.slip_consecutive_ticks = 0;
        }

        KickoutCause::None
    }

    /// Clear the latch, counters, and slip tracking (called by the loop
    /// after `handle_kickout`/`force_disabled`, or once cooldown elapses).
    pub fn clear(&mut self) {
        self.cause = KickoutCause::None;
        self.latch_ms = 0;
        self.slip_consecutive_ticks = 0;
    }
}
