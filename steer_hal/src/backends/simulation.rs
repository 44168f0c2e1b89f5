//! Software-simulated motor backend for development and testing without
//! physical hardware. Models the steering actuator as a first-order lag
//! between target and actual PWM, the way the bench setups describe it.

use steer_common::model::MotorStatus;
use steer_common::motor::{DriverError, MotorDriver, MotorKind};

/// Fraction of the remaining target-actual gap closed per tick.
const RESPONSE_GAIN: f32 = 0.3;

pub struct SimulationDriver {
    enabled: bool,
    target_pwm: f32,
    actual_pwm: f32,
    status: MotorStatus,
}

impl SimulationDriver {
    pub fn new() -> Self {
        Self {
            enabled: false,
            target_pwm: 0.0,
            actual_pwm: 0.0,
            status: MotorStatus::default(),
        }
    }
}

impl Default for SimulationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MotorDriver for SimulationDriver {
    fn kind(&self) -> MotorKind {
        MotorKind::Simulation
    }

    fn init(&mut self) -> Result<(), DriverError> {
        self.enabled = false;
        self.target_pwm = 0.0;
        self.actual_pwm = 0.0;
        Ok(())
    }

    fn enable(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.target_pwm = 0.0;
        }
    }

    fn set_speed(&mut self, percent: f32) {
        if !self.enabled {
            return;
        }
        self.target_pwm = percent.clamp(-100.0, 100.0) * 2.55;
    }

    fn tick(&mut self) {
        self.actual_pwm += (self.target_pwm - self.actual_pwm) * RESPONSE_GAIN;
        self.status.enabled = self.enabled;
        self.status.target_pwm = self.target_pwm.round() as i16;
        self.status.actual_pwm = self.actual_pwm.round() as i16;
        self.status.current_draw_a = (self.actual_pwm.abs() / 255.0) * 3.0;
        self.status.has_error = false;
    }

    fn status(&self) -> MotorStatus {
        self.status
    }

    fn supports_current(&self) -> bool {
        true
    }

    fn current_draw_a(&self) -> Option<f32> {
        Some(self.status.current_draw_a)
    }

    fn commanded_vs_actual_rpm(&self) -> Option<(f32, f32)> {
        Some((self.target_pwm, self.actual_pwm))
    }
}
