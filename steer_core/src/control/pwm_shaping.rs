//! Maps a signed PID percentage onto the drive's usable PWM band.
//!
//! The motor does not move below `min_pwm` (static friction breakaway), so
//! the raw PID output is rescaled onto `[low_pwm, high_pwm]` and anything
//! that would land below `min_pwm` is treated as "not moving" rather than
//! "moving slowly".

use steer_common::model::SteerSettings;

/// Shape a signed PID output (`[-100, 100]`) into a signed motor-speed
/// percentage, honoring `settings`' PWM floor/ceiling and `motor_invert`.
pub fn shape(settings: &SteerSettings, pid_output_pct: f32, motor_invert: bool) -> f32 {
    if pid_output_pct == 0.0 {
        return 0.0;
    }

    let magnitude = pid_output_pct.abs() / 100.0;
    let span = settings.high_pwm as f32 - settings.low_pwm as f32;
    let scaled = (settings.low_pwm as f32 + magnitude * span).min(settings.high_pwm as f32);

    if scaled < settings.min_pwm as f32 {
        return 0.0;
    }

    let sign = pid_output_pct.signum();
    let motor_speed_pct = sign * (scaled / 255.0) * 100.0;

    if motor_invert {
        -motor_speed_pct
    } else {
        motor_speed_pct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SteerSettings {
        SteerSettings {
            kp: 1.0,
            high_pwm: 250,
            low_pwm: 60,
            min_pwm: 50,
            was_counts_per_degree: 10.0,
            was_offset: 0,
            ackerman_fix: 1.0,
        }
    }

    #[test]
    fn zero_input_is_zero_output() {
        assert_eq!(shape(&settings(), 0.0, false), 0.0);
    }

    #[test]
    fn full_scale_reaches_high_pwm() {
        let out = shape(&settings(), 100.0, false);
        assert!((out - (250.0 / 255.0) * 100.0).abs() < 1e-3);
    }

    #[test]
    fn below_min_pwm_is_clamped_to_zero() {
        // low_pwm itself (60) is >= min_pwm (50), so nothing scales below
        // min_pwm for this settings fixture except literal zero input.
        let mut s = settings();
        s.min_pwm = 70;
        let out = shape(&s, 1.0, false);
        assert_eq!(out, 0.0);
    }

    #[test]
    fn negative_input_produces_negative_output() {
        assert!(shape(&settings(), -50.0, false) < 0.0);
    }

    #[test]
    fn motor_invert_flips_sign() {
        let normal = shape(&settings(), 80.0, false);
        let inverted = shape(&settings(), 80.0, true);
        assert!((normal + inverted).abs() < 1e-6);
    }
}
