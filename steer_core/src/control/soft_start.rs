//! Quarter-sine torque ramp applied while the state machine is in
//! `SoftStart`, so engagement does not slam the wheel with full authority.

use steer_common::model::SteerSettings;

/// Clip `motor_speed_pct` to the soft-start envelope at elapsed time
/// `now_ms - t0_ms` into a ramp of `duration_ms`, scaled by
/// `peak_fraction` of the `low_pwm` floor.
///
/// Progress past `duration_ms` is clamped to 1.0 (full `low_pwm`-scaled
/// authority) rather than extrapolated past the quarter sine's peak.
pub fn clip(
    settings: &SteerSettings,
    motor_speed_pct: f32,
    peak_fraction: f32,
    t0_ms: u32,
    now_ms: u32,
    duration_ms: u32,
) -> f32 {
    let elapsed_ms = now_ms.saturating_sub(t0_ms);
    let progress = if duration_ms == 0 {
        1.0
    } else {
        (elapsed_ms as f32 / duration_ms as f32).clamp(0.0, 1.0)
    };
    let ramp = (progress * std::f32::consts::FRAC_PI_2).sin();
    let limit_pct = (settings.low_pwm as f32 / 255.0) * 100.0 * peak_fraction * ramp;

    motor_speed_pct.clamp(-limit_pct, limit_pct)
}

/// True once `now_ms` has reached `t0_ms + duration_ms`.
pub fn elapsed(t0_ms: u32, now_ms: u32, duration_ms: u32) -> bool {
    now_ms.saturating_sub(t0_ms) >= duration_ms
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
    fn at_t0_ramp_clips_to_zero() {
        let out = clip(&settings(), 100.0, 1.0, 1000, 1000, 250);
        assert_eq!(out, 0.0);
    }

    #[test]
    fn at_full_duration_ramp_reaches_peak() {
        let out = clip(&settings(), 100.0, 1.0, 1000, 1250, 250);
        let expected = (60.0 / 255.0) * 100.0;
        assert!((out - expected).abs() < 1e-3);
    }

    #[test]
    fn mid_ramp_is_between_zero_and_peak() {
        let out = clip(&settings(), 100.0, 1.0, 0, 125, 250);
        let peak = (60.0 / 255.0) * 100.0;
        assert!(out > 0.0 && out < peak);
    }

    #[test]
    fn negative_command_is_clipped_symmetrically() {
        let out = clip(&settings(), -100.0, 1.0, 1000, 1250, 250);
        let expected = -(60.0 / 255.0) * 100.0;
        assert!((out - expected).abs() < 1e-3);
    }

    #[test]
    fn elapsed_is_true_once_duration_reached() {
        assert!(!elapsed(0, 249, 250));
        assert!(elapsed(0, 250, 250));
        assert!(elapsed(0, 300, 250));
    }
}
