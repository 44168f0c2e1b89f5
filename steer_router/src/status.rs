//! 10 Hz status-frame (253) construction: the one outbound frame the core
//! emits on its own schedule rather than in reply to an inbound frame.

use steer_common::consts::STATUS_PERIOD_TICKS;
use steer_common::model::MotorState;

use crate::frame::Frame;

pub const TYPE_STATUS: u8 = 253;

/// Everything the status frame reports, gathered from the control loop
/// and sensor snapshots each tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusSnapshot {
    pub angle_deg: f32,
    pub motor_state: MotorState,
    pub work_switch_active: bool,
    pub motor_speed_pct: f32,
}

/// True once every [`STATUS_PERIOD_TICKS`] calls; `tick_count` is the
/// control loop's free-running 100 Hz tick counter.
pub fn is_status_tick(tick_count: u64) -> bool {
    tick_count % STATUS_PERIOD_TICKS as u64 == 0
}

/// bit0 = work switch, inverted sense (set when OFF); bit1 = steer state
/// (0 when autosteering is ARMED/active, i.e. SoftStart or NormalControl);
/// bit2 = kickout input, reserved, always 0.
fn switch_byte(snapshot: &StatusSnapshot) -> u8 {
    let mut byte = 0u8;
    if !snapshot.work_switch_active {
        byte |= 1 << 0;
    }
    if snapshot.motor_state == MotorState::Disabled {
        byte |= 1 << 1;
    }
    byte
}

/// Build the 253 status frame: angle x100 (i16), heading (i16, unused here,
/// reported 0), roll (i16, unused, reported 0), switch byte, PWM display.
pub fn build_status_frame(snapshot: &StatusSnapshot) -> Frame {
    let angle_x100 = (snapshot.angle_deg * 100.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
    let pwm_display = (snapshot.motor_speed_pct.abs() * 2.55).round().clamp(0.0, 255.0) as u8;

    let angle_bytes = angle_x100.to_le_bytes();
    let heading_bytes = 0i16.to_le_bytes();
    let roll_bytes = 0i16.to_le_bytes();

    let data = [
        angle_bytes[0],
        angle_bytes[1],
        heading_bytes[0],
        heading_bytes[1],
        roll_bytes[0],
        roll_bytes[1],
        switch_byte(snapshot),
        pwm_display,
    ];

    Frame::new(0, TYPE_STATUS, &data).expect("status frame payload is always within capacity")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tick_fires_every_tenth_cycle() {
        assert!(is_status_tick(0));
        assert!(!is_status_tick(1));
        assert!(is_status_tick(10));
        assert!(is_status_tick(20));
        assert!(!is_status_tick(15));
    }

    #[test]
    fn angle_is_scaled_by_one_hundred() {
        let snapshot = StatusSnapshot {
            angle_deg: 1.23,
            ..Default::default()
        };
        let frame = build_status_frame(&snapshot);
        let angle = i16::from_le_bytes([frame.data[0], frame.data[1]]);
        assert_eq!(angle, 123);
    }

    #[test]
    fn pwm_display_is_clamped_to_byte_range() {
        let snapshot = StatusSnapshot {
            motor_speed_pct: -250.0,
            ..Default::default()
        };
        let frame = build_status_frame(&snapshot);
        assert_eq!(frame.data[7], 255);
    }

    #[test]
    fn switch_byte_reports_work_switch_off_and_motor_disabled() {
        // Default snapshot: work switch inactive (OFF -> bit0 set),
        // motor Disabled (-> bit1 set).
        let snapshot = StatusSnapshot::default();
        let frame = build_status_frame(&snapshot);
        assert_eq!(frame.data[6], 0b11);
    }

    #[test]
    fn switch_byte_clears_both_bits_when_on_and_armed() {
        let snapshot = StatusSnapshot {
            work_switch_active: true,
            motor_state: MotorState::NormalControl,
            ..Default::default()
        };
        let frame = build_status_frame(&snapshot);
        assert_eq!(frame.data[6], 0b00);
    }
}
