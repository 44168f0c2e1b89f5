//! Keya-style CAN motor backend.
//!
//! Transmits at a fixed 20 ms cadence regardless of enabled state,
//! alternating between two command forms each period so the drive never
//! sees a gap long enough to fault. Byte layouts match the drive's wire
//! protocol exactly, including the non-contiguous SPEED byte order.

use steer_common::consts::{
    CAN_COMMAND_ID, CAN_CURRENT_IIR_ALPHA, CAN_HEARTBEAT_ID, CAN_HEARTBEAT_TIMEOUT_MS,
    CAN_TX_PERIOD_MS,
};
use steer_common::model::{KickoutCause, MotorStatus};
use steer_common::motor::{CanFrame, DriverError, MotorDriver, MotorKind};

const ENABLE_FRAME: [u8; 8] = [0x23, 0x0D, 0x20, 0x01, 0x00, 0x00, 0x00, 0x00];
const DISABLE_FRAME: [u8; 8] = [0x23, 0x0C, 0x20, 0x01, 0x00, 0x00, 0x00, 0x00];

/// Build the SPEED command frame for `percent` (-100..=100).
///
/// `rpm_x10 = percent * 100 / 255 * 10`, encoded as a little/big mixed
/// non-contiguous layout: `[H(15..8), H(7..0), H(31..24), H(23..16)]`.
fn speed_frame(percent: f32) -> CanFrame {
    let rpm_x10 = (percent * 100.0 / 255.0 * 10.0).round() as i32;
    let h = rpm_x10 as u32;
    let data = [
        0x23,
        0x00,
        0x20,
        0x01,
        ((h >> 8) & 0xFF) as u8,
        (h & 0xFF) as u8,
        ((h >> 24) & 0xFF) as u8,
        ((h >> 16) & 0xFF) as u8,
    ];
    CanFrame {
        id: CAN_COMMAND_ID,
        data,
    }
}

fn zero_speed_frame() -> CanFrame {
    speed_frame(0.0)
}

#[derive(Debug, Clone, Copy, Default)]
struct HeartbeatState {
    position: u16,
    rpm: i16,
    current_filtered: f32,
    status_word: u16,
    last_seen_ms: Option<u32>,
}

/// Keya-style CAN motor backend.
pub struct CanDriver {
    enabled: bool,
    target_speed_pct: f32,
    alternate: bool,
    now_ms: u32,
    last_tx_ms: Option<u32>,
    last_rpm_cmd: f32,
    rpm_cmd_changed_ms: u32,
    slip_consecutive: u8,
    heartbeat: HeartbeatState,
    status: MotorStatus,
    pending_tx: Option<CanFrame>,
}

impl CanDriver {
    pub fn new() -> Self {
        Self {
            enabled: false,
            target_speed_pct: 0.0,
            alternate: false,
            now_ms: 0,
            last_tx_ms: None,
            last_rpm_cmd: 0.0,
            rpm_cmd_changed_ms: 0,
            slip_consecutive: 0,
            heartbeat: HeartbeatState::default(),
            status: MotorStatus::default(),
            pending_tx: None,
        }
    }

    /// Fold a received heartbeat frame's 8 data bytes into the filtered
    /// feedback state.
    fn on_heartbeat(&mut self, data: [u8; 8]) {
        self.heartbeat.position = u16::from_be_bytes([data[0], data[1]]);
        self.heartbeat.rpm = i16::from_be_bytes([data[2], data[3]]);
        let current_raw = i16::from_be_bytes([data[4], data[5]]);
        let sample = (current_raw.unsigned_abs() as f32) * 32.0;
        self.heartbeat.current_filtered =
            (1.0 - CAN_CURRENT_IIR_ALPHA) * self.heartbeat.current_filtered
                + CAN_CURRENT_IIR_ALPHA * sample;
        self.heartbeat.status_word = u16::from_be_bytes([data[6], data[7]]);
        self.heartbeat.last_seen_ms = Some(self.now_ms);
    }
}

impl Default for CanDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MotorDriver for CanDriver {
    fn kind(&self) -> MotorKind {
        MotorKind::Can
    }

    fn init(&mut self) -> Result<(), DriverError> {
        self.enabled = false;
        self.target_speed_pct = 0.0;
        Ok(())
    }

    fn enable(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.target_speed_pct = 0.0;
        }
    }

    fn set_speed(&mut self, percent: f32) {
        if !self.enabled {
            return;
        }
        let clamped = percent.clamp(-100.0, 100.0);
        if (clamped - self.last_rpm_cmd).abs() > f32::EPSILON {
            self.rpm_cmd_changed_ms = self.now_ms;
            self.slip_consecutive = 0;
        }
        self.target_speed_pct = clamped;
        self.last_rpm_cmd = clamped;
    }

    fn tick(&mut self) {
        let due = match self.last_tx_ms {
            None => true,
            Some(last) => self.now_ms.wrapping_sub(last) >= CAN_TX_PERIOD_MS,
        };

        if due {
            let frame = if self.enabled {
                if self.alternate {
                    speed_frame(self.target_speed_pct)
                } else {
                    CanFrame {
                        id: CAN_COMMAND_ID,
                        data: ENABLE_FRAME,
                    }
                }
            } else if self.alternate {
                zero_speed_frame()
            } else {
                CanFrame {
                    id: CAN_COMMAND_ID,
                    data: DISABLE_FRAME,
                }
            };
            self.pending_tx = Some(frame);
            self.alternate = !self.alternate;
            self.last_tx_ms = Some(self.now_ms);
        }

        let heartbeat_lost = match self.heartbeat.last_seen_ms {
            None => true,
            Some(seen) => self.now_ms.wrapping_sub(seen) > CAN_HEARTBEAT_TIMEOUT_MS,
        };

        self.status.enabled = self.enabled;
        self.status.target_pwm = self.target_speed_pct as i16;
        self.status.actual_pwm = self.heartbeat.rpm;
        self.status.current_draw_a = self.heartbeat.current_filtered / 1000.0;
        self.status.has_error = heartbeat_lost;
        if heartbeat_lost {
            self.status.set_error_msg("can heartbeat lost");
        }
    }

    fn status(&self) -> MotorStatus {
        self.status
    }

    fn is_detected(&self) -> bool {
        matches!(
            self.heartbeat.last_seen_ms,
            Some(seen) if self.now_ms.wrapping_sub(seen) <= CAN_HEARTBEAT_TIMEOUT_MS
        )
    }

    fn supports_current(&self) -> bool {
        true
    }

    fn current_draw_a(&self) -> Option<f32> {
        Some(self.heartbeat.current_filtered / 1000.0)
    }

    fn commanded_vs_actual_rpm(&self) -> Option<(f32, f32)> {
        let grace_elapsed = self.now_ms.wrapping_sub(self.rpm_cmd_changed_ms) >= 50;
        if !grace_elapsed {
            return None;
        }
        Some((self.target_speed_pct, self.heartbeat.rpm as f32))
    }

    fn handle_kickout(&mut self, _cause: KickoutCause) {
        self.enabled = false;
        self.target_speed_pct = 0.0;
    }

    fn advance_can_clock(&mut self, now_ms: u32) {
        self.now_ms = now_ms;
    }

    fn feed_can_frame(&mut self, frame: CanFrame) {
        if frame.id == CAN_HEARTBEAT_ID {
            self.on_heartbeat(frame.data);
        }
    }

    fn take_can_tx(&mut self) -> Option<CanFrame> {
        self.pending_tx.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_frame_layout_matches_wire_protocol() {
        let f = speed_frame(100.0);
        assert_eq!(f.id, CAN_COMMAND_ID);
        assert_eq!(&f.data[0..4], &[0x23, 0x00, 0x20, 0x01]);
    }

    #[test]
    fn disabled_alternates_disable_and_zero_speed() {
        let mut d = CanDriver::new();
        d.init().unwrap();

        d.advance_can_clock(0);
        d.tick();
        let first = d.take_can_tx().unwrap();
        assert_eq!(first.data, DISABLE_FRAME);

        d.advance_can_clock(20);
        d.tick();
        let second = d.take_can_tx().unwrap();
        assert_ne!(second.data, DISABLE_FRAME);
    }

    #[test]
    fn enabled_alternates_enable_and_speed() {
        let mut d = CanDriver::new();
        d.init().unwrap();
        d.enable(true);
        d.set_speed(50.0);

        d.advance_can_clock(0);
        d.tick();
        assert_eq!(d.take_can_tx().unwrap().data, ENABLE_FRAME);

        d.advance_can_clock(20);
        d.tick();
        let speed = d.take_can_tx().unwrap();
        assert_eq!(&speed.data[0..4], &[0x23, 0x00, 0x20, 0x01]);
    }

    #[test]
    fn tx_cadence_is_twenty_milliseconds() {
        let mut d = CanDriver::new();
        d.init().unwrap();
        d.advance_can_clock(0);
        d.tick();
        assert!(d.take_can_tx().is_some());

        d.advance_can_clock(10);
        d.tick();
        assert!(d.take_can_tx().is_none());

        d.advance_can_clock(20);
        d.tick();
        assert!(d.take_can_tx().is_some());
    }

    #[test]
    fn heartbeat_parses_big_endian_fields() {
        let mut d = CanDriver::new();
        d.on_heartbeat([0x01, 0x00, 0x00, 0x64, 0x00, 0x0A, 0x00, 0x00]);
        assert_eq!(d.heartbeat.position, 256);
        assert_eq!(d.heartbeat.rpm, 100);
    }

    #[test]
    fn heartbeat_loss_sets_has_error() {
        let mut d = CanDriver::new();
        d.init().unwrap();
        d.advance_can_clock(0);
        d.tick();
        assert!(d.status().has_error);

        d.on_heartbeat([0, 0, 0, 0, 0, 0, 0, 0]);
        d.advance_can_clock(0);
        d.tick();
        assert!(!d.status().has_error);

        d.advance_can_clock(CAN_HEARTBEAT_TIMEOUT_MS + 1);
        d.tick();
        assert!(d.status().has_error);
    }

    #[test]
    fn feed_can_frame_ignores_frames_that_are_not_the_heartbeat_id() {
        let mut d = CanDriver::new();
        d.feed_can_frame(CanFrame {
            id: CAN_COMMAND_ID,
            data: [0x01, 0x00, 0x00, 0x64, 0x00, 0x0A, 0x00, 0x00],
        });
        assert_eq!(d.heartbeat.position, 0);

        d.feed_can_frame(CanFrame {
            id: CAN_HEARTBEAT_ID,
            data: [0x01, 0x00, 0x00, 0x64, 0x00, 0x0A, 0x00, 0x00],
        });
        assert_eq!(d.heartbeat.position, 256);
    }

    #[test]
    fn handle_kickout_disables_and_zeros_target() {
        let mut d = CanDriver::new();
        d.init().unwrap();
        d.enable(true);
        d.set_speed(80.0);
        d.handle_kickout(KickoutCause::MotorSlip(80.0, 10.0));
        assert!(!d.enabled);
        assert_eq!(d.target_speed_pct, 0.0);
    }
}
