//! The [`MotorDriver`] trait implemented by `steer_hal` backends.
//!
//! Lives in this crate (rather than `steer_hal`) so both `steer_core` (the
//! consumer) and `steer_hal` (the implementors) can depend on it without
//! `steer_core` depending on `steer_hal` directly.

use thiserror::Error;

use crate::model::{KickoutCause, MotorStatus};

/// Error types for motor-driver operations.
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    #[error("driver initialization failed: {0}")]
    InitFailed(String),

    #[error("hardware communication error: {0}")]
    CommunicationError(String),

    #[error("unsupported operation for this backend: {0}")]
    Unsupported(String),
}

/// Identifies which physical backend a [`MotorDriver`] speaks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorKind {
    Pwm,
    Can,
    Simulation,
}

/// One 29-bit extended CAN frame, as carried on or off the bus.
///
/// Lives here (rather than `steer_hal`) so [`MotorDriver`]'s CAN hooks can
/// name the type without `steer_common` depending back on `steer_hal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    pub id: u32,
    pub data: [u8; 8],
}

/// Interface implemented by each motor-driver backend (PWM H-bridge, Keya
/// CAN, simulation). The control loop in `steer_core` talks to whichever
/// backend was selected at boot only through this trait.
///
/// # Lifecycle
///
/// 1. `init()` — called once before the 100 Hz loop starts.
/// 2. `tick()` — called every cycle; backend should send/receive whatever
///    the physical link requires for that tick (PWM duty update, CAN
///    command frame, etc.), even while disabled.
/// 3. `status()` — read back after `tick()` to get the backend's view of
///    what actually happened this cycle.
///
/// # Timing
///
/// `tick()` runs inside the 100 Hz hot path and must not block or
/// allocate.
pub trait MotorDriver: Send + Sync {
    fn kind(&self) -> MotorKind;

    /// One-time hardware/link setup. Not time-constrained.
    fn init(&mut self) -> Result<(), DriverError>;

    /// Enable or disable motor output. Disabling must be safe to call at
    /// any time and should zero the commanded PWM/speed immediately.
    fn enable(&mut self, enabled: bool);

    /// Command a signed percentage, `-100.0..=100.0`.
    fn set_speed(&mut self, percent: f32);

    /// Equivalent to `enable(false)` followed by `set_speed(0.0)`.
    fn stop(&mut self) {
        self.enable(false);
        self.set_speed(0.0);
    }

    /// Advance the backend by one 100 Hz tick.
    fn tick(&mut self);

    /// Snapshot of the backend's state after the most recent `tick()`.
    fn status(&self) -> MotorStatus;

    /// True once the backend has positively identified hardware on its
    /// link (relevant to CAN/auto-detected backends). Default: always
    /// detected, for backends with no discovery phase (PWM, simulation).
    fn is_detected(&self) -> bool {
        true
    }

    /// True if this backend can report motor current.
    fn supports_current(&self) -> bool {
        false
    }

    /// True if this backend can report shaft/wheel position feedback
    /// independent of the WAS (none of the current backends do).
    fn supports_position(&self) -> bool {
        false
    }

    /// Most recent current draw in amperes, if [`Self::supports_current`].
    fn current_draw_a(&self) -> Option<f32> {
        None
    }

    /// Commanded vs. actual feedback used by the kickout monitor's
    /// motor-slip check. Backends without RPM feedback return `None`.
    fn commanded_vs_actual_rpm(&self) -> Option<(f32, f32)> {
        None
    }

    /// Notify the backend that a kickout has latched, in case it needs to
    /// react beyond the `stop()` the control loop will also issue (e.g.
    /// logging a cause-tagged fault). Default: no-op.
    fn handle_kickout(&mut self, _cause: KickoutCause) {}

    /// Advance the backend's notion of time by one tick, for backends that
    /// pace their own bus traffic independently of `tick()`'s call cadence
    /// (the CAN backend's 20 ms TX period). Default: no-op, since only a
    /// bus-paced backend needs a clock.
    fn advance_can_clock(&mut self, _now_ms: u32) {}

    /// Feed one inbound CAN frame (the control loop's CAN transport seam
    /// calls this for every frame it receives). Default: no-op, for
    /// backends with no bus to listen on.
    fn feed_can_frame(&mut self, _frame: CanFrame) {}

    /// Take the frame this backend wants transmitted this tick, if any.
    /// Default: nothing to send, for backends with no bus to drive.
    fn take_can_tx(&mut self) -> Option<CanFrame> {
        None
    }
}
