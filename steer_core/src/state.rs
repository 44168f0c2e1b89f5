//! Control-loop state machine: Disabled -> SoftStart -> NormalControl.
//!
//! Implements the transition table from §4.1 with guards I2/I3 and the
//! kickout override that can fire from any state.

use steer_common::consts::MIN_STEER_SPEED_KMH;
use steer_common::model::MotorState;

/// Whether the control loop is permitted to engage this tick (I2, I6, I7).
///
/// `kickout_latch_ms` is `None` when no kickout is currently latched.
#[allow(clippy::too_many_arguments)]
pub fn should_steer(
    guidance_active: bool,
    operator_intent: bool,
    vehicle_speed_kmh: f32,
    now_ms: u32,
    last_254_ms: u32,
    watchdog_ms: u32,
    kickout_latch_ms: Option<u32>,
    kickout_cooldown_ms: u32,
) -> bool {
    if !guidance_active || !operator_intent {
        return false;
    }
    if vehicle_speed_kmh <= MIN_STEER_SPEED_KMH {
        return false;
    }
    if now_ms.wrapping_sub(last_254_ms) > watchdog_ms {
        return false;
    }
    if let Some(latch_ms) = kickout_latch_ms {
        if now_ms.wrapping_sub(latch_ms) < kickout_cooldown_ms {
            return false;
        }
    }
    true
}

/// Result of a state transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded - new state.
    Ok(MotorState),
    /// No transition - guard was not satisfied.
    Held,
}

/// Event that can drive a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteerEvent {
    /// `should_steer()` evaluated this tick.
    ShouldSteer(bool),
    /// Soft-start elapsed time has reached `soft_start_duration_ms`.
    SoftStartElapsed,
    /// A kickout cause latched.
    Kickout,
}

/// Owns the current [`MotorState`] and the soft-start epoch.
#[derive(Debug, Clone, Copy)]
pub struct SteerStateMachine {
    state: MotorState,
    /// `now_ms` at the Disabled -> SoftStart transition (I3).
    soft_start_t0_ms: u32,
}

impl SteerStateMachine {
    pub const fn new() -> Self {
        Self {
            state: MotorState::Disabled,
            soft_start_t0_ms: 0,
        }
    }

    #[inline]
    pub const fn state(&self) -> MotorState {
        self.state
    }

    #[inline]
    pub const fn soft_start_t0_ms(&self) -> u32 {
        self.soft_start_t0_ms
    }

    /// Apply one event at `now_ms`, per the §4.1 transition table.
    pub fn handle_event(&mut self, event: SteerEvent, now_ms: u32) -> TransitionResult {
        use MotorState::*;
        use SteerEvent::*;

        match (self.state, event) {
            (_, Kickout) => {
                self.state = Disabled;
                TransitionResult::Ok(Disabled)
            }
            (Disabled, ShouldSteer(true)) => {
                self.state = SoftStart;
                self.soft_start_t0_ms = now_ms;
                TransitionResult::Ok(SoftStart)
            }
            (SoftStart, ShouldSteer(false)) | (NormalControl, ShouldSteer(false)) => {
                self.state = Disabled;
                TransitionResult::Ok(Disabled)
            }
            (SoftStart, SoftStartElapsed) => {
                self.state = NormalControl;
                TransitionResult::Ok(NormalControl)
            }
            _ => TransitionResult::Held,
        }
    }

    /// Force the machine to Disabled (kickout shorthand, bypasses events).
    pub fn force_disabled(&mut self) {
        self.state = MotorState::Disabled;
    }
}

impl Default for SteerStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
