//! # Autosteer Core
//!
//! The 100 Hz control loop, state machine, sensor acquisition, kickout
//! monitor, and protocol-router composition root for the agricultural
//! autosteer controller.
//!
//! ## Architecture
//!
//! 1. **[`state`]** — Disabled -> SoftStart -> NormalControl engagement
//!    state machine and the `should_steer()` engagement guard.
//! 2. **[`control`]** — P-only steering controller, PWM shaping, and the
//!    soft-start torque ramp, each a pure function of the loop's inputs.
//! 3. **[`sensors`]** — Staggered WAS/current/switch/pressure/encoder
//!    acquisition, decoupled from the hot-path rate.
//! 4. **[`kickout`]** — Fuses sensor and motor feedback into a single
//!    disengage signal, latched with cooldown.
//! 5. **[`cycle`]** — Owns all of the above plus the motor driver and
//!    protocol router; wraps them in the RT/simulation pacing loop.
//!
//! ## Zero-Allocation Hot Path
//!
//! Sensor, kickout, and control state are pre-allocated at boot inside
//! [`cycle::CycleRunner`]. The 100 Hz tick performs no heap allocation.

#![deny(clippy::disallowed_types)]

pub mod config;
pub mod control;
pub mod cycle;
pub mod error;
pub mod kickout;
pub mod pin_arbiter;
pub mod sensors;
pub mod state;
