//! Error taxonomy (§7): deliberately small. Most categories are counted
//! and logged rather than propagated — the control loop never stops
//! serving frames, it only ever closes its outputs to the safe state.

use thiserror::Error;

use steer_common::config::ConfigError;
use steer_common::motor::DriverError;
use steer_router::{FrameError, RegistryError};

/// Errors that can abort startup. Everything that happens after the loop
/// is running is handled inline (clamped, counted, logged) rather than
/// raised through this type — see the module doc.
#[derive(Debug, Error)]
pub enum BootError {
    #[error("configuration failed to load: {0}")]
    Config(#[from] ConfigError),

    #[error("motor driver failed to initialize: {0}")]
    Driver(#[from] DriverError),

    #[error("pin ownership claim failed during boot: {0}")]
    PinOwnership(#[from] crate::pin_arbiter::ArbiterError),

    #[error("protocol handler registration failed: {0}")]
    Router(#[from] RegistryError),

    #[error("real-time setup failed: {0}")]
    Rt(#[from] crate::cycle::CycleError),

    #[error("frame transport failed to bind: {0}")]
    Transport(String),
}

/// Per-tick transient conditions, accumulated in [`Counters`] rather than
/// returned — a single CAN TX failure or malformed frame must never stall
/// the 100 Hz loop.
#[derive(Debug, Default, Clone, Copy)]
pub struct Counters {
    /// Frame dropped: bad magic, CRC mismatch, length mismatch, or an
    /// unrecognized type.
    pub frames_malformed: u64,
    /// A single CAN TX or UDP send failed and will be retried next tick.
    pub transient_io_errors: u64,
    /// A settings byte was out of range and clamped to the nearest valid
    /// value (the frame is still ACK'd — see §7).
    pub settings_values_clamped: u64,
    /// Ticks spent with `MotorStatus.has_error` set (CAN heartbeat loss).
    pub heartbeat_loss_ticks: u64,
    /// Kickout latches observed since boot.
    pub kickouts: u64,
}

impl Counters {
    pub const fn new() -> Self {
        Self {
            frames_malformed: 0,
            transient_io_errors: 0,
            settings_values_clamped: 0,
            heartbeat_loss_ticks: 0,
            kickouts: 0,
        }
    }

    pub fn record_frame_error(&mut self, _err: FrameError) {
        self.frames_malformed += 1;
    }
}
