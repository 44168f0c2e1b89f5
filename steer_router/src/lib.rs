//! Wire-protocol framing, handler registry, and status-frame emission for
//! the autosteer core.
//!
//! # Module Structure
//!
//! - [`frame`] - `0x80 0x81 SRC TYPE LEN DATA CRC` framing
//! - [`context`] - Borrowed state handlers operate on
//! - [`registry`] - Capacity-bounded handler table and dispatch
//! - [`handlers`] - Concrete handlers for each recognized frame type
//! - [`status`] - 10 Hz status-frame construction

pub mod context;
pub mod frame;
pub mod handlers;
pub mod registry;
pub mod status;

pub use context::{NetworkIdentity, RouterContext, RouterCounters};
pub use frame::{Frame, FrameError};
pub use registry::{HandlerRegistry, RegistryError};

/// Register the standard 200/201/202/251/252/254 handlers into `registry`.
pub fn register_default_handlers(registry: &mut HandlerRegistry) -> Result<(), RegistryError> {
    registry.register(handlers::TYPE_HELLO, "hello", handlers::hello)?;
    registry.register(
        handlers::TYPE_SUBNET_CHANGE,
        "subnet_change",
        handlers::subnet_change,
    )?;
    registry.register(handlers::TYPE_SCAN, "scan", handlers::scan)?;
    registry.register(
        handlers::TYPE_STEER_CONFIG,
        "steer_config",
        handlers::steer_config,
    )?;
    registry.register(
        handlers::TYPE_STEER_SETTINGS,
        "steer_settings",
        handlers::steer_settings,
    )?;
    registry.register(
        handlers::TYPE_STEER_DATA,
        "steer_data",
        handlers::steer_data,
    )?;
    Ok(())
}
