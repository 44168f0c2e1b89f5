//! Motor-driver backend registry.
//!
//! Constructor-injected, no global state — testable in isolation. The
//! upstream `evo_hal` driver registry kept this style alongside a legacy
//! global `LazyLock` shim for callers that hadn't migrated; this registry
//! collapses that into the single constructor-injected path, since nothing
//! in this workspace still needs the legacy one.

use std::collections::HashMap;

use steer_common::motor::{DriverError, MotorDriver};

/// Factory function type for creating backend instances.
pub type DriverFactory = fn() -> Box<dyn MotorDriver>;

/// Registry of available motor-driver backends, keyed by the name used in
/// [`steer_common::model::SteerConfig::motor_driver_selector`] resolution.
///
/// Constructed at startup, populated via `register()`, and passed by value
/// to the composition root.
pub struct DriverRegistry {
    factories: HashMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory under `name`.
    ///
    /// # Panics
    /// Panics if `name` is already registered — this only happens at boot
    /// wiring time, never in the 100 Hz hot path, so a panic surfaces the
    /// programming error immediately rather than silently shadowing it.
    pub fn register(&mut self, name: &'static str, factory: DriverFactory) {
        if self.factories.contains_key(name) {
            panic!("motor driver backend '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    pub fn get_factory(&self, name: &str) -> Option<DriverFactory> {
        self.factories.get(name).copied()
    }

    /// Instantiate the backend registered under `name`.
    pub fn create_driver(&self, name: &str) -> Result<Box<dyn MotorDriver>, DriverError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| DriverError::InitFailed(format!("unknown backend '{name}'")))?;
        Ok(factory())
    }

    pub fn list_drivers(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a registry with all backends this crate ships registered under
/// their canonical names.
pub fn default_registry() -> DriverRegistry {
    let mut reg = DriverRegistry::new();
    reg.register("pwm", || Box::new(crate::backends::pwm::PwmDriver::new()));
    reg.register("can", || Box::new(crate::backends::can::CanDriver::new()));
    reg.register("simulation", || {
        Box::new(crate::backends::simulation::SimulationDriver::new())
    });
    reg
}
