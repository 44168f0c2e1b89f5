//! Mutable state handlers operate on: the persistent config/settings
//! structs, the latest guidance inputs, and small bits of network/router
//! bookkeeping. Owned by the composition root, borrowed for the duration
//! of one [`crate::registry::HandlerRegistry::dispatch`] call.

use steer_common::config::SettingsStore;
use steer_common::model::{GuidanceInputs, SteerConfig, SteerSettings};

/// Network identity the Hello/Scan/SubnetChange handlers read and mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkIdentity {
    pub ip: [u8; 4],
    pub subnet: [u8; 3],
}

impl Default for NetworkIdentity {
    fn default() -> Self {
        Self {
            ip: [192, 168, 5, 126],
            subnet: [192, 168, 5],
        }
    }
}

/// Counted-but-not-surfaced router statistics (§7: transient I/O and
/// configuration-invalid events are counted, never escalated to errors).
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterCounters {
    pub frames_dropped_bad_frame: u64,
    pub frames_dropped_unknown_type: u64,
    pub settings_values_clamped: u64,
}

/// Everything a handler function needs, borrowed from the composition
/// root for one dispatch call.
pub struct RouterContext<'a> {
    pub config: &'a mut SteerConfig,
    pub settings: &'a mut SteerSettings,
    pub guidance: &'a mut GuidanceInputs,
    pub store: &'a mut dyn SettingsStore,
    pub identity: &'a mut NetworkIdentity,
    pub counters: &'a mut RouterCounters,
    pub last_254_ms: &'a mut u32,
    pub reboot_requested: &'a mut bool,
    pub now_ms: u32,
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::*;
    use steer_common::config::MemorySettingsStore;

    /// Owns every field [`RouterContext`] borrows, so tests can build a
    /// fresh context per call without fighting the borrow checker.
    pub struct DummyContext {
        config: SteerConfig,
        settings: SteerSettings,
        guidance: GuidanceInputs,
        store: MemorySettingsStore,
        identity: NetworkIdentity,
        counters: RouterCounters,
        last_254_ms: u32,
        reboot_requested: bool,
        now_ms: u32,
    }

    pub fn dummy_context() -> DummyContext {
        DummyContext {
            config: SteerConfig::default(),
            settings: SteerSettings::default(),
            guidance: GuidanceInputs::default(),
            store: MemorySettingsStore::default(),
            identity: NetworkIdentity::default(),
            counters: RouterCounters::default(),
            last_254_ms: 0,
            reboot_requested: false,
            now_ms: 0,
        }
    }

    impl DummyContext {
        pub fn ctx(&mut self) -> RouterContext<'_> {
            RouterContext {
                config: &mut self.config,
                settings: &mut self.settings,
                guidance: &mut self.guidance,
                store: &mut self.store,
                identity: &mut self.identity,
                counters: &mut self.counters,
                last_254_ms: &mut self.last_254_ms,
                reboot_requested: &mut self.reboot_requested,
                now_ms: self.now_ms,
            }
        }

        pub fn guidance(&self) -> &GuidanceInputs {
            &self.guidance
        }

        pub fn config(&self) -> &SteerConfig {
            &self.config
        }

        pub fn settings(&self) -> &SteerSettings {
            &self.settings
        }

        pub fn reboot_requested(&self) -> bool {
            self.reboot_requested
        }
    }
}
