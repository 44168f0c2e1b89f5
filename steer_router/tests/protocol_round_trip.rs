//! Integration test: a frame serialized to wire bytes, parsed back, and
//! dispatched through the real [`HandlerRegistry`] exactly as the core's
//! composition root does each tick — no per-handler unit shortcuts.

use steer_common::config::{MemorySettingsStore, SettingsStore};
use steer_common::model::{GuidanceInputs, SteerConfig, SteerSettings};
use steer_router::context::{NetworkIdentity, RouterContext, RouterCounters};
use steer_router::frame::{parse, Frame};
use steer_router::{register_default_handlers, status, HandlerRegistry};

struct Fixture {
    config: SteerConfig,
    settings: SteerSettings,
    guidance: GuidanceInputs,
    store: MemorySettingsStore,
    identity: NetworkIdentity,
    counters: RouterCounters,
    last_254_ms: u32,
    reboot_requested: bool,
}

impl Fixture {
    fn new() -> Self {
        Self {
            config: SteerConfig::default(),
            settings: SteerSettings::default(),
            guidance: GuidanceInputs::default(),
            store: MemorySettingsStore::default(),
            identity: NetworkIdentity::default(),
            counters: RouterCounters::default(),
            last_254_ms: 0,
            reboot_requested: false,
        }
    }

    fn ctx(&mut self, now_ms: u32) -> RouterContext<'_> {
        RouterContext {
            config: &mut self.config,
            settings: &mut self.settings,
            guidance: &mut self.guidance,
            store: &mut self.store,
            identity: &mut self.identity,
            counters: &mut self.counters,
            last_254_ms: &mut self.last_254_ms,
            reboot_requested: &mut self.reboot_requested,
            now_ms,
        }
    }
}

#[test]
fn hello_round_trips_over_the_wire_and_dispatch() {
    let mut registry = HandlerRegistry::new();
    register_default_handlers(&mut registry).unwrap();

    let wire = Frame::new(5, 200, &[]).unwrap().to_bytes();
    let frame = parse(&wire).unwrap();

    let mut fixture = Fixture::new();
    let mut ctx = fixture.ctx(0);
    let replies = registry.dispatch(&frame, &mut ctx).unwrap();

    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].type_id, 126);
    assert_eq!(&replies[0].data[1..5], &[192, 168, 5, 126]);
}

#[test]
fn steer_data_then_steer_settings_then_status_reflects_both() {
    let mut registry = HandlerRegistry::new();
    register_default_handlers(&mut registry).unwrap();
    let mut fixture = Fixture::new();

    // 254: 7.2 km/h, guidance + autosteer requested, target 1.50 deg.
    let data = [200u8, 0, 0b0100_0001, 150, 0, 0, 0, 0];
    let wire = Frame::new(0, 254, &data).unwrap().to_bytes();
    let frame = parse(&wire).unwrap();
    {
        let mut ctx = fixture.ctx(1000);
        assert!(registry.dispatch(&frame, &mut ctx).unwrap().is_empty());
    }
    assert!((fixture.guidance.target_angle_deg - 1.5).abs() < 1e-3);
    assert_eq!(fixture.last_254_ms, 1000);

    // 252: min_pwm=50 triggers the low_pwm = min_pwm * 1.2 wire quirk.
    let settings_data = [20u8, 200, 99, 50, 100, 5, 0, 100];
    let wire = Frame::new(0, 252, &settings_data).unwrap().to_bytes();
    let frame = parse(&wire).unwrap();
    {
        let mut ctx = fixture.ctx(1010);
        assert!(registry.dispatch(&frame, &mut ctx).unwrap().is_empty());
    }
    assert_eq!(fixture.settings.low_pwm, 60);
    assert!(
        fixture.store.get("steer_settings").is_some(),
        "settings frame must persist before acking"
    );

    let snapshot = status::StatusSnapshot {
        angle_deg: 1.5,
        motor_state: steer_common::model::MotorState::NormalControl,
        work_switch_active: true,
        motor_speed_pct: 40.0,
    };
    let status_frame = status::build_status_frame(&snapshot);
    let round_tripped = parse(&status_frame.to_bytes()).unwrap();
    assert_eq!(round_tripped.type_id, status::TYPE_STATUS);
    assert_eq!(round_tripped.data[6], 0, "armed and work switch on clears both bits");
}

#[test]
fn malformed_wire_bytes_are_rejected_without_reaching_the_registry() {
    let mut wire = Frame::new(0, 254, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap().to_bytes();
    let last = wire.len() - 1;
    wire[last] ^= 0xFF; // corrupt the CRC byte

    assert!(parse(&wire).is_err());
}
