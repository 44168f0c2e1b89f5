//! Black-box lifecycle tests driving a full `CycleRunner` through its
//! public API: a scripted transport feeds wire frames in, the status
//! frames it emits back are decoded to observe engagement state, since
//! the tick loop itself has no other externally visible output.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use steer_common::config::MemorySettingsStore;
use steer_common::consts::MAX_PAYLOAD_LEN;
use steer_common::model::{MotorStatus, SteerConfig, SteerSettings, SteerSwitchMode};
use steer_common::motor::{DriverError, MotorDriver, MotorKind};
use steer_core::config::LoadedConfig;
use steer_core::cycle::{CycleRunner, FrameTransport};
use steer_core::pin_arbiter::PinArbiter;
use steer_core::sensors::SensorInputs;
use steer_router::context::NetworkIdentity;
use steer_router::frame::{parse, Frame};

const MAX_FRAME_BYTES: usize = MAX_PAYLOAD_LEN + 6;

type Datagram = heapless::Vec<u8, MAX_FRAME_BYTES>;

struct StubDriver {
    enabled: bool,
    speed: f32,
    status: MotorStatus,
}

impl StubDriver {
    fn new() -> Self {
        Self {
            enabled: false,
            speed: 0.0,
            status: MotorStatus::default(),
        }
    }
}

impl MotorDriver for StubDriver {
    fn kind(&self) -> MotorKind {
        MotorKind::Simulation
    }
    fn init(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
    fn enable(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.speed = 0.0;
        }
    }
    fn set_speed(&mut self, percent: f32) {
        self.speed = percent;
    }
    fn tick(&mut self) {
        self.status.enabled = self.enabled;
        self.status.target_pwm = self.speed as i16;
        self.status.actual_pwm = self.speed as i16;
    }
    fn status(&self) -> MotorStatus {
        self.status
    }
}

/// WAS parked dead-center, work switch on, no encoder motion — the
/// angle loop holds at zero while engagement is exercised through
/// guidance frames alone.
struct ParkedSensorInputs;

impl SensorInputs for ParkedSensorInputs {
    fn read_was_adc(&mut self) -> u16 {
        steer_common::consts::WAS_ADC_MIDPOINT as u16
    }
    fn read_current_adc(&mut self) -> u16 {
        0
    }
    fn read_pressure_adc(&mut self) -> u16 {
        0
    }
    fn read_steer_switch(&mut self) -> bool {
        false
    }
    fn read_work_switch(&mut self) -> bool {
        true
    }
    fn read_work_switch_pct(&mut self) -> f32 {
        100.0
    }
    fn encoder_pulse_count(&self) -> u32 {
        0
    }
}

/// Feeds a scripted sequence of inbound datagrams (one per `recv_at`
/// tick) and records every outbound datagram into a handle the test
/// keeps, since `CycleRunner` takes ownership of the transport itself.
struct ScriptedTransport {
    tick: u64,
    inbound: VecDeque<(u64, Datagram)>,
    sent: Rc<RefCell<Vec<Datagram>>>,
}

impl ScriptedTransport {
    fn new(inbound: Vec<(u64, Frame)>, sent: Rc<RefCell<Vec<Datagram>>>) -> Self {
        let inbound = inbound
            .into_iter()
            .map(|(tick, frame)| (tick, frame.to_bytes()))
            .collect();
        Self {
            tick: 0,
            inbound,
            sent,
        }
    }
}

impl FrameTransport for ScriptedTransport {
    fn try_recv(&mut self) -> Option<Datagram> {
        let due = self.tick;
        self.tick += 1;
        if matches!(self.inbound.front(), Some((t, _)) if *t == due) {
            Some(self.inbound.pop_front().unwrap().1)
        } else {
            None
        }
    }

    fn send(&mut self, bytes: &[u8]) {
        let mut out = heapless::Vec::new();
        let _ = out.extend_from_slice(bytes);
        self.sent.borrow_mut().push(out);
    }
}

fn steer_data_frame(target_angle_deg: f32, speed_kmh: f32, guidance_active: bool) -> Frame {
    let speed_cm_s = ((speed_kmh / 3.6) * 100.0) as u16;
    let status = if guidance_active { 0b0100_0001u8 } else { 0 };
    let angle_raw = (target_angle_deg * 100.0) as i16;
    let angle_bytes = angle_raw.to_le_bytes();
    let speed_bytes = speed_cm_s.to_le_bytes();
    let data = [
        speed_bytes[0],
        speed_bytes[1],
        status,
        angle_bytes[0],
        angle_bytes[1],
        0,
        0,
        0,
    ];
    Frame::new(0, 254, &data).unwrap()
}

fn subnet_change_frame() -> Frame {
    Frame::new(0, 201, &[10, 0, 1]).unwrap()
}

/// Bit1 of the status switch byte is 0 once autosteer is armed
/// (SoftStart or NormalControl), 1 while Disabled.
fn armed(status: &Frame) -> bool {
    status.data[6] & (1 << 1) == 0
}

fn status_frames(sent: &[Datagram]) -> Vec<Frame> {
    sent.iter()
        .filter_map(|bytes| parse(bytes).ok())
        .filter(|f| f.type_id == 253)
        .collect()
}

fn build_runner(transport: ScriptedTransport) -> CycleRunner {
    let loaded = LoadedConfig {
        steer_config: SteerConfig {
            steer_switch_mode: SteerSwitchMode::None,
            ..SteerConfig::default()
        },
        steer_settings: SteerSettings::default(),
    };
    let mut arbiter = PinArbiter::new();
    CycleRunner::new(
        loaded,
        Box::new(StubDriver::new()),
        Box::new(ParkedSensorInputs),
        Box::new(transport),
        None,
        Box::new(MemorySettingsStore::default()),
        NetworkIdentity::default(),
        &mut arbiter,
    )
    .unwrap()
}

#[test]
fn guidance_engages_and_final_status_frame_reports_armed() {
    let sent = Rc::new(RefCell::new(Vec::new()));
    // Engage on tick 0, terminate after soft-start has had time to elapse
    // (250ms default / 10ms per tick == 25 ticks) so the final status
    // frame observes the wheel already past SoftStart.
    let transport = ScriptedTransport::new(
        vec![
            (0, steer_data_frame(5.0, 8.0, true)),
            (40, subnet_change_frame()),
        ],
        sent.clone(),
    );
    let mut runner = build_runner(transport);
    runner.run().unwrap();
    assert!(runner.reboot_requested());

    let frames = status_frames(&sent.borrow());
    assert!(!frames.is_empty(), "expected at least one status frame");
    let last = frames.last().unwrap();
    assert!(armed(last), "expected autosteer armed by tick 40");
}

#[test]
fn no_guidance_keeps_status_frames_disarmed() {
    let sent = Rc::new(RefCell::new(Vec::new()));
    let transport = ScriptedTransport::new(vec![(30, subnet_change_frame())], sent.clone());
    let mut runner = build_runner(transport);
    runner.run().unwrap();
    assert!(runner.reboot_requested());

    let frames = status_frames(&sent.borrow());
    assert!(!frames.is_empty(), "expected at least one status frame");
    assert!(
        frames.iter().all(|f| !armed(f)),
        "no guidance was ever sent, autosteer must never arm"
    );
}

#[test]
fn subnet_change_frame_requests_reboot_and_run_returns() {
    let sent = Rc::new(RefCell::new(Vec::new()));
    let transport = ScriptedTransport::new(vec![(0, subnet_change_frame())], sent);
    let mut runner = build_runner(transport);
    let result = runner.run();
    assert!(result.is_ok());
    assert!(runner.reboot_requested());
}
