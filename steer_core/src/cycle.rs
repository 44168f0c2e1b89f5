//! Composition root: wires sensors, kickout, control, and the protocol
//! router into the 100 Hz tick and owns the RT/simulation loop pacing.
//!
//! ## Boot-time RT setup
//! Runs once, before the first tick, and only does anything under the
//! `rt` feature:
//! 1. Pre-allocate everything the loop will touch (no heap use once ticking).
//! 2. `mlockall(MCL_CURRENT | MCL_FUTURE)`.
//! 3. Prefault the stack so the first real tick doesn't fault pages in.
//! 4. `sched_setaffinity` onto the configured core.
//! 5. `sched_setscheduler(SCHED_FIFO, priority)`.
//!
//! ## Steady-state pacing
//! `rt` build: absolute-time sleep on `CLOCK_MONOTONIC`, so drift never
//! accumulates across ticks. Default build: plain `std::thread::sleep`,
//! adequate for simulation but not drift-free.
//!
//! ## Cycle Body (§4.1)
//! Drain inbound frames, sample sensors, evaluate kickout, drive the
//! state machine, compute the motor command, write it to the driver, and
//! emit a status frame every tenth tick.

use steer_common::config::SettingsStore;
use steer_common::consts::{
    CURRENT_THRESHOLD_DEFAULT, CYCLE_PERIOD_US, KICKOUT_COOLDOWN_MS_DEFAULT,
    MOTOR_SLIP_GRACE_MS, PRESSURE_THRESHOLD_DEFAULT, SOFT_START_DURATION_MS_DEFAULT,
    SOFT_START_PEAK_FRACTION_DEFAULT, WATCHDOG_MS_DEFAULT,
};
use steer_common::model::{GuidanceInputs, MotorState, SteerConfig, SteerSettings, SteerSwitchMode};
use steer_common::motor::{CanFrame, MotorDriver, MotorKind};
use thiserror::Error;

use steer_router::context::{NetworkIdentity, RouterContext, RouterCounters};
use steer_router::{frame, register_default_handlers, HandlerRegistry};

use crate::config::LoadedConfig;
use crate::control::{pid, pwm_shaping, soft_start};
use crate::error::{BootError, Counters};
use crate::kickout::{KickoutInputs, KickoutMonitor};
use crate::pin_arbiter::PinArbiter;
use crate::sensors::{IdentityWasFilter, SensorBoard, SensorInputs, WasFilter};
use crate::state::{should_steer, SteerEvent, SteerStateMachine, TransitionResult};

/// Control-loop tick period, milliseconds (derived from [`CYCLE_PERIOD_US`]).
const CYCLE_PERIOD_MS: u32 = (CYCLE_PERIOD_US / 1000) as u32;

/// Maximum size of one inbound/outbound wire datagram.
const MAX_FRAME_BYTES: usize = steer_common::consts::MAX_PAYLOAD_LEN + 6;

/// Byte-oriented seam to whatever external transport delivers and
/// accepts frames (§6 leaves the UDP/Ethernet stack itself out of
/// scope) — one call to [`try_recv`](FrameTransport::try_recv) yields
/// one already-delimited datagram, which the loop parses with
/// [`steer_router::frame::parse`].
pub trait FrameTransport {
    /// Pull one waiting datagram without blocking, or `None` if nothing
    /// is pending this tick.
    fn try_recv(&mut self) -> Option<heapless::Vec<u8, MAX_FRAME_BYTES>>;
    /// Send one already-framed datagram.
    fn send(&mut self, bytes: &[u8]);
}

/// Byte-oriented seam to whatever bus carries CAN traffic (SocketCAN, a
/// vendor SDK, a bench simulator) — mirrors [`FrameTransport`]. Only
/// relevant when the CAN motor-driver backend is selected; the loop skips
/// this entirely for PWM/simulation backends.
pub trait CanTransport {
    /// Pull one waiting frame without blocking, or `None` if nothing is
    /// pending this tick.
    fn try_recv(&mut self) -> Option<CanFrame>;
    /// Send one frame.
    fn send(&mut self, frame: CanFrame);
}

/// How long to watch for a CAN heartbeat before falling back to the
/// `motor_driver_selector` byte (§4.3): a heartbeat observed anywhere in
/// this window wins over the selector regardless of its value.
pub const CAN_DETECTION_WINDOW_MS: u32 = 1_000;

/// Spacing between receive attempts during [`detect_can_heartbeat`].
pub const CAN_DETECTION_POLL_MS: u32 = 50;

/// Boot-time probe: watch `can_bus` for a heartbeat frame for up to
/// `window_ms`, sleeping `poll_ms` between attempts via the injected
/// `sleep` (real time in production, a no-op in tests). Returns `true` the
/// moment a heartbeat is seen, `false` if the window elapses with nothing
/// on the bus.
pub fn detect_can_heartbeat(
    can_bus: &mut dyn CanTransport,
    window_ms: u32,
    poll_ms: u32,
    mut sleep: impl FnMut(u32),
) -> bool {
    let mut elapsed_ms = 0u32;
    loop {
        if let Some(frame) = can_bus.try_recv() {
            if frame.id == steer_common::consts::CAN_HEARTBEAT_ID {
                return true;
            }
        }
        if elapsed_ms >= window_ms {
            return false;
        }
        sleep(poll_ms);
        elapsed_ms += poll_ms;
    }
}

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics, updated every cycle with no
/// allocation: min/max/avg plus overrun and wake-latency tracking. No
/// running sum-of-squares here — nothing downstream consumes a stddev,
/// and the 100 Hz loop has no budget to carry state that only ever grows.
#[derive(Debug, Clone)]
pub struct CycleStats {
    pub cycle_count: u64,
    pub last_cycle_ns: i64,
    pub min_cycle_ns: i64,
    pub max_cycle_ns: i64,
    pub sum_cycle_ns: i64,
    pub overruns: u64,
    pub max_latency_ns: i64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        if duration_ns < self.min_cycle_ns {
            self.min_cycle_ns = duration_ns;
        }
        if duration_ns > self.max_cycle_ns {
            self.max_cycle_ns = duration_ns;
        }
        self.sum_cycle_ns += duration_ns;
        if latency_ns > self.max_latency_ns {
            self.max_latency_ns = latency_ns;
        }
    }

    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── RT Setup ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("RT setup error: {0}")]
    RtSetup(String),
    #[error("cycle overrun: {actual_ns}ns > {budget_ns}ns budget")]
    CycleOverrun { actual_ns: i64, budget_ns: i64 },
}

/// No-op when the `rt` feature is not enabled.
#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{mlockall, MlockallFlags};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))?;
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch 1 MB of stack to prefault pages ahead of the RT loop.
fn prefault_stack() {
    let mut buf = [0u8; 1024 * 1024];
    for byte in buf.iter_mut() {
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))?;
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Full RT setup sequence. Must run before entering the cycle loop; all
/// calls are no-ops in the default (non-`rt`) build.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Cycle Runner ────────────────────────────────────────────────────

/// Resolve the string name `steer_hal::default_registry()` keys its
/// backends by, from the wire-level u8 selector in
/// [`SteerConfig::motor_driver_selector`].
fn motor_backend_name(selector: u8) -> &'static str {
    match selector {
        0 => "pwm",
        1 => "can",
        _ => "simulation",
    }
}

/// Everything the 100 Hz loop owns: persistent config/settings, the
/// sensor/motor/transport seams, and the control-loop subsystems that
/// consume them. Built once at boot in the order described in the
/// module doc, then ticked forever.
pub struct CycleRunner {
    config: SteerConfig,
    settings: SteerSettings,
    store: Box<dyn SettingsStore>,
    identity: NetworkIdentity,
    guidance: GuidanceInputs,
    last_254_ms: u32,
    reboot_requested: bool,

    registry: HandlerRegistry,
    router_counters: RouterCounters,
    core_counters: Counters,

    sensor_inputs: Box<dyn SensorInputs>,
    sensor_board: SensorBoard,
    was_filter: Box<dyn WasFilter>,

    motor: Box<dyn MotorDriver>,
    state_machine: SteerStateMachine,
    kickout: KickoutMonitor,

    transport: Box<dyn FrameTransport>,
    /// Only `Some` when the CAN backend was selected at boot (§4.3).
    can_transport: Option<Box<dyn CanTransport>>,

    /// Toggle latch for `SteerSwitchMode::Button` (edge-triggered).
    button_engaged: bool,
    /// Most recently commanded signed motor percentage, for the kickout
    /// monitor's settle-time gate.
    last_commanded_pct: f32,
    last_command_change_ms: u32,

    tick_count: u64,
    cycle_time_ns: i64,
    pub stats: CycleStats,
}

impl CycleRunner {
    /// Boot order: claim the pins/buses this core owns, construct the
    /// sensor board, resolve and init the motor backend, build the
    /// kickout monitor, and register the protocol handlers.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        loaded: LoadedConfig,
        mut motor: Box<dyn MotorDriver>,
        sensor_inputs: Box<dyn SensorInputs>,
        transport: Box<dyn FrameTransport>,
        can_transport: Option<Box<dyn CanTransport>>,
        store: Box<dyn SettingsStore>,
        identity: NetworkIdentity,
        arbiter: &mut PinArbiter,
    ) -> Result<Self, BootError> {
        arbiter.claim_bus("adc0", "sensors", "analog_in", 1_000_000, 12, false)?;
        arbiter.claim_pin("steer_switch", "sensors", "digital_in")?;
        arbiter.claim_pin("work_switch", "sensors", "digital_in")?;
        arbiter.claim_pin("encoder", "sensors", "counter_in")?;
        arbiter.claim_pin("motor_out", "motor", "pwm_or_can")?;

        motor.init()?;

        let mut registry = HandlerRegistry::new();
        register_default_handlers(&mut registry)?;

        let sensor_board = SensorBoard::new(
            loaded.steer_settings.was_offset,
            loaded.steer_settings.was_counts_per_degree,
            steer_common::consts::DEBOUNCE_MS_DEFAULT,
        );

        Ok(Self {
            config: loaded.steer_config,
            settings: loaded.steer_settings,
            store,
            identity,
            guidance: GuidanceInputs::default(),
            last_254_ms: 0,
            reboot_requested: false,
            registry,
            router_counters: RouterCounters::default(),
            core_counters: Counters::new(),
            sensor_inputs,
            sensor_board,
            was_filter: Box::new(IdentityWasFilter),
            motor,
            state_machine: SteerStateMachine::new(),
            kickout: KickoutMonitor::new(),
            transport,
            can_transport,
            button_engaged: false,
            last_commanded_pct: 0.0,
            last_command_change_ms: 0,
            tick_count: 0,
            cycle_time_ns: CYCLE_PERIOD_US as i64 * 1000,
            stats: CycleStats::new(),
        })
    }

    /// Resolve the backend name for `steer_hal::default_registry()`: a CAN
    /// heartbeat observed by [`detect_can_heartbeat`] wins over
    /// [`SteerConfig::motor_driver_selector`] irrespective of its value
    /// (§4.3); the selector only decides when nothing answered on the bus.
    pub fn resolve_backend_name(config: &SteerConfig, can_heartbeat_detected: bool) -> &'static str {
        if can_heartbeat_detected {
            "can"
        } else {
            motor_backend_name(config.motor_driver_selector)
        }
    }

    pub fn reboot_requested(&self) -> bool {
        self.reboot_requested
    }

    /// Enter the cycle loop. Never returns under normal operation unless
    /// a reboot was requested by the 251 (SubnetChange) handler, in
    /// which case it returns `Ok(())` so `main` can restart the process.
    pub fn run(&mut self) -> Result<(), CycleError> {
        #[cfg(feature = "rt")]
        {
            self.run_rt_loop()
        }

        #[cfg(not(feature = "rt"))]
        {
            self.run_sim_loop()
        }
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self) -> Result<(), CycleError> {
        use nix::time::{clock_gettime, clock_nanosleep, ClockId, ClockNanosleepFlags};

        let clock = ClockId::CLOCK_MONOTONIC;
        let mut next_wake =
            clock_gettime(clock).map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;

        loop {
            next_wake = timespec_add_ns(next_wake, self.cycle_time_ns);

            let cycle_start = clock_gettime(clock)
                .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;
            let wake_latency_ns = timespec_diff_ns(&cycle_start, &next_wake).abs();

            self.tick();

            let cycle_end = clock_gettime(clock)
                .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;
            let duration_ns = timespec_diff_ns(&cycle_end, &cycle_start);

            self.stats.record(duration_ns, wake_latency_ns);

            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
                return Err(CycleError::CycleOverrun {
                    actual_ns: duration_ns,
                    budget_ns: self.cycle_time_ns,
                });
            }

            if self.reboot_requested {
                return Ok(());
            }

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self) -> Result<(), CycleError> {
        use std::time::Instant;

        let cycle_duration = std::time::Duration::from_nanos(self.cycle_time_ns as u64);

        loop {
            let cycle_start = Instant::now();

            self.tick();

            let elapsed = cycle_start.elapsed();
            let duration_ns = elapsed.as_nanos() as i64;
            self.stats.record(duration_ns, 0);

            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
                tracing::warn!(duration_ns, budget_ns = self.cycle_time_ns, "cycle overrun");
            }

            if self.reboot_requested {
                return Ok(());
            }

            if let Some(remaining) = cycle_duration.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
    }

    /// One 100 Hz tick: drain inbound frames, sample sensors, evaluate
    /// kickout, drive the state machine, compute and write the motor
    /// command, and emit a status frame at the 10 Hz cadence (§4.1).
    fn tick(&mut self) {
        let now_ms = (self.tick_count as u32).wrapping_mul(CYCLE_PERIOD_MS);

        self.drain_inbound(now_ms);
        self.sensor_board.tick(self.sensor_inputs.as_mut(), now_ms);

        if let Some(can) = self.can_transport.as_deref_mut() {
            self.motor.advance_can_clock(now_ms);
            while let Some(frame) = can.try_recv() {
                self.motor.feed_can_frame(frame);
            }
        }

        let kickout_inputs = self.build_kickout_inputs(now_ms);
        if let Some(cause) = self
            .kickout
            .evaluate(&kickout_inputs, now_ms, KICKOUT_COOLDOWN_MS_DEFAULT)
        {
            tracing::warn!(?cause, "kickout latched");
            self.motor.handle_kickout(cause);
            self.state_machine.handle_event(SteerEvent::Kickout, now_ms);
            self.core_counters.kickouts += 1;
        }

        let operator_intent = self.operator_intent();
        let engage = should_steer(
            self.guidance.guidance_active,
            operator_intent,
            self.guidance.vehicle_speed_kmh,
            now_ms,
            self.last_254_ms,
            WATCHDOG_MS_DEFAULT,
            self.kickout.latch_ms(),
            KICKOUT_COOLDOWN_MS_DEFAULT,
        );

        match self
            .state_machine
            .handle_event(SteerEvent::ShouldSteer(engage), now_ms)
        {
            TransitionResult::Ok(MotorState::SoftStart) => {
                self.motor.enable(true);
                tracing::info!("autosteer engaged, entering soft-start");
            }
            TransitionResult::Ok(MotorState::Disabled) => {
                self.motor.enable(false);
                self.motor.set_speed(0.0);
                tracing::info!("autosteer disengaged");
            }
            _ => {}
        }

        if self.state_machine.state() == MotorState::SoftStart
            && soft_start::elapsed(
                self.state_machine.soft_start_t0_ms(),
                now_ms,
                SOFT_START_DURATION_MS_DEFAULT,
            )
        {
            self.state_machine
                .handle_event(SteerEvent::SoftStartElapsed, now_ms);
        }

        let motor_speed_pct = self.compute_motor_speed(now_ms);
        if (motor_speed_pct - self.last_commanded_pct).abs() > f32::EPSILON {
            self.last_commanded_pct = motor_speed_pct;
            self.last_command_change_ms = now_ms;
        }
        self.motor.set_speed(motor_speed_pct);
        self.motor.tick();

        if let Some(can) = self.can_transport.as_deref_mut() {
            if let Some(frame) = self.motor.take_can_tx() {
                can.send(frame);
            }
        }

        if self.motor.status().has_error {
            self.core_counters.heartbeat_loss_ticks += 1;
        }

        if steer_router::status::is_status_tick(self.tick_count) {
            self.emit_status();
        }

        self.tick_count += 1;
    }

    /// Resolve the operator-intent bit per [`SteerSwitchMode`] (§4.1).
    fn operator_intent(&mut self) -> bool {
        match self.config.steer_switch_mode {
            SteerSwitchMode::None => self.guidance.autosteer_enable_request,
            SteerSwitchMode::Switch => self.sensor_board.steer_switch().debounced,
            SteerSwitchMode::Button => {
                let switch = self.sensor_board.steer_switch();
                if switch.changed && switch.debounced {
                    self.button_engaged = !self.button_engaged;
                }
                self.button_engaged
            }
        }
    }

    fn compute_motor_speed(&mut self, now_ms: u32) -> f32 {
        match self.state_machine.state() {
            MotorState::Disabled => 0.0,
            state @ (MotorState::SoftStart | MotorState::NormalControl) => {
                let current_angle = self.was_filter.filter(self.sensor_board.angle_deg());
                let gains = pid::PidGains { kp: self.settings.kp };
                let u = pid::pid_compute(&gains, self.guidance.target_angle_deg, current_angle);
                let shaped = pwm_shaping::shape(&self.settings, u, self.config.motor_invert);

                if state == MotorState::SoftStart {
                    soft_start::clip(
                        &self.settings,
                        shaped,
                        SOFT_START_PEAK_FRACTION_DEFAULT,
                        self.state_machine.soft_start_t0_ms(),
                        now_ms,
                        SOFT_START_DURATION_MS_DEFAULT,
                    )
                } else {
                    shaped
                }
            }
        }
    }

    fn build_kickout_inputs(&self, now_ms: u32) -> KickoutInputs {
        let steering_active = self.state_machine.state() != MotorState::Disabled;
        let motor_rpm = if self.motor.kind() == MotorKind::Can && steering_active {
            self.motor.commanded_vs_actual_rpm()
        } else {
            None
        };
        let rpm_command_settled =
            now_ms.wrapping_sub(self.last_command_change_ms) >= MOTOR_SLIP_GRACE_MS;

        KickoutInputs {
            shaft_encoder_enabled: self.config.shaft_encoder,
            encoder_pulses_in_window: self.sensor_board.encoder_pulses_in_window(),
            pulse_count_max: self.config.pulse_count_max,
            pressure_sensor_enabled: self.config.pressure_sensor,
            pressure_raw: self.sensor_board.pressure_raw(),
            pressure_threshold: PRESSURE_THRESHOLD_DEFAULT,
            current_sensor_enabled: self.config.current_sensor,
            current_raw: self.sensor_board.current_draw_raw() as u16,
            current_threshold: CURRENT_THRESHOLD_DEFAULT,
            motor_rpm,
            rpm_command_settled,
        }
    }

    /// Drain every inbound datagram waiting this tick, dispatching each
    /// through the handler registry and sending any replies back out.
    fn drain_inbound(&mut self, now_ms: u32) {
        while let Some(bytes) = self.transport.try_recv() {
            match frame::parse(&bytes) {
                Ok(parsed) => {
                    let mut ctx = RouterContext {
                        config: &mut self.config,
                        settings: &mut self.settings,
                        guidance: &mut self.guidance,
                        store: self.store.as_mut(),
                        identity: &mut self.identity,
                        counters: &mut self.router_counters,
                        last_254_ms: &mut self.last_254_ms,
                        reboot_requested: &mut self.reboot_requested,
                        now_ms,
                    };
                    match self.registry.dispatch(&parsed, &mut ctx) {
                        Some(replies) => {
                            for reply in replies {
                                self.transport.send(&reply.to_bytes());
                            }
                        }
                        None => {
                            self.router_counters.frames_dropped_unknown_type += 1;
                            self.core_counters.frames_malformed += 1;
                        }
                    }
                }
                Err(err) => {
                    self.router_counters.frames_dropped_bad_frame += 1;
                    self.core_counters.record_frame_error(err);
                }
            }
        }
    }

    fn emit_status(&mut self) {
        use steer_router::status::{build_status_frame, StatusSnapshot};

        let snapshot = StatusSnapshot {
            angle_deg: self.sensor_board.angle_deg(),
            motor_state: self.state_machine.state(),
            work_switch_active: self.sensor_board.work_switch_active(),
            motor_speed_pct: self.last_commanded_pct,
        };
        let frame = build_status_frame(&snapshot);
        self.transport.send(&frame.to_bytes());

        tracing::info!(
            angle_deg = snapshot.angle_deg,
            motor_state = ?snapshot.motor_state,
            motor_speed_pct = snapshot.motor_speed_pct,
            kickouts = self.core_counters.kickouts,
            frames_malformed = self.core_counters.frames_malformed,
            "status"
        );
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    while nanos < 0 {
        secs -= 1;
        nanos += 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
