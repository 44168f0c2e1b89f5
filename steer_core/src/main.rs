//! Autosteer core binary: boots the composition root and enters the
//! 100 Hz control loop (§10.5).
//!
//! Boot order: load config -> claim pin ownership -> build the sensor
//! board -> resolve and initialize the motor-driver backend -> build the
//! kickout monitor and protocol router -> enter the run loop. A reboot
//! requested by the SubnetChange (251) handler exits the process with a
//! distinct status so a supervisor (systemd, etc.) restarts it on the new
//! identity.

use std::io::ErrorKind;
use std::net::UdpSocket;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use steer_common::config::{FileSettingsStore, SettingsStore};
use steer_common::consts::MAX_PAYLOAD_LEN;
use steer_common::motor::CanFrame;
use steer_core::cycle::{
    detect_can_heartbeat, rt_setup, CanTransport, CycleRunner, FrameTransport,
    CAN_DETECTION_POLL_MS, CAN_DETECTION_WINDOW_MS,
};
use steer_core::error::BootError;
use steer_core::pin_arbiter::PinArbiter;
use steer_core::sensors::SensorInputs;
use steer_router::context::NetworkIdentity;

/// Agricultural autosteer controller core.
#[derive(Debug, Parser)]
#[command(name = "steer_core", version, about)]
struct Cli {
    /// Persistent settings store path (created on first boot).
    #[arg(long, default_value = "/etc/autosteer/config.toml")]
    settings_path: PathBuf,

    /// Static TOML file seeding `steer_config` on a first boot, before any
    /// settings frame has ever been received. Ignored once the persistent
    /// store holds a value.
    #[arg(long)]
    boot_config: Option<PathBuf>,

    /// Local address to bind the guidance/router UDP socket to.
    #[arg(long, default_value = "0.0.0.0:8888")]
    bind_addr: String,

    /// CPU core to pin the control loop to (`rt` builds only).
    #[arg(long, default_value_t = 0)]
    cpu_core: usize,

    /// SCHED_FIFO priority for the control loop (`rt` builds only).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,
}

/// Inbound/outbound datagrams over a UDP socket — the concrete
/// [`FrameTransport`] for a deployed unit. Non-blocking: a tick with
/// nothing to read never stalls the loop.
struct UdpTransport {
    socket: UdpSocket,
    peer: Option<std::net::SocketAddr>,
}

impl UdpTransport {
    fn bind(addr: &str) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        Ok(Self { socket, peer: None })
    }
}

impl FrameTransport for UdpTransport {
    fn try_recv(&mut self) -> Option<heapless::Vec<u8, { MAX_PAYLOAD_LEN + 6 }>> {
        let mut buf = [0u8; MAX_PAYLOAD_LEN + 6];
        match self.socket.recv_from(&mut buf) {
            Ok((len, from)) => {
                self.peer = Some(from);
                let mut out = heapless::Vec::new();
                let _ = out.extend_from_slice(&buf[..len]);
                Some(out)
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => None,
            Err(e) => {
                tracing::warn!(error = %e, "udp recv failed");
                None
            }
        }
    }

    fn send(&mut self, bytes: &[u8]) {
        let Some(peer) = self.peer else {
            return;
        };
        if let Err(e) = self.socket.send_to(bytes, peer) {
            tracing::warn!(error = %e, "udp send failed");
        }
    }
}

/// Stand-in for a CAN bus link — a real build plugs SocketCAN or a vendor
/// SDK in behind this trait. Never yields a frame, so CAN-heartbeat
/// detection always falls back to the selector byte and, if the CAN
/// backend is selected by that byte anyway, its periodic transmits are
/// silently discarded rather than reaching real hardware.
struct NullCanTransport;

impl CanTransport for NullCanTransport {
    fn try_recv(&mut self) -> Option<CanFrame> {
        None
    }
    fn send(&mut self, _frame: CanFrame) {}
}

/// Stand-in for the board's ADC/GPIO reads — a real build plugs its
/// hardware poller in behind this trait, the way [`steer_hal`]'s PWM
/// backend exposes a `feed_current_volts` seam for the same purpose.
/// Until that poller is wired in, readings hold steady at their
/// electrical zero point.
struct NullSensorInputs;

impl SensorInputs for NullSensorInputs {
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
        false
    }
    fn read_work_switch_pct(&mut self) -> f32 {
        0.0
    }
    fn encoder_pulse_count(&self) -> u32 {
        0
    }
}

fn run(cli: &Cli) -> Result<(), BootError> {
    let store = FileSettingsStore::open(cli.settings_path.as_path())?;
    let loaded = steer_core::config::load(&store, cli.boot_config.as_deref())?;

    let mut arbiter = PinArbiter::new();

    let mut can_bus = NullCanTransport;
    let can_heartbeat_detected = detect_can_heartbeat(
        &mut can_bus,
        CAN_DETECTION_WINDOW_MS,
        CAN_DETECTION_POLL_MS,
        |ms| std::thread::sleep(std::time::Duration::from_millis(ms as u64)),
    );

    let backend_name =
        CycleRunner::resolve_backend_name(&loaded.steer_config, can_heartbeat_detected);
    let motor = steer_hal::default_registry()
        .create_driver(backend_name)
        .map_err(BootError::Driver)?;

    let can_transport: Option<Box<dyn CanTransport>> = if backend_name == "can" {
        Some(Box::new(can_bus))
    } else {
        None
    };

    let transport =
        UdpTransport::bind(&cli.bind_addr).map_err(|e| BootError::Transport(e.to_string()))?;

    let mut runner = CycleRunner::new(
        loaded,
        motor,
        Box::new(NullSensorInputs),
        Box::new(transport),
        can_transport,
        Box::new(store),
        NetworkIdentity::default(),
        &mut arbiter,
    )?;

    rt_setup(cli.cpu_core, cli.rt_priority)?;

    tracing::info!(backend = backend_name, "autosteer core booted, entering run loop");

    if let Err(e) = runner.run() {
        tracing::error!(error = %e, "cycle loop exited with an error");
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => {
            tracing::info!("run loop exited cleanly, likely for a pending identity change");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "boot failed");
            ExitCode::FAILURE
        }
    }
}
