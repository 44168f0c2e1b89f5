//! Concrete handler functions for each recognized frame type (§4.2).

use steer_common::config::{clamp_f32, clamp_u8, store_value};
use steer_common::model::SteerSwitchMode;
use tracing::{info, warn};

use crate::context::RouterContext;
use crate::frame::Frame;

pub const TYPE_HELLO: u8 = 200;
pub const TYPE_SUBNET_CHANGE: u8 = 201;
pub const TYPE_SCAN: u8 = 202;
pub const TYPE_STEER_CONFIG: u8 = 251;
pub const TYPE_STEER_SETTINGS: u8 = 252;
pub const TYPE_STEER_DATA: u8 = 254;

const TYPE_HELLO_REPLY: u8 = 126;
const TYPE_SCAN_REPLY: u8 = 203;

/// 200 Hello -> 126 reply carrying module identity.
pub fn hello(_frame: &Frame, ctx: &mut RouterContext) -> Option<Frame> {
    let ip = ctx.identity.ip;
    // 5 data bytes: a module-class tag plus the 4 IPv4 octets.
    let data = [1u8, ip[0], ip[1], ip[2], ip[3]];
    Frame::new(0, TYPE_HELLO_REPLY, &data).ok()
}

/// 201 SubnetChange: persist new network octets, request a reboot.
pub fn subnet_change(frame: &Frame, ctx: &mut RouterContext) -> Option<Frame> {
    if frame.data.len() < 3 {
        return None;
    }
    ctx.identity.subnet = [frame.data[0], frame.data[1], frame.data[2]];
    let _ = store_value(ctx.store, "network.subnet", &ctx.identity.subnet);
    let _ = ctx.store.save();
    *ctx.reboot_requested = true;
    info!(subnet = ?ctx.identity.subnet, "subnet changed, reboot requested");
    None
}

/// 202 Scan -> 203 reply: IPv4 plus 3-byte subnet.
pub fn scan(_frame: &Frame, ctx: &mut RouterContext) -> Option<Frame> {
    let ip = ctx.identity.ip;
    let subnet = ctx.identity.subnet;
    let data = [ip[0], ip[1], ip[2], ip[3], subnet[0], subnet[1], subnet[2]];
    Frame::new(0, TYPE_SCAN_REPLY, &data).ok()
}

/// 251 SteerConfig: unpack bit-packed config, persist. Out-of-range byte
/// values have no invalid encoding here (every bit pattern is a valid
/// bool/u8), so there is nothing to clamp for this frame; `pulse_count_max`
/// and `min_speed_kmh` are free-ranging bytes by design.
pub fn steer_config(frame: &Frame, ctx: &mut RouterContext) -> Option<Frame> {
    if frame.data.len() < 4 {
        return None;
    }
    let flags = frame.data[0];
    let pulse_count_max = frame.data[1];
    let min_speed_kmh = frame.data[2];
    let flags2 = frame.data[3];

    let steer_switch_mode = match (flags & (1 << 5) != 0, flags & (1 << 6) != 0) {
        (true, _) => SteerSwitchMode::Switch,
        (_, true) => SteerSwitchMode::Button,
        _ => SteerSwitchMode::None,
    };

    *ctx.config = steer_common::model::SteerConfig {
        invert_was: flags & (1 << 0) != 0,
        motor_invert: flags & (1 << 2) != 0,
        cytron_driver: flags & (1 << 4) != 0,
        is_danfoss: flags2 & (1 << 0) != 0,
        steer_switch_mode,
        shaft_encoder: flags & (1 << 7) != 0,
        pressure_sensor: flags2 & (1 << 1) != 0,
        current_sensor: flags2 & (1 << 2) != 0,
        pulse_count_max,
        min_speed_kmh,
        motor_driver_selector: ctx.config.motor_driver_selector,
    };

    let _ = store_value(ctx.store, "steer_config", ctx.config);
    let _ = ctx.store.save();
    None
}

/// 252 SteerSettings: unpack kp/PWM/offsets, persist, apply to the loop.
///
/// Preserves a known upstream quirk: `low_pwm` (byte 2) is parsed from the
/// wire and then immediately overwritten with `min_pwm * 1.2` before it is
/// stored — reimplementations keep this for wire compatibility even though
/// it discards the transmitted byte.
pub fn steer_settings(frame: &Frame, ctx: &mut RouterContext) -> Option<Frame> {
    if frame.data.len() < 8 {
        return None;
    }
    let kp_raw = frame.data[0];
    let high_pwm = frame.data[1];
    let min_pwm = frame.data[3];
    let counts_per_degree = frame.data[4];
    let was_offset = i16::from_le_bytes([frame.data[5], frame.data[6]]);
    let ackerman_raw = frame.data[7];

    let (kp, kp_clamped) = clamp_f32(kp_raw as f32 / 10.0, 0.0, 25.5);
    let (high_pwm, high_clamped) = clamp_u8(high_pwm, 0, 255);
    let (min_pwm, min_clamped) = clamp_u8(min_pwm, 0, 255);
    let low_pwm = ((min_pwm as f32) * 1.2).round().clamp(0.0, 255.0) as u8;

    if kp_clamped || high_clamped || min_clamped {
        ctx.counters.settings_values_clamped += 1;
        warn!("steer_settings frame had out-of-range bytes, clamped");
    }

    *ctx.settings = steer_common::model::SteerSettings {
        kp,
        high_pwm,
        low_pwm,
        min_pwm,
        was_counts_per_degree: counts_per_degree as f32,
        was_offset,
        ackerman_fix: ackerman_raw as f32 / 100.0,
    };

    let _ = store_value(ctx.store, "steer_settings", ctx.settings);
    let _ = ctx.store.save();
    None
}

/// 254 SteerData: target angle, speed, guidance flag, sections.
pub fn steer_data(frame: &Frame, ctx: &mut RouterContext) -> Option<Frame> {
    if frame.data.len() < 8 {
        return None;
    }
    let speed_cm_s = u16::from_le_bytes([frame.data[0], frame.data[1]]);
    let status = frame.data[2];
    let target_angle_raw = i16::from_le_bytes([frame.data[3], frame.data[4]]);
    let cross_track_error = frame.data[5] as i8;
    let sections = u16::from_le_bytes([frame.data[6], frame.data[7]]);

    ctx.guidance.vehicle_speed_kmh = (speed_cm_s as f32 / 100.0) * 3.6;
    ctx.guidance.guidance_active = status & (1 << 0) != 0;
    ctx.guidance.autosteer_enable_request = status & (1 << 6) != 0;
    ctx.guidance.target_angle_deg = target_angle_raw as f32 / 100.0;
    ctx.guidance.cross_track_error = cross_track_error;
    ctx.guidance.machine_sections = sections;
    ctx.guidance.arrival_ms = ctx.now_ms;

    *ctx.last_254_ms = ctx.now_ms;
    None
}
