//! Control engine root: P-only steering control, PWM shaping, soft-start.

pub mod pid;
pub mod pwm_shaping;
pub mod soft_start;
