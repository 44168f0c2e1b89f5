//! Motor-driver backends: PWM H-bridge, Keya-style CAN, and simulation.
//!
//! Each backend implements [`steer_common::motor::MotorDriver`]; the
//! control loop never sees which one is active.

pub mod can;
pub mod pwm;
pub mod simulation;
