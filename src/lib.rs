//! Pan/tilt servo control over Raspberry Pi PWM.

pub mod config;
pub mod error;
pub mod menu;
pub mod pause;
#[cfg(feature = "pigpio")]
pub mod pigpio;
pub mod pwm;
pub mod rig;
pub mod servo;
pub mod sim;

pub use crate::error::{Error, Result};
pub use crate::pwm::{Gpio, PinMode, PwmChannel, PwmChip};
pub use crate::servo::{build_servo, instance_count, DutyBounds, ScanPhase, Servo};
