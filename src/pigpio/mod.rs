//! Hardware PWM through the pigpio library.

use std::fmt::Debug;

use log::info;
use rust_pigpio::pwm::{pwm, set_pwm_frequency, set_pwm_range};
use rust_pigpio::{initialize, set_mode, terminate, INPUT, OUTPUT};

use crate::error::{Error, Result};
use crate::pwm::{PinMode, PwmChannel, PwmChip};

// 1 tick = 0.1% duty cycle
const PWM_RANGE: u32 = 1000;

fn pigpio_error<E: Debug>(e: E) -> Error {
    Error::Pigpio(format!("{:?}", e))
}

fn ticks(duty_cycle: f64) -> u32 {
    let ticks = (duty_cycle * PWM_RANGE as f64 / 100.0).round();
    ticks.max(0.0).min(PWM_RANGE as f64) as u32
}

pub struct PigpioChip {
    released: bool,
}

impl PigpioChip {
    pub fn open() -> Result<PigpioChip> {
        let version = initialize().map_err(pigpio_error)?;
        info!("Initialized pigpio. Version: {}", version);
        Ok(PigpioChip { released: false })
    }
}

impl PwmChip for PigpioChip {
    type Channel = PigpioChannel;

    fn configure_pin(&mut self, pin: u32, mode: PinMode) -> Result<()> {
        let mode = match mode {
            PinMode::Input => INPUT,
            PinMode::Output => OUTPUT,
        };
        set_mode(pin, mode).map_err(pigpio_error)
    }

    fn allocate_channel(&mut self, pin: u32, frequency_hz: u32) -> Result<PigpioChannel> {
        let actual = set_pwm_frequency(pin, frequency_hz).map_err(pigpio_error)?;
        if actual != frequency_hz {
            info!("GPIO {} PWM frequency {} Hz (asked {} Hz)", pin, actual, frequency_hz);
        }
        set_pwm_range(pin, PWM_RANGE).map_err(pigpio_error)?;
        Ok(PigpioChannel {
            pin,
            ticks: 0,
            enabled: false,
        })
    }

    fn release_all(&mut self) {
        if !self.released {
            info!("Terminate pigpio");
            terminate();
            self.released = true;
        }
    }
}

pub struct PigpioChannel {
    pin: u32,
    ticks: u32,
    enabled: bool,
}

impl PwmChannel for PigpioChannel {
    fn start(&mut self, duty_cycle: f64) -> Result<()> {
        self.ticks = ticks(duty_cycle);
        pwm(self.pin, self.ticks).map_err(pigpio_error)?;
        self.enabled = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        pwm(self.pin, 0).map_err(pigpio_error)?;
        self.enabled = false;
        Ok(())
    }

    fn set_duty_cycle(&mut self, duty_cycle: f64) -> Result<()> {
        self.ticks = ticks(duty_cycle);
        if self.enabled {
            pwm(self.pin, self.ticks).map_err(pigpio_error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duty_cycle_to_ticks() {
        assert_eq!(ticks(6.0), 60);
        assert_eq!(ticks(7.25), 73);
        assert_eq!(ticks(-1.0), 0);
        assert_eq!(ticks(150.0), PWM_RANGE);
    }
}
