use log::info;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    Output,
}

/// One PWM output line.
///
/// A duty cycle written while the channel is stopped is remembered and only
/// emitted on the next `start`.
pub trait PwmChannel {
    fn start(&mut self, duty_cycle: f64) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn set_duty_cycle(&mut self, duty_cycle: f64) -> Result<()>;
}

/// The process-wide GPIO/PWM subsystem.
pub trait PwmChip {
    type Channel: PwmChannel;

    fn configure_pin(&mut self, pin: u32, mode: PinMode) -> Result<()>;
    fn allocate_channel(&mut self, pin: u32, frequency_hz: u32) -> Result<Self::Channel>;
    fn release_all(&mut self);
}

/// Owned handle on a `PwmChip`. The chip is released when the handle drops,
/// so declare it before the servos it hands out.
pub struct Gpio<C: PwmChip> {
    chip: C,
    pins: Vec<u32>,
}

impl<C: PwmChip> Gpio<C> {
    pub fn new(chip: C) -> Gpio<C> {
        Gpio {
            chip,
            pins: Vec::new(),
        }
    }

    pub fn output_channel(&mut self, pin: u32, frequency_hz: u32) -> Result<C::Channel> {
        if self.pins.contains(&pin) {
            return Err(Error::PinInUse(pin));
        }
        self.chip.configure_pin(pin, PinMode::Output)?;
        let channel = self.chip.allocate_channel(pin, frequency_hz)?;
        self.pins.push(pin);
        info!("Allocated PWM channel on GPIO {} at {} Hz", pin, frequency_hz);
        Ok(channel)
    }

    pub fn pins(&self) -> &[u32] {
        &self.pins
    }
}

impl<C: PwmChip> Drop for Gpio<C> {
    fn drop(&mut self) {
        info!("Releasing GPIO");
        self.chip.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimChip, SimEvent, SimLog};

    #[test]
    fn allocates_output_channel() {
        let log = SimLog::new();
        let mut gpio = Gpio::new(SimChip::new(&log));
        gpio.output_channel(5, 50).unwrap();

        assert_eq!(gpio.pins(), &[5]);
        assert_eq!(
            log.events(),
            vec![
                SimEvent::ConfigurePin {
                    pin: 5,
                    mode: PinMode::Output
                },
                SimEvent::Allocate {
                    pin: 5,
                    frequency_hz: 50
                },
            ]
        );
    }

    #[test]
    fn rejects_second_channel_on_same_pin() {
        let log = SimLog::new();
        let mut gpio = Gpio::new(SimChip::new(&log));
        gpio.output_channel(6, 50).unwrap();

        match gpio.output_channel(6, 50) {
            Err(Error::PinInUse(6)) => {}
            other => panic!("expected PinInUse, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn releases_once_on_drop() {
        let log = SimLog::new();
        {
            let mut gpio = Gpio::new(SimChip::new(&log));
            gpio.output_channel(5, 50).unwrap();
        }
        let releases = log
            .events()
            .into_iter()
            .filter(|e| *e == SimEvent::ReleaseAll)
            .count();
        assert_eq!(releases, 1);
    }
}
