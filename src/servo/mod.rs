use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::pause::Pacer;
use crate::pwm::{Gpio, PwmChannel, PwmChip};

pub const DEFAULT_MIN_DUTY_CYCLE: f64 = 2.0;
pub const DEFAULT_MAX_DUTY_CYCLE: f64 = 10.0;
pub const DEFAULT_FREQUENCY_HZ: u32 = 50;

// Servos created so far. Never decremented.
static INSTANCES: AtomicUsize = AtomicUsize::new(0);

/// Number of servos created in this process.
pub fn instance_count() -> usize {
    INSTANCES.load(Ordering::SeqCst)
}

/// Inclusive duty cycle travel range, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DutyBounds {
    min: f64,
    max: f64,
}

impl DutyBounds {
    pub fn new(min: f64, max: f64) -> Result<DutyBounds> {
        if min.is_nan() || max.is_nan() {
            return Err(Error::NotANumber);
        }
        for &bound in &[min, max] {
            if bound.is_infinite() {
                return Err(Error::NotFinite(bound));
            }
        }
        if min > max {
            return Err(Error::InvertedBounds { min, max });
        }
        Ok(DutyBounds { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// `min + (max - min) / 2`, halved first so wide ranges cannot overflow.
    pub fn centre(&self) -> f64 {
        self.min + (self.max / 2.0 - self.min / 2.0)
    }

    pub fn clamp(&self, duty_cycle: f64) -> f64 {
        duty_cycle.min(self.max).max(self.min)
    }

    pub fn contains(&self, duty_cycle: f64) -> bool {
        duty_cycle >= self.min && duty_cycle <= self.max
    }
}

impl Default for DutyBounds {
    fn default() -> DutyBounds {
        DutyBounds {
            min: DEFAULT_MIN_DUTY_CYCLE,
            max: DEFAULT_MAX_DUTY_CYCLE,
        }
    }
}

/// Phases of one scan. Each is held for one pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    AtMin,
    AtCentre1,
    AtMax,
    AtCentre2,
}

impl ScanPhase {
    pub fn first() -> ScanPhase {
        ScanPhase::AtMin
    }

    pub fn next(self) -> Option<ScanPhase> {
        match self {
            ScanPhase::AtMin => Some(ScanPhase::AtCentre1),
            ScanPhase::AtCentre1 => Some(ScanPhase::AtMax),
            ScanPhase::AtMax => Some(ScanPhase::AtCentre2),
            ScanPhase::AtCentre2 => None,
        }
    }

    pub fn target(self, range: &DutyBounds) -> f64 {
        match self {
            ScanPhase::AtMin => range.min(),
            ScanPhase::AtCentre1 | ScanPhase::AtCentre2 => range.centre(),
            ScanPhase::AtMax => range.max(),
        }
    }
}

/// A hobby servo on one PWM channel.
///
/// The stored duty cycle always lies within `bounds`; `calibrate` is the only
/// way to put anything else on the wire.
pub struct Servo<P: PwmChannel, T: Pacer> {
    pin: u32,
    channel: P,
    pacer: T,
    bounds: DutyBounds,
    duty_cycle: f64,
    frequency_hz: u32,
    running: bool,
    raw_override: Option<f64>,
}

impl<P: PwmChannel, T: Pacer> Servo<P, T> {
    pub fn new<C>(
        gpio: &mut Gpio<C>,
        pin: u32,
        bounds: DutyBounds,
        frequency_hz: u32,
        pacer: T,
    ) -> Result<Servo<P, T>>
    where
        C: PwmChip<Channel = P>,
    {
        let channel = gpio.output_channel(pin, frequency_hz)?;
        INSTANCES.fetch_add(1, Ordering::SeqCst);

        let servo = Servo {
            pin,
            channel,
            pacer,
            bounds,
            duty_cycle: bounds.centre(),
            frequency_hz,
            running: false,
            raw_override: None,
        };
        info!("{}", servo);
        Ok(servo)
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }

    pub fn bounds(&self) -> DutyBounds {
        self.bounds
    }

    pub fn duty_cycle(&self) -> f64 {
        self.duty_cycle
    }

    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pacer(&self) -> &T {
        &self.pacer
    }

    /// What the hardware was last told: the raw calibration value if one is
    /// in effect, otherwise the stored duty cycle.
    pub fn hardware_duty_cycle(&self) -> f64 {
        self.raw_override.unwrap_or(self.duty_cycle)
    }

    pub fn start(&mut self) -> Result<()> {
        self.channel.start(self.hardware_duty_cycle())?;
        self.running = true;
        info!("GPIO {} PWM started at {}", self.pin, self.hardware_duty_cycle());
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        self.channel.stop()?;
        self.running = false;
        info!("GPIO {} PWM stopped", self.pin);
        Ok(())
    }

    pub fn set_duty_cycle(&mut self, duty_cycle: f64) -> Result<()> {
        if duty_cycle.is_nan() {
            return Err(Error::NotANumber);
        }
        let clamped = self.bounds.clamp(duty_cycle);
        self.channel.set_duty_cycle(clamped)?;
        self.duty_cycle = clamped;
        self.raw_override = None;
        debug!("GPIO {} duty cycle {}", self.pin, clamped);
        Ok(())
    }

    pub fn centre(&mut self) -> Result<()> {
        let centre = self.bounds.centre();
        self.set_duty_cycle(centre)
    }

    pub fn to_min(&mut self) -> Result<()> {
        let min = self.bounds.min();
        self.set_duty_cycle(min)
    }

    pub fn to_max(&mut self) -> Result<()> {
        let max = self.bounds.max();
        self.set_duty_cycle(max)
    }

    /// Sweep min, centre, max, centre, pausing after each move. `min` and
    /// `max` default to the servo's bounds; targets are still clamped to them.
    pub fn scan(&mut self, min: Option<f64>, max: Option<f64>) -> Result<()> {
        let range = DutyBounds::new(
            min.unwrap_or(self.bounds.min()),
            max.unwrap_or(self.bounds.max()),
        )?;

        let mut phase = Some(ScanPhase::first());
        while let Some(current) = phase {
            debug!("GPIO {} scan {:?}", self.pin, current);
            self.set_duty_cycle(current.target(&range))?;
            self.pacer.pause()?;
            phase = current.next();
        }
        Ok(())
    }

    /// Drive the hardware to `duty_cycle` without clamping. The stored duty
    /// cycle is untouched until the next move or `reconcile`.
    pub fn calibrate(&mut self, duty_cycle: f64) -> Result<()> {
        if duty_cycle.is_nan() {
            return Err(Error::NotANumber);
        }
        if duty_cycle.is_infinite() {
            return Err(Error::NotFinite(duty_cycle));
        }
        if !self.bounds.contains(duty_cycle) {
            warn!(
                "GPIO {} calibrating to {} outside {}..{}",
                self.pin,
                duty_cycle,
                self.bounds.min(),
                self.bounds.max()
            );
        }
        self.channel.set_duty_cycle(duty_cycle)?;
        self.raw_override = Some(duty_cycle);
        Ok(())
    }

    /// Put the stored duty cycle back on the wire after calibration.
    pub fn reconcile(&mut self) -> Result<()> {
        let duty_cycle = self.duty_cycle;
        self.set_duty_cycle(duty_cycle)
    }

    pub fn set_bounds(&mut self, min: f64, max: f64) -> Result<()> {
        self.bounds = DutyBounds::new(min, max)?;
        info!("GPIO {} bounds {}..{}", self.pin, min, max);
        let duty_cycle = self.duty_cycle;
        self.set_duty_cycle(duty_cycle)
    }

    /// Centre, let the servo get there, then stop the signal.
    pub fn cleanup(&mut self) -> Result<()> {
        self.centre()?;
        self.pacer.settle();
        self.stop()
    }
}

impl<P: PwmChannel, T: Pacer> fmt::Display for Servo<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Servo: pin - {}, MIN_DC - {:?}, MAX_DC - {:?}, DC - {:?}",
            self.pin,
            self.bounds.min(),
            self.bounds.max(),
            self.duty_cycle
        )
    }
}

/// Servo on `pin` with the default 2..10 bounds at 50 Hz.
pub fn build_servo<C, T>(gpio: &mut Gpio<C>, pin: u32, pacer: T) -> Result<Servo<C::Channel, T>>
where
    C: PwmChip,
    T: Pacer,
{
    Servo::new(gpio, pin, DutyBounds::default(), DEFAULT_FREQUENCY_HZ, pacer)
}
