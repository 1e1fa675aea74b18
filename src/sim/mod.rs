//! Simulated PWM hardware.
//!
//! Every command a servo sends to the hardware, and every pause it takes,
//! is appended to a shared `SimLog`. Tests assert on the log; `--dry-run`
//! uses a log that only traces to the logger.

use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;

use log::debug;

use crate::error::{Error, Result};
use crate::pause::Pacer;
use crate::pwm::{PinMode, PwmChannel, PwmChip};

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    ConfigurePin { pin: u32, mode: PinMode },
    Allocate { pin: u32, frequency_hz: u32 },
    Start { pin: u32, duty_cycle: f64 },
    Stop { pin: u32 },
    SetDutyCycle { pin: u32, duty_cycle: f64 },
    ReleaseAll,
    Pause,
    Settle,
}

#[derive(Debug, Clone)]
pub struct SimLog {
    events: Rc<RefCell<Vec<SimEvent>>>,
    record: bool,
}

impl SimLog {
    pub fn new() -> SimLog {
        SimLog {
            events: Rc::new(RefCell::new(Vec::new())),
            record: true,
        }
    }

    /// A log that traces events without keeping them.
    pub fn discard() -> SimLog {
        SimLog {
            events: Rc::new(RefCell::new(Vec::new())),
            record: false,
        }
    }

    pub fn push(&self, event: SimEvent) {
        debug!("sim: {:?}", event);
        if self.record {
            self.events.borrow_mut().push(event);
        }
    }

    pub fn events(&self) -> Vec<SimEvent> {
        self.events.borrow().clone()
    }

    /// Duty cycles commanded on `pin`, in order, whether by start or change.
    pub fn duty_cycles(&self, pin: u32) -> Vec<f64> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match *e {
                SimEvent::Start { pin: p, duty_cycle } if p == pin => Some(duty_cycle),
                SimEvent::SetDutyCycle { pin: p, duty_cycle } if p == pin => Some(duty_cycle),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl Default for SimLog {
    fn default() -> SimLog {
        SimLog::new()
    }
}

pub struct SimChip {
    log: SimLog,
    fail_start: Option<u32>,
}

impl SimChip {
    pub fn new(log: &SimLog) -> SimChip {
        SimChip {
            log: log.clone(),
            fail_start: None,
        }
    }

    /// Make `start` fail on the channel for `pin`.
    pub fn fail_start_on(self, pin: u32) -> SimChip {
        SimChip {
            fail_start: Some(pin),
            ..self
        }
    }
}

impl PwmChip for SimChip {
    type Channel = SimChannel;

    fn configure_pin(&mut self, pin: u32, mode: PinMode) -> Result<()> {
        self.log.push(SimEvent::ConfigurePin { pin, mode });
        Ok(())
    }

    fn allocate_channel(&mut self, pin: u32, frequency_hz: u32) -> Result<SimChannel> {
        self.log.push(SimEvent::Allocate { pin, frequency_hz });
        Ok(SimChannel {
            pin,
            duty_cycle: 0.0,
            enabled: false,
            fail_start: self.fail_start == Some(pin),
            log: self.log.clone(),
        })
    }

    fn release_all(&mut self) {
        self.log.push(SimEvent::ReleaseAll);
    }
}

#[derive(Debug)]
pub struct SimChannel {
    pin: u32,
    duty_cycle: f64,
    enabled: bool,
    fail_start: bool,
    log: SimLog,
}

impl SimChannel {
    pub fn pin(&self) -> u32 {
        self.pin
    }

    pub fn duty_cycle(&self) -> f64 {
        self.duty_cycle
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl PwmChannel for SimChannel {
    fn start(&mut self, duty_cycle: f64) -> Result<()> {
        if self.fail_start {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("simulated start failure on GPIO {}", self.pin),
            )));
        }
        self.duty_cycle = duty_cycle;
        self.enabled = true;
        self.log.push(SimEvent::Start {
            pin: self.pin,
            duty_cycle,
        });
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.enabled = false;
        self.log.push(SimEvent::Stop { pin: self.pin });
        Ok(())
    }

    fn set_duty_cycle(&mut self, duty_cycle: f64) -> Result<()> {
        self.duty_cycle = duty_cycle;
        self.log.push(SimEvent::SetDutyCycle {
            pin: self.pin,
            duty_cycle,
        });
        Ok(())
    }
}

/// Pacer that records pauses instead of sleeping.
///
/// Clones share the interrupt state, like servos sharing one Ctrl-C.
#[derive(Debug, Clone)]
pub struct SimPacer {
    log: SimLog,
    interrupt_after: Option<usize>,
    pauses: Rc<Cell<usize>>,
    interrupted: Rc<Cell<bool>>,
}

impl SimPacer {
    pub fn new(log: &SimLog) -> SimPacer {
        SimPacer {
            log: log.clone(),
            interrupt_after: None,
            pauses: Rc::new(Cell::new(0)),
            interrupted: Rc::new(Cell::new(false)),
        }
    }

    /// Raise the interrupt during the `n`th pause.
    pub fn interrupt_after(log: &SimLog, n: usize) -> SimPacer {
        SimPacer {
            interrupt_after: Some(n),
            ..SimPacer::new(log)
        }
    }

    pub fn interrupt(&self) {
        self.interrupted.set(true);
    }

    pub fn pauses(&self) -> usize {
        self.pauses.get()
    }
}

impl Pacer for SimPacer {
    fn pause(&self) -> Result<()> {
        if self.interrupted.get() {
            return Err(Error::Interrupted);
        }
        self.log.push(SimEvent::Pause);
        let count = self.pauses.get() + 1;
        self.pauses.set(count);
        if let Some(n) = self.interrupt_after {
            if count >= n {
                self.interrupted.set(true);
                return Err(Error::Interrupted);
            }
        }
        Ok(())
    }

    fn settle(&self) {
        self.log.push(SimEvent::Settle);
    }

    fn interrupted(&self) -> bool {
        self.interrupted.get()
    }
}
