use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::info;

use crate::error::{Error, Result};

// How often a pause looks at the interrupt flag.
pub(crate) const POLL: Duration = Duration::from_millis(10);

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Timing between servo moves.
pub trait Pacer {
    /// Wait one interval. Returns `Error::Interrupted` as soon as an
    /// interrupt is requested.
    fn pause(&self) -> Result<()>;

    /// Wait one interval regardless of interrupts.
    fn settle(&self);

    fn interrupted(&self) -> bool;
}

#[derive(Debug, Clone, Copy)]
pub struct SleepPacer {
    interval: Duration,
    flag: &'static AtomicBool,
}

impl SleepPacer {
    /// Pacer driven by the process interrupt flag.
    pub fn new(interval: Duration) -> SleepPacer {
        SleepPacer::with_flag(interval, &INTERRUPTED)
    }

    pub fn with_flag(interval: Duration, flag: &'static AtomicBool) -> SleepPacer {
        SleepPacer { interval, flag }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Pacer for SleepPacer {
    fn pause(&self) -> Result<()> {
        let deadline = Instant::now() + self.interval;
        loop {
            if self.flag.load(Ordering::SeqCst) {
                return Err(Error::Interrupted);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            thread::sleep(POLL.min(deadline - now));
        }
    }

    fn settle(&self) {
        thread::sleep(self.interval);
    }

    fn interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

extern "C" fn on_signal(_signum: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Route SIGINT and SIGTERM to the process interrupt flag.
///
/// pigpio installs its own handlers when it initialises, so call this after
/// the chip is open.
pub fn install_interrupt_handler() -> Result<()> {
    for &signum in &[libc::SIGINT, libc::SIGTERM] {
        let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
        let previous = unsafe { libc::signal(signum, handler) };
        if previous == libc::SIG_ERR {
            return Err(Error::Io(io::Error::last_os_error()));
        }
    }
    info!("Interrupt handler installed");
    Ok(())
}
