//! Calibrate and exercise a single servo from the terminal.

use std::io::{self, BufReader};
use std::process;
use std::time::Duration;

use clap::Parser;
use log::{error, info, LevelFilter};

use pantilt::config::ServoConfig;
use pantilt::pause::{install_interrupt_handler, SleepPacer};
use pantilt::rig::calibrate_servo;
use pantilt::sim::{SimChip, SimLog};
use pantilt::{PwmChip, Result};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// BCM GPIO pin driving the servo
    #[arg(long, default_value_t = 6)]
    pin: u32,

    /// Minimum duty cycle (%)
    #[arg(long, default_value_t = 2.0)]
    min: f64,

    /// Maximum duty cycle (%)
    #[arg(long, default_value_t = 10.0)]
    max: f64,

    /// PWM frequency (Hz)
    #[arg(long, default_value_t = 50)]
    frequency: u32,

    /// How long each scan step is held (ms)
    #[arg(long, default_value_t = 1000)]
    pause_ms: u64,

    /// Drive simulated hardware instead of pigpio
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    fn servo(&self) -> ServoConfig {
        ServoConfig {
            frequency_hz: self.frequency,
            ..ServoConfig::new("servo", self.pin, self.min, self.max)
        }
    }
}

fn run<C: PwmChip>(chip: C, args: &Args) -> Result<()> {
    install_interrupt_handler()?;
    let pacer = SleepPacer::new(Duration::from_millis(args.pause_ms));
    calibrate_servo(
        chip,
        &args.servo(),
        pacer,
        BufReader::new(io::stdin()),
        &mut io::stdout(),
    )
}

#[cfg(feature = "pigpio")]
fn open_and_run(args: &Args) -> Result<()> {
    if args.dry_run {
        return run(SimChip::new(&SimLog::discard()), args);
    }
    run(pantilt::pigpio::PigpioChip::open()?, args)
}

#[cfg(not(feature = "pigpio"))]
fn open_and_run(args: &Args) -> Result<()> {
    if !args.dry_run {
        info!("Built without pigpio, using simulated hardware");
    }
    run(SimChip::new(&SimLog::discard()), args)
}

fn main() {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    info!("Servo on GPIO {}", args.pin);
    if let Err(e) = open_and_run(&args) {
        error!("{}", e);
        process::exit(1);
    }
}
