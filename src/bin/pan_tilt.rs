//! Scan a pan and a tilt servo until Ctrl-C.

use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::{error, info, LevelFilter};

use pantilt::config::RigConfig;
use pantilt::pause::{install_interrupt_handler, SleepPacer};
use pantilt::rig::scan_rig;
use pantilt::sim::{SimChip, SimLog};
use pantilt::{PwmChip, Result};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON rig description; defaults to pan on GPIO 5 and tilt on GPIO 6
    #[arg(long)]
    config: Option<PathBuf>,

    /// Drive simulated hardware instead of pigpio
    #[arg(long)]
    dry_run: bool,
}

fn run<C: PwmChip>(chip: C, rig: &RigConfig) -> Result<()> {
    install_interrupt_handler()?;
    let pacer = SleepPacer::new(rig.pause());
    info!("Holding each scan step for {:?}", pacer.interval());
    scan_rig(chip, rig, pacer, &mut io::stdout())
}

#[cfg(feature = "pigpio")]
fn open_and_run(args: &Args, rig: &RigConfig) -> Result<()> {
    if args.dry_run {
        return run(SimChip::new(&SimLog::discard()), rig);
    }
    run(pantilt::pigpio::PigpioChip::open()?, rig)
}

#[cfg(not(feature = "pigpio"))]
fn open_and_run(args: &Args, rig: &RigConfig) -> Result<()> {
    if !args.dry_run {
        info!("Built without pigpio, using simulated hardware");
    }
    run(SimChip::new(&SimLog::discard()), rig)
}

fn main() {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let rig = match args.config {
        Some(ref path) => RigConfig::load(path),
        None => Ok(RigConfig::pan_tilt()),
    };
    let rig = match rig {
        Ok(rig) => {
            info!("{} servo(s) on the rig", rig.servos.len());
            rig
        }
        Err(e) => {
            error!("Could not load config: {}", e);
            process::exit(2);
        }
    };

    if let Err(e) = open_and_run(&args, &rig) {
        error!("{}", e);
        process::exit(1);
    }
}
