//! Driver loops shared by the binaries.
//!
//! Both end the same way: Ctrl-C counts as a clean exit, every servo is
//! cleaned up whatever happened, and the GPIO goes last.

use std::io::{BufRead, Write};

use log::{error, info};

use crate::config::{RigConfig, ServoConfig};
use crate::error::{Error, Result};
use crate::menu::Menu;
use crate::pause::Pacer;
use crate::pwm::{Gpio, PwmChannel, PwmChip};
use crate::servo::{instance_count, Servo};

fn interrupt_is_success<W: Write>(result: Result<()>, out: &mut W) -> Result<()> {
    match result {
        Err(Error::Interrupted) => {
            writeln!(out, "\n-- CTRL-C: Terminating program --")?;
            Ok(())
        }
        other => other,
    }
}

fn clean_up<P: PwmChannel, T: Pacer, W: Write>(servos: &mut [Servo<P, T>], out: &mut W) {
    let _ = writeln!(out, "Cleaning up PWM and GPIO...");
    for servo in servos.iter_mut() {
        if let Err(e) = servo.cleanup() {
            error!("GPIO {} cleanup failed: {}", servo.pin(), e);
        }
    }
}

fn start_all<P: PwmChannel, T: Pacer, W: Write>(
    servos: &mut [Servo<P, T>],
    out: &mut W,
) -> Result<()> {
    for servo in servos.iter_mut() {
        servo.start()?;
        writeln!(out, "{}", servo)?;
    }
    writeln!(out, "Servo instances: {}", instance_count())?;
    Ok(())
}

fn scan_forever<P: PwmChannel, T: Pacer, W: Write>(
    servos: &mut [Servo<P, T>],
    out: &mut W,
) -> Result<()> {
    loop {
        writeln!(out, "\nScanning (CTRL c to exit)...")?;
        out.flush()?;
        for servo in servos.iter_mut() {
            servo.scan(None, None)?;
        }
    }
}

/// Start every servo in `rig` and scan them one after another until
/// interrupted.
pub fn scan_rig<C, T, W>(chip: C, rig: &RigConfig, pacer: T, out: &mut W) -> Result<()>
where
    C: PwmChip,
    T: Pacer + Clone,
    W: Write,
{
    let mut gpio = Gpio::new(chip);
    let mut servos = Vec::new();
    for config in &rig.servos {
        let servo = Servo::new(
            &mut gpio,
            config.pin,
            config.bounds()?,
            config.frequency_hz,
            pacer.clone(),
        )?;
        servos.push(servo);
    }
    info!("Scanning GPIO {:?}", gpio.pins());

    let result = start_all(&mut servos, out).and_then(|()| scan_forever(&mut servos, &mut *out));
    let result = interrupt_is_success(result, out);

    clean_up(&mut servos, out);
    drop(servos);
    drop(gpio);
    writeln!(out, "Done.")?;
    result
}

/// Run the calibration menu for one servo, reading `input`.
pub fn calibrate_servo<C, T, R, W>(
    chip: C,
    config: &ServoConfig,
    pacer: T,
    input: R,
    out: &mut W,
) -> Result<()>
where
    C: PwmChip,
    T: Pacer,
    R: BufRead + Send + 'static,
    W: Write,
{
    let bounds = config.bounds()?;
    let mut gpio = Gpio::new(chip);
    let servo = Servo::new(&mut gpio, config.pin, bounds, config.frequency_hz, pacer)?;
    let mut servos = vec![servo];

    let result = start_all(&mut servos, out).and_then(|()| {
        let mut menu = Menu::new(input, &mut *out);
        menu.run(&mut servos[0])
    });
    let result = interrupt_is_success(result, out);

    clean_up(&mut servos, out);
    drop(servos);
    drop(gpio);
    writeln!(out, "Done.")?;
    result
}
