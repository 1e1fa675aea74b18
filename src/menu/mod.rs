//! Interactive calibration menu.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;

use crate::error::{Error, Result};
use crate::pause::{Pacer, POLL};
use crate::pwm::PwmChannel;
use crate::servo::Servo;

const SELECT_PROMPT: &str =
    "\nSelect Action - (1) Calibrate, (2) Set max/min duty cycle, or (3) Scan: ";
const CALIBRATE_PROMPT: &str = "Enter Duty Cycle (q = quit): ";
const QUIT: &str = "q";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Calibrate,
    SetBounds,
    Scan,
}

impl Action {
    /// Anything that isn't 1 or 2 scans.
    pub fn parse(choice: &str) -> Action {
        match choice.trim() {
            "1" => Action::Calibrate,
            "2" => Action::SetBounds,
            _ => Action::Scan,
        }
    }
}

enum Flow {
    Continue,
    EndOfInput,
}

pub fn parse_duty_cycle(text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidNumber(text.trim().to_string()))
}

// Mistyped input is reported and the menu carries on.
fn is_input_error(e: &Error) -> bool {
    match e {
        Error::InvalidNumber(_)
        | Error::NotANumber
        | Error::NotFinite(_)
        | Error::InvertedBounds { .. } => true,
        _ => false,
    }
}

// Lines are read on their own thread so a blocked read never hides Ctrl-C.
// The channel disconnects at end of input.
fn spawn_reader<R: BufRead + Send + 'static>(mut input: R) -> Receiver<io::Result<String>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || loop {
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                if tx.send(Ok(line)).is_err() {
                    break;
                }
            }
            Err(e) => {
                let _ = tx.send(Err(e));
                break;
            }
        }
    });
    rx
}

pub struct Menu<W> {
    lines: Receiver<io::Result<String>>,
    output: W,
}

impl<W: Write> Menu<W> {
    pub fn new<R: BufRead + Send + 'static>(input: R, output: W) -> Menu<W> {
        Menu {
            lines: spawn_reader(input),
            output,
        }
    }

    /// Runs until input ends or the servo's pacer is interrupted. Choosing
    /// scan never returns normally.
    pub fn run<P: PwmChannel, T: Pacer>(&mut self, servo: &mut Servo<P, T>) -> Result<()> {
        loop {
            let choice = match self.prompt(servo, SELECT_PROMPT)? {
                Some(choice) => choice,
                None => return Ok(()),
            };
            let flow = match Action::parse(&choice) {
                Action::Calibrate => self.calibrate(servo)?,
                Action::SetBounds => self.set_bounds(servo)?,
                Action::Scan => return self.scan(servo),
            };
            if let Flow::EndOfInput = flow {
                return Ok(());
            }
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn prompt<P: PwmChannel, T: Pacer>(
        &mut self,
        servo: &Servo<P, T>,
        text: &str,
    ) -> Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;

        loop {
            if servo.pacer().interrupted() {
                return Err(Error::Interrupted);
            }
            match self.lines.recv_timeout(POLL) {
                Ok(line) => return Ok(Some(line?.trim().to_string())),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Ok(None),
            }
        }
    }

    fn calibrate<P: PwmChannel, T: Pacer>(&mut self, servo: &mut Servo<P, T>) -> Result<Flow> {
        loop {
            let response = match self.prompt(servo, CALIBRATE_PROMPT)? {
                Some(response) => response,
                None => return Ok(Flow::EndOfInput),
            };
            if response == QUIT {
                return Ok(Flow::Continue);
            }
            match parse_duty_cycle(&response).and_then(|dc| servo.calibrate(dc)) {
                Ok(()) => {}
                Err(ref e) if is_input_error(e) => writeln!(self.output, "{}", e)?,
                Err(e) => return Err(e),
            }
        }
    }

    fn set_bounds<P: PwmChannel, T: Pacer>(&mut self, servo: &mut Servo<P, T>) -> Result<Flow> {
        let min = match self.prompt(servo, "Enter minimum duty cycle: ")? {
            Some(min) => min,
            None => return Ok(Flow::EndOfInput),
        };
        let max = match self.prompt(servo, "Enter maximum duty cycle: ")? {
            Some(max) => max,
            None => return Ok(Flow::EndOfInput),
        };

        let result = parse_duty_cycle(&min)
            .and_then(|min| parse_duty_cycle(&max).map(|max| (min, max)))
            .and_then(|(min, max)| servo.set_bounds(min, max));
        match result {
            Ok(()) => writeln!(self.output, "{}", servo)?,
            Err(ref e) if is_input_error(e) => writeln!(self.output, "{}", e)?,
            Err(e) => return Err(e),
        }
        Ok(Flow::Continue)
    }

    fn scan<P: PwmChannel, T: Pacer>(&mut self, servo: &mut Servo<P, T>) -> Result<()> {
        loop {
            writeln!(self.output, "\nScanning (CTRL c to exit)...")?;
            self.output.flush()?;
            servo.scan(None, None)?;
        }
    }
}
