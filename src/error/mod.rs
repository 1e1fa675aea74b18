use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Inverted duty cycle bounds: min {min} > max {max}")]
    InvertedBounds { min: f64, max: f64 },

    #[error("Duty cycle is not a number")]
    NotANumber,

    #[error("Duty cycle {0} is not finite")]
    NotFinite(f64),

    #[error("GPIO pin {0} already has a PWM channel")]
    PinInUse(u32),

    #[error("pigpio error: {0}")]
    Pigpio(String),

    #[error("Interrupted")]
    Interrupted,

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid number: {0:?}")]
    InvalidNumber(String),
}

impl Error {
    pub fn is_interrupt(&self) -> bool {
        match self {
            Error::Interrupted => true,
            _ => false,
        }
    }
}
