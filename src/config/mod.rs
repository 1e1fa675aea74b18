use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::servo::{
    DutyBounds, DEFAULT_FREQUENCY_HZ, DEFAULT_MAX_DUTY_CYCLE, DEFAULT_MIN_DUTY_CYCLE,
};

fn default_min_duty_cycle() -> f64 {
    DEFAULT_MIN_DUTY_CYCLE
}

fn default_max_duty_cycle() -> f64 {
    DEFAULT_MAX_DUTY_CYCLE
}

fn default_frequency_hz() -> u32 {
    DEFAULT_FREQUENCY_HZ
}

fn default_pause_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServoConfig {
    pub name: String,
    pub pin: u32,
    #[serde(default = "default_min_duty_cycle")]
    pub min_duty_cycle: f64,
    #[serde(default = "default_max_duty_cycle")]
    pub max_duty_cycle: f64,
    #[serde(default = "default_frequency_hz")]
    pub frequency_hz: u32,
}

impl ServoConfig {
    pub fn new(name: &str, pin: u32, min_duty_cycle: f64, max_duty_cycle: f64) -> ServoConfig {
        ServoConfig {
            name: name.to_string(),
            pin,
            min_duty_cycle,
            max_duty_cycle,
            frequency_hz: DEFAULT_FREQUENCY_HZ,
        }
    }

    pub fn bounds(&self) -> Result<DutyBounds> {
        DutyBounds::new(self.min_duty_cycle, self.max_duty_cycle)
    }
}

/// The servos on the rig and how long each scan step is held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigConfig {
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
    pub servos: Vec<ServoConfig>,
}

impl RigConfig {
    /// Pan on GPIO 5 and tilt on GPIO 6.
    pub fn pan_tilt() -> RigConfig {
        RigConfig {
            pause_ms: default_pause_ms(),
            servos: vec![
                ServoConfig::new("pan", 5, 3.0, 11.0),
                ServoConfig::new("tilt", 6, 2.0, 11.0),
            ],
        }
    }

    pub fn from_json(json: &str) -> Result<RigConfig> {
        let config: RigConfig = serde_json::from_str(json)?;
        for servo in &config.servos {
            servo.bounds()?;
        }
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<RigConfig> {
        let json = fs::read_to_string(path)?;
        RigConfig::from_json(&json)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

impl Default for RigConfig {
    fn default() -> RigConfig {
        RigConfig::pan_tilt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn fills_in_defaults() {
        let config = RigConfig::from_json(r#"{ "servos": [ { "name": "pan", "pin": 5 } ] }"#)
            .unwrap();
        assert_eq!(config.pause(), Duration::from_secs(1));
        let pan = &config.servos[0];
        assert_eq!(pan.min_duty_cycle, 2.0);
        assert_eq!(pan.max_duty_cycle, 10.0);
        assert_eq!(pan.frequency_hz, 50);
    }

    #[test]
    fn reads_full_rig() {
        let json = r#"{
            "pause_ms": 250,
            "servos": [
                { "name": "pan", "pin": 5, "min_duty_cycle": 3, "max_duty_cycle": 11 },
                { "name": "tilt", "pin": 6, "min_duty_cycle": 2, "max_duty_cycle": 11, "frequency_hz": 60 }
            ]
        }"#;
        let config = RigConfig::from_json(json).unwrap();
        assert_eq!(config.pause(), Duration::from_millis(250));
        assert_eq!(config.servos[0], ServoConfig::new("pan", 5, 3.0, 11.0));
        assert_eq!(config.servos[1].frequency_hz, 60);
    }

    #[test]
    fn rejects_inverted_bounds() {
        let json = r#"{ "servos": [ { "name": "pan", "pin": 5, "min_duty_cycle": 11, "max_duty_cycle": 3 } ] }"#;
        match RigConfig::from_json(json) {
            Err(Error::InvertedBounds { .. }) => {}
            other => panic!("expected InvertedBounds, got {:?}", other),
        }
    }

    #[test]
    fn rejects_malformed_json() {
        match RigConfig::from_json("{ servos: ") {
            Err(Error::Config(_)) => {}
            other => panic!("expected Config, got {:?}", other),
        }
    }

    #[test]
    fn default_rig_is_pan_tilt() {
        let config = RigConfig::default();
        let pins: Vec<u32> = config.servos.iter().map(|s| s.pin).collect();
        assert_eq!(pins, vec![5, 6]);
        assert_eq!(config.servos[1].bounds().unwrap().centre(), 6.5);
    }

    #[test]
    fn loads_from_file() {
        let path = std::env::temp_dir().join(format!("pantilt-rig-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{ "pause_ms": 500, "servos": [ { "name": "tilt", "pin": 6, "max_duty_cycle": 11 } ] }"#,
        )
        .unwrap();

        let config = RigConfig::load(&path);
        fs::remove_file(&path).unwrap();

        let config = config.unwrap();
        assert_eq!(config.pause(), Duration::from_millis(500));
        assert_eq!(config.servos, vec![ServoConfig::new("tilt", 6, 2.0, 11.0)]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("pantilt-no-such-rig.json");
        match RigConfig::load(&path) {
            Err(Error::Io(_)) => {}
            other => panic!("expected Io, got {:?}", other),
        }
    }
}
