use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::pointing::{HardwareMode, MountPins, StepperPins};
use crate::source::{Observer, DEFAULT_BASE_URL, DEFAULT_TRACE};

pub const API_KEY_ENV: &str = "N2YO_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub station: StationConfig,
    pub n2yo: N2yoConfig,
    pub replay: ReplayConfig,
    pub hardware: HardwareConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
}

impl StationConfig {
    pub fn observer(&self) -> Observer {
        Observer {
            latitude_deg: self.latitude,
            longitude_deg: self.longitude,
            altitude_m: self.altitude_m,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct N2yoConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_key_file: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for N2yoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            api_key_file: None,
            timeout_secs: 10,
        }
    }
}

impl N2yoConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Environment first, then the inline key, then the secret file.
    /// Blank values count as absent.
    pub fn resolve_api_key(&self, env: Option<String>) -> Result<Option<String>, ConfigError> {
        let non_blank = |s: String| {
            let trimmed = s.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        };

        if let Some(key) = env.and_then(non_blank) {
            return Ok(Some(key));
        }
        if let Some(key) = self.api_key.clone().and_then(non_blank) {
            return Ok(Some(key));
        }
        match &self.api_key_file {
            Some(path) => Ok(non_blank(std::fs::read_to_string(path)?)),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub trace: PathBuf,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            trace: PathBuf::from(DEFAULT_TRACE),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    pub mode: HardwareMode,
    pub gpio_root: PathBuf,
    pub pwm_chip: PathBuf,
    pub stepper: StepperConfig,
    pub servo: ServoConfig,
    pub led_pin: u32,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        let pins = MountPins::default();
        Self {
            mode: HardwareMode::Auto,
            gpio_root: PathBuf::from("/sys/class/gpio"),
            pwm_chip: PathBuf::from("/sys/class/pwm/pwmchip0"),
            stepper: StepperConfig {
                direction_pin: pins.stepper.direction,
                step_pin: pins.stepper.step,
                enable_pin: pins.stepper.enable,
            },
            servo: ServoConfig {
                pwm_channel: pins.servo_channel,
                mid_angle: pins.servo_mid_angle,
            },
            led_pin: pins.led,
        }
    }
}

impl HardwareConfig {
    pub fn pins(&self) -> MountPins {
        MountPins {
            stepper: StepperPins {
                direction: self.stepper.direction_pin,
                step: self.stepper.step_pin,
                enable: self.stepper.enable_pin,
            },
            servo_channel: self.servo.pwm_channel,
            servo_mid_angle: self.servo.mid_angle,
            led: self.led_pin,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepperConfig {
    pub direction_pin: u32,
    pub step_pin: u32,
    pub enable_pin: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServoConfig {
    pub pwm_channel: u32,
    #[serde(default)]
    pub mid_angle: i32,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }
}
