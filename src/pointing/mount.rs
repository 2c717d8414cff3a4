use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use strum_macros::{Display, EnumString};

use crate::source::{Position, SatInfo};

use super::display::tracking_line;
use super::error::PointingError;
use super::gpio::{release_quietly, GpioBackend, SimulatedBackend, SysfsBackend};
use super::led::Led;
use super::servo::{MidAngle, Servo};
use super::stepper::{Stepper, StepperPins};
use super::Pointer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HardwareMode {
    /// sysfs when present, otherwise log only
    Auto,
    Sysfs,
    Simulated,
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MountPins {
    pub stepper: StepperPins,
    pub servo_channel: u32,
    pub servo_mid_angle: i32,
    pub led: u32,
}

impl Default for MountPins {
    fn default() -> Self {
        Self {
            stepper: StepperPins {
                direction: 20,
                step: 21,
                enable: 16,
            },
            servo_channel: 0,
            servo_mid_angle: 0,
            led: 26,
        }
    }
}

/// Hardware selection resolved once at startup
pub enum Hardware {
    Absent,
    Present(Box<dyn GpioBackend>),
}

impl Hardware {
    pub fn resolve(
        mode: HardwareMode,
        gpio_root: PathBuf,
        pwm_chip: PathBuf,
    ) -> Result<Self, PointingError> {
        let sysfs = SysfsBackend::new(gpio_root, pwm_chip);
        let hardware = match (mode, sysfs.missing()) {
            (HardwareMode::None, _) => Hardware::Absent,
            (HardwareMode::Simulated, _) => Hardware::Present(Box::new(SimulatedBackend::new())),
            (HardwareMode::Sysfs | HardwareMode::Auto, None) => Hardware::Present(Box::new(sysfs)),
            (HardwareMode::Sysfs, Some(missing)) => return Err(PointingError::NoBackend(missing)),
            (HardwareMode::Auto, Some(missing)) => {
                log::info!("No {}, pointing will only be logged", missing.display());
                Hardware::Absent
            }
        };
        Ok(hardware)
    }
}

/// Pointer that only logs where to look
#[derive(Debug, Default)]
pub struct LogPointer;

#[async_trait]
impl Pointer for LogPointer {
    async fn point(&mut self, position: &Position, info: &SatInfo, _verbosity: u8) -> Result<(), PointingError> {
        log::info!("{}", tracking_line(position, info));
        Ok(())
    }
}

/// Two-axis mount with its eclipse indicator
pub struct Mount {
    stepper: Stepper,
    servo: Servo,
    led: Led,
}

impl Mount {
    /// Set up every actuator. If one cannot be set up, those already set up
    /// are released before the error is returned.
    pub fn new(backend: &dyn GpioBackend, pins: &MountPins) -> Result<Self, PointingError> {
        let mid = MidAngle::try_from(pins.servo_mid_angle)?;
        let stepper = Stepper::new(backend, pins.stepper)?;
        let servo = match Servo::new(backend, pins.servo_channel, mid) {
            Ok(servo) => servo,
            Err(e) => {
                release_quietly(stepper.release());
                return Err(e);
            }
        };
        let led = match Led::new(backend, pins.led) {
            Ok(led) => led,
            Err(e) => {
                release_quietly(stepper.release());
                release_quietly(servo.clean());
                return Err(e);
            }
        };
        Ok(Self { stepper, servo, led })
    }

    pub async fn self_test(&mut self) -> Result<(), PointingError> {
        self.stepper.self_test().await?;
        self.servo.self_test().await?;
        self.led.self_test().await
    }

    /// Release every actuator; all of them are attempted even if one fails
    pub async fn clean(self) -> Result<(), PointingError> {
        let stepper = self.stepper.clean().await;
        let servo = self.servo.clean();
        let led = self.led.clean();
        stepper.and(servo).and(led)
    }
}

#[async_trait]
impl Pointer for Mount {
    async fn point(&mut self, position: &Position, info: &SatInfo, verbosity: u8) -> Result<(), PointingError> {
        if verbosity > 0 {
            log::info!("{}", tracking_line(position, info));
        }
        self.servo.point(position.elevation).await?;
        self.stepper.point(position.azimuth).await?;
        self.led.flip(Some(!position.eclipsed))?;
        log::trace!(
            "Mount at step {}, led {}",
            self.stepper.current_step(),
            if self.led.is_on() { "on" } else { "off" }
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::pointing::gpio::{Level, OutputLine, PwmOutput};

    impl Hardware {
        fn is_present(&self) -> bool {
            matches!(self, Hardware::Present(_))
        }
    }

    impl Mount {
        fn azimuth_step(&self) -> i64 {
            self.stepper.current_step()
        }

        fn led_on(&self) -> bool {
            self.led.is_on()
        }
    }

    fn position(azimuth: f64, elevation: f64, eclipsed: bool) -> Position {
        Position {
            timestamp: 0,
            azimuth,
            elevation,
            eclipsed,
            satlatitude: None,
            satlongitude: None,
            sataltitude: None,
        }
    }

    fn info() -> SatInfo {
        SatInfo {
            name: "ISS".into(),
            id: 25544,
            transactionscount: None,
        }
    }

    #[test]
    fn mode_parses_from_cli_text() {
        assert_eq!("auto".parse::<HardwareMode>().unwrap(), HardwareMode::Auto);
        assert_eq!("simulated".parse::<HardwareMode>().unwrap(), HardwareMode::Simulated);
        assert_eq!(HardwareMode::Sysfs.to_string(), "sysfs");
        assert!("gpio".parse::<HardwareMode>().is_err());
    }

    #[test]
    fn auto_without_sysfs_is_absent() {
        let hardware =
            Hardware::resolve(HardwareMode::Auto, "/nonexistent/gpio".into(), "/nonexistent/pwm".into())
                .unwrap();
        assert!(!hardware.is_present());
    }

    #[test]
    fn forced_sysfs_without_gpio_fails() {
        let result =
            Hardware::resolve(HardwareMode::Sysfs, "/nonexistent/gpio".into(), "/nonexistent/pwm".into());
        assert!(matches!(result, Err(PointingError::NoBackend(_))));
    }

    #[test]
    fn forced_sysfs_without_pwm_chip_fails() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("gpio")).unwrap();
        fs::write(dir.path().join("gpio").join("export"), "").unwrap();

        let result = Hardware::resolve(
            HardwareMode::Sysfs,
            dir.path().join("gpio"),
            dir.path().join("pwm"),
        );
        match result {
            Err(PointingError::NoBackend(missing)) => {
                assert_eq!(missing, dir.path().join("pwm").join("export"))
            }
            _ => panic!("expected a missing pwm chip"),
        }
        let auto = Hardware::resolve(HardwareMode::Auto, dir.path().join("gpio"), dir.path().join("pwm"));
        assert!(!auto.unwrap().is_present());
    }

    /// Simulated lines whose pwm chip has gone away
    struct NoPwm(SimulatedBackend);

    impl GpioBackend for NoPwm {
        fn output(&self, pin: u32) -> Result<Box<dyn OutputLine>, PointingError> {
            self.0.output(pin)
        }

        fn pwm(&self, _channel: u32) -> Result<Box<dyn PwmOutput>, PointingError> {
            Err(PointingError::Io(std::io::Error::from(std::io::ErrorKind::NotFound)))
        }
    }

    #[test]
    fn failed_servo_setup_releases_the_stepper() {
        let backend = NoPwm(SimulatedBackend::new());
        let pins = MountPins::default();
        assert!(Mount::new(&backend, &pins).is_err());

        let trace = backend.0.trace();
        let trace = trace.lock().unwrap();
        // driver de-energised, then every stepper line handed back
        let enable: Vec<_> = trace
            .iter()
            .filter(|(pin, _)| *pin == pins.stepper.enable)
            .map(|(_, level)| level.clone())
            .collect();
        assert_eq!(
            enable,
            vec![Level::Digital(false), Level::Digital(true), Level::Released]
        );
        assert_eq!(
            trace.iter().filter(|(_, l)| *l == Level::Released).count(),
            3
        );
    }

    #[tokio::test]
    async fn mount_drives_every_actuator() {
        let backend = SimulatedBackend::new();
        let mut mount = Mount::new(&backend, &MountPins::default()).unwrap();

        mount.point(&position(90.0, 45.0, false), &info(), 0).await.unwrap();
        assert_eq!(mount.azimuth_step(), 100);
        assert!(mount.led_on());

        mount.point(&position(180.0, 10.0, true), &info(), 1).await.unwrap();
        assert_eq!(mount.azimuth_step(), 200);
        assert!(!mount.led_on());
    }

    #[tokio::test]
    async fn clean_releases_all_lines() {
        let backend = SimulatedBackend::new();
        let mount = Mount::new(&backend, &MountPins::default()).unwrap();
        mount.clean().await.unwrap();

        let released = backend
            .trace()
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, l)| *l == Level::Released)
            .count();
        // three stepper lines, the pwm channel and the led
        assert_eq!(released, 5);
    }

    #[test]
    fn invalid_mid_angle_is_rejected() {
        let pins = MountPins {
            servo_mid_angle: 45,
            ..MountPins::default()
        };
        assert!(matches!(
            Mount::new(&SimulatedBackend::new(), &pins),
            Err(PointingError::InvalidMidAngle(45))
        ));
    }
}
