use std::time::Duration;

use super::error::PointingError;
use super::gpio::{pause_for, release_quietly, wait, GpioBackend, OutputLine};

/// Steps per revolution (1.8° full steps in half-step mode)
pub const STEPS_PER_REVOLUTION: i64 = 400;
pub const MIN_STEP_DELAY: Duration = Duration::from_millis(5);
/// Level on the direction pin that turns clockwise
const CLOCKWISE: bool = false;
/// Level on the enable pin that energises the driver
const ENABLED: bool = false;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepperPins {
    pub direction: u32,
    pub step: u32,
    pub enable: u32,
}

/// Step index for an azimuth, wrapped into one revolution
pub fn step_target(angle_deg: f64) -> i64 {
    ((angle_deg / 360.0 * STEPS_PER_REVOLUTION as f64) as i64).rem_euclid(STEPS_PER_REVOLUTION)
}

/// Whether the shortest way from `current` to `target` is clockwise
pub fn shortest_is_clockwise(current: i64, target: i64) -> bool {
    (target - current).rem_euclid(STEPS_PER_REVOLUTION) < STEPS_PER_REVOLUTION / 2
}

/// Azimuth drive. Assumes it is powered up pointing at true north.
pub struct Stepper {
    direction: Box<dyn OutputLine>,
    step: Box<dyn OutputLine>,
    enable: Box<dyn OutputLine>,
    delay: Duration,
    current_step: i64,
    increment: i64,
}

impl Stepper {
    /// Claim the three lines and energise the driver. Lines already claimed
    /// are released again if a later one fails.
    pub fn new(backend: &dyn GpioBackend, pins: StepperPins) -> Result<Self, PointingError> {
        log::info!("Setting up stepper on pins {:?}", pins);
        let mut direction = backend.output(pins.direction)?;
        let mut step = match backend.output(pins.step) {
            Ok(line) => line,
            Err(e) => {
                release_quietly(direction.release());
                return Err(e);
            }
        };
        let enable = match backend.output(pins.enable) {
            Ok(line) => line,
            Err(e) => {
                release_quietly(direction.release());
                release_quietly(step.release());
                return Err(e);
            }
        };

        let mut stepper = Self {
            direction,
            step,
            enable,
            delay: backend.settle(MIN_STEP_DELAY),
            current_step: 0,
            increment: 1,
        };
        let powered = stepper
            .direction
            .write(CLOCKWISE)
            .and_then(|_| stepper.enable.write(ENABLED));
        if let Err(e) = powered {
            release_quietly(stepper.release());
            return Err(e);
        }
        Ok(stepper)
    }

    pub fn current_step(&self) -> i64 {
        self.current_step
    }

    pub async fn point(&mut self, angle_deg: f64) -> Result<(), PointingError> {
        log::trace!("   - stepper pointing to {:.2}°", angle_deg);
        let target = step_target(angle_deg);
        self.set_clockwise(shortest_is_clockwise(self.current_step, target))?;

        while self.current_step != target {
            self.pulse().await?;
        }
        Ok(())
    }

    fn set_clockwise(&mut self, clockwise: bool) -> Result<(), PointingError> {
        self.direction
            .write(if clockwise { CLOCKWISE } else { !CLOCKWISE })?;
        self.increment = if clockwise { 1 } else { -1 };
        Ok(())
    }

    async fn pulse(&mut self) -> Result<(), PointingError> {
        self.step.write(true)?;
        wait(self.delay).await;
        self.step.write(false)?;
        wait(self.delay).await;
        self.current_step = (self.current_step + self.increment).rem_euclid(STEPS_PER_REVOLUTION);
        Ok(())
    }

    /// Full tour and back
    pub async fn self_test(&mut self) -> Result<(), PointingError> {
        log::info!("Testing stepper");
        for angle in [90.0, 180.0, 270.0, 0.0] {
            self.point(angle).await?;
        }
        wait(pause_for(self.delay, Duration::from_millis(500))).await;
        for angle in [270.0, 180.0, 90.0, 0.0] {
            self.point(angle).await?;
        }
        Ok(())
    }

    /// Park at north and de-energise
    pub async fn clean(mut self) -> Result<(), PointingError> {
        log::info!("Cleaning stepper");
        let parked = self.point(0.0).await;
        let released = self.release();
        parked.and(released)
    }

    /// De-energise and give the lines back without moving
    pub fn release(mut self) -> Result<(), PointingError> {
        let disabled = self.enable.write(!ENABLED);
        let direction = self.direction.release();
        let step = self.step.release();
        let enable = self.enable.release();
        disabled.and(direction).and(step).and(enable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointing::gpio::{Level, PwmOutput, SimulatedBackend};

    const PINS: StepperPins = StepperPins {
        direction: 20,
        step: 21,
        enable: 16,
    };

    fn step_pulses(backend: &SimulatedBackend) -> usize {
        backend
            .trace()
            .lock()
            .unwrap()
            .iter()
            .filter(|(pin, level)| *pin == PINS.step && *level == Level::Digital(true))
            .count()
    }

    #[test]
    fn targets_wrap_into_one_revolution() {
        assert_eq!(step_target(0.0), 0);
        assert_eq!(step_target(90.0), 100);
        assert_eq!(step_target(359.99), 399);
        assert_eq!(step_target(360.0), 0);
        assert_eq!(step_target(-90.0), 300);
    }

    #[test]
    fn picks_shortest_rotation() {
        assert!(shortest_is_clockwise(0, 100));
        assert!(!shortest_is_clockwise(0, 300));
        assert!(!shortest_is_clockwise(0, 200));
        assert!(shortest_is_clockwise(350, 10));
    }

    #[tokio::test]
    async fn counter_clockwise_takes_short_path() {
        let backend = SimulatedBackend::new();
        let mut stepper = Stepper::new(&backend, PINS).unwrap();

        stepper.point(270.0).await.unwrap();
        assert_eq!(stepper.current_step(), 300);
        assert_eq!(step_pulses(&backend), 100);

        stepper.point(45.0).await.unwrap();
        assert_eq!(stepper.current_step(), 50);
        assert_eq!(step_pulses(&backend), 250);
    }

    #[tokio::test]
    async fn clean_parks_at_north_and_disables() {
        let backend = SimulatedBackend::new();
        let mut stepper = Stepper::new(&backend, PINS).unwrap();
        stepper.point(100.0).await.unwrap();
        stepper.clean().await.unwrap();

        let trace = backend.trace();
        let trace = trace.lock().unwrap();
        assert!(trace.contains(&(PINS.enable, Level::Digital(!ENABLED))));
        assert_eq!(
            trace.iter().filter(|(_, l)| *l == Level::Released).count(),
            3
        );
    }

    #[tokio::test]
    async fn self_test_returns_home() {
        let backend = SimulatedBackend::new();
        let mut stepper = Stepper::new(&backend, PINS).unwrap();
        stepper.self_test().await.unwrap();
        assert_eq!(stepper.current_step(), 0);
        assert_eq!(step_pulses(&backend), 800);
    }

    /// Simulated lines, except for one pin that cannot be claimed
    struct BusyPin {
        inner: SimulatedBackend,
        busy: u32,
    }

    impl GpioBackend for BusyPin {
        fn output(&self, pin: u32) -> Result<Box<dyn OutputLine>, PointingError> {
            if pin == self.busy {
                return Err(PointingError::Io(std::io::Error::other("busy")));
            }
            self.inner.output(pin)
        }

        fn pwm(&self, channel: u32) -> Result<Box<dyn PwmOutput>, PointingError> {
            self.inner.pwm(channel)
        }
    }

    #[test]
    fn failed_setup_releases_claimed_lines() {
        let backend = BusyPin {
            inner: SimulatedBackend::new(),
            busy: PINS.enable,
        };
        assert!(Stepper::new(&backend, PINS).is_err());

        let trace = backend.inner.trace();
        let trace = trace.lock().unwrap();
        assert!(trace.contains(&(PINS.direction, Level::Released)));
        assert!(trace.contains(&(PINS.step, Level::Released)));
    }
}
