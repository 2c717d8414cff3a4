use std::time::Duration;

use super::error::PointingError;
use super::gpio::{pause_for, release_quietly, wait, GpioBackend, PwmOutput};

pub const DUTY_MIN: f64 = 3.2;
pub const DUTY_MAX: f64 = 12.1;
pub const FREQUENCY_HZ: u32 = 50;
/// How long the pulse is held before being cut to stop the horn jittering
pub const JITTER_DELAY: Duration = Duration::from_millis(200);

/// Which angle sits in the middle of the 180° travel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidAngle {
    /// travel is [-90, 90]
    Zero,
    /// travel is [0, 180]
    Ninety,
}

impl MidAngle {
    pub fn degrees(&self) -> f64 {
        match self {
            MidAngle::Zero => 0.0,
            MidAngle::Ninety => 90.0,
        }
    }

    pub fn range(&self) -> (f64, f64) {
        let mid = self.degrees();
        (mid - 90.0, mid + 90.0)
    }
}

impl TryFrom<i32> for MidAngle {
    type Error = PointingError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MidAngle::Zero),
            90 => Ok(MidAngle::Ninety),
            other => Err(PointingError::InvalidMidAngle(other)),
        }
    }
}

/// Duty cycle in percent for an angle expressed in the servo's own range
pub fn duty_for(angle_deg: f64, mid: MidAngle) -> f64 {
    let travel = angle_deg + (90.0 - mid.degrees());
    DUTY_MAX.min(DUTY_MIN + travel / (180.0 / (DUTY_MAX - DUTY_MIN)))
}

/// Elevation drive
pub struct Servo {
    pwm: Box<dyn PwmOutput>,
    mid: MidAngle,
    jitter_delay: Duration,
}

impl Servo {
    pub fn new(backend: &dyn GpioBackend, channel: u32, mid: MidAngle) -> Result<Self, PointingError> {
        log::info!("Setting up servo on pwm channel {} ({:?})", channel, mid);
        let mut pwm = backend.pwm(channel)?;
        if let Err(e) = pwm.set_duty(FREQUENCY_HZ, 0.0) {
            release_quietly(pwm.release());
            return Err(e);
        }
        Ok(Self {
            pwm,
            mid,
            jitter_delay: backend.settle(JITTER_DELAY),
        })
    }

    pub async fn point(&mut self, angle_deg: f64) -> Result<(), PointingError> {
        self.point_held(angle_deg, 1).await
    }

    async fn point_held(&mut self, angle_deg: f64, hold_factor: u32) -> Result<(), PointingError> {
        log::trace!("   - servo pointing to {:.2}°", angle_deg);
        self.pwm.set_duty(FREQUENCY_HZ, duty_for(angle_deg, self.mid))?;
        wait(self.jitter_delay * hold_factor).await;
        self.pwm.set_duty(FREQUENCY_HZ, 0.0)
    }

    /// Sweep mid, max, min and back to mid
    pub async fn self_test(&mut self) -> Result<(), PointingError> {
        log::info!("Testing servo");
        let mid = self.mid.degrees();
        let (min, max) = self.mid.range();
        let pause = pause_for(self.jitter_delay, Duration::from_millis(500));

        self.point_held(mid, 2).await?;
        for angle in [mid, (mid + max) / 2.0, max, (mid + max) / 2.0, mid, (mid + min) / 2.0, min] {
            wait(pause).await;
            self.point(angle).await?;
        }
        wait(pause).await;
        self.point_held(mid, 2).await
    }

    pub fn clean(mut self) -> Result<(), PointingError> {
        log::info!("Cleaning servo");
        self.pwm.release()
    }
}
