use std::time::Duration;

use super::error::PointingError;
use super::gpio::{release_quietly, wait, GpioBackend, OutputLine};

/// Daylight indicator
pub struct Led {
    line: Box<dyn OutputLine>,
    is_on: bool,
    blink: Duration,
}

impl Led {
    pub fn new(backend: &dyn GpioBackend, pin: u32) -> Result<Self, PointingError> {
        log::info!("Setting up led on pin {}", pin);
        let mut led = Self {
            line: backend.output(pin)?,
            is_on: false,
            blink: backend.settle(Duration::from_millis(100)),
        };
        if let Err(e) = led.flip(Some(false)) {
            release_quietly(led.line.release());
            return Err(e);
        }
        Ok(led)
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Set the led, or toggle it when `turn_on` is `None`
    pub fn flip(&mut self, turn_on: Option<bool>) -> Result<(), PointingError> {
        self.is_on = turn_on.unwrap_or(!self.is_on);
        log::trace!("   - led flip {}", self.is_on);
        self.line.write(self.is_on)
    }

    pub async fn self_test(&mut self) -> Result<(), PointingError> {
        log::info!("Testing led");
        for _ in 0..5 {
            self.flip(None)?;
            wait(self.blink).await;
            self.flip(None)?;
            wait(self.blink * 2).await;
        }
        Ok(())
    }

    pub fn clean(mut self) -> Result<(), PointingError> {
        log::info!("Cleaning led");
        let off = self.flip(Some(false));
        off.and(self.line.release())
    }
}
