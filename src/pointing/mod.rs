mod display;
mod error;
mod gpio;
mod led;
mod mount;
mod servo;
mod stepper;

use async_trait::async_trait;

use crate::source::{Position, SatInfo};

pub use error::PointingError;
#[cfg(test)]
pub use gpio::{Level, SimulatedBackend};
pub use mount::{Hardware, HardwareMode, LogPointer, Mount, MountPins};
pub use stepper::StepperPins;

/// Receives one resolved position per tick. The future may be dropped
/// mid-move when the session is interrupted.
#[async_trait]
pub trait Pointer: Send {
    async fn point(&mut self, position: &Position, info: &SatInfo, verbosity: u8) -> Result<(), PointingError>;
}

#[async_trait]
impl<F> Pointer for F
where
    F: FnMut(&Position, &SatInfo, u8) -> Result<(), PointingError> + Send,
{
    async fn point(&mut self, position: &Position, info: &SatInfo, verbosity: u8) -> Result<(), PointingError> {
        (self)(position, info, verbosity)
    }
}
