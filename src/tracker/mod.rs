mod clock;
mod error;
mod tracker;
mod types;
mod window;

pub use clock::{Clock, ReplayClock, WallClock};
pub use error::TrackerError;
pub use tracker::{Target, Tracker};
pub use types::{Interval, TrackDuration, TrackOutcome};
