use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::pointing::{Hardware, LogPointer, Mount, MountPins, PointingError};
use crate::source::{SourceError, SourceKind};
use crate::tracker::{
    Clock, Interval, ReplayClock, Target, TrackDuration, TrackOutcome, Tracker, TrackerError,
    WallClock,
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Source(#[from] SourceError),
    #[error("{0}")]
    Tracker(#[from] TrackerError),
    #[error("{0}")]
    Pointing(#[from] PointingError),
}

/// Everything needed to run one pointing session
#[derive(Debug, Clone)]
pub struct SessionPlan {
    pub target: Target,
    pub duration: TrackDuration,
    pub interval: Interval,
    pub verbosity: u8,
    pub source: SourceKind,
    /// exercise the actuators before tracking
    pub self_test: bool,
}

impl SessionPlan {
    fn tracker(&self) -> Result<Tracker, SourceError> {
        let clock: Box<dyn Clock> = if self.source.is_simulated() {
            Box::new(ReplayClock::new())
        } else {
            Box::new(WallClock)
        };
        Ok(Tracker::new(
            self.target,
            self.source.clone().open()?,
            clock,
            self.interval,
            self.verbosity,
        ))
    }
}

/// Track with whatever hardware was resolved at startup. The mount, if any,
/// is cleaned exactly once after tracking, whatever the outcome.
pub async fn run(
    plan: &SessionPlan,
    hardware: Hardware,
    pins: &MountPins,
    cancel: &CancellationToken,
) -> Result<TrackOutcome, SessionError> {
    let mut tracker = plan.tracker()?;
    log::info!(
        "Tracking sat {} for {} every {}s",
        plan.target.norad_id,
        plan.duration,
        plan.interval.secs()
    );

    let backend = match hardware {
        Hardware::Absent => {
            return Ok(tracker.run(plan.duration, &mut LogPointer, cancel).await?);
        }
        Hardware::Present(backend) => backend,
    };

    let mut mount = Mount::new(backend.as_ref(), pins)?;
    let result = track(plan, &mut tracker, &mut mount, cancel).await;
    let cleaned = mount.clean().await;

    let outcome = result?;
    cleaned?;
    Ok(outcome)
}

async fn track(
    plan: &SessionPlan,
    tracker: &mut Tracker,
    mount: &mut Mount,
    cancel: &CancellationToken,
) -> Result<TrackOutcome, SessionError> {
    if plan.self_test {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Ok(TrackOutcome::Aborted {
                    ticks: 0,
                    refreshes: 0,
                });
            }
            tested = mount.self_test() => tested?,
        }
    }
    Ok(tracker.run(plan.duration, mount, cancel).await?)
}
