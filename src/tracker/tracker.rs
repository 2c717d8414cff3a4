use tokio_util::sync::CancellationToken;

use crate::pointing::Pointer;
use crate::source::{FetchRequest, Observer, PositionSource};

use super::clock::Clock;
use super::error::TrackerError;
use super::types::{Interval, TrackDuration, TrackOutcome};
use super::window::PositionWindow;

/// Extra seconds asked for on the first fetch; the upstream timestamps
/// drift a few seconds behind the request time.
pub const LOOKAHEAD_MARGIN: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub norad_id: u32,
    pub observer: Observer,
}

pub struct Tracker {
    target: Target,
    source: Box<dyn PositionSource>,
    clock: Box<dyn Clock>,
    interval: Interval,
    verbosity: u8,
}

/// State owned by one run of the loop
struct Session {
    window: PositionWindow,
    remaining: TrackDuration,
    ticks: u64,
    refreshes: u64,
}

impl Session {
    fn outcome(&self, aborted: bool) -> TrackOutcome {
        if aborted {
            TrackOutcome::Aborted {
                ticks: self.ticks,
                refreshes: self.refreshes,
            }
        } else {
            TrackOutcome::Completed {
                ticks: self.ticks,
                refreshes: self.refreshes,
            }
        }
    }
}

impl Tracker {
    pub fn new(
        target: Target,
        source: Box<dyn PositionSource>,
        clock: Box<dyn Clock>,
        interval: Interval,
        verbosity: u8,
    ) -> Self {
        Self {
            target,
            source,
            clock,
            interval,
            verbosity,
        }
    }

    fn request(&self, count: u64) -> FetchRequest {
        FetchRequest {
            norad_id: self.target.norad_id,
            observer: self.target.observer,
            count,
        }
    }

    /// Fetch a batch and index it. `None` means the token fired first.
    async fn fill(
        &mut self,
        count: u64,
        cancel: &CancellationToken,
    ) -> Result<Option<PositionWindow>, TrackerError> {
        let request = self.request(count);
        log::debug!(
            "Fetching {} seconds of positions from {}",
            crate::source::clamp_seconds(count),
            self.source.describe()
        );
        let batch = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(None),
            batch = self.source.fetch(&request) => batch?,
        };
        let window = PositionWindow::build(batch)?;
        let (min, max) = window.bounds();
        log::debug!("Window holds {} positions in [{}, {}]", window.len(), min, max);
        Ok(Some(window))
    }

    /// Run the loop until `duration` is used up or `cancel` fires, calling
    /// `pointer` once per tick.
    ///
    /// Errors from the source, the window or the pointer end the session and
    /// are returned as is; nothing is retried here. Cleaning up whatever the
    /// pointer drives is up to the caller.
    pub async fn run<P: Pointer + ?Sized>(
        &mut self,
        duration: TrackDuration,
        pointer: &mut P,
        cancel: &CancellationToken,
    ) -> Result<TrackOutcome, TrackerError> {
        let Some(window) = self.fill(duration.lookahead(LOOKAHEAD_MARGIN), cancel).await? else {
            return Ok(TrackOutcome::Aborted {
                ticks: 0,
                refreshes: 0,
            });
        };
        let mut session = Session {
            window,
            remaining: duration,
            ticks: 0,
            refreshes: 0,
        };

        while session.remaining.is_positive() {
            let mut now = self.clock.now(&session.window);

            if session.window.is_stale(now) {
                log::debug!(
                    "Window ended at {}, now is {}: refreshing",
                    session.window.max_timestamp(),
                    now
                );
                match self.fill(session.remaining.lookahead(0), cancel).await? {
                    Some(window) => session.window = window,
                    None => return Ok(session.outcome(true)),
                }
                session.refreshes += 1;
                if session.window.is_stale(now) {
                    return Err(TrackerError::WindowBehind {
                        now,
                        max: session.window.max_timestamp(),
                    });
                }
            }

            if now < session.window.min_timestamp() {
                let first = session.window.min_timestamp();
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Ok(session.outcome(true)),
                    _ = self.clock.sleep_until(first) => {}
                }
                now = first;
            }

            if cancel.is_cancelled() {
                return Ok(session.outcome(true));
            }

            let position = session.window.lookup(now)?;
            log::trace!("Dispatching position at {}", position.timestamp);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(session.outcome(true)),
                pointed = pointer.point(position, session.window.info(), self.verbosity) => pointed?,
            }
            session.ticks += 1;
            if cancel.is_cancelled() {
                return Ok(session.outcome(true));
            }

            session.remaining.consume(self.interval);
            if session.remaining.is_positive() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Ok(session.outcome(true)),
                    _ = self.clock.sleep(self.interval.secs()) => {}
                }
            }
        }

        if self.verbosity > 1 {
            log::info!("Tracking completed");
        }
        Ok(session.outcome(false))
    }
}
