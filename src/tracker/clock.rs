use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::sleep;

use super::window::PositionWindow;

/// Reference time for the tracking loop.
///
/// The loop only ever asks for "now" relative to the window it currently
/// holds and asks to be suspended; whether time is real or simulated is the
/// clock's business.
#[async_trait]
pub trait Clock: Send {
    fn now(&mut self, window: &PositionWindow) -> i64;

    async fn sleep_until(&mut self, timestamp: i64);

    async fn sleep(&mut self, seconds: u64);
}

/// Real time, whole seconds since the epoch
#[derive(Debug, Default)]
pub struct WallClock;

#[async_trait]
impl Clock for WallClock {
    fn now(&mut self, _window: &PositionWindow) -> i64 {
        Utc::now().timestamp()
    }

    async fn sleep_until(&mut self, timestamp: i64) {
        let Some(target) = DateTime::<Utc>::from_timestamp(timestamp, 0) else {
            return;
        };
        let wait = (target - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        log::debug!("Waiting {} for first position", humantime::format_duration(wait));
        sleep(wait).await;
    }

    async fn sleep(&mut self, seconds: u64) {
        sleep(Duration::from_secs(seconds)).await;
    }
}

/// Simulated time for recorded traces. Starts at the minimum of the first
/// window it is asked about and only moves when the loop suspends, which
/// returns immediately.
#[derive(Debug, Default)]
pub struct ReplayClock {
    current: Option<i64>,
}

impl ReplayClock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Clock for ReplayClock {
    fn now(&mut self, window: &PositionWindow) -> i64 {
        *self.current.get_or_insert(window.min_timestamp())
    }

    async fn sleep_until(&mut self, timestamp: i64) {
        self.current = Some(self.current.map_or(timestamp, |now| now.max(timestamp)));
    }

    async fn sleep(&mut self, seconds: u64) {
        if let Some(now) = self.current.as_mut() {
            *now = now.saturating_add(i64::try_from(seconds).unwrap_or(i64::MAX));
        }
    }
}
