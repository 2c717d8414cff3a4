use std::fmt;

/// How long a session keeps dispatching. Finite durations are counted down
/// by the interval after every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackDuration {
    Seconds(i64),
    Unbounded,
}

impl TrackDuration {
    /// `-1` stands for "until interrupted"
    pub fn from_cli(seconds: i64) -> Self {
        if seconds == -1 {
            TrackDuration::Unbounded
        } else {
            TrackDuration::Seconds(seconds)
        }
    }

    pub fn is_positive(&self) -> bool {
        match self {
            TrackDuration::Seconds(s) => *s > 0,
            TrackDuration::Unbounded => true,
        }
    }

    pub fn consume(&mut self, interval: Interval) {
        if let TrackDuration::Seconds(s) = self {
            *s = s.saturating_sub(interval.secs() as i64);
        }
    }

    /// Lookahead to request, in seconds. Unbounded sessions ask for as
    /// much as any source will give.
    pub fn lookahead(&self, margin: u64) -> u64 {
        match self {
            TrackDuration::Seconds(s) => (*s).max(0) as u64 + margin,
            TrackDuration::Unbounded => u64::MAX,
        }
    }
}

impl fmt::Display for TrackDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackDuration::Seconds(s) => write!(f, "{}s", s),
            TrackDuration::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Time between two dispatches, in whole seconds, from one second up to
/// a day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval(u64);

impl Interval {
    pub const MAX_SECS: u64 = 86_400;

    pub fn from_secs_f64(seconds: f64) -> Self {
        let rounded = if seconds.is_finite() { seconds.round() } else { 1.0 };
        Interval(rounded.clamp(1.0, Self::MAX_SECS as f64) as u64)
    }

    pub fn secs(&self) -> u64 {
        self.0
    }
}

impl Default for Interval {
    fn default() -> Self {
        Interval(1)
    }
}

/// Where a session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    Completed { ticks: u64, refreshes: u64 },
    Aborted { ticks: u64, refreshes: u64 },
}

impl TrackOutcome {
    pub fn ticks(&self) -> u64 {
        match self {
            TrackOutcome::Completed { ticks, .. } | TrackOutcome::Aborted { ticks, .. } => *ticks,
        }
    }

    pub fn refreshes(&self) -> u64 {
        match self {
            TrackOutcome::Completed { refreshes, .. }
            | TrackOutcome::Aborted { refreshes, .. } => *refreshes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minus_one_is_unbounded() {
        assert_eq!(TrackDuration::from_cli(-1), TrackDuration::Unbounded);
        assert_eq!(TrackDuration::from_cli(30), TrackDuration::Seconds(30));
        assert!(!TrackDuration::from_cli(0).is_positive());
    }

    #[test]
    fn consume_counts_down() {
        let mut duration = TrackDuration::Seconds(5);
        duration.consume(Interval::from_secs_f64(2.0));
        assert_eq!(duration, TrackDuration::Seconds(3));
        duration.consume(Interval::from_secs_f64(2.0));
        duration.consume(Interval::from_secs_f64(2.0));
        assert!(!duration.is_positive());

        let mut unbounded = TrackDuration::Unbounded;
        unbounded.consume(Interval::default());
        assert!(unbounded.is_positive());
    }

    #[test]
    fn lookahead_adds_margin() {
        assert_eq!(TrackDuration::Seconds(5).lookahead(20), 25);
        assert_eq!(TrackDuration::Seconds(-3).lookahead(0), 0);
        assert_eq!(TrackDuration::Unbounded.lookahead(20), u64::MAX);
    }

    #[test]
    fn interval_rounds_to_whole_seconds() {
        assert_eq!(Interval::from_secs_f64(2.4).secs(), 2);
        assert_eq!(Interval::from_secs_f64(2.6).secs(), 3);
        assert_eq!(Interval::from_secs_f64(0.2).secs(), 1);
        assert_eq!(Interval::from_secs_f64(f64::NAN).secs(), 1);
    }

    #[test]
    fn interval_is_capped_at_a_day() {
        assert_eq!(Interval::from_secs_f64(1e19).secs(), Interval::MAX_SECS);
        assert_eq!(Interval::from_secs_f64(-1e19).secs(), 1);

        let mut duration = TrackDuration::Seconds(i64::MIN + 1);
        duration.consume(Interval::from_secs_f64(1e19));
        assert_eq!(duration, TrackDuration::Seconds(i64::MIN));
    }
}
