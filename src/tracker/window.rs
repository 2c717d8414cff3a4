use std::collections::HashMap;

use crate::source::{Batch, Position, SatInfo};

use super::error::TrackerError;

/// Timestamp-indexed view over one batch. Never mutated once built; a stale
/// window is replaced by building a new one.
#[derive(Debug, Clone)]
pub struct PositionWindow {
    info: SatInfo,
    positions: HashMap<i64, Position>,
    min_timestamp: i64,
    max_timestamp: i64,
}

impl PositionWindow {
    pub fn build(batch: Batch) -> Result<Self, TrackerError> {
        let Batch { info, positions } = batch;
        let positions: HashMap<i64, Position> =
            positions.into_iter().map(|p| (p.timestamp, p)).collect();

        let min_timestamp = *positions.keys().min().ok_or(TrackerError::EmptyBatch)?;
        let max_timestamp = *positions.keys().max().ok_or(TrackerError::EmptyBatch)?;

        Ok(Self {
            info,
            positions,
            min_timestamp,
            max_timestamp,
        })
    }

    pub fn bounds(&self) -> (i64, i64) {
        (self.min_timestamp, self.max_timestamp)
    }

    pub fn min_timestamp(&self) -> i64 {
        self.min_timestamp
    }

    pub fn max_timestamp(&self) -> i64 {
        self.max_timestamp
    }

    pub fn lookup(&self, timestamp: i64) -> Result<&Position, TrackerError> {
        self.positions
            .get(&timestamp)
            .ok_or(TrackerError::PositionNotFound(timestamp))
    }

    pub fn info(&self) -> &SatInfo {
        &self.info
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// The window cannot answer for `now` any more
    pub fn is_stale(&self, now: i64) -> bool {
        now > self.max_timestamp
    }
}
