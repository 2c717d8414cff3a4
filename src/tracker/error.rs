use thiserror::Error;

use crate::pointing::PointingError;
use crate::source::SourceError;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("source returned an empty batch")]
    EmptyBatch,
    #[error("no position at timestamp {0}")]
    PositionNotFound(i64),
    #[error("refreshed window ends at {max}, behind now ({now})")]
    WindowBehind { now: i64, max: i64 },
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("pointing error: {0}")]
    Pointing(#[from] PointingError),
}
