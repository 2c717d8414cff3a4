use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PointingError {
    #[error("gpio io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("gpio line {path}: {source}")]
    Line {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("servo mid angle must be 0 or 90, got {0}")]
    InvalidMidAngle(i32),
    #[error("no gpio backend at {0}")]
    NoBackend(PathBuf),
}
