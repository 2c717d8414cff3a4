mod error;
mod n2yo;
mod replay;
mod types;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

pub use error::SourceError;
pub use n2yo::{clamp_seconds, N2yoSource, DEFAULT_BASE_URL};
pub use replay::{ReplaySource, SyntheticSource, DEFAULT_TRACE};
pub use types::{Batch, FetchRequest, Observer, Position, SatInfo};

/// Anything able to produce a batch of upcoming positions
#[async_trait]
pub trait PositionSource: Send {
    async fn fetch(&mut self, request: &FetchRequest) -> Result<Batch, SourceError>;

    fn describe(&self) -> String;
}

/// Which source backs a session, picked once before tracking starts
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    Live {
        base_url: String,
        api_key: Option<String>,
        timeout: Option<Duration>,
    },
    Replay {
        trace: PathBuf,
    },
    Synthetic,
}

impl SourceKind {
    /// Map the repeatable `--testing` flag onto a source
    pub fn from_testing_level(level: u8, live: SourceKind, trace: PathBuf) -> Self {
        match level {
            0 => live,
            1 => SourceKind::Replay { trace },
            _ => SourceKind::Synthetic,
        }
    }

    pub fn is_simulated(&self) -> bool {
        !matches!(self, SourceKind::Live { .. })
    }

    pub fn open(self) -> Result<Box<dyn PositionSource>, SourceError> {
        match self {
            SourceKind::Live {
                base_url,
                api_key,
                timeout,
            } => {
                let key = api_key.ok_or(SourceError::MissingApiKey)?;
                Ok(Box::new(N2yoSource::new(&base_url, key, timeout)?))
            }
            SourceKind::Replay { trace } => Ok(Box::new(ReplaySource::new(trace))),
            SourceKind::Synthetic => Ok(Box::new(SyntheticSource)),
        }
    }
}
