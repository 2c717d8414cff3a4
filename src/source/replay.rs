use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;

use super::error::SourceError;
use super::types::{Batch, FetchRequest, Position, SatInfo};
use super::PositionSource;

pub const DEFAULT_TRACE: &str = "testing_trace.json";

/// Serves a previously recorded batch from disk. Every fetch re-reads the
/// file, so the request parameters are ignored.
pub struct ReplaySource {
    path: PathBuf,
}

impl ReplaySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Batch, SourceError> {
        let unavailable = |reason: String| SourceError::Unavailable {
            path: self.path.clone(),
            reason,
        };
        let content = fs::read_to_string(&self.path).map_err(|e| unavailable(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| unavailable(e.to_string()))
    }
}

#[async_trait]
impl PositionSource for ReplaySource {
    async fn fetch(&mut self, _request: &FetchRequest) -> Result<Batch, SourceError> {
        let batch = self.load()?;
        log::debug!(
            "Replayed {} positions from {}",
            batch.positions.len(),
            self.path.display()
        );
        Ok(batch)
    }

    fn describe(&self) -> String {
        format!("replay ({})", self.path.display())
    }
}

/// Five canned positions one second apart starting right after `now`,
/// sweeping every quadrant and both elevation extremes.
#[derive(Debug, Default)]
pub struct SyntheticSource;

impl SyntheticSource {
    pub const LEN: u64 = 5;

    pub fn batch_at(&self, now: i64) -> Batch {
        let angles = [
            (45.0, -90.0, true),
            (135.0, -45.0, false),
            (225.0, -0.0, true),
            (315.0, 45.0, false),
            (45.0, 90.0, true),
        ];
        let positions = angles
            .iter()
            .zip(1..)
            .map(|(&(azimuth, elevation, eclipsed), i)| Position {
                timestamp: now + i,
                azimuth,
                elevation,
                eclipsed,
                satlatitude: None,
                satlongitude: None,
                sataltitude: None,
            })
            .collect();

        Batch {
            info: SatInfo {
                name: "TESTING".into(),
                id: -1,
                transactionscount: None,
            },
            positions,
        }
    }
}

#[async_trait]
impl PositionSource for SyntheticSource {
    async fn fetch(&mut self, _request: &FetchRequest) -> Result<Batch, SourceError> {
        Ok(self.batch_at(chrono::Utc::now().timestamp()))
    }

    fn describe(&self) -> String {
        "synthetic".into()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::source::Observer;

    fn temp_trace(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn request() -> FetchRequest {
        FetchRequest {
            norad_id: 25544,
            observer: Observer::default(),
            count: 1000,
        }
    }

    #[tokio::test]
    async fn replays_recorded_batch() {
        let trace = temp_trace(
            r#"{"info":{"satname":"ISS","satid":25544},
                "positions":[{"azimuth":10.0,"elevation":5.0,"timestamp":100,"eclipsed":false}]}"#,
        );
        let mut source = ReplaySource::new(trace.path());

        let batch = source.fetch(&request()).await.unwrap();
        assert_eq!(batch.info.name, "ISS");
        assert_eq!(batch.positions[0].timestamp, 100);
        assert_eq!(batch.positions[0].satlatitude, None);
    }

    #[tokio::test]
    async fn missing_trace_is_unavailable() {
        let mut source = ReplaySource::new("/nonexistent/sat-pointer/trace.json");
        let err = source.fetch(&request()).await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn corrupt_trace_is_unavailable() {
        let trace = temp_trace("{ not json");
        let mut source = ReplaySource::new(trace.path());

        let err = source.fetch(&request()).await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
    }

    #[test]
    fn synthetic_batch_follows_now() {
        let batch = SyntheticSource.batch_at(1_000);
        let timestamps: Vec<_> = batch.positions.iter().map(|p| p.timestamp).collect();

        assert_eq!(timestamps, vec![1_001, 1_002, 1_003, 1_004, 1_005]);
        assert_eq!(batch.info.id, -1);
        assert!(batch.positions[0].eclipsed);
        assert!(!batch.positions[1].eclipsed);
    }
}
