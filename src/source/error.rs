use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("upstream error: {message}")]
    Upstream { message: String },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("source unavailable ({path}): {reason}")]
    Unavailable { path: PathBuf, reason: String },
    #[error("live source requires an API key (set N2YO_API_KEY)")]
    MissingApiKey,
}
