use std::time::Duration;

use async_trait::async_trait;

use super::error::SourceError;
use super::types::{Batch, FetchRequest, Observer};
use super::PositionSource;

pub const DEFAULT_BASE_URL: &str = "https://api.n2yo.com/rest/v1/satellite";
/// Longest lookahead the positions endpoint serves per request
pub const MAX_SECONDS: u64 = 300;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Live source backed by the N2YO REST API
pub struct N2yoSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl N2yoSource {
    pub fn new(base_url: &str, api_key: String, timeout: Option<Duration>) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn url(&self, request: &FetchRequest) -> String {
        positions_url(&self.base_url, request, &self.api_key)
    }
}

/// Clamp a requested lookahead to what the endpoint accepts
pub fn clamp_seconds(count: u64) -> u64 {
    count.min(MAX_SECONDS)
}

pub fn positions_url(base_url: &str, request: &FetchRequest, api_key: &str) -> String {
    let Observer {
        latitude_deg,
        longitude_deg,
        altitude_m,
    } = request.observer;
    format!(
        "{}/positions/{}/{}/{}/{}/{}/&apiKey={}",
        base_url,
        request.norad_id,
        latitude_deg,
        longitude_deg,
        altitude_m,
        clamp_seconds(request.count),
        api_key
    )
}

/// Decode a positions payload. The API reports logical failures with a
/// top-level `error` field even on HTTP 200.
pub fn parse_payload(payload: serde_json::Value) -> Result<Batch, SourceError> {
    if let Some(error) = payload.get("error") {
        let message = match error {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(SourceError::Upstream { message });
    }

    serde_json::from_value(payload).map_err(|e| SourceError::Upstream {
        message: format!("malformed payload: {}", e),
    })
}

#[async_trait]
impl PositionSource for N2yoSource {
    async fn fetch(&mut self, request: &FetchRequest) -> Result<Batch, SourceError> {
        let url = self.url(request);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Upstream {
                message: if body.is_empty() {
                    status.to_string()
                } else {
                    format!("{}: {}", status, body.trim())
                },
            });
        }

        let payload: serde_json::Value = response.json().await?;
        let batch = parse_payload(payload)?;

        log::debug!(
            "API response at t={} (#{}) with {} positions - params: /{}/{}/{}/{}/{}",
            chrono::Utc::now().timestamp(),
            batch
                .info
                .transactionscount
                .map(|c| c.to_string())
                .unwrap_or_else(|| "?".into()),
            batch.positions.len(),
            request.norad_id,
            request.observer.latitude_deg,
            request.observer.longitude_deg,
            request.observer.altitude_m,
            clamp_seconds(request.count)
        );

        Ok(batch)
    }

    fn describe(&self) -> String {
        format!("n2yo ({})", self.base_url)
    }
}
