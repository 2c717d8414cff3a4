use serde::{Deserialize, Serialize};

/// A single predicted look-angle as served by the upstream API
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Position {
    pub timestamp: i64,
    pub azimuth: f64,
    pub elevation: f64,
    pub eclipsed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satlatitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satlongitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sataltitude: Option<f64>,
}

/// Satellite identity attached to every batch
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SatInfo {
    #[serde(rename = "satname")]
    pub name: String,
    #[serde(rename = "satid")]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactionscount: Option<u64>,
}

/// One fetch worth of positions
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Batch {
    pub info: SatInfo,
    #[serde(default)]
    pub positions: Vec<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

impl Default for Observer {
    fn default() -> Self {
        Self {
            latitude_deg: 0.0,
            longitude_deg: 0.0,
            altitude_m: 0.0,
        }
    }
}

/// Parameters of a single fetch. `count` is the number of seconds of
/// lookahead wanted; sources clamp it to what they can serve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchRequest {
    pub norad_id: u32,
    pub observer: Observer,
    pub count: u64,
}
