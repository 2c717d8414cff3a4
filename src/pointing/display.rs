use chrono::{DateTime, Local};
use strum_macros::Display;

use crate::source::{Position, SatInfo};

const UNKNOWN: &str = "???";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Cardinal {
    N,
    E,
    S,
    W,
}

impl Cardinal {
    pub fn from_azimuth(azimuth: f64) -> Self {
        if 45.0 < azimuth && azimuth < 135.0 {
            Cardinal::E
        } else if (135.0..=225.0).contains(&azimuth) {
            Cardinal::S
        } else if 225.0 < azimuth && azimuth < 315.0 {
            Cardinal::W
        } else {
            Cardinal::N
        }
    }
}

fn fixed(value: Option<f64>, width: usize) -> String {
    match value {
        Some(v) => format!("{:>width$.2}", v, width = width),
        None => UNKNOWN.to_string(),
    }
}

/// One human readable line describing where to look
pub fn tracking_line(position: &Position, info: &SatInfo) -> String {
    let time = DateTime::from_timestamp(position.timestamp, 0)
        .map(|t| {
            t.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| position.timestamp.to_string());
    let daylight = if position.eclipsed {
        "eclipsed"
    } else {
        "in daylight"
    };

    format!(
        "{} - {} (id:{}) is at lat:{} lon:{} alt:{}. Look at {:>7.2}°{} and {:6.2}° elevation. It is {}.",
        time,
        info.name,
        info.id,
        fixed(position.satlatitude, 7),
        fixed(position.satlongitude, 7),
        fixed(position.sataltitude, 7),
        position.azimuth,
        Cardinal::from_azimuth(position.azimuth),
        position.elevation,
        daylight
    )
}
