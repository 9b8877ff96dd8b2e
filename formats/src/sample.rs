// ----- Normalized `Sample`, flattened struct

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sortie_common::Position;

/// This is a flattened struct gathering all elements we can find in a given
/// flight log row (DJI, EdgeTX) into a common type: `Sample`.
///
/// Coordinates are optional because both dialects emit rows before the GPS
/// has a fix, and those rows still carry useful link data.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Sample {
    /// timestamp
    pub time: DateTime<Utc>,
    /// Latitude in decimal degrees
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees
    pub longitude: Option<f64>,
    /// Altitude in metres, above the takeoff point
    pub altitude: Option<f64>,
    /// Ground speed in km/h
    pub speed: Option<f64>,
    /// Receiver battery voltage
    pub rx_battery: Option<f64>,
    /// Downlink signal strength in dB
    pub rssi: Option<i32>,
    /// Uplink quality in percent
    pub link_quality: Option<i32>,
    /// Metres from the first GPS fix of the flight, filled in at import
    pub distance_from_start: Option<f64>,
}

impl Sample {
    /// A sample taken before the GPS had a fix has no position.
    ///
    pub fn position(&self) -> Option<Position> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Position::new(lat, lon)),
            _ => None,
        }
    }

    /// Timestamp as fractional seconds since the epoch, what the duration
    /// estimator works on.
    ///
    pub fn epoch(&self) -> f64 {
        self.time.timestamp_micros() as f64 / 1_000_000.
    }
}
