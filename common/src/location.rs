//! Position related module
//!
//! Plain WGS84 decimal degrees all around, distances in metres computed with
//! the haversine formula on a spherical earth.
//!

use std::fmt;

use serde::{Deserialize, Serialize};

/// Mean earth radius in metres, the usual spherical approximation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.;

/// A point on earth.
///
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Position {
    /// Latitude in decimal degrees, positive north
    pub latitude: f64,
    /// Longitude in decimal degrees, positive east
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Position {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in metres.
    ///
    pub fn distance_to(&self, other: &Position) -> f64 {
        let phi1 = self.latitude.to_radians();
        let phi2 = other.latitude.to_radians();
        let d_phi = (other.latitude - self.latitude).to_radians();
        let d_lambda = (other.longitude - self.longitude).to_radians();

        let a = (d_phi / 2.).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.).sin().powi(2);
        let c = 2. * a.sqrt().atan2((1. - a).sqrt());

        EARTH_RADIUS_M * c
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}
