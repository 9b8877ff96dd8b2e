//! The record types making up the logbook.
//!
//! Everything the store persists lives here.  Records own their id, handed
//! out by the store at insert time, and reference each other through the
//! typed id newtypes rather than through shared pointers.
//!

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use sortie_common::Position;
use sortie_formats::Sample;

/// Typed record ids so a flight id can not end up where a pilot id belongs.
///
macro_rules! id_type {
    ($name:ident) => {
        #[derive(
            Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd,
            Serialize,
        )]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(PilotId);
id_type!(AircraftId);
id_type!(LocationId);
id_type!(BatteryId);
id_type!(FlightId);

// -----

/// Someone who flies.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Pilot {
    pub id: PilotId,
    /// Pilot name, unique
    pub name: String,
    /// Used when an import does not name a pilot
    #[serde(default)]
    pub is_default: bool,
}

/// An airframe.  Created on the fly at import time whenever a log names one
/// we have not seen yet.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Aircraft {
    pub id: AircraftId,
    /// Aircraft name, unique, matched against log content or filename
    pub name: String,
    /// Free text
    #[serde(default)]
    pub notes: Option<String>,
}

/// A flying site.  Takeoff points within 300 m of an existing site fold into
/// it, anything further away seeds a new one.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Location {
    pub id: LocationId,
    /// Display name, auto-generated from the seed coordinates
    pub name: String,
    /// Takeoff point the cluster was seeded with
    pub position: Position,
    /// Free text
    #[serde(default)]
    pub notes: Option<String>,
    /// Cleared when the site turns out to be bogus (GPS glitch etc.)
    #[serde(default = "default_true")]
    pub is_valid: bool,
    /// Why it was invalidated
    #[serde(default)]
    pub invalidation_notes: Option<String>,
    /// Metres to add to every altitude flown here
    #[serde(default)]
    pub altitude_offset: f64,
}

/// A battery pack, with a cycle count maintained as packs get attached to
/// and detached from flights.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BatteryPack {
    pub id: BatteryId,
    /// Short identifier written on the pack
    pub number: String,
    /// Pack name or model
    pub name: String,
    /// When it was bought
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    /// Free text
    #[serde(default)]
    pub notes: Option<String>,
    /// Charge cycles, one per flight the pack is attached to
    #[serde(default)]
    pub cycles: i32,
    /// Cell arrangement, e.g. "4S"
    #[serde(default)]
    pub voltage_level: Option<String>,
    /// Capacity in mAh
    #[serde(default)]
    pub capacity_mah: Option<u32>,
}

/// One flight, i.e. one imported log file.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Flight {
    pub id: FlightId,
    pub pilot: PilotId,
    pub aircraft: AircraftId,
    /// Unset when the log never got a GPS fix
    #[serde(default)]
    pub location: Option<LocationId>,
    /// Date of the flight as found in the log
    pub date: NaiveDate,
    /// Canonical path of the log file this flight came from
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    /// Free text
    #[serde(default)]
    pub notes: Option<String>,
    /// Cleared for bench tests and other non-flights
    #[serde(default = "default_true")]
    pub is_valid: bool,
    /// Why it was invalidated
    #[serde(default)]
    pub invalidation_notes: Option<String>,
    /// Battery packs used on this flight
    #[serde(default)]
    pub batteries: Vec<BatteryId>,
    /// Normalized telemetry, sorted by timestamp
    pub samples: Vec<Sample>,
}

fn default_true() -> bool {
    true
}

impl Flight {
    /// Basename of the log file this flight came from, what duplicate
    /// detection compares.
    ///
    pub fn log_basename(&self) -> Option<String> {
        self.log_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
    }

    /// First sample with a GPS fix, the takeoff point for all distance work.
    ///
    pub fn start_position(&self) -> Option<Position> {
        self.samples.iter().find_map(|s| s.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight_with_path(path: Option<&str>) -> Flight {
        Flight {
            id: FlightId(1),
            pilot: PilotId(1),
            aircraft: AircraftId(1),
            location: None,
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            log_path: path.map(PathBuf::from),
            notes: None,
            is_valid: true,
            invalidation_notes: None,
            batteries: vec![],
            samples: vec![],
        }
    }

    #[test]
    fn test_log_basename() {
        let f = flight_with_path(Some("/var/sortie/import/Avata-2024-06-01.csv"));
        assert_eq!(Some("Avata-2024-06-01.csv".to_string()), f.log_basename());
    }

    #[test]
    fn test_log_basename_none_without_path() {
        assert_eq!(None, flight_with_path(None).log_basename());
    }
}
