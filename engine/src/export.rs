//! Turn a flight track into GPX or KML for the usual map viewers.
//!
//! Both exports keep only the positioned samples, in sequence order.
//!

use std::collections::HashMap;
use std::io::Write;

use eyre::Result;
use gpx::{Gpx, GpxVersion, Time, Track, TrackSegment, Waypoint};
use kml::types::{AltitudeMode, Coord, Geometry, LineString, Placemark};
use kml::Kml::Document;
use kml::{Kml, KmlDocument, KmlVersion, KmlWriter};
use time::OffsetDateTime;
use tracing::trace;

use crate::Flight;

/// One track, one segment, one point per positioned sample.
///
#[tracing::instrument(skip_all, fields(flight = %flight.id))]
pub fn to_gpx<W: Write>(flight: &Flight, out: W) -> Result<()> {
    trace!("enter");

    let points = flight
        .samples
        .iter()
        .filter_map(|s| {
            s.position().map(|p| {
                let mut wpt = Waypoint::new(geo_types::Point::new(p.longitude, p.latitude));
                wpt.elevation = s.altitude;
                wpt.time = OffsetDateTime::from_unix_timestamp_nanos(
                    s.time.timestamp_micros() as i128 * 1_000,
                )
                .ok()
                .map(Time::from);
                wpt
            })
        })
        .collect::<Vec<_>>();

    let track = Track {
        segments: vec![TrackSegment { points }],
        ..Default::default()
    };
    let gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(crate::version()),
        tracks: vec![track],
        ..Default::default()
    };
    Ok(gpx::write(&gpx, out)?)
}

/// A single extruded `LineString` at absolute altitude, like the track
/// viewers expect for drone footage.
///
#[tracing::instrument(skip_all, fields(flight = %flight.id))]
pub fn to_kml<W: Write>(flight: &Flight, mut out: W) -> Result<()> {
    trace!("enter");

    let coords = flight
        .samples
        .iter()
        .filter_map(|s| {
            s.position()
                .map(|p| Coord::new(p.longitude, p.latitude, s.altitude))
        })
        .collect::<Vec<_>>();

    let ls = LineString {
        tessellate: false,
        extrude: true,
        altitude_mode: AltitudeMode::Absolute,
        coords,
        ..Default::default()
    };
    let pm = Kml::Placemark(Placemark {
        name: Some(format!("Flight {}", flight.id)),
        geometry: Some(Geometry::LineString(ls)),
        ..Default::default()
    });

    let doc = Document {
        attrs: HashMap::new(),
        elements: vec![pm],
    };
    let doc = Kml::KmlDocument(KmlDocument {
        version: KmlVersion::V22,
        elements: vec![doc],
        ..Default::default()
    });

    let mut w = KmlWriter::from_writer(&mut out);
    w.write(&doc)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};

    use sortie_formats::Sample;

    use crate::{AircraftId, FlightId, PilotId};

    fn fixed_sample(secs: i64, lat: Option<f64>, lon: Option<f64>) -> Sample {
        Sample {
            time: Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
                + chrono::Duration::seconds(secs),
            latitude: lat,
            longitude: lon,
            altitude: Some(35.5),
            speed: None,
            rx_battery: None,
            rssi: None,
            link_quality: None,
            distance_from_start: None,
        }
    }

    fn flight() -> Flight {
        Flight {
            id: FlightId(7),
            pilot: PilotId(1),
            aircraft: AircraftId(1),
            location: None,
            date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            log_path: None,
            notes: None,
            is_valid: true,
            invalidation_notes: None,
            batteries: vec![],
            samples: vec![
                fixed_sample(0, None, None),
                fixed_sample(10, Some(48.8566), Some(2.3522)),
                fixed_sample(20, Some(48.8567), Some(2.3523)),
            ],
        }
    }

    #[test]
    fn test_gpx_keeps_positioned_samples() {
        let mut buf = vec![];
        to_gpx(&flight(), &mut buf).unwrap();
        let xml = String::from_utf8(buf).unwrap();

        assert_eq!(2, xml.matches("<trkpt").count());
        assert!(xml.contains("48.8566"));
        assert!(xml.contains("2.3522"));
        assert!(xml.contains("35.5"));
        assert!(xml.contains("2024-06-01T10:00:10"));
        assert!(xml.contains("sortie-engine"));
    }

    #[test]
    fn test_kml_linestring() {
        let mut buf = vec![];
        to_kml(&flight(), &mut buf).unwrap();
        let xml = String::from_utf8(buf).unwrap();

        assert!(xml.contains("Flight 7"));
        assert!(xml.contains("<LineString"));
        assert!(xml.contains("2.3522,48.8566,35.5"));
        assert!(xml.contains("absolute"));
        assert!(xml.contains("<extrude>1</extrude>"));
    }

    #[test]
    fn test_exports_without_any_fix_still_serialize() {
        let mut f = flight();
        f.samples = vec![fixed_sample(0, None, None)];

        let mut buf = vec![];
        to_gpx(&f, &mut buf).unwrap();
        assert!(!String::from_utf8(buf).unwrap().contains("<trkpt"));

        let mut buf = vec![];
        to_kml(&f, &mut buf).unwrap();
        assert!(String::from_utf8(buf).unwrap().contains("<LineString"));
    }
}
