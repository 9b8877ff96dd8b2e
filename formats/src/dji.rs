//! Module to load and process the CSV export of a DJI flight controller log,
//! as produced by CsvView/DatCon.
//!
//! Column names are the ones CsvView emits.  A real export has a few hundred
//! columns, we only look at the handful we normalize into `Sample`; everything
//! else is ignored.
//!

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use eyre::Result;
use serde::Deserialize;
use tracing::debug;

use crate::Sample;

/// Rows logged before the FC clock is set carry this date and are dropped.
const EPOCH_DATE: &str = "1970-01-01";

/// Represents a record obtained from a CsvView export.
///
/// Everything is a string in the file and most columns only exist on some
/// firmware versions, hence all the `Option`s.  Numeric coercion happens when
/// converting into a `Sample`, so that one mangled row does not sink the file.
///
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DjiRecord {
    /// Wall-clock timestamp, ISO-8601-ish
    #[serde(default, rename = "CUSTOM.dateTime")]
    pub date_time: Option<String>,
    /// Latitude in decimal degrees, `0.0` until the GPS has a fix
    #[serde(default, rename = "OSD.latitude")]
    pub latitude: Option<String>,
    /// Longitude in decimal degrees, `0.0` until the GPS has a fix
    #[serde(default, rename = "OSD.longitude")]
    pub longitude: Option<String>,
    /// Height above the takeoff point in metres
    #[serde(default, rename = "OSD.height")]
    pub height: Option<String>,
    /// Horizontal speed component in m/s
    #[serde(default, rename = "OSD.xSpeed")]
    pub x_speed: Option<String>,
    /// Horizontal speed component in m/s
    #[serde(default, rename = "OSD.ySpeed")]
    pub y_speed: Option<String>,
    /// Downlink signal strength
    #[serde(default, rename = "RC.downlinkSignal")]
    pub downlink_signal: Option<String>,
    /// Uplink signal strength
    #[serde(default, rename = "RC.uplinkSignal")]
    pub uplink_signal: Option<String>,
    /// Aircraft name as recorded at the end of the log
    #[serde(default, rename = "RECOVER.aircraftName")]
    pub recover_aircraft_name: Option<String>,
    /// Aircraft name as recorded in the details block
    #[serde(default, rename = "DETAILS.aircraftName")]
    pub details_aircraft_name: Option<String>,
}

impl DjiRecord {
    /// Numeric coercion for one row.  Any present field that does not parse
    /// makes the whole row invalid.
    ///
    fn sample(&self, ts: &str) -> Result<Sample> {
        let time = parse_datetime(ts)?;

        let latitude = coord(&self.latitude)?;
        let longitude = coord(&self.longitude)?;
        let altitude = opt_f64(&self.height)?;

        // Ground speed out of the two horizontal components, m/s into km/h.
        //
        let x = speed_component(&self.x_speed)?;
        let y = speed_component(&self.y_speed)?;
        let speed = (x * x + y * y).sqrt() * 3.6;

        let rssi = opt_i32(&self.downlink_signal)?;
        let link_quality = opt_i32(&self.uplink_signal)?;

        Ok(Sample {
            time,
            latitude,
            longitude,
            altitude,
            speed: Some(speed),
            rx_battery: None,
            rssi,
            link_quality,
            distance_from_start: None,
        })
    }
}

/// Load every record out of a CsvView export.
///
#[tracing::instrument(skip(data))]
pub fn load(data: &str) -> Result<Vec<DjiRecord>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(data.as_bytes());
    let records: Vec<DjiRecord> = rdr.deserialize().collect::<Result<_, _>>()?;
    Ok(records)
}

/// Aircraft name out of the first row that has one, `RECOVER` wins over
/// `DETAILS` within a row.
///
pub fn aircraft_name(records: &[DjiRecord]) -> Option<String> {
    records.iter().find_map(|r| {
        non_empty(&r.recover_aircraft_name).or_else(|| non_empty(&r.details_aircraft_name))
    })
}

/// Date of the flight, taken from the first parseable timestamp that is not
/// an epoch placeholder.
///
pub fn flight_date(records: &[DjiRecord]) -> Option<NaiveDate> {
    records.iter().find_map(|r| match r.date_time.as_deref() {
        Some(ts) if !ts.is_empty() && !ts.starts_with(EPOCH_DATE) => {
            parse_datetime(ts).ok().map(|t| t.date_naive())
        }
        _ => None,
    })
}

/// Convert raw records into normalized samples.
///
/// Epoch placeholder rows are silently dropped, rows failing numeric coercion
/// are counted and logged.  Rows without a GPS fix still become samples, the
/// link data on them is worth keeping.
///
#[tracing::instrument(skip(records))]
pub fn to_samples(records: &[DjiRecord]) -> (Vec<Sample>, usize) {
    let mut rejected = 0usize;
    let mut samples = Vec::with_capacity(records.len());

    for (n, rec) in records.iter().enumerate() {
        let ts = match rec.date_time.as_deref() {
            Some(ts) if !ts.is_empty() && !ts.starts_with(EPOCH_DATE) => ts,
            _ => continue,
        };
        match rec.sample(ts) {
            Ok(s) => samples.push(s),
            Err(e) => {
                debug!("rejecting row {n}: {e}");
                rejected += 1;
            }
        }
    }
    (samples, rejected)
}

/// CsvView emits local naive timestamps most of the time but RFC3339 shows up
/// in the wild too, try the strict form first.
///
fn parse_datetime(ts: &str) -> Result<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(ts) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(t.and_utc());
    }
    let t = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S%.f")?;
    Ok(t.and_utc())
}

/// The FC writes a literal `0.0` for both coordinates until the GPS has a
/// fix, that is not a position.
///
fn coord(v: &Option<String>) -> Result<Option<f64>> {
    match v.as_deref() {
        None | Some("") | Some("0.0") => Ok(None),
        Some(v) => Ok(Some(v.parse()?)),
    }
}

/// A missing component counts as zero, a present one must parse.
///
fn speed_component(v: &Option<String>) -> Result<f64> {
    match v.as_deref() {
        None => Ok(0.),
        Some(v) => Ok(v.parse()?),
    }
}

fn opt_f64(v: &Option<String>) -> Result<Option<f64>> {
    match v.as_deref() {
        None | Some("") => Ok(None),
        Some(v) => Ok(Some(v.parse()?)),
    }
}

fn opt_i32(v: &Option<String>) -> Result<Option<i32>> {
    match v.as_deref() {
        None | Some("") => Ok(None),
        Some(v) => Ok(Some(v.parse()?)),
    }
}

fn non_empty(v: &Option<String>) -> Option<String> {
    v.as_deref().filter(|s| !s.is_empty()).map(String::from)
}
