//! Module to load and process CSV telemetry logs written by an EdgeTX radio.
//!
//! The radio logs one row per telemetry frame.  Sensor columns vary with what
//! the receiver reports, the `GPS` column packs latitude and longitude into a
//! single space-separated value.
//!

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use eyre::Result;
use nom::character::complete::char;
use nom::combinator::all_consuming;
use nom::number::complete::double;
use nom::sequence::separated_pair;
use nom::IResult;
use serde::Deserialize;
use tracing::debug;

use crate::Sample;

/// Represents a record obtained from an EdgeTX telemetry log.
///
/// Older firmware does not log a `Date` column, and every sensor column is
/// optional, hence the `Option`s all over.
///
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EdgeTxRecord {
    /// Log date, YYYY-MM-DD
    #[serde(default, rename = "Date")]
    pub date: Option<String>,
    /// Log time, HH:MM:SS with fraction
    #[serde(default, rename = "Time")]
    pub time: Option<String>,
    /// Packed "lat lon" pair in decimal degrees
    #[serde(default, rename = "GPS")]
    pub gps: Option<String>,
    /// Altitude in metres
    #[serde(default, rename = "Alt(m)")]
    pub altitude: Option<String>,
    /// Ground speed in km/h, straight from the sensor
    #[serde(default, rename = "GSpd(kmh)")]
    pub ground_speed: Option<String>,
    /// Receiver battery voltage
    #[serde(default, rename = "RxBt(V)")]
    pub rx_battery: Option<String>,
    /// Downlink signal strength in dB
    #[serde(default, rename = "1RSS(dB)")]
    pub rssi: Option<String>,
    /// Uplink quality in percent
    #[serde(default, rename = "RQly(%)")]
    pub link_quality: Option<String>,
}

impl EdgeTxRecord {
    /// Numeric coercion for one row.  Any present field that does not parse
    /// makes the whole row invalid, except the GPS pair which degrades to no
    /// position.
    ///
    fn sample(&self, date: &str, time: &str) -> Result<Sample> {
        let ts = format!("{date} {time}");
        let time = NaiveDateTime::parse_from_str(&ts, "%Y-%m-%d %H:%M:%S%.f")?.and_utc();

        let (latitude, longitude) = match self.gps.as_deref().filter(|s| !s.is_empty()) {
            Some(gps) => match split_gps(gps) {
                Some((lat, lon)) => (Some(lat), Some(lon)),
                None => (None, None),
            },
            None => (None, None),
        };

        Ok(Sample {
            time,
            latitude,
            longitude,
            altitude: opt_f64(&self.altitude)?,
            speed: opt_f64(&self.ground_speed)?,
            rx_battery: opt_f64(&self.rx_battery)?,
            rssi: opt_i32(&self.rssi)?,
            link_quality: opt_i32(&self.link_quality)?,
            distance_from_start: None,
        })
    }
}

/// Load every record out of an EdgeTX telemetry log.
///
#[tracing::instrument(skip(data))]
pub fn load(data: &str) -> Result<Vec<EdgeTxRecord>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(data.as_bytes());
    let records: Vec<EdgeTxRecord> = rdr.deserialize().collect::<Result<_, _>>()?;
    Ok(records)
}

/// Date of the flight, taken from the first row.
///
/// A radio without an RTC date column gets today's date, a `Date` value that
/// does not parse is an error the caller turns into a skip.
///
pub fn flight_date(records: &[EdgeTxRecord]) -> Result<NaiveDate> {
    let date = records.first().and_then(|r| r.date.clone());
    match date {
        None => Ok(Local::now().date_naive()),
        Some(d) => Ok(NaiveDate::parse_from_str(&d, "%Y-%m-%d")?),
    }
}

/// Convert raw records into normalized samples.
///
/// Rows without both a date and a time are silently dropped, rows failing
/// numeric coercion are counted and logged.
///
#[tracing::instrument(skip(records))]
pub fn to_samples(records: &[EdgeTxRecord]) -> (Vec<Sample>, usize) {
    let mut rejected = 0usize;
    let mut samples = Vec::with_capacity(records.len());

    for (n, rec) in records.iter().enumerate() {
        let (date, time) = match (non_empty(&rec.date), non_empty(&rec.time)) {
            (Some(d), Some(t)) => (d, t),
            _ => continue,
        };
        match rec.sample(&date, &time) {
            Ok(s) => samples.push(s),
            Err(e) => {
                debug!("rejecting row {n}: {e}");
                rejected += 1;
            }
        }
    }
    (samples, rejected)
}

/// Exactly two floats with a single space between them, nothing else.
///
fn parse_gps(input: &str) -> IResult<&str, (f64, f64)> {
    all_consuming(separated_pair(double, char(' '), double))(input)
}

/// Split the packed `GPS` column, anything malformed degrades to no position.
///
pub fn split_gps(input: &str) -> Option<(f64, f64)> {
    parse_gps(input).ok().map(|(_, pair)| pair)
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
