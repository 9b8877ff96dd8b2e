//! Batch import of telemetry logs.
//!
//! One call scans a directory for CSV files, sniffs the dialect of each,
//! turns rows into samples and files everything as `Flight` records inside
//! a single transaction.  A file that cannot be imported for a known reason
//! is reported as skipped and the batch carries on, anything unexpected
//! aborts and rolls the whole batch back.
//!
//! Aircraft and location resolution is cached per batch in `ImportContext`
//! so ten logs flown from the same new field create one location, not ten.
//!

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use eyre::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, trace, warn};

use sortie_common::Position;
use sortie_formats::{dji, edgetx, LogFormat, Sample};

use crate::metrics::{fill_distances, simple_span, sort_samples};
use crate::store::{Dataset, Store};
use crate::{AircraftId, Flight, FlightId, LocationId, PilotId, Status};

/// Flights starting within this distance of a known location belong to it
pub const CLUSTER_RADIUS_M: f64 = 300.;

/// Spans under this are bench noise, not flights
pub const MIN_FLIGHT_SECS: f64 = 30.;

// -----

/// Why a file was left out of the batch.  The wording is part of the report
/// format, scripts match on it.
///
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SkipReason {
    #[error("unknown format")]
    UnknownFormat,
    #[error("empty or malformed")]
    Empty,
    #[error("Pilot {0} not found")]
    NoSuchPilot(String),
    #[error("invalid date format")]
    BadDate,
    #[error("log file already imported")]
    AlreadyImported,
    #[error("no valid data")]
    NoValidData,
    #[error("short duration")]
    ShortDuration,
    #[error("drone name not in filename")]
    NoAircraftInFilename,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Processed,
    Skipped,
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportStatus::Processed => write!(f, "processed"),
            ImportStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// One line of the batch report, one per input file.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FileReport {
    pub status: ImportStatus,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight: Option<FlightId>,
}

impl FileReport {
    fn processed(filename: &str, flight: FlightId) -> Self {
        FileReport {
            status: ImportStatus::Processed,
            filename: filename.to_string(),
            reason: None,
            flight: Some(flight),
        }
    }

    fn skipped(filename: &str, reason: &SkipReason) -> Self {
        FileReport {
            status: ImportStatus::Skipped,
            filename: filename.to_string(),
            reason: Some(reason.to_string()),
            flight: None,
        }
    }
}

/// What one file resolved to before reporting.
///
enum Outcome {
    Flight(FlightId),
    Skip(SkipReason),
}

// -----

/// Mutable state shared by every file of one batch.
///
/// Holding the context is what makes a batch a batch: the caches guarantee
/// that files resolving to the same new aircraft or location reuse the
/// record staged by an earlier file instead of creating twins.
///
pub struct ImportContext {
    /// Pilot the whole batch is filed under, unresolved stays `None`
    pilot: Option<PilotId>,
    /// What the caller asked for, kept for the skip report
    pilot_label: String,
    /// Canonical prefix under which log paths are stored
    import_dir: PathBuf,
    /// Locations touched by this batch, scanned in insertion order
    locations: Vec<LocationId>,
    /// Aircraft resolved by this batch, by name
    aircraft: BTreeMap<String, AircraftId>,
}

impl ImportContext {
    /// `pilot` is a name or a numeric id, resolution failure is not fatal
    /// here, every file of the batch will report it.
    ///
    pub fn new(data: &Dataset, pilot: &str, import_dir: &Path) -> Self {
        ImportContext {
            pilot: data.find_pilot(pilot).map(|p| p.id),
            pilot_label: pilot.to_string(),
            import_dir: import_dir.into(),
            locations: vec![],
            aircraft: BTreeMap::new(),
        }
    }

    /// Stored log path: canonical prefix plus basename, whatever directory
    /// the file actually came from.  Keeps duplicate detection working when
    /// the import directory moves.
    ///
    fn normalized_path(&self, filename: &str) -> PathBuf {
        self.import_dir.join(filename)
    }

    /// Sniff one file and run the right dialect pipeline on it.
    ///
    #[tracing::instrument(skip(self, data))]
    pub fn process_file(&mut self, data: &mut Dataset, path: &Path) -> Result<FileReport> {
        trace!("enter");

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let raw = fs::read_to_string(path)?;
        let header = raw.lines().next().unwrap_or("");

        let outcome = match LogFormat::sniff(header) {
            LogFormat::Dji => self.import_dji(data, &filename, &raw)?,
            LogFormat::EdgeTx => self.import_edgetx(data, &filename, &raw)?,
            LogFormat::Unknown => Outcome::Skip(SkipReason::UnknownFormat),
        };

        Ok(match outcome {
            Outcome::Flight(id) => FileReport::processed(&filename, id),
            Outcome::Skip(reason) => {
                info!("skipping {}: {}", filename, reason);
                FileReport::skipped(&filename, &reason)
            }
        })
    }

    fn import_dji(&mut self, data: &mut Dataset, filename: &str, raw: &str) -> Result<Outcome> {
        let rows = dji::load(raw)?;
        if rows.is_empty() {
            return Ok(Outcome::Skip(SkipReason::Empty));
        }
        let pilot = match self.pilot {
            Some(p) => p,
            None => return Ok(Outcome::Skip(SkipReason::NoSuchPilot(self.pilot_label.clone()))),
        };

        // Model name from the rows themselves, else the filename prefix.
        //
        let name = dji::aircraft_name(&rows).unwrap_or_else(|| filename_token(filename));
        let aircraft = self.resolve_aircraft(data, &name);

        let date = match dji::flight_date(&rows) {
            Some(d) => d,
            None => return Ok(Outcome::Skip(SkipReason::BadDate)),
        };

        if data.flight_by_log_basename(filename).is_some() {
            return Ok(Outcome::Skip(SkipReason::AlreadyImported));
        }

        let (samples, rejected) = dji::to_samples(&rows);
        if rejected > 0 {
            warn!("{}: dropped {} unparseable rows", filename, rejected);
        }
        self.file_flight(data, filename, pilot, aircraft, date, samples)
    }

    fn import_edgetx(&mut self, data: &mut Dataset, filename: &str, raw: &str) -> Result<Outcome> {
        let rows = edgetx::load(raw)?;
        if rows.is_empty() {
            return Ok(Outcome::Skip(SkipReason::Empty));
        }
        let pilot = match self.pilot {
            Some(p) => p,
            None => return Ok(Outcome::Skip(SkipReason::NoSuchPilot(self.pilot_label.clone()))),
        };

        // Radio logs carry no model name, the filename prefix is all we get.
        //
        let name = filename_token(filename);
        if name.is_empty() {
            return Ok(Outcome::Skip(SkipReason::NoAircraftInFilename));
        }
        let aircraft = self.resolve_aircraft(data, &name);

        let date = match edgetx::flight_date(&rows) {
            Ok(d) => d,
            Err(_) => return Ok(Outcome::Skip(SkipReason::BadDate)),
        };

        if data.flight_by_log_basename(filename).is_some() {
            return Ok(Outcome::Skip(SkipReason::AlreadyImported));
        }

        let (samples, rejected) = edgetx::to_samples(&rows);
        if rejected > 0 {
            warn!("{}: dropped {} unparseable rows", filename, rejected);
        }
        self.file_flight(data, filename, pilot, aircraft, date, samples)
    }

    /// Dialect-independent tail of the pipeline: gate on content, resolve
    /// the location, derive distances and stage the flight.
    ///
    fn file_flight(
        &mut self,
        data: &mut Dataset,
        filename: &str,
        pilot: PilotId,
        aircraft: AircraftId,
        date: NaiveDate,
        mut samples: Vec<Sample>,
    ) -> Result<Outcome> {
        if samples.is_empty() {
            return Ok(Outcome::Skip(SkipReason::NoValidData));
        }
        sort_samples(&mut samples);

        // The gate uses the raw span on purpose, the outlier-filtered
        // duration is for statistics only.
        //
        if simple_span(&samples) < MIN_FLIGHT_SECS {
            return Ok(Outcome::Skip(SkipReason::ShortDuration));
        }

        let location = samples
            .iter()
            .find_map(|s| s.position())
            .map(|start| self.resolve_location(data, &start));

        fill_distances(&mut samples);

        let id = data.add_flight(Flight {
            id: FlightId(0),
            pilot,
            aircraft,
            location,
            date,
            log_path: Some(self.normalized_path(filename)),
            notes: None,
            is_valid: true,
            invalidation_notes: None,
            batteries: vec![],
            samples,
        });
        info!("{} filed as flight {}", filename, id);
        Ok(Outcome::Flight(id))
    }

    fn resolve_aircraft(&mut self, data: &mut Dataset, name: &str) -> AircraftId {
        if let Some(id) = self.aircraft.get(name) {
            return *id;
        }
        let id = match data.aircraft_by_name(name) {
            Some(a) => a.id,
            None => data.add_aircraft(name),
        };
        self.aircraft.insert(name.to_string(), id);
        id
    }

    /// Find the location a start point belongs to, first match within the
    /// radius wins.  Batch cache first in insertion order, then the store,
    /// and a miss creates a fresh location named after the coordinates.
    ///
    fn resolve_location(&mut self, data: &mut Dataset, start: &Position) -> LocationId {
        let cached = self.locations.iter().copied().find(|id| {
            data.location(*id)
                .map(|l| start.distance_to(&l.position) <= CLUSTER_RADIUS_M)
                .unwrap_or(false)
        });
        if let Some(id) = cached {
            return id;
        }

        let found = data
            .locations
            .iter()
            .find(|l| start.distance_to(&l.position) <= CLUSTER_RADIUS_M)
            .map(|l| l.id);
        let id = match found {
            Some(id) => id,
            None => {
                let name = format!("Location ({:.4}, {:.4})", start.latitude, start.longitude);
                data.add_location(&name, *start)
            }
        };
        self.locations.push(id);
        id
    }
}

/// Aircraft name candidate from a log filename, the token before the
/// first `-`.
///
fn filename_token(filename: &str) -> String {
    filename.split('-').next().unwrap_or("").trim().to_string()
}

// -----

/// Import every `*.csv` file under `dir` for `pilot`, in one transaction.
///
/// Files are visited in sorted order.  The returned report has one entry
/// per file.  Any unexpected error aborts with nothing committed.
///
#[tracing::instrument(skip(store))]
pub fn import_directory(store: &mut Store, pilot: &str, dir: &Path) -> Result<Vec<FileReport>> {
    trace!("enter");

    if !dir.is_dir() {
        return Err(Status::NoImportDir(dir.to_string_lossy().to_string()).into());
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension() == Some(OsStr::new("csv")))
        .collect();
    files.sort();
    info!("found {} log files in {:?}", files.len(), dir);

    let mut txn = store.begin()?;
    let mut ctx = ImportContext::new(txn.data(), pilot, dir);

    let mut reports = Vec::with_capacity(files.len());
    for path in &files {
        let report = ctx.process_file(txn.data_mut(), path)?;
        reports.push(report);
    }
    txn.commit()?;
    Ok(reports)
}

/// Import a single log file for `pilot`, stored under `import_dir`.
///
/// Unlike a batch, a skipped file is an error here, and nothing is kept.
///
#[tracing::instrument(skip(store))]
pub fn import_file(
    store: &mut Store,
    pilot: &str,
    path: &Path,
    import_dir: &Path,
) -> Result<FileReport> {
    trace!("enter");

    let mut txn = store.begin()?;
    let mut ctx = ImportContext::new(txn.data(), pilot, import_dir);

    let report = ctx.process_file(txn.data_mut(), path)?;
    if report.status == ImportStatus::Skipped {
        let reason = report.reason.clone().unwrap_or_default();
        return Err(Status::ImportFailed(report.filename, reason).into());
    }
    txn.commit()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::{tempdir, TempDir};

    const DJI_HEADER: &str = "CUSTOM.dateTime,OSD.latitude,OSD.longitude,OSD.height,\
OSD.xSpeed,OSD.ySpeed,RC.downlinkSignal,RC.uplinkSignal,\
RECOVER.aircraftName,DETAILS.aircraftName";

    const EDGETX_HEADER: &str = "Date,Time,GPS,Alt(m),GSpd(kmh),RxBt(V),1RSS(dB),RQly(%)";

    /// Five DJI rows ten seconds apart, 40 s span.
    fn dji_file(aircraft: &str, lat: f64, lon: f64) -> String {
        let mut out = format!("{DJI_HEADER}\n");
        for i in 0..5 {
            out.push_str(&format!(
                "2024-06-01T10:00:{:02}Z,{},{},12.0,1.0,2.0,90,95,{},\n",
                i * 10,
                lat,
                lon,
                aircraft
            ));
        }
        out
    }

    /// Five EdgeTX rows ten seconds apart, 40 s span.
    fn edgetx_file(lat: f64, lon: f64) -> String {
        let mut out = format!("{EDGETX_HEADER}\n");
        for i in 0..5 {
            out.push_str(&format!(
                "2024-06-02,09:30:{:02}.000,{} {},35.0,42.0,8.2,-55,100\n",
                i * 10,
                lat,
                lon
            ));
        }
        out
    }

    /// Store with one pilot and an empty log directory.
    fn setup() -> (TempDir, Store, PathBuf) {
        let dir = tempdir().unwrap();
        let logs = dir.path().join("logs");
        fs::create_dir(&logs).unwrap();

        let mut store = Store::open(&dir.path().join("sortie.json")).unwrap();
        let mut txn = store.begin().unwrap();
        txn.data_mut().add_pilot("marcel", true).unwrap();
        txn.commit().unwrap();

        (dir, store, logs)
    }

    #[test]
    fn test_mixed_batch_reports_every_file() {
        let (_dir, mut store, logs) = setup();
        fs::write(logs.join("X1-1.csv"), dji_file("Mavic", 45.0, 7.0)).unwrap();
        fs::write(logs.join("Bixler-2.csv"), edgetx_file(45.0, 7.0)).unwrap();
        fs::write(logs.join("notes.txt"), "not a log").unwrap();
        fs::write(logs.join("weird.csv"), "a,b,c\n1,2,3\n").unwrap();

        let reports = import_directory(&mut store, "marcel", &logs).unwrap();

        let names: Vec<&str> = reports.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(vec!["Bixler-2.csv", "X1-1.csv", "weird.csv"], names);
        assert_eq!(ImportStatus::Processed, reports[0].status);
        assert_eq!(ImportStatus::Processed, reports[1].status);
        assert_eq!(ImportStatus::Skipped, reports[2].status);
        assert_eq!(Some("unknown format".to_string()), reports[2].reason);

        // Both flights committed, aircraft resolved per dialect rules.
        let again = Store::open(store.path()).unwrap();
        assert_eq!(2, again.data().flights.len());
        assert!(again.data().aircraft_by_name("Mavic").is_some());
        assert!(again.data().aircraft_by_name("Bixler").is_some());
        assert!(again.data().aircraft_by_name("X1").is_none());
    }

    #[test]
    fn test_second_run_skips_everything() {
        let (_dir, mut store, logs) = setup();
        fs::write(logs.join("Avata-1.csv"), dji_file("", 45.0, 7.0)).unwrap();

        let first = import_directory(&mut store, "marcel", &logs).unwrap();
        assert_eq!(ImportStatus::Processed, first[0].status);

        let second = import_directory(&mut store, "marcel", &logs).unwrap();
        assert_eq!(ImportStatus::Skipped, second[0].status);
        assert_eq!(
            Some("log file already imported".to_string()),
            second[0].reason
        );
        assert_eq!(1, store.data().flights.len());
    }

    #[test]
    fn test_duplicate_basename_across_directories() {
        let (dir, mut store, logs) = setup();
        fs::write(logs.join("Avata-1.csv"), dji_file("", 45.0, 7.0)).unwrap();
        import_directory(&mut store, "marcel", &logs).unwrap();

        // Same basename from another directory is still the same log.
        let elsewhere = dir.path().join("elsewhere");
        fs::create_dir(&elsewhere).unwrap();
        fs::write(elsewhere.join("Avata-1.csv"), dji_file("", 46.0, 8.0)).unwrap();

        let r = import_file(&mut store, "marcel", &elsewhere.join("Avata-1.csv"), &logs);
        assert!(r.is_err());
        assert_eq!(1, store.data().flights.len());
    }

    // ~298 m and ~302 m north of the first start point.
    //
    #[test]
    fn test_location_clustering_radius() {
        let (_dir, mut store, logs) = setup();
        fs::write(logs.join("a-1.csv"), dji_file("Avata", 45.0, 7.0)).unwrap();
        fs::write(logs.join("b-2.csv"), dji_file("Avata", 45.00268, 7.0)).unwrap();
        fs::write(logs.join("c-3.csv"), dji_file("Avata", 45.00272, 7.0)).unwrap();

        let reports = import_directory(&mut store, "marcel", &logs).unwrap();
        assert!(reports.iter().all(|r| r.status == ImportStatus::Processed));

        let data = store.data();
        assert_eq!(2, data.locations.len());
        assert_eq!("Location (45.0000, 7.0000)", data.locations[0].name);
        assert_eq!("Location (45.0027, 7.0000)", data.locations[1].name);

        // One shared aircraft for the whole batch.
        assert_eq!(1, data.aircraft.len());

        let locs: Vec<Option<LocationId>> = data.flights.iter().map(|f| f.location).collect();
        assert_eq!(locs[0], locs[1]);
        assert_ne!(locs[0], locs[2]);
    }

    #[test]
    fn test_short_flight_is_skipped() {
        let (_dir, mut store, logs) = setup();
        let mut content = format!("{DJI_HEADER}\n");
        for i in 0..3 {
            content.push_str(&format!(
                "2024-06-01T10:00:{:02}Z,45.0,7.0,12.0,1.0,2.0,90,95,Avata,\n",
                i * 10
            ));
        }
        fs::write(logs.join("Avata-1.csv"), content).unwrap();

        let reports = import_directory(&mut store, "marcel", &logs).unwrap();
        assert_eq!(Some("short duration".to_string()), reports[0].reason);
        assert!(store.data().flights.is_empty());
        // The aircraft was resolved before the gate and stays.
        assert_eq!(1, store.data().aircraft.len());
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let (_dir, mut store, logs) = setup();
        fs::write(logs.join("Avata-1.csv"), format!("{DJI_HEADER}\n")).unwrap();

        let reports = import_directory(&mut store, "marcel", &logs).unwrap();
        assert_eq!(Some("empty or malformed".to_string()), reports[0].reason);
    }

    #[test]
    fn test_rows_without_timestamps_are_no_valid_data() {
        let (_dir, mut store, logs) = setup();
        let content = format!("{EDGETX_HEADER}\n2024-06-02,,45.0 7.0,35.0,42.0,8.2,-55,100\n");
        fs::write(logs.join("Bixler-1.csv"), content).unwrap();

        let reports = import_directory(&mut store, "marcel", &logs).unwrap();
        assert_eq!(Some("no valid data".to_string()), reports[0].reason);
    }

    #[test]
    fn test_unknown_pilot_skips_batch_files() {
        let (_dir, mut store, logs) = setup();
        fs::write(logs.join("Avata-1.csv"), dji_file("", 45.0, 7.0)).unwrap();

        let reports = import_directory(&mut store, "ghost", &logs).unwrap();
        assert_eq!(Some("Pilot ghost not found".to_string()), reports[0].reason);
        assert!(store.data().flights.is_empty());
    }

    #[test]
    fn test_edgetx_needs_aircraft_in_filename() {
        let (_dir, mut store, logs) = setup();
        fs::write(logs.join("-2024.csv"), edgetx_file(45.0, 7.0)).unwrap();

        let reports = import_directory(&mut store, "marcel", &logs).unwrap();
        assert_eq!(
            Some("drone name not in filename".to_string()),
            reports[0].reason
        );
    }

    #[test]
    fn test_unreadable_file_rolls_back_batch() {
        let (_dir, mut store, logs) = setup();
        fs::write(logs.join("a-1.csv"), dji_file("Avata", 45.0, 7.0)).unwrap();
        fs::write(logs.join("b-2.csv"), b"\xff\xfe not utf-8").unwrap();

        assert!(import_directory(&mut store, "marcel", &logs).is_err());

        // The valid file was staged before the failure, nothing survives.
        assert!(store.data().flights.is_empty());
        assert!(store.data().aircraft.is_empty());
        let again = Store::open(store.path()).unwrap();
        assert!(again.data().flights.is_empty());
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let (dir, mut store, _logs) = setup();
        let r = import_directory(&mut store, "marcel", &dir.path().join("nope"));
        assert!(r.is_err());
    }

    #[test]
    fn test_single_file_import() {
        let (_dir, mut store, logs) = setup();
        let path = logs.join("Avata-1.csv");
        fs::write(&path, dji_file("", 45.0, 7.0)).unwrap();

        let report = import_file(&mut store, "marcel", &path, &logs).unwrap();
        assert_eq!(ImportStatus::Processed, report.status);
        let flight = store.data().flight(report.flight.unwrap()).unwrap();
        assert_eq!(Some("Avata-1.csv".to_string()), flight.log_basename());

        // Second time round the duplicate is an error, not a report.
        assert!(import_file(&mut store, "marcel", &path, &logs).is_err());
        assert_eq!(1, store.data().flights.len());
    }

    #[test]
    fn test_samples_are_sorted_and_measured() {
        let (_dir, mut store, logs) = setup();
        // Rows deliberately out of order, with a coordinate-less head row.
        let content = format!(
            "{DJI_HEADER}\n\
2024-06-01T10:00:40Z,45.001,7.0,12.0,0.0,0.0,90,95,Avata,\n\
2024-06-01T10:00:00Z,0.0,0.0,12.0,0.0,0.0,90,95,,\n\
2024-06-01T10:00:20Z,45.0,7.0,12.0,0.0,0.0,90,95,,\n"
        );
        fs::write(logs.join("Avata-1.csv"), content).unwrap();

        let report = import_file(&mut store, "marcel", &logs.join("Avata-1.csv"), &logs).unwrap();
        let flight = store.data().flight(report.flight.unwrap()).unwrap();

        let times: Vec<i64> = flight
            .samples
            .windows(2)
            .map(|w| (w[1].time - w[0].time).num_seconds())
            .collect();
        assert_eq!(vec![20, 20], times);

        // Anchor is the first positioned sample after sorting, 10:00:20.
        assert_eq!(None, flight.samples[0].distance_from_start);
        assert_eq!(Some(0.), flight.samples[1].distance_from_start);
        let d = flight.samples[2].distance_from_start.unwrap();
        assert!((d - 111.19).abs() < 0.5);
    }
}
