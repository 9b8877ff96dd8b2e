//! Keeping the logbook on disk.
//!
//! The whole dataset lives in memory and is synced as one JSON snapshot.
//! Mutations go through a `Txn` which clones the dataset, works on the copy
//! and swaps it back in on `commit()`.  Dropping an uncommitted transaction
//! is the rollback, ids handed out inside it included.
//!
//! An advisory lock file next to the snapshot keeps two imports from
//! interleaving.  It holds the pid of the owner for post-mortem diagnostics
//! and goes away with the transaction.
//!

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use sortie_common::Position;

use crate::{
    Aircraft, AircraftId, BatteryId, BatteryPack, Flight, FlightId, Location, LocationId, Pilot,
    PilotId, Status,
};

/// Current snapshot file version
const STORE_VERSION: usize = 1;

/// Extension of the lock file, next to the snapshot
const LOCK_EXT: &str = "lock";

// -----

/// Whole dataset, which doubles as the JSON payload on disk.
///
/// Records are kept in insertion order, which is also ascending-id order,
/// so every scan in the engine is deterministic.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Dataset {
    /// Version number for safety
    pub version: usize,
    next_pilot: u32,
    next_aircraft: u32,
    next_location: u32,
    next_battery: u32,
    next_flight: u32,
    pub pilots: Vec<Pilot>,
    pub aircraft: Vec<Aircraft>,
    pub locations: Vec<Location>,
    pub batteries: Vec<BatteryPack>,
    pub flights: Vec<Flight>,
}

impl Default for Dataset {
    fn default() -> Self {
        Dataset {
            version: STORE_VERSION,
            next_pilot: 1,
            next_aircraft: 1,
            next_location: 1,
            next_battery: 1,
            next_flight: 1,
            pilots: vec![],
            aircraft: vec![],
            locations: vec![],
            batteries: vec![],
            flights: vec![],
        }
    }
}

impl Dataset {
    // ----- Lookups

    pub fn pilot(&self, id: PilotId) -> Option<&Pilot> {
        self.pilots.iter().find(|p| p.id == id)
    }

    pub fn pilot_by_name(&self, name: &str) -> Option<&Pilot> {
        self.pilots.iter().find(|p| p.name == name)
    }

    /// Resolve a pilot given either a name or a numeric id.
    ///
    pub fn find_pilot(&self, who: &str) -> Option<&Pilot> {
        self.pilot_by_name(who)
            .or_else(|| who.parse::<u32>().ok().and_then(|n| self.pilot(PilotId(n))))
    }

    pub fn default_pilot(&self) -> Option<&Pilot> {
        self.pilots.iter().find(|p| p.is_default)
    }

    pub fn aircraft(&self, id: AircraftId) -> Option<&Aircraft> {
        self.aircraft.iter().find(|a| a.id == id)
    }

    pub fn aircraft_by_name(&self, name: &str) -> Option<&Aircraft> {
        self.aircraft.iter().find(|a| a.name == name)
    }

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn battery(&self, id: BatteryId) -> Option<&BatteryPack> {
        self.batteries.iter().find(|b| b.id == id)
    }

    pub fn flight(&self, id: FlightId) -> Option<&Flight> {
        self.flights.iter().find(|f| f.id == id)
    }

    /// Does any flight reference this log file already?  Comparison is on
    /// basenames, wherever the file was picked up from.
    ///
    pub fn flight_by_log_basename(&self, basename: &str) -> Option<&Flight> {
        self.flights
            .iter()
            .find(|f| f.log_basename().as_deref() == Some(basename))
    }

    // ----- Mutations

    #[tracing::instrument(skip(self))]
    pub fn add_pilot(&mut self, name: &str, is_default: bool) -> Result<PilotId> {
        if self.pilot_by_name(name).is_some() {
            return Err(Status::PilotExists(name.to_string()).into());
        }
        let id = PilotId(self.next_pilot);
        self.next_pilot += 1;
        if is_default {
            self.pilots.iter_mut().for_each(|p| p.is_default = false);
        }
        self.pilots.push(Pilot {
            id,
            name: name.to_string(),
            is_default,
        });
        debug!("new pilot {id}");
        Ok(id)
    }

    pub fn set_default_pilot(&mut self, id: PilotId) -> Result<()> {
        if self.pilot(id).is_none() {
            return Err(Status::UnknownPilot(id.to_string()).into());
        }
        self.pilots
            .iter_mut()
            .for_each(|p| p.is_default = p.id == id);
        Ok(())
    }

    pub fn add_aircraft(&mut self, name: &str) -> AircraftId {
        let id = AircraftId(self.next_aircraft);
        self.next_aircraft += 1;
        self.aircraft.push(Aircraft {
            id,
            name: name.to_string(),
            notes: None,
        });
        debug!("new aircraft {id} ({name})");
        id
    }

    pub fn add_location(&mut self, name: &str, position: Position) -> LocationId {
        let id = LocationId(self.next_location);
        self.next_location += 1;
        self.locations.push(Location {
            id,
            name: name.to_string(),
            position,
            notes: None,
            is_valid: true,
            invalidation_notes: None,
            altitude_offset: 0.,
        });
        debug!("new location {id} ({name})");
        id
    }

    /// Insert a pack, id is handed out here whatever the caller put in.
    ///
    pub fn add_battery(&mut self, pack: BatteryPack) -> BatteryId {
        let id = BatteryId(self.next_battery);
        self.next_battery += 1;
        self.batteries.push(BatteryPack { id, ..pack });
        id
    }

    /// Insert a flight, id is handed out here whatever the caller put in.
    ///
    pub fn add_flight(&mut self, flight: Flight) -> FlightId {
        let id = FlightId(self.next_flight);
        self.next_flight += 1;
        self.flights.push(Flight { id, ..flight });
        id
    }

    pub fn flight_mut(&mut self, id: FlightId) -> Option<&mut Flight> {
        self.flights.iter_mut().find(|f| f.id == id)
    }

    pub fn location_mut(&mut self, id: LocationId) -> Option<&mut Location> {
        self.locations.iter_mut().find(|l| l.id == id)
    }

    pub fn battery_mut(&mut self, id: BatteryId) -> Option<&mut BatteryPack> {
        self.batteries.iter_mut().find(|b| b.id == id)
    }

    /// Replace the set of packs attached to a flight, keeping the cycle
    /// counters in step: one up for every pack attached, one down for every
    /// pack detached.
    ///
    #[tracing::instrument(skip(self))]
    pub fn set_flight_batteries(&mut self, id: FlightId, packs: &[BatteryId]) -> Result<()> {
        let new: BTreeSet<BatteryId> = packs.iter().copied().collect();
        for b in &new {
            if self.battery(*b).is_none() {
                return Err(Status::UnknownBattery(b.0).into());
            }
        }
        let old: BTreeSet<BatteryId> = match self.flight(id) {
            Some(f) => f.batteries.iter().copied().collect(),
            None => return Err(Status::UnknownFlight(id.0).into()),
        };

        for b in old.difference(&new) {
            if let Some(pack) = self.battery_mut(*b) {
                pack.cycles -= 1;
            }
        }
        for b in new.difference(&old) {
            if let Some(pack) = self.battery_mut(*b) {
                pack.cycles += 1;
            }
        }

        if let Some(f) = self.flight_mut(id) {
            f.batteries = new.into_iter().collect();
        }
        Ok(())
    }

    pub fn set_flight_location(&mut self, id: FlightId, loc: Option<LocationId>) -> Result<()> {
        if let Some(l) = loc {
            if self.location(l).is_none() {
                return Err(Status::UnknownLocation(l.0).into());
            }
        }
        match self.flight_mut(id) {
            Some(f) => {
                f.location = loc;
                Ok(())
            }
            None => Err(Status::UnknownFlight(id.0).into()),
        }
    }

    pub fn set_flight_validity(
        &mut self,
        id: FlightId,
        is_valid: bool,
        notes: Option<String>,
    ) -> Result<()> {
        match self.flight_mut(id) {
            Some(f) => {
                f.is_valid = is_valid;
                f.invalidation_notes = notes;
                Ok(())
            }
            None => Err(Status::UnknownFlight(id.0).into()),
        }
    }

    pub fn set_location_validity(
        &mut self,
        id: LocationId,
        is_valid: bool,
        notes: Option<String>,
    ) -> Result<()> {
        match self.location_mut(id) {
            Some(l) => {
                l.is_valid = is_valid;
                l.invalidation_notes = notes;
                Ok(())
            }
            None => Err(Status::UnknownLocation(id.0).into()),
        }
    }

    pub fn rename_location(&mut self, id: LocationId, name: &str) -> Result<()> {
        match self.location_mut(id) {
            Some(l) => {
                l.name = name.to_string();
                Ok(())
            }
            None => Err(Status::UnknownLocation(id.0).into()),
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn remove_flight(&mut self, id: FlightId) -> Result<Flight> {
        match self.flights.iter().position(|f| f.id == id) {
            Some(n) => Ok(self.flights.remove(n)),
            None => Err(Status::UnknownFlight(id.0).into()),
        }
    }

    /// Delete a location.  Refused while valid flights still point at it,
    /// references from invalid flights are cleared.
    ///
    #[tracing::instrument(skip(self))]
    pub fn remove_location(&mut self, id: LocationId) -> Result<Location> {
        let n = match self.locations.iter().position(|l| l.id == id) {
            Some(n) => n,
            None => return Err(Status::UnknownLocation(id.0).into()),
        };
        let used = self
            .flights
            .iter()
            .filter(|f| f.location == Some(id) && f.is_valid)
            .count();
        if used > 0 {
            return Err(Status::LocationInUse(id.0, used).into());
        }
        self.flights
            .iter_mut()
            .filter(|f| f.location == Some(id))
            .for_each(|f| f.location = None);
        Ok(self.locations.remove(n))
    }

    /// Delete a pack and detach it from every flight.  Cycle counters keep
    /// their value, the history happened.
    ///
    #[tracing::instrument(skip(self))]
    pub fn remove_battery(&mut self, id: BatteryId) -> Result<BatteryPack> {
        let n = match self.batteries.iter().position(|b| b.id == id) {
            Some(n) => n,
            None => return Err(Status::UnknownBattery(id.0).into()),
        };
        self.flights
            .iter_mut()
            .for_each(|f| f.batteries.retain(|b| *b != id));
        Ok(self.batteries.remove(n))
    }
}

// -----

/// The store wraps the dataset with its on-disk snapshot.
///
#[derive(Debug)]
pub struct Store {
    /// Snapshot path
    path: PathBuf,
    data: Dataset,
}

impl Store {
    /// Open a store, creating an empty one when the snapshot does not exist
    /// yet.  Nothing is written until the first sync.
    ///
    #[tracing::instrument]
    pub fn open(path: &Path) -> Result<Self> {
        trace!("store::open({:?})", path);

        let data = if path.exists() {
            let raw = fs::read_to_string(path)?;
            let data: Dataset = serde_json::from_str(&raw)?;

            // Bail out if different
            //
            if data.version != STORE_VERSION {
                return Err(Status::BadFileVersion(data.version).into());
            }
            data
        } else {
            Dataset::default()
        };
        Ok(Store {
            path: path.into(),
            data,
        })
    }

    /// Read access to the current dataset.
    ///
    pub fn data(&self) -> &Dataset {
        &self.data
    }

    /// Where the snapshot lives.
    ///
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension(LOCK_EXT)
    }

    /// Sync the snapshot to disk.
    ///
    #[tracing::instrument(skip(self))]
    pub fn sync(&self) -> Result<()> {
        trace!("store::sync");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&self.data)?;
        Ok(fs::write(&self.path, data)?)
    }

    /// Start a transaction.  Takes the lock file, so a second call (from
    /// this or another process) fails until the first transaction ends.
    ///
    #[tracing::instrument(skip(self))]
    pub fn begin(&mut self) -> Result<Txn<'_>> {
        trace!("store::begin");
        let lock = LockGuard::take(&self.lock_path())?;
        let work = self.data.clone();
        Ok(Txn {
            store: self,
            work,
            _lock: lock,
        })
    }

    /// Dump the whole dataset into `out`, same layout as the snapshot.
    ///
    #[tracing::instrument(skip(self))]
    pub fn backup(&self, out: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(&self.data)?;
        Ok(fs::write(out, data)?)
    }

    /// Replace the whole dataset with an earlier backup and sync.
    ///
    #[tracing::instrument(skip(self))]
    pub fn restore(&mut self, from: &Path) -> Result<()> {
        let raw = fs::read_to_string(from)?;
        let data: Dataset = serde_json::from_str(&raw)?;
        if data.version != STORE_VERSION {
            return Err(Status::BadFileVersion(data.version).into());
        }
        self.data = data;
        self.sync()
    }
}

// -----

/// A transaction over the store.
///
/// Reads see the staged state, writes stay private until `commit()`.
///
pub struct Txn<'a> {
    store: &'a mut Store,
    work: Dataset,
    _lock: LockGuard,
}

impl Txn<'_> {
    pub fn data(&self) -> &Dataset {
        &self.work
    }

    pub fn data_mut(&mut self) -> &mut Dataset {
        &mut self.work
    }

    /// Swap the staged dataset in and sync the snapshot.
    ///
    #[tracing::instrument(skip(self))]
    pub fn commit(self) -> Result<()> {
        trace!("txn::commit");
        let Txn { store, work, _lock } = self;
        store.data = work;
        store.sync()
    }
}

// -----

/// Advisory lock, removed on drop.
///
#[derive(Debug)]
struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    fn take(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(mut f) => {
                write!(f, "{}", std::process::id())?;
                Ok(LockGuard { path: path.into() })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(Status::Locked(path.to_string_lossy().to_string()).into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
