//! Engine-level error states, everything else goes through `eyre`.
//!

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Status {
    #[error("Bad store file version {0}")]
    BadFileVersion(usize),
    #[error("Lock file {0} exists, another import is running")]
    Locked(String),
    #[error("Pilot {0} already exists")]
    PilotExists(String),
    #[error("Unknown pilot {0}")]
    UnknownPilot(String),
    #[error("No default pilot configured")]
    NoDefaultPilot,
    #[error("Unknown aircraft {0}")]
    UnknownAircraft(String),
    #[error("Unknown location {0}")]
    UnknownLocation(u32),
    #[error("Unknown battery pack {0}")]
    UnknownBattery(u32),
    #[error("Unknown flight {0}")]
    UnknownFlight(u32),
    #[error("Location {0} still has {1} valid flights, reassign or delete them first")]
    LocationInUse(u32, usize),
    #[error("Directory {0} not found")]
    NoImportDir(String),
    #[error("Failed to process {0}: {1}")]
    ImportFailed(String, String),
}
