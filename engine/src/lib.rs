//! Library implementing the logbook store and the import pipeline.
//!
//! The `Store` holds the whole logbook (pilots, aircraft, locations, battery
//! packs, flights) in memory and persists it as a JSON snapshot.  Batches of
//! log files go through `import`, which feeds the CSV dialects from
//! `sortie-formats` into `Flight` records inside a single transaction:
//! either the whole batch lands or none of it does.
//!

// Re-export for convenience
//
pub use error::*;
pub use export::*;
pub use import::*;
pub use metrics::*;
pub use records::*;
pub use stats::*;
pub use store::*;

mod error;
mod export;
mod import;
mod metrics;
mod records;
mod stats;
mod store;

pub fn version() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
