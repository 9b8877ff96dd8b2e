//! All the command implementations, one module per record family.
//!

pub use battery::*;
pub use export::*;
pub use flight::*;
pub use import::*;
pub use list::*;
pub use location::*;
pub use pilot::*;
pub use show::*;
pub use stats::*;

mod battery;
mod export;
mod flight;
mod import;
mod list;
mod location;
mod pilot;
mod show;
mod stats;

/// Render a duration in seconds as `HH:MM:SS` for the tables.
///
pub(crate) fn fmt_duration(secs: f64) -> String {
    let secs = secs.round() as u64;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
