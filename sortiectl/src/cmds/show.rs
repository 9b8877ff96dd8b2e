//! The `show` command, one flight in full.
//!

use std::fmt::Write;

use eyre::Result;

use sortie_engine::{max_distance, robust_duration, Dataset, FlightId, Status};

use crate::cmds::fmt_duration;
use crate::ShowOpts;

/// Everything we know about one flight.
///
pub fn show_flight(data: &Dataset, opts: &ShowOpts) -> Result<String> {
    let flight = data
        .flight(FlightId(opts.flight))
        .ok_or(Status::UnknownFlight(opts.flight))?;

    let pilot = data
        .pilot(flight.pilot)
        .map(|p| p.name.clone())
        .unwrap_or_default();
    let aircraft = data
        .aircraft(flight.aircraft)
        .map(|a| a.name.clone())
        .unwrap_or_default();
    let location = flight
        .location
        .and_then(|id| data.location(id))
        .map(|l| format!("{} (#{})", l.name, l.id))
        .unwrap_or_else(|| "none".to_string());

    let mut out = String::new();
    writeln!(out, "Flight #{}", flight.id)?;
    writeln!(out, "Date:         {}", flight.date)?;
    writeln!(out, "Pilot:        {pilot}")?;
    writeln!(out, "Aircraft:     {aircraft}")?;
    writeln!(out, "Location:     {location}")?;
    writeln!(
        out,
        "Duration:     {}",
        fmt_duration(robust_duration(&flight.samples))
    )?;
    writeln!(out, "Max distance: {:.0} m", max_distance(&flight.samples))?;
    writeln!(out, "Samples:      {}", flight.samples.len())?;
    if let Some(path) = &flight.log_path {
        writeln!(out, "Log file:     {}", path.display())?;
    }
    if !flight.batteries.is_empty() {
        let packs = flight
            .batteries
            .iter()
            .map(|b| {
                data.battery(*b)
                    .map(|p| format!("{} ({})", p.number, p.name))
                    .unwrap_or_else(|| b.to_string())
            })
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(out, "Batteries:    {packs}")?;
    }
    if let Some(notes) = &flight.notes {
        writeln!(out, "Notes:        {notes}")?;
    }
    if !flight.is_valid {
        let why = flight
            .invalidation_notes
            .clone()
            .unwrap_or_else(|| "no reason given".to_string());
        writeln!(out, "INVALIDATED:  {why}")?;
    }
    Ok(out)
}
