//! The `list` family, one table per record family.
//!

use eyre::Result;
use tabled::builder::Builder;
use tabled::settings::Style;

use sortie_engine::{robust_duration, Dataset, Flight, LocationId, Status};

use crate::cmds::fmt_duration;
use crate::ListFlightsOpts;

/// List all pilots, the default one marked with a star.
///
pub fn list_pilots(data: &Dataset) -> Result<String> {
    let header = vec!["Id", "Name", "Default"];

    let mut builder = Builder::default();
    builder.push_record(header);

    data.pilots.iter().for_each(|p| {
        let def = if p.is_default { "*" } else { "" };
        builder.push_record(vec![p.id.to_string(), p.name.clone(), def.to_string()]);
    });
    let table = builder.build().with(Style::modern()).to_string();
    Ok(format!("Pilots:\n{table}"))
}

/// List all aircraft with how many flights each one has logged.
///
pub fn list_aircraft(data: &Dataset) -> Result<String> {
    let header = vec!["Id", "Name", "Flights", "Notes"];

    let mut builder = Builder::default();
    builder.push_record(header);

    data.aircraft.iter().for_each(|a| {
        let count = data.flights.iter().filter(|f| f.aircraft == a.id).count();
        builder.push_record(vec![
            a.id.to_string(),
            a.name.clone(),
            count.to_string(),
            a.notes.clone().unwrap_or_default(),
        ]);
    });
    let table = builder.build().with(Style::modern()).to_string();
    Ok(format!("Aircraft:\n{table}"))
}

/// List all flying sites with their valid flight counts.
///
pub fn list_locations(data: &Dataset) -> Result<String> {
    let header = vec!["Id", "Name", "Position", "Valid", "Flights"];

    let mut builder = Builder::default();
    builder.push_record(header);

    data.locations.iter().for_each(|l| {
        let count = data
            .flights
            .iter()
            .filter(|f| f.location == Some(l.id) && f.is_valid)
            .count();
        let valid = if l.is_valid { "" } else { "no" };
        builder.push_record(vec![
            l.id.to_string(),
            l.name.clone(),
            l.position.to_string(),
            valid.to_string(),
            count.to_string(),
        ]);
    });
    let table = builder.build().with(Style::modern()).to_string();
    Ok(format!("Locations:\n{table}"))
}

/// List all battery packs with their cycle counters.
///
pub fn list_batteries(data: &Dataset) -> Result<String> {
    let header = vec!["Id", "Number", "Name", "Cells", "mAh", "Cycles"];

    let mut builder = Builder::default();
    builder.push_record(header);

    data.batteries.iter().for_each(|b| {
        builder.push_record(vec![
            b.id.to_string(),
            b.number.clone(),
            b.name.clone(),
            b.voltage_level.clone().unwrap_or_default(),
            b.capacity_mah.map(|c| c.to_string()).unwrap_or_default(),
            b.cycles.to_string(),
        ]);
    });
    let table = builder.build().with(Style::modern()).to_string();
    Ok(format!("Battery packs:\n{table}"))
}

/// List flights, newest first.  Invalidated ones only show up with `--all`.
///
pub fn list_flights(data: &Dataset, opts: &ListFlightsOpts) -> Result<String> {
    let aircraft = match &opts.aircraft {
        Some(name) => Some(
            data.aircraft_by_name(name)
                .ok_or_else(|| Status::UnknownAircraft(name.clone()))?
                .id,
        ),
        None => None,
    };
    let location = opts.location.map(LocationId);

    let mut flights: Vec<&Flight> = data
        .flights
        .iter()
        .filter(|f| opts.all || f.is_valid)
        .filter(|f| aircraft.map_or(true, |a| f.aircraft == a))
        .filter(|f| location.map_or(true, |l| f.location == Some(l)))
        .filter(|f| opts.begin.map_or(true, |d| f.date >= d))
        .filter(|f| opts.end.map_or(true, |d| f.date <= d))
        .collect();
    flights.sort_by(|a, b| b.date.cmp(&a.date));

    let header = vec!["Id", "Date", "Pilot", "Aircraft", "Location", "Duration", "Valid"];

    let mut builder = Builder::default();
    builder.push_record(header);

    flights.iter().for_each(|f| {
        let pilot = data
            .pilot(f.pilot)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        let aircraft = data
            .aircraft(f.aircraft)
            .map(|a| a.name.clone())
            .unwrap_or_default();
        let location = f
            .location
            .and_then(|id| data.location(id))
            .map(|l| l.name.clone())
            .unwrap_or_default();
        let valid = if f.is_valid { "" } else { "no" };
        builder.push_record(vec![
            f.id.to_string(),
            f.date.to_string(),
            pilot,
            aircraft,
            location,
            fmt_duration(robust_duration(&f.samples)),
            valid.to_string(),
        ]);
    });
    let table = builder.build().with(Style::modern()).to_string();
    Ok(format!("{} flights:\n{table}", flights.len()))
}
