//! The `stats` family, rendering the engine aggregates.
//!

use std::fmt::Write;

use eyre::Result;
use tabled::builder::Builder;
use tabled::settings::Style;

use sortie_engine::{battery_usage, dashboard, location_stats, Dataset, LocationId, Status};

use crate::cmds::fmt_duration;
use crate::{BatteryStatsOpts, LocationStatsOpts};

/// Whole-logbook totals.
///
pub fn show_dashboard(data: &Dataset) -> Result<String> {
    let stats = dashboard(data);

    let header = vec!["Flights", "Pilots", "Aircraft", "Total time"];

    let mut builder = Builder::default();
    builder.push_record(header);
    builder.push_record(vec![
        stats.total_flights.to_string(),
        stats.total_pilots.to_string(),
        stats.total_aircraft.to_string(),
        fmt_duration(stats.total_duration_seconds),
    ]);
    let table = builder.build().with(Style::modern()).to_string();
    Ok(format!("Logbook:\n{table}"))
}

/// One flying site in detail.
///
pub fn show_location(data: &Dataset, opts: &LocationStatsOpts) -> Result<String> {
    let id = LocationId(opts.location);
    let loc = data
        .location(id)
        .ok_or(Status::UnknownLocation(opts.location))?;
    let stats = location_stats(data, id)?;

    let mut out = String::new();
    writeln!(out, "Location #{}: {}", loc.id, loc.name)?;
    writeln!(out, "Position:     {}", loc.position)?;
    writeln!(out, "Flights:      {}", stats.total_flights)?;
    writeln!(
        out,
        "Total time:   {}",
        fmt_duration(stats.total_duration_seconds)
    )?;
    writeln!(out, "Farthest sum: {:.0} m", stats.total_distance_meters)?;
    if let (Some(first), Some(last)) = (stats.first_flight_date, stats.last_flight_date) {
        writeln!(out, "Active:       {first} to {last}")?;
    }

    if !stats.flights_per_aircraft.is_empty() {
        let header = vec!["Aircraft", "Flights"];

        let mut builder = Builder::default();
        builder.push_record(header);
        stats.flights_per_aircraft.iter().for_each(|a| {
            builder.push_record(vec![a.name.clone(), a.count.to_string()]);
        });
        let table = builder.build().with(Style::modern()).to_string();
        writeln!(out, "{table}")?;
    }
    Ok(out)
}

/// Battery usage on one aircraft, one row per pack ever flown on it.
///
pub fn show_batteries(data: &Dataset, opts: &BatteryStatsOpts) -> Result<String> {
    let aircraft = data
        .aircraft_by_name(&opts.aircraft)
        .ok_or_else(|| Status::UnknownAircraft(opts.aircraft.clone()))?;
    let usage = battery_usage(data, aircraft.id)?;

    let header = vec!["Id", "Number", "Name", "Flights", "Total time"];

    let mut builder = Builder::default();
    builder.push_record(header);

    usage.iter().for_each(|u| {
        builder.push_record(vec![
            u.battery.to_string(),
            u.number.clone(),
            u.name.clone(),
            u.flight_count.to_string(),
            fmt_duration(u.total_duration_seconds),
        ]);
    });
    let table = builder.build().with(Style::modern()).to_string();
    Ok(format!("Battery usage on {}:\n{table}", aircraft.name))
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{NaiveDate, TimeZone, Utc};

    use sortie_common::Position;
    use sortie_engine::Flight;
    use sortie_formats::Sample;

    fn sample(secs: i64) -> Sample {
        Sample {
            time: Utc.timestamp_opt(1_718_000_000 + secs, 0).unwrap(),
            latitude: None,
            longitude: None,
            altitude: None,
            speed: None,
            rx_battery: None,
            rssi: None,
            link_quality: None,
            distance_from_start: None,
        }
    }

    fn logbook() -> Dataset {
        let mut data = Dataset::default();
        let pilot = data.add_pilot("marcel", true).unwrap();
        let aircraft = data.add_aircraft("Avata");
        let field = data.add_location("The field", Position::new(48.0, 2.0));
        data.add_flight(Flight {
            id: Default::default(),
            pilot,
            aircraft,
            location: Some(field),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            log_path: None,
            notes: None,
            is_valid: true,
            invalidation_notes: None,
            batteries: vec![],
            samples: vec![sample(0), sample(90)],
        });
        data
    }

    #[test]
    fn test_show_dashboard() {
        let data = logbook();
        let out = show_dashboard(&data).unwrap();
        assert!(out.contains("00:01:30"));
    }

    #[test]
    fn test_show_location() {
        let data = logbook();
        let out = show_location(&data, &LocationStatsOpts { location: 1 }).unwrap();
        assert!(out.contains("The field"));
        assert!(out.contains("Avata"));
        assert!(out.contains("2024-06-01 to 2024-06-01"));
    }

    #[test]
    fn test_show_location_unknown() {
        let data = logbook();
        assert!(show_location(&data, &LocationStatsOpts { location: 9 }).is_err());
    }

    #[test]
    fn test_show_batteries_unknown_aircraft() {
        let data = logbook();
        let opts = BatteryStatsOpts {
            aircraft: "Mavic".to_string(),
        };
        assert!(show_batteries(&data, &opts).is_err());
    }
}
