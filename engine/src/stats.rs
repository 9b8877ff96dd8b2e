//! Read-only aggregates over the logbook.
//!
//! Everything here goes through the outlier-filtered duration, not the raw
//! span the import gate uses.
//!

use chrono::NaiveDate;
use eyre::Result;
use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

use crate::metrics::{max_distance, robust_duration};
use crate::store::Dataset;
use crate::{AircraftId, BatteryId, Flight, LocationId, Status};

/// Front page totals.
///
#[derive(Clone, Debug, Serialize)]
pub struct DashboardStats {
    pub total_flights: usize,
    pub total_pilots: usize,
    pub total_aircraft: usize,
    pub total_duration_seconds: f64,
}

/// Per-aircraft flight count at one location.
///
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AircraftFlights {
    pub aircraft: AircraftId,
    pub name: String,
    pub count: usize,
}

/// Figures for one flying site.
///
#[derive(Clone, Debug, Serialize)]
pub struct LocationStats {
    pub total_flights: usize,
    pub total_duration_seconds: f64,
    pub total_distance_meters: f64,
    pub flights_per_aircraft: Vec<AircraftFlights>,
    pub first_flight_date: Option<NaiveDate>,
    pub last_flight_date: Option<NaiveDate>,
}

/// How much one battery pack flew on a given aircraft.
///
#[derive(Clone, Debug, Serialize)]
pub struct BatteryUsage {
    pub battery: BatteryId,
    pub number: String,
    pub name: String,
    pub flight_count: usize,
    pub total_duration_seconds: f64,
}

// -----

/// Whole-logbook totals.  The flight count is valid flights only, the
/// flown time runs over every flight, invalidated ones included.
///
pub fn dashboard(data: &Dataset) -> DashboardStats {
    let total_duration_seconds = data
        .flights
        .iter()
        .map(|f| robust_duration(&f.samples))
        .sum();
    DashboardStats {
        total_flights: data.flights.iter().filter(|f| f.is_valid).count(),
        total_pilots: data.pilots.len(),
        total_aircraft: data.aircraft.len(),
        total_duration_seconds,
    }
}

/// Totals for one location over its valid flights.  First and last dates
/// span every flight recorded there, valid or not.
///
pub fn location_stats(data: &Dataset, id: LocationId) -> Result<LocationStats> {
    if data.location(id).is_none() {
        return Err(Status::UnknownLocation(id.0).into());
    }

    let valid_here: Vec<&Flight> = data
        .flights
        .iter()
        .filter(|f| f.location == Some(id) && f.is_valid)
        .collect();

    let total_duration_seconds = valid_here
        .iter()
        .map(|f| robust_duration(&f.samples))
        .sum();
    let total_distance_meters = valid_here.iter().map(|f| max_distance(&f.samples)).sum();

    let flights_per_aircraft = valid_here
        .iter()
        .map(|f| f.aircraft)
        .counts()
        .into_iter()
        .sorted()
        .map(|(aircraft, count)| AircraftFlights {
            aircraft,
            name: data
                .aircraft(aircraft)
                .map(|a| a.name.clone())
                .unwrap_or_default(),
            count,
        })
        .collect();

    let dates = data
        .flights
        .iter()
        .filter(|f| f.location == Some(id))
        .map(|f| f.date);
    let (first_flight_date, last_flight_date) = match dates.minmax() {
        MinMaxResult::NoElements => (None, None),
        MinMaxResult::OneElement(d) => (Some(d), Some(d)),
        MinMaxResult::MinMax(a, b) => (Some(a), Some(b)),
    };

    Ok(LocationStats {
        total_flights: valid_here.len(),
        total_duration_seconds,
        total_distance_meters,
        flights_per_aircraft,
        first_flight_date,
        last_flight_date,
    })
}

/// Pack usage over the valid flights of one aircraft, packs listed in
/// first-flown order.
///
pub fn battery_usage(data: &Dataset, aircraft: AircraftId) -> Result<Vec<BatteryUsage>> {
    if data.aircraft(aircraft).is_none() {
        return Err(Status::UnknownAircraft(aircraft.to_string()).into());
    }

    let mut usage: Vec<BatteryUsage> = vec![];
    for flight in data
        .flights
        .iter()
        .filter(|f| f.aircraft == aircraft && f.is_valid)
    {
        let duration = robust_duration(&flight.samples);
        for b in &flight.batteries {
            if usage.iter().all(|u| u.battery != *b) {
                let pack = data.battery(*b);
                usage.push(BatteryUsage {
                    battery: *b,
                    number: pack.map(|p| p.number.clone()).unwrap_or_default(),
                    name: pack.map(|p| p.name.clone()).unwrap_or_default(),
                    flight_count: 0,
                    total_duration_seconds: 0.,
                });
            }
            if let Some(u) = usage.iter_mut().find(|u| u.battery == *b) {
                u.flight_count += 1;
                u.total_duration_seconds += duration;
            }
        }
    }
    Ok(usage)
}
