//! The `flight` commands, small record surgery on single flights.
//!

use eyre::Result;
use tracing::trace;

use sortie_engine::{BatteryId, FlightId, LocationId, Store};

use crate::FlightSubCommand;

/// Every sub-command is one mutation inside one transaction.
///
#[tracing::instrument(skip(store))]
pub fn handle_flight(store: &mut Store, subcmd: &FlightSubCommand) -> Result<String> {
    trace!("enter");

    let mut txn = store.begin()?;
    let msg = match subcmd {
        FlightSubCommand::Batteries(o) => {
            let packs: Vec<BatteryId> = o.batteries.iter().map(|id| BatteryId(*id)).collect();
            txn.data_mut()
                .set_flight_batteries(FlightId(o.flight), &packs)?;
            format!("Flight #{} now uses {} pack(s).", o.flight, packs.len())
        }
        FlightSubCommand::Delete(o) => {
            let flight = txn.data_mut().remove_flight(FlightId(o.flight))?;
            format!(
                "Flight #{} and its {} samples removed.",
                o.flight,
                flight.samples.len()
            )
        }
        FlightSubCommand::Invalidate(o) => {
            txn.data_mut()
                .set_flight_validity(FlightId(o.flight), false, o.notes.clone())?;
            format!("Flight #{} invalidated.", o.flight)
        }
        FlightSubCommand::Location(o) => {
            let loc = if o.clear {
                None
            } else {
                o.location.map(LocationId)
            };
            txn.data_mut().set_flight_location(FlightId(o.flight), loc)?;
            match loc {
                Some(l) => format!("Flight #{} moved to location #{l}.", o.flight),
                None => format!("Flight #{} left without a location.", o.flight),
            }
        }
        FlightSubCommand::Revalidate(o) => {
            txn.data_mut()
                .set_flight_validity(FlightId(o.flight), true, None)?;
            format!("Flight #{} valid again.", o.flight)
        }
    };
    txn.commit()?;
    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use tempfile::tempdir;

    use sortie_engine::Flight;

    use crate::{FlightBatteriesOpts, FlightIdOpts, FlightInvalidateOpts};

    fn seeded_store(dir: &std::path::Path) -> Store {
        let mut store = Store::open(&dir.join("sortie.json")).unwrap();
        let mut txn = store.begin().unwrap();
        let data = txn.data_mut();
        let pilot = data.add_pilot("marcel", true).unwrap();
        let aircraft = data.add_aircraft("Avata");
        data.add_flight(Flight {
            id: Default::default(),
            pilot,
            aircraft,
            location: None,
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            log_path: None,
            notes: None,
            is_valid: true,
            invalidation_notes: None,
            batteries: vec![],
            samples: vec![],
        });
        txn.commit().unwrap();
        store
    }

    #[test]
    fn test_flight_validity_cycle() {
        let dir = tempdir().unwrap();
        let mut store = seeded_store(dir.path());

        let cmd = FlightSubCommand::Invalidate(FlightInvalidateOpts {
            notes: Some("crashed on the bench".to_string()),
            flight: 1,
        });
        assert!(handle_flight(&mut store, &cmd).is_ok());
        assert!(!store.data().flight(FlightId(1)).unwrap().is_valid);

        let cmd = FlightSubCommand::Revalidate(FlightIdOpts { flight: 1 });
        assert!(handle_flight(&mut store, &cmd).is_ok());
        assert!(store.data().flight(FlightId(1)).unwrap().is_valid);
    }

    #[test]
    fn test_flight_batteries_unknown_pack() {
        let dir = tempdir().unwrap();
        let mut store = seeded_store(dir.path());

        let cmd = FlightSubCommand::Batteries(FlightBatteriesOpts {
            flight: 1,
            batteries: vec![42],
        });
        assert!(handle_flight(&mut store, &cmd).is_err());
    }

    #[test]
    fn test_flight_delete() {
        let dir = tempdir().unwrap();
        let mut store = seeded_store(dir.path());

        let cmd = FlightSubCommand::Delete(FlightIdOpts { flight: 1 });
        assert!(handle_flight(&mut store, &cmd).is_ok());
        assert!(store.data().flights.is_empty());
    }
}
