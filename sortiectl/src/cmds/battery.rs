//! The `battery` commands.
//!

use eyre::Result;
use tracing::trace;

use sortie_engine::{BatteryId, BatteryPack, Store};

use crate::{BatteryAddOpts, BatteryRemoveOpts};

#[tracing::instrument(skip(store))]
pub fn battery_add(store: &mut Store, opts: &BatteryAddOpts) -> Result<String> {
    trace!("enter");

    let pack = BatteryPack {
        id: BatteryId(0),
        number: opts.number.clone(),
        name: opts.name.clone(),
        purchase_date: opts.date,
        notes: opts.notes.clone(),
        cycles: 0,
        voltage_level: opts.voltage.clone(),
        capacity_mah: opts.capacity,
    };

    let mut txn = store.begin()?;
    let id = txn.data_mut().add_battery(pack);
    txn.commit()?;
    Ok(format!("Battery pack {} added as #{id}.", opts.number))
}

#[tracing::instrument(skip(store))]
pub fn battery_remove(store: &mut Store, opts: &BatteryRemoveOpts) -> Result<String> {
    trace!("enter");

    let mut txn = store.begin()?;
    let pack = txn.data_mut().remove_battery(BatteryId(opts.battery))?;
    txn.commit()?;
    Ok(format!("Battery pack {} removed.", pack.number))
}
