//! The `pilot` commands.
//!

use eyre::Result;
use tracing::trace;

use sortie_engine::{Status, Store};

use crate::{PilotAddOpts, PilotDefaultOpts};

#[tracing::instrument(skip(store))]
pub fn pilot_add(store: &mut Store, opts: &PilotAddOpts) -> Result<String> {
    trace!("enter");

    let mut txn = store.begin()?;
    let id = txn.data_mut().add_pilot(&opts.name, opts.default)?;
    txn.commit()?;
    Ok(format!("Pilot {} added as #{id}.", opts.name))
}

#[tracing::instrument(skip(store))]
pub fn pilot_default(store: &mut Store, opts: &PilotDefaultOpts) -> Result<String> {
    trace!("enter");

    let mut txn = store.begin()?;
    let id = txn
        .data()
        .find_pilot(&opts.pilot)
        .map(|p| p.id)
        .ok_or_else(|| Status::UnknownPilot(opts.pilot.clone()))?;
    txn.data_mut().set_default_pilot(id)?;
    txn.commit()?;
    Ok(format!("Pilot #{id} is now the default."))
}
