//! The `location` commands.
//!

use eyre::Result;
use tracing::trace;

use sortie_engine::{LocationId, Store};

use crate::LocationSubCommand;

/// Every sub-command is one mutation inside one transaction.
///
#[tracing::instrument(skip(store))]
pub fn handle_location(store: &mut Store, subcmd: &LocationSubCommand) -> Result<String> {
    trace!("enter");

    let mut txn = store.begin()?;
    let msg = match subcmd {
        LocationSubCommand::Delete(o) => {
            let loc = txn.data_mut().remove_location(LocationId(o.location))?;
            format!("Location #{} ({}) removed.", o.location, loc.name)
        }
        LocationSubCommand::Invalidate(o) => {
            txn.data_mut()
                .set_location_validity(LocationId(o.location), false, o.notes.clone())?;
            format!("Location #{} invalidated.", o.location)
        }
        LocationSubCommand::Rename(o) => {
            txn.data_mut()
                .rename_location(LocationId(o.location), &o.name)?;
            format!("Location #{} renamed to {}.", o.location, o.name)
        }
        LocationSubCommand::Revalidate(o) => {
            txn.data_mut()
                .set_location_validity(LocationId(o.location), true, None)?;
            format!("Location #{} valid again.", o.location)
        }
    };
    txn.commit()?;
    Ok(msg)
}
