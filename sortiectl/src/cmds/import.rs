//! The `import` command, driving the engine's batch and single-file imports.
//!

use eyre::Result;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::trace;

use sortie_engine::{import_directory, import_file, ImportStatus, Status, Store};

use crate::{ConfigFile, ImportOpts};

/// Run one import, a directory batch unless a single file was given, and
/// render the per-file report.
///
/// The pilot comes from `-P`, else the configuration file, else whoever is
/// the default pilot in the logbook.
///
#[tracing::instrument(skip(store, cfg))]
pub fn run_import(store: &mut Store, cfg: &ConfigFile, opts: &ImportOpts) -> Result<String> {
    trace!("enter");

    let pilot = match (&opts.pilot, &cfg.pilot) {
        (Some(p), _) => p.clone(),
        (None, Some(p)) => p.clone(),
        (None, None) => store
            .data()
            .default_pilot()
            .map(|p| p.name.clone())
            .ok_or(Status::NoDefaultPilot)?,
    };
    let dir = opts.directory.clone().unwrap_or_else(|| cfg.import_path());

    let reports = match &opts.file {
        Some(file) => vec![import_file(store, &pilot, file, &dir)?],
        None => import_directory(store, &pilot, &dir)?,
    };

    let header = vec!["File", "Status", "Flight", "Reason"];

    let mut builder = Builder::default();
    builder.push_record(header);

    for r in &reports {
        let row = vec![
            r.filename.clone(),
            r.status.to_string(),
            r.flight.map(|f| f.to_string()).unwrap_or_default(),
            r.reason.clone().unwrap_or_default(),
        ];
        builder.push_record(row);
    }
    let table = builder.build().with(Style::modern()).to_string();

    let done = reports
        .iter()
        .filter(|r| r.status == ImportStatus::Processed)
        .count();
    let skipped = reports.len() - done;
    Ok(format!(
        "Imported {done} files, skipped {skipped}:\n{table}"
    ))
}
