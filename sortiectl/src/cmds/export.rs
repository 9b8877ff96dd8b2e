//! The `export` command, one flight track to GPX or KML.
//!

use std::fs::File;
use std::io::{self, BufWriter, Write};

use eyre::Result;
use tracing::trace;

use sortie_engine::{to_gpx, to_kml, Dataset, Flight, FlightId, Status};

use crate::{ExportFormat, ExportOpts};

/// Write the track to `-o` or stdout.
///
#[tracing::instrument(skip(data))]
pub fn export_flight(data: &Dataset, opts: &ExportOpts) -> Result<()> {
    trace!("enter");

    let flight = data
        .flight(FlightId(opts.flight))
        .ok_or(Status::UnknownFlight(opts.flight))?;

    match &opts.output {
        Some(path) => {
            let out = BufWriter::new(File::create(path)?);
            write_track(flight, opts.format, out)?;
            println!("Track of flight #{} written to {:?}.", opts.flight, path);
        }
        None => write_track(flight, opts.format, io::stdout().lock())?,
    }
    Ok(())
}

fn write_track<W: Write>(flight: &Flight, format: ExportFormat, out: W) -> Result<()> {
    match format {
        ExportFormat::Gpx => to_gpx(flight, out),
        ExportFormat::Kml => to_kml(flight, out),
    }
}
