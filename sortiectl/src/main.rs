//! CLI driver for the sortie logbook.
//!

use std::io;

use clap::{crate_authors, crate_description, crate_version, CommandFactory, Parser};
use clap_complete::generate;
use eyre::Result;
use tracing::trace;

use sortie_common::init_logging;
use sortie_engine::Store;
use sortie_formats::LogFormat;
use sortiectl::{
    battery_add, battery_remove, export_flight, handle_flight, handle_location, list_aircraft,
    list_batteries, list_flights, list_locations, list_pilots, pilot_add, pilot_default,
    run_import, show_batteries, show_dashboard, show_flight, show_location, BatterySubCommand,
    ConfigFile, ListSubCommand, Opts, PilotSubCommand, StatsSubCommand, SubCommand,
};

/// Binary name, using a different binary name
pub const NAME: &str = env!("CARGO_BIN_NAME");
/// Binary version
pub const VERSION: &str = crate_version!();
/// Authors
pub const AUTHORS: &str = crate_authors!();

fn main() -> Result<()> {
    let opts = Opts::parse();

    // Initialise logging early
    //
    init_logging(NAME, opts.debug, None)?;

    // Shell completion and version dumps need no configuration nor store.
    //
    match &opts.subcmd {
        SubCommand::Completion(copts) => {
            let generator = copts.shell;
            generate(generator, &mut Opts::command(), NAME, &mut io::stdout());
            return Ok(());
        }
        SubCommand::Version => {
            eprintln!("{}", version());
            eprintln!("Modules:");
            eprintln!("\t{}", sortie_common::version());
            eprintln!("\t{}", sortie_formats::version());
            eprintln!("\t{}", sortie_engine::version());
            return Ok(());
        }
        _ => (),
    }

    // Banner
    //
    banner();

    let cfg = ConfigFile::load(opts.config.clone())?;
    let mut store = Store::open(&cfg.store_path())?;

    handle_subcmd(&mut store, &cfg, &opts.subcmd)
}

pub fn handle_subcmd(store: &mut Store, cfg: &ConfigFile, subcmd: &SubCommand) -> Result<()> {
    match subcmd {
        SubCommand::Backup(bopts) => {
            trace!("backup");

            store.backup(&bopts.file)?;
            println!("Logbook written to {:?}.", bopts.file);
        }

        SubCommand::Battery(bopts) => {
            trace!("battery");

            let str = match &bopts.subcmd {
                BatterySubCommand::Add(aopts) => battery_add(store, aopts)?,
                BatterySubCommand::Remove(ropts) => battery_remove(store, ropts)?,
            };
            println!("{str}");
        }

        SubCommand::Export(eopts) => {
            trace!("export");

            export_flight(store.data(), eopts)?;
        }

        SubCommand::Flight(fopts) => {
            trace!("flight");

            let str = handle_flight(store, &fopts.subcmd)?;
            println!("{str}");
        }

        SubCommand::Import(iopts) => {
            trace!("import");

            let str = run_import(store, cfg, iopts)?;
            println!("{str}");
        }

        SubCommand::List(lopts) => {
            trace!("list");

            let str = match &lopts.subcmd {
                ListSubCommand::Aircraft => list_aircraft(store.data())?,
                ListSubCommand::Batteries => list_batteries(store.data())?,
                ListSubCommand::Flights(fopts) => list_flights(store.data(), fopts)?,
                ListSubCommand::Formats => LogFormat::list()?,
                ListSubCommand::Locations => list_locations(store.data())?,
                ListSubCommand::Pilots => list_pilots(store.data())?,
            };
            println!("{str}");
        }

        SubCommand::Location(lopts) => {
            trace!("location");

            let str = handle_location(store, &lopts.subcmd)?;
            println!("{str}");
        }

        SubCommand::Pilot(popts) => {
            trace!("pilot");

            let str = match &popts.subcmd {
                PilotSubCommand::Add(aopts) => pilot_add(store, aopts)?,
                PilotSubCommand::Default(dopts) => pilot_default(store, dopts)?,
            };
            println!("{str}");
        }

        SubCommand::Restore(ropts) => {
            trace!("restore");

            store.restore(&ropts.file)?;
            println!("Logbook restored from {:?}.", ropts.file);
        }

        SubCommand::Show(sopts) => {
            trace!("show");

            let str = show_flight(store.data(), sopts)?;
            println!("{str}");
        }

        SubCommand::Stats(sopts) => {
            trace!("stats");

            let str = match &sopts.subcmd {
                StatsSubCommand::Dashboard => show_dashboard(store.data())?,
                StatsSubCommand::Location(lopts) => show_location(store.data(), lopts)?,
                StatsSubCommand::Batteries(bopts) => show_batteries(store.data(), bopts)?,
            };
            println!("{str}");
        }

        // Handled before the store is opened.
        //
        SubCommand::Completion(_) | SubCommand::Version => (),
    }
    Ok(())
}

/// Return our version number
///
#[inline]
pub fn version() -> String {
    format!("{}/{}", NAME, VERSION)
}

/// Display banner
///
fn banner() {
    eprintln!(
        r##"
{}/{} by {}
{}
"##,
        NAME,
        VERSION,
        AUTHORS,
        crate_description!()
    )
}
