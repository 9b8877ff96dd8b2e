//! Module describing all possible commands and sub-commands to the `sortiectl` main driver.
//!
//! The main commands are:
//!
//! - `import` to feed log files into the logbook, one directory batch or one file at a time.
//! - `list` to enumerate what the logbook knows about (flights, sites, aircraft, packs, etc.).
//! - `show` and `stats` for single-flight detail and aggregates.
//! - `pilot`, `battery`, `flight` and `location` to manage the corresponding records.
//! - `export` to turn one flight into a GPX or KML track.
//! - `backup`/`restore` for whole-logbook JSON dumps.
//!
//! `completion` is here just to configure the various shells completion system.
//!

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{crate_authors, crate_description, crate_name, crate_version, Parser, ValueEnum};
use clap_complete::shells::Shell;

/// CLI options
#[derive(Parser)]
#[command(disable_version_flag = true)]
#[clap(name = crate_name!(), about = crate_description!())]
#[clap(version = crate_version!(), author = crate_authors!())]
pub struct Opts {
    /// configuration file.
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// debug mode (hierarchical logging).
    #[clap(short = 'D', long = "debug")]
    pub debug: bool,
    /// Sub-commands (see below).
    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

// ------

/// All sub-commands:
///
/// `backup FILE` / `restore FILE`
/// `battery (add|remove) OPTS`
/// `completion SHELL`
/// `export [-F format] [-o FILE] flight`
/// `flight (batteries|delete|invalidate|location|revalidate) OPTS`
/// `import [-P pilot] [-d DIR] [file]`
/// `list (aircraft|batteries|flights|formats|locations|pilots)`
/// `location (delete|invalidate|rename|revalidate) OPTS`
/// `pilot (add|default) OPTS`
/// `show flight`
/// `stats (dashboard|location|batteries) OPTS`
///
#[derive(Debug, Parser)]
pub enum SubCommand {
    /// Dump the whole logbook into a JSON file
    Backup(BackupOpts),
    /// Manage battery packs
    Battery(BatteryOpts),
    /// Generate Completion stuff
    Completion(ComplOpts),
    /// Export one flight track as GPX or KML
    Export(ExportOpts),
    /// Manage single flights
    Flight(FlightOpts),
    /// Import log files into the logbook
    Import(ImportOpts),
    /// List logbook records
    List(ListOpts),
    /// Manage flying sites
    Location(LocationOpts),
    /// Manage pilots
    Pilot(PilotOpts),
    /// Replace the logbook from a JSON dump
    Restore(RestoreOpts),
    /// Everything about one flight
    Show(ShowOpts),
    /// Aggregate statistics
    Stats(StatsOpts),
    /// List all package versions
    Version,
}

// ------

/// Options for importing log files, either the configured directory, another
/// directory or a single file.
///
#[derive(Debug, Parser)]
pub struct ImportOpts {
    /// Pilot (name or id) the new flights are filed under (optional)
    #[clap(short = 'P', long)]
    pub pilot: Option<String>,
    /// Directory to scan instead of the configured one (optional)
    #[clap(short = 'd', long)]
    pub directory: Option<PathBuf>,
    /// Single file to import instead of a whole directory
    pub file: Option<PathBuf>,
}

// ------

/// This contain only the `list` sub-commands.
///
#[derive(Debug, Parser)]
pub struct ListOpts {
    /// Sub-commands
    #[clap(subcommand)]
    pub subcmd: ListSubCommand,
}

/// All `list` sub-commands:
///
/// `list flights [-a NAME] [-l ID] [-B date] [-E date] [--all]`
/// everything else takes no options.
///
#[derive(Debug, Parser)]
pub enum ListSubCommand {
    /// All aircraft with their flight counts
    Aircraft,
    /// All battery packs
    Batteries,
    /// Flights, newest first
    Flights(ListFlightsOpts),
    /// All supported log file formats
    Formats,
    /// All flying sites
    Locations,
    /// All pilots
    Pilots,
}

#[derive(Debug, Parser)]
pub struct ListFlightsOpts {
    /// Only flights on this aircraft (name)
    #[clap(short = 'a', long)]
    pub aircraft: Option<String>,
    /// Only flights at this location (id)
    #[clap(short = 'l', long)]
    pub location: Option<u32>,
    /// Start the list at specified date (optional)
    #[clap(short = 'B', long)]
    pub begin: Option<NaiveDate>,
    /// End date (optional)
    #[clap(short = 'E', long)]
    pub end: Option<NaiveDate>,
    /// Include invalidated flights
    #[clap(long)]
    pub all: bool,
}

// ------

/// Options for the single flight display.
///
#[derive(Debug, Parser)]
pub struct ShowOpts {
    /// Flight id
    pub flight: u32,
}

// ------

/// This contain only the `stats` sub-commands.
///
#[derive(Debug, Parser)]
pub struct StatsOpts {
    /// Sub-commands
    #[clap(subcommand)]
    pub subcmd: StatsSubCommand,
}

/// All `stats` sub-commands:
///
/// `stats dashboard`
/// `stats location ID`
/// `stats batteries AIRCRAFT`
///
#[derive(Debug, Parser)]
pub enum StatsSubCommand {
    /// Whole logbook totals
    Dashboard,
    /// One flying site in detail
    Location(LocationStatsOpts),
    /// Battery usage on one aircraft
    Batteries(BatteryStatsOpts),
}

#[derive(Debug, Parser)]
pub struct LocationStatsOpts {
    /// Location id
    pub location: u32,
}

#[derive(Debug, Parser)]
pub struct BatteryStatsOpts {
    /// Aircraft name
    pub aircraft: String,
}

// ------

/// This contain only the `pilot` sub-commands.
///
#[derive(Debug, Parser)]
pub struct PilotOpts {
    /// Sub-commands
    #[clap(subcommand)]
    pub subcmd: PilotSubCommand,
}

#[derive(Debug, Parser)]
pub enum PilotSubCommand {
    /// Register a new pilot
    Add(PilotAddOpts),
    /// Make an existing pilot the default one
    Default(PilotDefaultOpts),
}

#[derive(Debug, Parser)]
pub struct PilotAddOpts {
    /// Make this pilot the default one
    #[clap(long)]
    pub default: bool,
    /// Pilot name
    pub name: String,
}

#[derive(Debug, Parser)]
pub struct PilotDefaultOpts {
    /// Pilot name or id
    pub pilot: String,
}

// ------

/// This contain only the `battery` sub-commands.
///
#[derive(Debug, Parser)]
pub struct BatteryOpts {
    /// Sub-commands
    #[clap(subcommand)]
    pub subcmd: BatterySubCommand,
}

#[derive(Debug, Parser)]
pub enum BatterySubCommand {
    /// Register a new pack
    Add(BatteryAddOpts),
    /// Remove a pack, detaching it from every flight
    Remove(BatteryRemoveOpts),
}

#[derive(Debug, Parser)]
pub struct BatteryAddOpts {
    /// Purchase date (YYYY-MM-DD)
    #[clap(long)]
    pub date: Option<NaiveDate>,
    /// Cell arrangement, e.g. 4S
    #[clap(long)]
    pub voltage: Option<String>,
    /// Capacity in mAh
    #[clap(long)]
    pub capacity: Option<u32>,
    /// Free text
    #[clap(long)]
    pub notes: Option<String>,
    /// Short identifier written on the pack
    pub number: String,
    /// Pack name or model
    pub name: String,
}

#[derive(Debug, Parser)]
pub struct BatteryRemoveOpts {
    /// Battery id
    pub battery: u32,
}

// ------

/// This contain only the `flight` sub-commands.
///
#[derive(Debug, Parser)]
pub struct FlightOpts {
    /// Sub-commands
    #[clap(subcommand)]
    pub subcmd: FlightSubCommand,
}

#[derive(Debug, Parser)]
pub enum FlightSubCommand {
    /// Replace the set of packs attached to a flight
    Batteries(FlightBatteriesOpts),
    /// Remove a flight and its samples
    Delete(FlightIdOpts),
    /// Mark a flight as not a real flight
    Invalidate(FlightInvalidateOpts),
    /// Move a flight to a flying site
    Location(FlightLocationOpts),
    /// Mark a flight as a real flight again
    Revalidate(FlightIdOpts),
}

#[derive(Debug, Parser)]
pub struct FlightIdOpts {
    /// Flight id
    pub flight: u32,
}

#[derive(Debug, Parser)]
pub struct FlightInvalidateOpts {
    /// Why it does not count
    #[clap(long)]
    pub notes: Option<String>,
    /// Flight id
    pub flight: u32,
}

#[derive(Debug, Parser)]
pub struct FlightLocationOpts {
    /// Detach the flight from any site
    #[clap(long, conflicts_with = "location")]
    pub clear: bool,
    /// Flight id
    pub flight: u32,
    /// Location id
    #[clap(required_unless_present = "clear")]
    pub location: Option<u32>,
}

#[derive(Debug, Parser)]
pub struct FlightBatteriesOpts {
    /// Flight id
    pub flight: u32,
    /// Battery ids, an empty list detaches everything
    pub batteries: Vec<u32>,
}

// ------

/// This contain only the `location` sub-commands.
///
#[derive(Debug, Parser)]
pub struct LocationOpts {
    /// Sub-commands
    #[clap(subcommand)]
    pub subcmd: LocationSubCommand,
}

#[derive(Debug, Parser)]
pub enum LocationSubCommand {
    /// Remove a site no valid flight uses
    Delete(LocationIdOpts),
    /// Mark a site as bogus (GPS glitch etc.)
    Invalidate(LocationInvalidateOpts),
    /// Give a site a proper name
    Rename(LocationRenameOpts),
    /// Mark a site as real again
    Revalidate(LocationIdOpts),
}

#[derive(Debug, Parser)]
pub struct LocationIdOpts {
    /// Location id
    pub location: u32,
}

#[derive(Debug, Parser)]
pub struct LocationInvalidateOpts {
    /// Why the site is bogus
    #[clap(long)]
    pub notes: Option<String>,
    /// Location id
    pub location: u32,
}

#[derive(Debug, Parser)]
pub struct LocationRenameOpts {
    /// Location id
    pub location: u32,
    /// New name
    pub name: String,
}

// ------

/// Options for exporting one flight track.
///
#[derive(Debug, Parser)]
pub struct ExportOpts {
    /// Track format to generate.
    #[clap(short = 'F', long, default_value = "gpx")]
    pub format: ExportFormat,
    /// Output file (default is stdout).
    #[clap(short = 'o', long)]
    pub output: Option<PathBuf>,
    /// Flight id
    pub flight: u32,
}

/// The two track formats we can write.
///
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Gpx,
    Kml,
}

// ------

#[derive(Debug, Parser)]
pub struct BackupOpts {
    /// Where the JSON dump goes
    pub file: PathBuf,
}

#[derive(Debug, Parser)]
pub struct RestoreOpts {
    /// JSON dump to load back
    pub file: PathBuf,
}

// ------

/// Options to generate completion files at runtime
///
#[derive(Debug, Parser)]
pub struct ComplOpts {
    #[clap(value_parser)]
    pub shell: Shell,
}
