//! Library part of the `sortiectl` utility.
//!
//! The binary in `main.rs` only parses options and dispatches; everything a
//! command does lives here, on top of the `sortie-engine` store.  Parsing of
//! the log files themselves is in the `sortie-formats` crate.
//!

/// Re-export
///
pub use cli::*;
pub use cmds::*;
pub use config::*;

mod cli;
mod cmds;
mod config;
