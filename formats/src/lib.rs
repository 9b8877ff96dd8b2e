//! Definition of the supported log formats
//!
//! This module makes the link between the normalized `Sample` type and the
//! different CSV dialects defined in the other modules.
//!
//! To add a new format, insert here the different hooks & names and a `FORMAT.rs`
//! file which will define the input format and the transformations needed.
//!

// Re-export for convenience
//
pub use format::*;
pub use sample::*;

pub mod dji;
pub mod edgetx;
mod format;
mod sample;

pub fn version() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
