//! This library is there to share some common code amongst all sortie modules.
//!

mod location;
mod logging;
mod macros;

pub use location::*;
pub use logging::*;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version() -> String {
    format!("{}/{}", NAME, VERSION)
}
