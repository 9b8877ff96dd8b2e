//! CLI configuration, a small versioned HCL file.
//!
//! Everything in it is optional: a missing file or a missing key falls back
//! to defaults under the user configuration directory, so a first run needs
//! no setup at all.
//!

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{eyre, Result};
use home::home_dir;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use sortie_common::makepath;

#[cfg(unix)]
const BASEDIR: &str = ".config";

/// Config filename
const CONFIG: &str = "sortiectl.hcl";
/// Current version
const CVERSION: usize = 1;
/// Main name for the directory base
const TAG: &str = "sortie";

/// Default snapshot filename, next to the config file
const STORE: &str = "sortie.json";
/// Default import directory, same place
const IMPORT_DIR: &str = "import";

/// Configuration for the CLI tool
///
#[derive(Debug, Deserialize, Serialize)]
pub struct ConfigFile {
    /// Version in the file MUST match `CVERSION`
    pub version: usize,
    /// JSON snapshot holding the whole logbook.
    pub store: Option<PathBuf>,
    /// Directory scanned by batch imports.
    pub import_dir: Option<PathBuf>,
    /// Pilot used when `-P` is not given.
    pub pilot: Option<String>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        ConfigFile {
            version: CVERSION,
            store: None,
            import_dir: None,
            pilot: None,
        }
    }
}

impl ConfigFile {
    /// Returns the path of the default config directory
    ///
    #[cfg(unix)]
    pub fn config_path() -> PathBuf {
        let homedir = home_dir().unwrap();
        let def: PathBuf = makepath!(homedir, BASEDIR, TAG);
        def
    }

    /// Returns the path of the default config directory
    ///
    #[cfg(windows)]
    pub fn config_path() -> PathBuf {
        let homedir = env!("LOCALAPPDATA");

        let def: PathBuf = makepath!(homedir, TAG);
        def
    }

    /// Returns the path of the default config file
    ///
    pub fn default_file() -> PathBuf {
        Self::config_path().join(CONFIG)
    }

    /// Where the JSON snapshot lives.
    ///
    pub fn store_path(&self) -> PathBuf {
        self.store
            .clone()
            .unwrap_or_else(|| Self::config_path().join(STORE))
    }

    /// Directory scanned when `import` is not given one.
    ///
    pub fn import_path(&self) -> PathBuf {
        self.import_dir
            .clone()
            .unwrap_or_else(|| Self::config_path().join(IMPORT_DIR))
    }

    /// Load either the file specified as parameter or the default file if `None`.
    /// No default file at all is fine, defaults cover everything.
    ///
    #[tracing::instrument]
    pub fn load<T>(fname: Option<T>) -> Result<ConfigFile>
    where
        T: Into<PathBuf> + Debug,
    {
        trace!("loading config");

        match fname {
            Some(fname) => Self::read(&fname.into()),
            None => {
                let def = Self::default_file();
                if def.exists() {
                    Self::read(&def)
                } else {
                    debug!("no config file, using defaults");
                    Ok(ConfigFile::default())
                }
            }
        }
    }

    fn read(fname: &Path) -> Result<ConfigFile> {
        let data = fs::read_to_string(fname)?;
        let data: ConfigFile = hcl::from_str(&data)?;

        if data.version != CVERSION {
            return Err(eyre!("bad config version: {}", data.version));
        }
        Ok(data)
    }
}
