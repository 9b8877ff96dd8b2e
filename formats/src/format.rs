//! Format set for the CSV dialects we recognise, with the header sniffing used
//! to tell them apart.
//!

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::EnumString;
use tabled::builder::Builder;
use tabled::settings::Style;

/// Current formats.hcl version
///
const FVERSION: usize = 1;

/// Column heading present in every DJI CsvView export.
const DJI_TIME_COL: &str = "CUSTOM.dateTime";
/// Column headings only EdgeTX telemetry logs carry.
const EDGETX_RSSI_COL: &str = "1RSS(dB)";
const EDGETX_TXBAT_COL: &str = "TxBat(V)";

// -----

/// This struct represents the format descriptor for each of the supported dialects,
/// loaded from `formats.hcl`.
///
#[derive(Debug, Deserialize)]
pub struct FormatDescr {
    /// Type of data each format refers to
    #[serde(rename = "type")]
    pub dtype: String,
    /// Free text description
    pub description: String,
    /// Source
    pub source: String,
    /// URL to the site where this is defined
    pub url: String,
}

/// This struct represents the format file structure to be loaded from an HCL file.
///
#[derive(Debug, Deserialize)]
pub struct FormatFile {
    /// Version
    pub version: usize,
    /// Ordered list of format metadata
    pub format: BTreeMap<String, FormatDescr>,
}

/// The `LogFormat` enum represents the CSV dialects we know how to turn into
/// `Sample` series.
///
/// - `Unknown`: Default, no recognised format.
/// - `Dji`: flight controller log converted to CSV by CsvView/DatCon.
/// - `EdgeTx`: radio telemetry log written by an EdgeTX transmitter.
///
#[derive(
    Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq, strum::Display, EnumString, Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    #[default]
    Unknown,
    /// DJI flight controller export (CsvView/DatCon)
    Dji,
    /// EdgeTX radio telemetry log
    EdgeTx,
}

impl LogFormat {
    /// Look at the first line of a file and guess which dialect wrote it.
    ///
    /// The DJI marker wins when both sets of markers are present, which does
    /// not happen with real exports.
    ///
    pub fn sniff(header: &str) -> Self {
        if header.contains(DJI_TIME_COL) {
            LogFormat::Dji
        } else if header.contains(EDGETX_RSSI_COL) || header.contains(EDGETX_TXBAT_COL) {
            LogFormat::EdgeTx
        } else {
            LogFormat::Unknown
        }
    }

    /// List all supported formats into a string using `tabled`.
    ///
    pub fn list() -> eyre::Result<String> {
        let descr = include_str!("formats.hcl");
        let fstr: FormatFile = hcl::from_str(descr)?;

        // Safety checks
        //
        assert_eq!(fstr.version, FVERSION);

        let header = vec!["Name", "Type", "Description"];

        let mut builder = Builder::default();
        builder.push_record(header);

        fstr.format.iter().for_each(|(name, entry)| {
            let mut row = vec![];

            let name = name.clone();
            let dtype = entry.dtype.clone();
            let description = entry.description.clone();
            let source = entry.source.clone();
            let url = entry.url.clone();

            let row_text = format!("{}\nSource: {} -- URL: {}", description, source, url);
            row.push(&name);
            row.push(&dtype);
            row.push(&row_text);
            builder.push_record(row);
        });
        let allf = builder.build().with(Style::modern()).to_string();
        let str = format!("List all formats:\n{allf}");
        Ok(str)
    }
}
