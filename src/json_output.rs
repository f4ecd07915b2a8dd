//! JSON output format for the landing page report
//!
//! The report is wrapped with a format identifier and the crate version.
//! Non-finite numbers (infinite VIFs, NaN rates of empty groups) serialize as
//! `null`.

use crate::analysis::Report;
use serde::Serialize;

/// Format identifier written into every document
pub const FORMAT: &str = "abtest-report-json-v1";

/// Root JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a> {
    /// Crate version that produced the document
    pub version: &'static str,
    /// Format name
    pub format: &'static str,
    #[serde(flatten)]
    pub report: &'a Report,
}

impl<'a> JsonOutput<'a> {
    pub fn new(report: &'a Report) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            format: FORMAT,
            report,
        }
    }
}

/// Pretty-printed JSON document for `report`
pub fn to_json(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonOutput::new(report))
}
