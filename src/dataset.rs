//! A/B test observation loading
//!
//! Reads the landing page CSV export into typed observations. Expected columns
//! (any order): `timestamp`, `variant_id`, `converted`, `user_id`, `location`,
//! `device`. Timestamps are calendar dates written day/month/year.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Date format of the `timestamp` column
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Columns every input file must provide
pub const INPUT_COLUMNS: [&str; 6] = [
    "timestamp",
    "variant_id",
    "converted",
    "user_id",
    "location",
    "device",
];

/// Errors raised while loading observations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column '{0}' in CSV header")]
    MissingColumn(String),

    #[error("Line {line}: invalid date '{value}' (expected dd/mm/yyyy)")]
    InvalidDate { line: usize, value: String },

    #[error("Line {line}: column '{column}' must be 0 or 1, got '{value}'")]
    InvalidBinary {
        line: usize,
        column: &'static str,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, DataError>;

/// Landing page version shown to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Old page (`variant_id = 0`)
    Control,
    /// New page (`variant_id = 1`)
    Treatment,
}

impl Variant {
    /// Numeric encoding used in the input file and the design matrix
    pub fn id(self) -> u8 {
        match self {
            Variant::Control => 0,
            Variant::Treatment => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Variant::Control => "Control",
            Variant::Treatment => "Treatment",
        }
    }
}

/// Categorical observation attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Location,
    Device,
}

impl Category {
    /// Column name in the input file, also the indicator column prefix
    pub fn column_name(self) -> &'static str {
        match self {
            Category::Location => "location",
            Category::Device => "device",
        }
    }

    /// Level of this category for one observation
    pub fn level(self, observation: &Observation) -> &str {
        match self {
            Category::Location => &observation.location,
            Category::Device => &observation.device,
        }
    }
}

/// One user's exposure and outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub user_id: String,
    pub timestamp: NaiveDate,
    pub variant: Variant,
    pub converted: bool,
    pub location: String,
    pub device: String,
}

/// First and last observed dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl DateRange {
    /// Inclusive number of calendar days covered
    pub fn days(&self) -> i64 {
        (self.last - self.first).num_days() + 1
    }
}

/// Untyped CSV row before coercion
#[derive(Debug, Deserialize)]
struct RawRecord {
    timestamp: String,
    variant_id: String,
    converted: String,
    user_id: String,
    location: String,
    device: String,
}

impl RawRecord {
    fn into_observation(self, line: usize) -> Result<Observation> {
        let timestamp = NaiveDate::parse_from_str(self.timestamp.trim(), DATE_FORMAT).map_err(
            |_| DataError::InvalidDate {
                line,
                value: self.timestamp.clone(),
            },
        )?;

        let variant = if parse_binary(line, "variant_id", &self.variant_id)? {
            Variant::Treatment
        } else {
            Variant::Control
        };
        let converted = parse_binary(line, "converted", &self.converted)?;

        Ok(Observation {
            user_id: self.user_id.trim().to_string(),
            timestamp,
            variant,
            converted,
            location: self.location.trim().to_string(),
            device: self.device.trim().to_string(),
        })
    }
}

fn parse_binary(line: usize, column: &'static str, value: &str) -> Result<bool> {
    match value.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(DataError::InvalidBinary {
            line,
            column,
            value: value.to_string(),
        }),
    }
}

/// All observations of one export, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    observations: Vec<Observation>,
}

impl Dataset {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    /// Load observations from a CSV file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DataError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let dataset = Self::from_reader(file)?;
        tracing::info!(
            path = %path.display(),
            rows = dataset.len(),
            "loaded observations"
        );
        Ok(dataset)
    }

    /// Load observations from any CSV source with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        for column in INPUT_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(DataError::MissingColumn(column.to_string()));
            }
        }

        let mut observations = Vec::new();
        for (index, record) in reader.records().enumerate() {
            // Header occupies line 1
            let line = index + 2;
            let raw: RawRecord = record?.deserialize(Some(&headers))?;
            observations.push(raw.into_observation(line)?);
        }

        Ok(Self { observations })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Number of input columns
    pub fn column_count(&self) -> usize {
        INPUT_COLUMNS.len()
    }

    /// Number of distinct user ids
    pub fn unique_users(&self) -> usize {
        self.observations
            .iter()
            .map(|o| o.user_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Rows whose user id already appeared earlier in the file
    pub fn duplicate_users(&self) -> usize {
        self.len() - self.unique_users()
    }

    /// First `n` observations in file order
    pub fn head(&self, n: usize) -> &[Observation] {
        &self.observations[..n.min(self.len())]
    }

    pub fn date_range(&self) -> Option<DateRange> {
        let first = self.observations.iter().map(|o| o.timestamp).min()?;
        let last = self.observations.iter().map(|o| o.timestamp).max()?;
        Some(DateRange { first, last })
    }

    /// Observations assigned to one arm
    pub fn variant_partition(&self, variant: Variant) -> impl Iterator<Item = &Observation> {
        self.observations
            .iter()
            .filter(move |o| o.variant == variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
timestamp,variant_id,converted,user_id,location,device
01/03/2024,0,1,1001,Asia,Mobile
02/03/2024,1,0,1002,Europe,Desktop
15/03/2024,1,1,1003,Other,Tablet
";

    #[test]
    fn test_from_reader_parses_rows() {
        let dataset = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 3);

        let first = &dataset.observations()[0];
        assert_eq!(first.user_id, "1001");
        assert_eq!(first.timestamp, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(first.variant, Variant::Control);
        assert!(first.converted);
        assert_eq!(first.location, "Asia");
        assert_eq!(first.device, "Mobile");

        assert_eq!(dataset.observations()[1].variant, Variant::Treatment);
    }

    #[test]
    fn test_day_month_year_order() {
        let dataset = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        // 02/03 is the 2nd of March, not the 3rd of February
        assert_eq!(
            dataset.observations()[1].timestamp,
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
    }

    #[test]
    fn test_columns_in_any_order() {
        let csv = "user_id,device,location,converted,variant_id,timestamp\n7,Tablet,Asia,1,1,05/05/2024\n";
        let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
        let obs = &dataset.observations()[0];
        assert_eq!(obs.user_id, "7");
        assert_eq!(obs.variant, Variant::Treatment);
        assert_eq!(obs.device, "Tablet");
    }

    #[test]
    fn test_missing_column_rejected() {
        let csv = "timestamp,variant_id,converted,user_id,location\n01/01/2024,0,0,1,Asia\n";
        match Dataset::from_reader(csv.as_bytes()) {
            Err(DataError::MissingColumn(column)) => assert_eq!(column, "device"),
            other => panic!("Expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_date_reports_line() {
        let csv = "timestamp,variant_id,converted,user_id,location,device\n01/01/2024,0,0,1,Asia,Mobile\n2024-01-02,0,0,2,Asia,Mobile\n";
        match Dataset::from_reader(csv.as_bytes()) {
            Err(DataError::InvalidDate { line, value }) => {
                assert_eq!(line, 3);
                assert_eq!(value, "2024-01-02");
            }
            other => panic!("Expected InvalidDate, got {:?}", other),
        }
    }

    #[test]
    fn test_non_binary_variant_rejected() {
        let csv = "timestamp,variant_id,converted,user_id,location,device\n01/01/2024,2,0,1,Asia,Mobile\n";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DataError::InvalidBinary {
                column: "variant_id",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Dataset::from_path("/nonexistent/ab_test.csv").unwrap_err();
        assert!(matches!(err, DataError::Open { .. }));
        assert!(err.to_string().contains("/nonexistent/ab_test.csv"));
    }

    #[test]
    fn test_unique_and_duplicate_users() {
        let csv = "timestamp,variant_id,converted,user_id,location,device\n01/01/2024,0,0,1,Asia,Mobile\n01/01/2024,1,0,2,Asia,Mobile\n02/01/2024,1,1,1,Asia,Mobile\n";
        let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.unique_users(), 2);
        assert_eq!(dataset.duplicate_users(), 1);
    }

    #[test]
    fn test_date_range_inclusive_days() {
        let dataset = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        let range = dataset.date_range().unwrap();
        assert_eq!(range.first, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(range.last, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(range.days(), 15);
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = Dataset::from_reader(INPUT_COLUMNS.join(",").as_bytes()).unwrap();
        assert!(dataset.is_empty());
        assert!(dataset.date_range().is_none());
        assert!(dataset.head(5).is_empty());
    }

    #[test]
    fn test_head_and_partition() {
        let dataset = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.head(2).len(), 2);
        assert_eq!(dataset.head(10).len(), 3);
        assert_eq!(dataset.variant_partition(Variant::Treatment).count(), 2);
        assert_eq!(dataset.variant_partition(Variant::Control).count(), 1);
    }

    #[test]
    fn test_category_levels() {
        let dataset = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        let obs = &dataset.observations()[2];
        assert_eq!(Category::Location.level(obs), "Other");
        assert_eq!(Category::Device.level(obs), "Tablet");
        assert_eq!(Category::Location.column_name(), "location");
    }
}
