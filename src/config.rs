// Run configuration for the landing page report
//
// Defaults reproduce the standard analysis: 5% significance level, 10,000
// simulated trials, unseeded generator. Values may come from a TOML file and
// are then overridden by command-line flags.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors while reading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Parameters of one report run
///
/// # Example
/// ```
/// use abtest_report::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.significance_level, 0.05);
/// assert_eq!(config.simulations, 10_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Threshold the p-values are compared against in the conclusions
    pub significance_level: f64,

    /// Number of simulated experiments under the null hypothesis
    pub simulations: usize,

    /// Simulation RNG seed; `None` draws from OS entropy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Bins of the null distribution histogram
    pub histogram_bins: usize,

    /// Rows shown in the data overview and encoded data tables
    pub head_rows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            simulations: 10_000,
            seed: None,
            histogram_bins: 30,
            head_rows: 5,
        }
    }
}

impl AnalysisConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(format!(
                "significance_level must be in (0, 1), got {}",
                self.significance_level
            ));
        }

        if self.simulations == 0 {
            return Err("simulations must be >= 1".to_string());
        }

        if self.histogram_bins == 0 {
            return Err("histogram_bins must be >= 1".to_string());
        }

        Ok(())
    }
}
