//! CLI argument parsing for abtest-report

use crate::config::AnalysisConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal report (default)
    Text,
    /// Standalone HTML page with embedded styles and charts
    Html,
    /// JSON document for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "abtest-report")]
#[command(version)]
#[command(
    about = "Conversion analysis report for a landing page A/B test",
    long_about = None
)]
pub struct Cli {
    /// CSV export of the experiment
    #[arg(value_name = "INPUT", default_value = "AB_Test-Landing_page.csv")]
    pub input: PathBuf,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Seed for the null-hypothesis simulation (reproducible p-value)
    #[arg(long = "seed", value_name = "N")]
    pub seed: Option<u64>,

    /// Number of simulated experiments (default: 10000)
    #[arg(long = "simulations", value_name = "N")]
    pub simulations: Option<usize>,

    /// Significance level used in the conclusions (default: 0.05)
    #[arg(long = "alpha", value_name = "P")]
    pub alpha: Option<f64>,

    /// TOML configuration file; flags take precedence over it
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose debug output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Overlay the flags that were given on top of `config`
    pub fn apply_overrides(&self, config: &mut AnalysisConfig) {
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(simulations) = self.simulations {
            config.simulations = simulations;
        }
        if let Some(alpha) = self.alpha {
            config.significance_level = alpha;
        }
    }
}
