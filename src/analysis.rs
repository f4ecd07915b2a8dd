//! Report driver
//!
//! Runs every stage of the analysis once, in document order, and collects
//! the results into a single serializable [`Report`]. Renderers only read
//! from the report; nothing is recomputed while formatting.

use crate::cli::OutputFormat;
use crate::config::AnalysisConfig;
use crate::dataset::{Dataset, DateRange, Observation, Variant};
use crate::hypothesis::{self, Alternative, NullSimulation, ZTestResult};
use crate::regression::{self, ModelReport, VifEntry, INTERCEPT, VARIANT};
use crate::stats::{self, ConversionSummary, GroupRate};
use crate::{html_output, json_output, text_output};
use anyhow::{Context, Result};
use serde::Serialize;

/// Part I data overview
#[derive(Debug, Clone, Serialize)]
pub struct DataOverview {
    pub rows: usize,
    pub columns: usize,
    pub unique_users: usize,
    pub duplicate_users: usize,
    pub head: Vec<Observation>,
    pub date_range: Option<DateRange>,
}

/// One row of the encoded data preview
#[derive(Debug, Clone, Serialize)]
pub struct EncodedRow {
    pub user_id: String,
    pub converted: bool,
    pub values: Vec<f64>,
}

/// Part III results
#[derive(Debug, Clone, Serialize)]
pub struct RegressionSection {
    pub encoded_columns: Vec<String>,
    pub encoded_head: Vec<EncodedRow>,
    /// VIF of the full one-hot design (every level kept)
    pub full_vif: Vec<VifEntry>,
    pub models: Vec<ModelReport>,
}

/// Effect of one predictor in one fitted model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictorEffect {
    pub model: String,
    pub predictor: String,
    pub odds_ratio: f64,
    pub p_value: f64,
    pub significant: bool,
}

/// Verdicts derived from the computed values
#[derive(Debug, Clone, Serialize)]
pub struct Conclusions {
    pub significance_level: f64,
    /// Treatment rate minus control rate
    pub rate_lift: f64,
    pub top_location: Option<GroupRate>,
    pub top_device: Option<GroupRate>,
    pub simulation_rejects_null: bool,
    pub ztest_rejects_null: bool,
    /// `variant_id` coefficient of each model
    pub variant_effects: Vec<PredictorEffect>,
    /// Non-intercept predictors below the significance level, per model
    pub significant_predictors: Vec<PredictorEffect>,
    pub test_duration_days: Option<i64>,
}

/// Everything the report shows, in section order
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub source: String,
    pub config: AnalysisConfig,
    pub overview: DataOverview,
    pub conversion: ConversionSummary,
    pub simulation: NullSimulation,
    pub ztest: ZTestResult,
    pub regression: RegressionSection,
    pub conclusions: Conclusions,
}

/// Group with the highest conversion rate
fn top_group(groups: &[GroupRate]) -> Option<GroupRate> {
    groups
        .iter()
        .filter(|g| !g.rate.is_nan())
        .max_by(|a, b| a.rate.total_cmp(&b.rate))
        .cloned()
}

fn predictor_effects(models: &[ModelReport], alpha: f64) -> Vec<PredictorEffect> {
    models
        .iter()
        .flat_map(|model| {
            model.fit.coefficients.iter().map(|c| PredictorEffect {
                model: model.name.clone(),
                predictor: c.name.clone(),
                odds_ratio: c.odds_ratio,
                p_value: c.p_value,
                significant: c.p_value < alpha,
            })
        })
        .collect()
}

/// Derive the summary verdicts
pub fn conclude(
    conversion: &ConversionSummary,
    simulation: &NullSimulation,
    ztest: &ZTestResult,
    models: &[ModelReport],
    date_range: Option<DateRange>,
    significance_level: f64,
) -> Conclusions {
    let effects = predictor_effects(models, significance_level);

    Conclusions {
        significance_level,
        rate_lift: conversion.treatment_rate - conversion.control_rate,
        top_location: top_group(&conversion.by_location),
        top_device: top_group(&conversion.by_device),
        simulation_rejects_null: simulation.p_value < significance_level,
        ztest_rejects_null: ztest.p_value < significance_level,
        variant_effects: effects
            .iter()
            .filter(|e| e.predictor == VARIANT)
            .cloned()
            .collect(),
        significant_predictors: effects
            .into_iter()
            .filter(|e| e.significant && e.predictor != INTERCEPT)
            .collect(),
        test_duration_days: date_range.map(|r| r.days()),
    }
}

/// Run the full analysis on a loaded dataset
pub fn build_report(dataset: &Dataset, source: &str, config: &AnalysisConfig) -> Result<Report> {
    let duplicate_users = dataset.duplicate_users();
    if duplicate_users > 0 {
        tracing::warn!(
            duplicate_users,
            rows = dataset.len(),
            "user ids are not unique; every row is analysed as a separate observation"
        );
    }

    let overview = DataOverview {
        rows: dataset.len(),
        columns: dataset.column_count(),
        unique_users: dataset.unique_users(),
        duplicate_users,
        head: dataset.head(config.head_rows).to_vec(),
        date_range: dataset.date_range(),
    };

    // Part I
    let conversion = stats::summarize(dataset);
    tracing::info!(
        overall = conversion.overall_rate,
        control = conversion.control_rate,
        treatment = conversion.treatment_rate,
        "computed conversion rates"
    );

    // Part II
    let treatment = stats::variant_counts(dataset, Variant::Treatment);
    let control = stats::variant_counts(dataset, Variant::Control);

    let simulation = hypothesis::simulate_null(
        treatment,
        control,
        config.simulations,
        config.seed,
        config.histogram_bins,
    )
    .context("Failed to simulate the null distribution")?;

    let ztest = hypothesis::proportions_ztest(treatment, control, Alternative::Larger)
        .context("Failed to run the two-proportion z-test")?;

    tracing::info!(
        simulated_p = simulation.p_value,
        z = ztest.statistic,
        z_p = ztest.p_value,
        "hypothesis tests complete"
    );

    // Part III
    let encoded = regression::encode(dataset);
    let full_vif =
        regression::vif_table(&encoded.design).context("Failed to compute the full VIF table")?;
    let models = regression::fit_reduced_models(&encoded)
        .context("Failed to fit the reduced regression models")?;

    let encoded_head = encoded
        .design
        .head(config.head_rows)
        .into_iter()
        .zip(dataset.observations())
        .map(|(values, observation)| EncodedRow {
            user_id: observation.user_id.clone(),
            converted: observation.converted,
            values,
        })
        .collect();

    let conclusions = conclude(
        &conversion,
        &simulation,
        &ztest,
        &models,
        overview.date_range,
        config.significance_level,
    );

    Ok(Report {
        source: source.to_string(),
        config: config.clone(),
        overview,
        conversion,
        simulation,
        ztest,
        regression: RegressionSection {
            encoded_columns: encoded.design.columns().to_vec(),
            encoded_head,
            full_vif,
            models,
        },
        conclusions,
    })
}

/// Format a report
pub fn render(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text_output::render(report)),
        OutputFormat::Html => Ok(html_output::render(report)),
        OutputFormat::Json => {
            json_output::to_json(report).context("Failed to serialize the report as JSON")
        }
    }
}
