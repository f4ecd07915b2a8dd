//! Terminal rendering of the report
//!
//! Sections are printed in document order with aligned tables and
//! block-character charts. Rates are shown as percentages to two decimals,
//! p-values and test statistics to five.

use crate::analysis::Report;
use crate::chart;
use crate::dataset::DATE_FORMAT;
use crate::narrative::{self, percent, Section};
use crate::regression::{ModelReport, VifEntry};
use crate::stats::GroupRate;

const CHART_WIDTH: usize = 40;
const RULE_WIDTH: usize = 88;

/// Column-aligned table; the first column is left-aligned, the rest right
struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }

        let format_row = |cells: &[String]| -> String {
            let parts: Vec<String> = cells
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (cell, &w))| {
                    if i == 0 {
                        format!("{:<w$}", cell)
                    } else {
                        format!("{:>w$}", cell)
                    }
                })
                .collect();
            format!("  {}\n", parts.join("  ").trim_end())
        };

        let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        let mut out = format_row(&self.headers);
        out.push_str(&format!("  {}\n", "─".repeat(total)));
        for row in &self.rows {
            out.push_str(&format_row(row));
        }
        out
    }
}

fn section_heading(out: &mut String, section: Section) {
    out.push('\n');
    out.push_str(&format!("{}\n", section.title));
    out.push_str(&format!("{}\n", "═".repeat(section.title.chars().count())));
}

fn subheading(out: &mut String, title: &str) {
    out.push('\n');
    out.push_str(&format!("{}\n", title));
    out.push_str(&format!("{}\n", "─".repeat(title.chars().count())));
}

fn bullets(out: &mut String, lines: &[impl AsRef<str>]) {
    for line in lines {
        out.push_str(&format!("  - {}\n", line.as_ref()));
    }
}

fn group_table(label: &str, groups: &[GroupRate]) -> String {
    let mut table = TextTable::new([label, "users", "conversions", "converted"]);
    for group in groups {
        table.row(vec![
            group.label.clone(),
            group.observations.to_string(),
            group.conversions.to_string(),
            format!("{:.6}", group.rate),
        ]);
    }
    table.render()
}

fn vif_table(entries: &[VifEntry]) -> String {
    let mut table = TextTable::new(["feature", "VIF"]);
    for entry in entries {
        table.row(vec![entry.feature.clone(), format!("{:.6}", entry.vif)]);
    }
    table.render()
}

fn coefficient_table(model: &ModelReport) -> String {
    let mut table = TextTable::new([
        "",
        "Coef.",
        "Std.Err.",
        "z",
        "P>|z|",
        "[0.025",
        "0.975]",
        "Odds Ratio",
    ]);
    for c in &model.fit.coefficients {
        table.row(vec![
            c.name.clone(),
            format!("{:.4}", c.estimate),
            format!("{:.4}", c.std_error),
            format!("{:.4}", c.z_value),
            format!("{:.4}", c.p_value),
            format!("{:.4}", c.ci_lower),
            format!("{:.4}", c.ci_upper),
            format!("{:.4}", c.odds_ratio),
        ]);
    }
    table.render()
}

fn render_header(out: &mut String) {
    let title = narrative::REPORT_TITLE;
    out.push_str(&format!("{}\n", "═".repeat(RULE_WIDTH)));
    out.push_str(&format!("  {}\n", title));
    out.push_str(&format!("  {}\n", narrative::REPORT_SUBTITLE));
    out.push_str(&format!("{}\n", "═".repeat(RULE_WIDTH)));

    subheading(out, "Table of Contents");
    for section in narrative::SECTIONS {
        out.push_str(&format!("  {}\n", section.title));
    }
}

fn render_background(out: &mut String) {
    section_heading(out, narrative::BACKGROUND);
    for paragraph in narrative::BACKGROUND_TEXT {
        out.push_str(&format!("{}\n\n", paragraph));
    }
    out.push_str("Key objectives:\n");
    bullets(out, narrative::OBJECTIVES);
}

fn render_methodology(out: &mut String) {
    section_heading(out, narrative::METHODOLOGY);
    out.push_str(&format!("{}\n\n", narrative::METHODOLOGY_TEXT));
    out.push_str("Hypothesis:\n");
    bullets(
        out,
        &[narrative::NULL_HYPOTHESIS, narrative::ALTERNATIVE_HYPOTHESIS],
    );
    out.push_str("\nAnalytical techniques:\n");
    bullets(out, narrative::TECHNIQUES);
}

fn render_part_one(out: &mut String, report: &Report) {
    let overview = &report.overview;
    let conversion = &report.conversion;

    section_heading(out, narrative::PART_ONE);
    subheading(out, "Data Overview");

    let mut head = TextTable::new([
        "user_id",
        "timestamp",
        "variant_id",
        "converted",
        "location",
        "device",
    ]);
    for o in &overview.head {
        head.row(vec![
            o.user_id.clone(),
            o.timestamp.format(DATE_FORMAT).to_string(),
            o.variant.id().to_string(),
            u8::from(o.converted).to_string(),
            o.location.clone(),
            o.device.clone(),
        ]);
    }
    out.push_str(&head.render());
    out.push('\n');

    out.push_str(&format!("Number of rows: {}\n", overview.rows));
    out.push_str(&format!("Number of columns: {}\n", overview.columns));
    out.push_str(&format!("{} unique users\n", overview.unique_users));
    if overview.duplicate_users > 0 {
        out.push_str(&format!(
            "Warning: {} rows repeat an earlier user id\n",
            overview.duplicate_users
        ));
    }
    if let Some(range) = overview.date_range {
        out.push_str(&format!(
            "Test period: {} to {} ({} days)\n",
            range.first.format(DATE_FORMAT),
            range.last.format(DATE_FORMAT),
            range.days()
        ));
    }
    out.push('\n');

    out.push_str(&format!(
        "Proportion of users converted = {}\n",
        percent(conversion.overall_rate)
    ));
    out.push_str(&format!(
        "Probability of conversion for control group: {}\n",
        percent(conversion.control_rate)
    ));
    out.push_str(&format!(
        "Probability of conversion for treatment group: {}\n",
        percent(conversion.treatment_rate)
    ));
    out.push_str(&format!(
        "Probability of receiving the new page: {:.5}\n",
        conversion.treatment_share
    ));

    subheading(out, "Conversion Rate by Location");
    out.push_str(&group_table("location", &conversion.by_location));
    out.push('\n');
    out.push_str(&chart::location_chart(conversion).to_ascii(CHART_WIDTH));

    subheading(out, "Conversion Rate by Device Type");
    out.push_str(&group_table("device", &conversion.by_device));
    out.push('\n');
    out.push_str(&chart::device_chart(conversion).to_ascii(CHART_WIDTH));

    out.push_str("\nInsights:\n");
    bullets(out, &narrative::part_one_insights(report));
}

fn render_part_two(out: &mut String, report: &Report) {
    let simulation = &report.simulation;
    let ztest = &report.ztest;

    section_heading(out, narrative::PART_TWO);
    subheading(out, "Hypothesis Setup");
    bullets(
        out,
        &[narrative::NULL_HYPOTHESIS, narrative::ALTERNATIVE_HYPOTHESIS],
    );

    subheading(out, "Simulation under the Null Hypothesis");
    out.push_str(&format!(
        "{} simulated experiments at the pooled rate {:.4} (seed: {})\n",
        simulation.trials,
        simulation.null_rate,
        simulation
            .seed
            .map_or_else(|| "none".to_string(), |s| s.to_string())
    ));
    out.push_str(&format!(
        "Null distribution: mean {:+.5}, std {:.5}\n\n",
        simulation.mean_difference, simulation.std_difference
    ));
    out.push_str(&chart::null_distribution_chart(simulation).to_ascii(CHART_WIDTH));
    out.push('\n');
    out.push_str(&format!(
        "Observed difference: {:.5}\n",
        simulation.observed_difference
    ));
    out.push_str(&format!("P-value: {:.5}\n", simulation.p_value));

    subheading(out, "Two-Proportion Z-Test");
    out.push_str(&format!(
        "Z-Score: {:.5}, P-Value: {:.5}\n\n",
        ztest.statistic, ztest.p_value
    ));
    out.push_str(&chart::observed_rates_chart(&report.conversion).to_ascii(CHART_WIDTH));

    out.push_str("\nInterpretation:\n");
    bullets(out, &narrative::ab_test_interpretation(report));
}

fn render_part_three(out: &mut String, report: &Report) {
    let regression = &report.regression;

    section_heading(out, narrative::PART_THREE);
    subheading(out, "Encode Device and Location");

    let mut headers = vec!["user_id".to_string(), "converted".to_string()];
    headers.extend(regression.encoded_columns.iter().cloned());
    let mut encoded = TextTable::new(headers);
    for row in &regression.encoded_head {
        let mut cells = vec![row.user_id.clone(), u8::from(row.converted).to_string()];
        cells.extend(row.values.iter().map(|v| format!("{}", v)));
        encoded.row(cells);
    }
    out.push_str(&encoded.render());

    subheading(out, "Variance Inflation Factor (VIF) Analysis");
    out.push_str(&vif_table(&regression.full_vif));

    for (i, model) in regression.models.iter().enumerate() {
        subheading(out, &format!("Logistic Regression {}", model.name));
        out.push_str(&vif_table(&model.vif));

        out.push_str(&format!("\nModel {} Summary\n", i + 1));
        out.push_str(&coefficient_table(model));
        let fit = &model.fit;
        out.push_str(&format!(
            "  No. Observations: {}  Log-Likelihood: {:.3}  LL-Null: {:.3}  Pseudo R-squared: {:.4}\n",
            fit.observations, fit.log_likelihood, fit.null_log_likelihood, fit.pseudo_r_squared
        ));
        out.push_str(&format!(
            "  Converged: {}  Iterations: {}\n",
            fit.converged, fit.iterations
        ));
    }
}

fn render_conclusions(out: &mut String, report: &Report) {
    section_heading(out, narrative::CONCLUSIONS);
    for paragraph in narrative::conclusions(report) {
        out.push_str(&format!("{}\n\n", paragraph));
    }
}

/// Render the full report as plain text
pub fn render(report: &Report) -> String {
    let mut out = String::new();
    render_header(&mut out);
    render_background(&mut out);
    render_methodology(&mut out);
    render_part_one(&mut out, report);
    render_part_two(&mut out, report);
    render_part_three(&mut out, report);
    render_conclusions(&mut out, report);
    out.push_str(&format!("Source: {}\n", report.source));
    out
}
