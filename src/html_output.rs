//! HTML output format for the landing page report
//!
//! Standalone single page: embedded CSS, anchored sections with a table of
//! contents, styled tables and inline SVG charts.

use crate::analysis::Report;
use crate::chart;
use crate::dataset::DATE_FORMAT;
use crate::narrative::{self, percent, Section};
use crate::regression::{ModelReport, VifEntry};
use crate::stats::GroupRate;

/// Escape HTML special characters to prevent XSS
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Generate embedded CSS styles
fn generate_styles() -> &'static str {
    r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 20px auto;
            max-width: 960px;
            background-color: #f5f5f5;
            color: #333;
            line-height: 1.5;
        }
        h1, h2, h3, h4 {
            color: #333;
        }
        .subtitle {
            color: #666;
            margin-top: -10px;
        }
        table {
            border-collapse: collapse;
            width: 100%;
            background-color: white;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
            margin-bottom: 20px;
        }
        th, td {
            border: 1px solid #ddd;
            padding: 6px 8px;
            text-align: right;
        }
        th:first-child, td:first-child {
            text-align: left;
        }
        th {
            background-color: #4a90d9;
            color: white;
            font-weight: bold;
        }
        tr:nth-child(even) {
            background-color: #f9f9f9;
        }
        tr:hover {
            background-color: #f0f0f0;
        }
        .vif-table th {
            background-color: #5cb85c;
        }
        .vif-severe {
            color: #cc0000;
            font-weight: bold;
        }
        .significant {
            font-weight: bold;
        }
        .metric {
            font-family: monospace;
        }
        .chart {
            background-color: white;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
            margin-bottom: 20px;
            text-align: center;
        }
        .toc a {
            color: #0066cc;
            text-decoration: none;
        }
        .warning {
            color: #cc0000;
        }
        .footer {
            margin-top: 20px;
            font-size: 0.8em;
            color: #888;
            text-align: center;
        }
        "#
}

fn section_heading(html: &mut String, section: Section) {
    html.push_str(&format!(
        "    <h2 id=\"{}\">{}</h2>\n",
        section.anchor,
        escape_html(section.title)
    ));
}

fn paragraph(html: &mut String, text: &str) {
    html.push_str(&format!("    <p>{}</p>\n", escape_html(text)));
}

fn list(html: &mut String, items: &[impl AsRef<str>]) {
    html.push_str("    <ul>\n");
    for item in items {
        html.push_str(&format!("        <li>{}</li>\n", escape_html(item.as_ref())));
    }
    html.push_str("    </ul>\n");
}

fn metric(html: &mut String, label: &str, value: &str) {
    html.push_str(&format!(
        "    <p>{}: <span class=\"metric\">{}</span></p>\n",
        escape_html(label),
        escape_html(value)
    ));
}

fn chart_block(html: &mut String, svg: &str) {
    html.push_str("    <div class=\"chart\">");
    html.push_str(svg);
    html.push_str("</div>\n");
}

/// Table header row
fn header_row(headers: &[&str]) -> String {
    let cells: Vec<String> = headers
        .iter()
        .map(|h| format!("<th>{}</th>", escape_html(h)))
        .collect();
    format!("        <tr>{}</tr>\n", cells.join(""))
}

fn data_row(cells: &[String]) -> String {
    let cells: Vec<String> = cells
        .iter()
        .map(|c| format!("<td>{}</td>", escape_html(c)))
        .collect();
    format!("        <tr>{}</tr>\n", cells.join(""))
}

fn group_table(label: &str, groups: &[GroupRate]) -> String {
    let mut html = String::from("    <table>\n");
    html.push_str(&header_row(&[label, "users", "conversions", "converted"]));
    for group in groups {
        html.push_str(&data_row(&[
            group.label.clone(),
            group.observations.to_string(),
            group.conversions.to_string(),
            format!("{:.6}", group.rate),
        ]));
    }
    html.push_str("    </table>\n");
    html
}

fn vif_table(entries: &[VifEntry]) -> String {
    let mut html = String::from("    <table class=\"vif-table\">\n");
    html.push_str(&header_row(&["feature", "VIF"]));
    for entry in entries {
        let class = if entry.is_severe() {
            " class=\"vif-severe\""
        } else {
            ""
        };
        html.push_str(&format!(
            "        <tr><td>{}</td><td{}>{:.6}</td></tr>\n",
            escape_html(&entry.feature),
            class,
            entry.vif
        ));
    }
    html.push_str("    </table>\n");
    html
}

fn coefficient_table(model: &ModelReport, alpha: f64) -> String {
    let mut html = String::from("    <table>\n");
    html.push_str(&header_row(&[
        "",
        "Coef.",
        "Std.Err.",
        "z",
        "P>|z|",
        "[0.025",
        "0.975]",
        "Odds Ratio",
    ]));
    for c in &model.fit.coefficients {
        let class = if c.p_value < alpha {
            " class=\"significant\""
        } else {
            ""
        };
        html.push_str(&format!(
            "        <tr{}><td>{}</td><td>{:.4}</td><td>{:.4}</td><td>{:.4}</td><td>{:.4}</td><td>{:.4}</td><td>{:.4}</td><td>{:.4}</td></tr>\n",
            class,
            escape_html(&c.name),
            c.estimate,
            c.std_error,
            c.z_value,
            c.p_value,
            c.ci_lower,
            c.ci_upper,
            c.odds_ratio
        ));
    }
    html.push_str("    </table>\n");
    html
}

fn render_contents(html: &mut String) {
    html.push_str("    <h2>Table of Contents</h2>\n");
    html.push_str("    <ol class=\"toc\">\n");
    for section in narrative::SECTIONS {
        // Titles carry their own numbering
        let title = section
            .title
            .split_once(". ")
            .map_or(section.title, |(_, rest)| rest);
        html.push_str(&format!(
            "        <li><a href=\"#{}\">{}</a></li>\n",
            section.anchor,
            escape_html(title)
        ));
    }
    html.push_str("    </ol>\n");
}

fn render_background(html: &mut String) {
    section_heading(html, narrative::BACKGROUND);
    for text in narrative::BACKGROUND_TEXT {
        paragraph(html, text);
    }
    paragraph(html, "Key objectives:");
    list(html, narrative::OBJECTIVES);
}

fn render_methodology(html: &mut String) {
    section_heading(html, narrative::METHODOLOGY);
    paragraph(html, narrative::METHODOLOGY_TEXT);
    html.push_str("    <h3>Hypothesis</h3>\n");
    list(
        html,
        &[narrative::NULL_HYPOTHESIS, narrative::ALTERNATIVE_HYPOTHESIS],
    );
    html.push_str("    <h3>Analytical Techniques</h3>\n");
    list(html, narrative::TECHNIQUES);
}

fn render_part_one(html: &mut String, report: &Report) {
    let overview = &report.overview;
    let conversion = &report.conversion;

    section_heading(html, narrative::PART_ONE);
    html.push_str("    <h3>Data Overview</h3>\n");
    html.push_str("    <table>\n");
    html.push_str(&header_row(&[
        "user_id",
        "timestamp",
        "variant_id",
        "converted",
        "location",
        "device",
    ]));
    for o in &overview.head {
        html.push_str(&data_row(&[
            o.user_id.clone(),
            o.timestamp.format(DATE_FORMAT).to_string(),
            o.variant.id().to_string(),
            u8::from(o.converted).to_string(),
            o.location.clone(),
            o.device.clone(),
        ]));
    }
    html.push_str("    </table>\n");

    metric(html, "Number of rows", &overview.rows.to_string());
    metric(html, "Number of columns", &overview.columns.to_string());
    metric(html, "Unique users", &overview.unique_users.to_string());
    if overview.duplicate_users > 0 {
        html.push_str(&format!(
            "    <p class=\"warning\">Warning: {} rows repeat an earlier user id</p>\n",
            overview.duplicate_users
        ));
    }
    if let Some(range) = overview.date_range {
        metric(
            html,
            "Test period",
            &format!(
                "{} to {} ({} days)",
                range.first.format(DATE_FORMAT),
                range.last.format(DATE_FORMAT),
                range.days()
            ),
        );
    }

    metric(
        html,
        "Proportion of users converted",
        &percent(conversion.overall_rate),
    );
    metric(
        html,
        "Probability of conversion for control group",
        &percent(conversion.control_rate),
    );
    metric(
        html,
        "Probability of conversion for treatment group",
        &percent(conversion.treatment_rate),
    );
    metric(
        html,
        "Probability of receiving the new page",
        &format!("{:.5}", conversion.treatment_share),
    );

    html.push_str("    <h3>Conversion Rate by Location</h3>\n");
    html.push_str(&group_table("location", &conversion.by_location));
    chart_block(html, &chart::location_chart(conversion).to_svg());

    html.push_str("    <h3>Conversion Rate by Device Type</h3>\n");
    html.push_str(&group_table("device", &conversion.by_device));
    chart_block(html, &chart::device_chart(conversion).to_svg());

    html.push_str("    <h3>Insights</h3>\n");
    list(html, &narrative::part_one_insights(report));
}

fn render_part_two(html: &mut String, report: &Report) {
    let simulation = &report.simulation;
    let ztest = &report.ztest;

    section_heading(html, narrative::PART_TWO);
    html.push_str("    <h3>Hypothesis Setup</h3>\n");
    list(
        html,
        &[narrative::NULL_HYPOTHESIS, narrative::ALTERNATIVE_HYPOTHESIS],
    );

    html.push_str("    <h3>Simulation under the Null Hypothesis</h3>\n");
    paragraph(
        html,
        &format!(
            "{} simulated experiments at the pooled conversion rate {:.4}; null distribution mean {:+.5}, standard deviation {:.5}.",
            simulation.trials,
            simulation.null_rate,
            simulation.mean_difference,
            simulation.std_difference
        ),
    );
    chart_block(html, &chart::null_distribution_chart(simulation).to_svg());
    metric(
        html,
        "Observed difference",
        &format!("{:.5}", simulation.observed_difference),
    );
    metric(html, "P-value", &format!("{:.5}", simulation.p_value));

    html.push_str("    <h3>Two-Proportion Z-Test</h3>\n");
    metric(html, "Z-Score", &format!("{:.5}", ztest.statistic));
    metric(html, "P-Value", &format!("{:.5}", ztest.p_value));
    chart_block(
        html,
        &chart::observed_rates_chart(&report.conversion).to_svg(),
    );

    html.push_str("    <h3>Interpretation</h3>\n");
    list(html, &narrative::ab_test_interpretation(report));
}

fn render_part_three(html: &mut String, report: &Report) {
    let regression = &report.regression;
    let alpha = report.conclusions.significance_level;

    section_heading(html, narrative::PART_THREE);
    html.push_str("    <h3>Encode Device and Location</h3>\n");
    html.push_str("    <table>\n");
    let mut headers = vec!["user_id", "converted"];
    headers.extend(regression.encoded_columns.iter().map(String::as_str));
    html.push_str(&header_row(&headers));
    for row in &regression.encoded_head {
        let mut cells = vec![row.user_id.clone(), u8::from(row.converted).to_string()];
        cells.extend(row.values.iter().map(|v| format!("{}", v)));
        html.push_str(&data_row(&cells));
    }
    html.push_str("    </table>\n");

    html.push_str("    <h3>Variance Inflation Factor (VIF) Analysis</h3>\n");
    html.push_str(&vif_table(&regression.full_vif));

    for (i, model) in regression.models.iter().enumerate() {
        html.push_str(&format!(
            "    <h3>Logistic Regression {}</h3>\n",
            escape_html(&model.name)
        ));
        html.push_str(&vif_table(&model.vif));
        html.push_str(&format!("    <h4>Model {} Summary</h4>\n", i + 1));
        html.push_str(&coefficient_table(model, alpha));

        let fit = &model.fit;
        paragraph(
            html,
            &format!(
                "Observations: {}, log-likelihood: {:.3}, null log-likelihood: {:.3}, pseudo R²: {:.4}, converged: {} after {} iterations.",
                fit.observations,
                fit.log_likelihood,
                fit.null_log_likelihood,
                fit.pseudo_r_squared,
                fit.converged,
                fit.iterations
            ),
        );
    }
}

fn render_conclusions(html: &mut String, report: &Report) {
    section_heading(html, narrative::CONCLUSIONS);
    for text in narrative::conclusions(report) {
        paragraph(html, &text);
    }
}

/// Generate complete HTML document
pub fn render(report: &Report) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n");
    html.push_str("<html lang=\"en\">\n");

    html.push_str("<head>\n");
    html.push_str("    <meta charset=\"UTF-8\">\n");
    html.push_str(
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html.push_str(&format!(
        "    <title>{}</title>\n",
        escape_html(narrative::REPORT_TITLE)
    ));
    html.push_str("    <style>");
    html.push_str(generate_styles());
    html.push_str("</style>\n");
    html.push_str("</head>\n");

    html.push_str("<body>\n");
    html.push_str(&format!(
        "    <h1>{}</h1>\n",
        escape_html(narrative::REPORT_TITLE)
    ));
    html.push_str(&format!(
        "    <p class=\"subtitle\">{}</p>\n",
        escape_html(narrative::REPORT_SUBTITLE)
    ));

    render_contents(&mut html);
    render_background(&mut html);
    render_methodology(&mut html);
    render_part_one(&mut html, report);
    render_part_two(&mut html, report);
    render_part_three(&mut html, report);
    render_conclusions(&mut html, report);

    html.push_str("    <div class=\"footer\">\n");
    html.push_str(&format!(
        "        Generated by abtest-report {} from {}\n",
        env!("CARGO_PKG_VERSION"),
        escape_html(&report.source)
    ));
    html.push_str("    </div>\n");

    html.push_str("</body>\n");
    html.push_str("</html>\n");

    html
}
