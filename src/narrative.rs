//! Report prose
//!
//! Fixed text (background, methodology, hypotheses) plus the sentences that
//! are generated from computed values. Shared by the text and HTML renderers.

use crate::analysis::{Conclusions, PredictorEffect, Report};
use crate::dataset::DATE_FORMAT;
use crate::regression::VARIANT;

pub const REPORT_TITLE: &str = "A/B Test Insight for Landing Page";
pub const REPORT_SUBTITLE: &str = "Conversion analysis of the email sign-up landing page";

/// Top-level report section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub anchor: &'static str,
    pub title: &'static str,
}

pub const BACKGROUND: Section = Section {
    anchor: "background",
    title: "1. Background",
};
pub const METHODOLOGY: Section = Section {
    anchor: "methodology-approach",
    title: "2. Methodology/Approach",
};
pub const PART_ONE: Section = Section {
    anchor: "part-i---probability",
    title: "3. Part I - Probability",
};
pub const PART_TWO: Section = Section {
    anchor: "part-ii---ab-test",
    title: "4. Part II - A/B Test",
};
pub const PART_THREE: Section = Section {
    anchor: "part-iii---regression",
    title: "5. Part III - Regression",
};
pub const CONCLUSIONS: Section = Section {
    anchor: "summary--conclusions",
    title: "6. Summary & Conclusions",
};

/// Table of contents order
pub const SECTIONS: [Section; 6] = [
    BACKGROUND,
    METHODOLOGY,
    PART_ONE,
    PART_TWO,
    PART_THREE,
    CONCLUSIONS,
];

pub const BACKGROUND_TEXT: &[&str] = &[
    "An art gallery wanted more visitors to sign up for email updates about \
     upcoming exhibitions and events. A redesigned landing page was built to \
     raise that sign-up rate and was tested against the existing page.",
    "The test is one step in a wider effort to strengthen the gallery's online \
     presence: a larger mailing list keeps art enthusiasts informed about what \
     the gallery offers. The data has been anonymised; it still reflects how \
     real users interacted with both pages.",
];

pub const OBJECTIVES: &[&str] = &[
    "Determine whether the new landing page converts better than the current one.",
    "Describe how conversion differs across user segments such as location and device type.",
];

pub const METHODOLOGY_TEXT: &str = "Visitors were randomly assigned to a control group, \
     shown the current landing page, or a treatment group, shown the new design. \
     Conversion is a sign-up for email updates.";

pub const NULL_HYPOTHESIS: &str =
    "H0: the new page converts at the same rate as the old page.";
pub const ALTERNATIVE_HYPOTHESIS: &str =
    "H1: the new page converts at a higher rate than the old page.";

pub const TECHNIQUES: &[&str] = &[
    "Descriptive statistics",
    "Hypothesis testing (two-proportion z-test)",
    "Segment analysis by location and device",
    "Statistical inference by simulation under the null hypothesis",
    "Logistic regression with multicollinearity checks (VIF)",
];

pub fn percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

fn verdict(rejects: bool) -> &'static str {
    if rejects {
        "reject the null hypothesis"
    } else {
        "fail to reject the null hypothesis"
    }
}

/// Insights closing Part I
pub fn part_one_insights(report: &Report) -> Vec<String> {
    let conversion = &report.conversion;
    let direction = if conversion.treatment_rate > conversion.control_rate {
        "higher"
    } else {
        "not higher"
    };

    let mut lines = vec![format!(
        "The conversion rate is {} in the treatment group ({}) than in the control group ({}).",
        direction,
        percent(conversion.treatment_rate),
        percent(conversion.control_rate)
    )];
    if let Some(top) = &report.conclusions.top_location {
        lines.push(format!(
            "Users in {} have the highest conversion rate at {}.",
            top.label,
            percent(top.rate)
        ));
    }
    if let Some(top) = &report.conclusions.top_device {
        lines.push(format!(
            "{} users convert at the highest rate ({}).",
            top.label,
            percent(top.rate)
        ));
    }
    lines
}

/// Interpretation of the two hypothesis tests
pub fn ab_test_interpretation(report: &Report) -> Vec<String> {
    let c = &report.conclusions;
    let alpha = c.significance_level;

    match (c.simulation_rejects_null, c.ztest_rejects_null) {
        (false, false) => vec![
            format!(
                "Both p-values are greater than the significance level of {}, so we {}.",
                alpha,
                verdict(false)
            ),
            "The new page does not significantly outperform the old page in terms of conversion rate."
                .to_string(),
            "The company may keep the current page or run the experiment for longer to gather more data."
                .to_string(),
        ],
        (true, true) => vec![
            format!(
                "Both p-values are below the significance level of {}, so we {}.",
                alpha,
                verdict(true)
            ),
            "The new page converts at a significantly higher rate than the old page.".to_string(),
        ],
        (simulated, z) => vec![
            format!(
                "The tests disagree at the {} significance level: the simulation test would {} and the z-test would {}.",
                alpha,
                verdict(simulated),
                verdict(z)
            ),
            "The evidence for the new page is borderline; a longer test is advisable.".to_string(),
        ],
    }
}

/// `location_Asia` -> `location Asia`
fn predictor_label(predictor: &str) -> String {
    predictor.replacen('_', " ", 1)
}

fn effect_sentence(effect: &PredictorEffect) -> String {
    format!(
        "{}: {} multiplies the odds of converting by {:.2} (p = {:.5}), holding the other predictors constant.",
        effect.model,
        predictor_label(&effect.predictor),
        effect.odds_ratio,
        effect.p_value
    )
}

fn variant_sentence(conclusions: &Conclusions) -> String {
    let p_values: Vec<String> = conclusions
        .variant_effects
        .iter()
        .map(|e| format!("{:.5}", e.p_value))
        .collect();

    if conclusions.variant_effects.iter().any(|e| e.significant) {
        format!(
            "The page variant is a significant predictor of conversion in at least one model (p = {}).",
            p_values.join(", ")
        )
    } else {
        format!(
            "The page variant is not a significant predictor of conversion in either model (p = {}) at the {} significance level.",
            p_values.join(", "),
            conclusions.significance_level
        )
    }
}

/// Summary & Conclusions paragraphs
pub fn conclusions(report: &Report) -> Vec<String> {
    let c = &report.conclusions;
    let mut paragraphs = Vec::new();

    let segment_effects: Vec<&PredictorEffect> = c
        .significant_predictors
        .iter()
        .filter(|e| e.predictor != VARIANT)
        .collect();
    if segment_effects.is_empty() {
        paragraphs.push(
            "No location or device predictor is significant in the logistic regression models."
                .to_string(),
        );
    } else {
        paragraphs.extend(segment_effects.into_iter().map(effect_sentence));
    }

    paragraphs.push(variant_sentence(c));

    let overall = if c.simulation_rejects_null && c.ztest_rejects_null {
        "The new page design has a statistically significant positive effect on conversion; \
         rolling it out is supported by the data."
    } else {
        "The overall impact of the new page design is not statistically significant. \
         The company may stick with the current page or run a longer or more targeted test."
    };
    paragraphs.push(overall.to_string());

    if let (Some(days), Some(range)) = (c.test_duration_days, report.overview.date_range) {
        paragraphs.push(format!(
            "The test ran for {} days ({} to {}).",
            days,
            range.first.format(DATE_FORMAT),
            range.last.format(DATE_FORMAT)
        ));
    }

    paragraphs
}
