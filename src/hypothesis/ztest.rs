// Closed-form two-proportion z-test
//
// Normal approximation to the difference of two binomial proportions with a
// pooled variance estimate under H0: p1 = p2.
//
//   p̂ = (x1 + x2) / (n1 + n2)
//   z  = (x1/n1 - x2/n2) / sqrt(p̂ (1 - p̂) (1/n1 + 1/n2))

use super::{normal_cdf, normal_sf, HypothesisError, Result};
use crate::stats::ArmCounts;
use serde::{Deserialize, Serialize};

/// Direction of the alternative hypothesis, relative to the first sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alternative {
    /// H1: p1 != p2
    TwoSided,
    /// H1: p1 > p2
    Larger,
    /// H1: p1 < p2
    Smaller,
}

/// Outcome of a two-proportion z-test
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZTestResult {
    pub statistic: f64,
    pub p_value: f64,
    pub alternative: Alternative,
    pub pooled_proportion: f64,
    pub standard_error: f64,
}

/// Two-proportion z-test of `first` against `second`
///
/// Deterministic: the same counts always produce bit-identical results.
///
/// # Example
/// ```
/// use abtest_report::hypothesis::{proportions_ztest, Alternative};
/// use abtest_report::stats::ArmCounts;
///
/// let treatment = ArmCounts { observations: 2500, conversions: 583 };
/// let control = ArmCounts { observations: 2500, conversions: 554 };
/// let result = proportions_ztest(treatment, control, Alternative::Larger).unwrap();
/// assert!((result.statistic - 0.97845).abs() < 1e-5);
/// ```
pub fn proportions_ztest(
    first: ArmCounts,
    second: ArmCounts,
    alternative: Alternative,
) -> Result<ZTestResult> {
    for counts in [first, second] {
        if counts.observations == 0 {
            return Err(HypothesisError::EmptyGroup);
        }
        if counts.conversions > counts.observations {
            return Err(HypothesisError::InvalidCounts {
                successes: counts.conversions,
                observations: counts.observations,
            });
        }
    }

    let n1 = first.observations as f64;
    let n2 = second.observations as f64;
    let pooled = (first.conversions + second.conversions) as f64 / (n1 + n2);
    let standard_error = (pooled * (1.0 - pooled) * (1.0 / n1 + 1.0 / n2)).sqrt();
    let statistic = (first.rate() - second.rate()) / standard_error;

    let p_value = match alternative {
        Alternative::Larger => normal_sf(statistic),
        Alternative::Smaller => normal_cdf(statistic),
        Alternative::TwoSided => 2.0 * normal_sf(statistic.abs()),
    };

    Ok(ZTestResult {
        statistic,
        p_value,
        alternative,
        pooled_proportion: pooled,
        standard_error,
    })
}
