// Binary logistic regression by maximum likelihood
//
// Newton-Raphson on the log-likelihood:
//   score       U(β) = Xᵀ (y - p)
//   information I(β) = Xᵀ W X,  W = diag(p (1 - p))
//   β ← β + I(β)⁻¹ U(β)
// Standard errors come from the inverse information at the optimum. The
// iteration limit and step tolerance are fixed; hitting the limit is logged
// and reported through `converged = false`, not treated as an error.

use super::encoding::DesignMatrix;
use super::{RegressionError, Result};
use crate::hypothesis::{normal_quantile, normal_sf};
use nalgebra::{DMatrix, DVector};
use serde::Serialize;

/// Newton iteration limit
pub const MAX_ITERATIONS: usize = 35;

/// Convergence threshold on the largest parameter step
pub const TOLERANCE: f64 = 1e-8;

/// Coverage of the reported confidence intervals
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Singular values below this fraction of the largest count as zero
const RANK_TOLERANCE: f64 = 1e-10;

/// Estimate and inference for one predictor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub z_value: f64,
    /// Two-sided p-value of H0: coefficient = 0
    pub p_value: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    /// exp(estimate): multiplicative change in the odds of converting
    pub odds_ratio: f64,
}

/// Fitted logistic regression model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogitFit {
    pub coefficients: Vec<Coefficient>,
    pub log_likelihood: f64,
    pub null_log_likelihood: f64,
    /// McFadden's pseudo R²: 1 - llf / llnull
    pub pseudo_r_squared: f64,
    pub iterations: usize,
    pub converged: bool,
    pub observations: usize,
}

impl LogitFit {
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }
}

fn sigmoid(eta: f64) -> f64 {
    if eta >= 0.0 {
        1.0 / (1.0 + (-eta).exp())
    } else {
        let e = eta.exp();
        e / (1.0 + e)
    }
}

/// ln(1 + e^x) without overflow
fn log1p_exp(x: f64) -> f64 {
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

fn xlogx(x: f64) -> f64 {
    if x > 0.0 {
        x * x.ln()
    } else {
        0.0
    }
}

/// Score vector and observed information matrix at `beta`
fn score_and_information(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    beta: &DVector<f64>,
) -> (DVector<f64>, DMatrix<f64>) {
    let probabilities = (x * beta).map(sigmoid);
    let score = x.transpose() * (y - &probabilities);

    let mut weighted = x.clone();
    for (i, mut row) in weighted.row_iter_mut().enumerate() {
        let p = probabilities[i];
        row *= p * (1.0 - p);
    }
    let information = x.transpose() * weighted;

    (score, information)
}

/// Numerical rank of the design; a rank-deficient design has no unique MLE
fn numerical_rank(x: &DMatrix<f64>) -> usize {
    let singular_values = x.clone().svd(false, false).singular_values;
    let largest = singular_values.max();
    singular_values
        .iter()
        .filter(|&&s| s > largest * RANK_TOLERANCE)
        .count()
}

fn log_likelihood(x: &DMatrix<f64>, y: &DVector<f64>, beta: &DVector<f64>) -> f64 {
    (x * beta)
        .iter()
        .zip(y.iter())
        .map(|(&eta, &yi)| yi * eta - log1p_exp(eta))
        .sum()
}

/// Fit `outcome ~ design` (the design must carry its own intercept column)
pub fn fit_logit(design: &DesignMatrix, outcome: &DVector<f64>) -> Result<LogitFit> {
    let x = design.matrix();
    let (n, k) = (x.nrows(), x.ncols());
    if n == 0 || k == 0 {
        return Err(RegressionError::EmptyDesign);
    }
    if outcome.len() != n {
        return Err(RegressionError::DimensionMismatch {
            expected: n,
            actual: outcome.len(),
        });
    }
    let rank = numerical_rank(x);
    if rank < k {
        return Err(RegressionError::RankDeficient { rank, columns: k });
    }

    let mut beta = DVector::<f64>::zeros(k);
    let mut converged = false;
    let mut iterations = 0;

    for iteration in 1..=MAX_ITERATIONS {
        iterations = iteration;
        let (score, information) = score_and_information(x, outcome, &beta);
        let step = information
            .cholesky()
            .ok_or(RegressionError::SingularInformation)?
            .solve(&score);
        if step.iter().any(|v| !v.is_finite()) {
            return Err(RegressionError::SingularInformation);
        }
        beta += &step;

        tracing::trace!(iteration, max_step = step.amax(), "newton step");
        if step.amax() < TOLERANCE {
            converged = true;
            break;
        }
    }

    if !converged {
        tracing::warn!(
            iterations,
            columns = ?design.columns(),
            "logistic regression did not converge"
        );
    }

    let (_, information) = score_and_information(x, outcome, &beta);
    let covariance = information
        .cholesky()
        .ok_or(RegressionError::SingularInformation)?
        .inverse();

    let critical = normal_quantile(0.5 + CONFIDENCE_LEVEL / 2.0);
    let coefficients = design
        .columns()
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let estimate = beta[j];
            let std_error = covariance[(j, j)].sqrt();
            let z_value = estimate / std_error;
            Coefficient {
                name: name.clone(),
                estimate,
                std_error,
                z_value,
                p_value: 2.0 * normal_sf(z_value.abs()),
                ci_lower: estimate - critical * std_error,
                ci_upper: estimate + critical * std_error,
                odds_ratio: estimate.exp(),
            }
        })
        .collect();

    let log_likelihood = log_likelihood(x, outcome, &beta);
    let mean = outcome.mean();
    let null_log_likelihood = n as f64 * (xlogx(mean) + xlogx(1.0 - mean));
    let pseudo_r_squared = 1.0 - log_likelihood / null_log_likelihood;

    tracing::debug!(iterations, converged, log_likelihood, "fitted logit model");

    Ok(LogitFit {
        coefficients,
        log_likelihood,
        null_log_likelihood,
        pseudo_r_squared,
        iterations,
        converged,
        observations: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logit(p: f64) -> f64 {
        (p / (1.0 - p)).ln()
    }

    /// Design with intercept and one binary group indicator
    ///
    /// group 0: `c0` conversions out of `n0`; group 1: `c1` out of `n1`
    fn two_group(n0: usize, c0: usize, n1: usize, c1: usize) -> (DesignMatrix, DVector<f64>) {
        let n = n0 + n1;
        let x = DMatrix::from_fn(n, 2, |r, c| match c {
            0 => 1.0,
            _ => {
                if r >= n0 {
                    1.0
                } else {
                    0.0
                }
            }
        });
        let y = DVector::from_fn(n, |r, _| {
            let converted = if r < n0 { r < c0 } else { r - n0 < c1 };
            if converted {
                1.0
            } else {
                0.0
            }
        });
        let design = DesignMatrix::new(vec!["intercept".into(), "group".into()], x).unwrap();
        (design, y)
    }

    #[test]
    fn test_two_group_closed_form() {
        let (design, y) = two_group(400, 80, 600, 180);
        let fit = fit_logit(&design, &y).unwrap();
        assert!(fit.converged);

        let p0: f64 = 80.0 / 400.0;
        let p1: f64 = 180.0 / 600.0;
        let intercept = fit.coefficient("intercept").unwrap();
        let group = fit.coefficient("group").unwrap();

        assert!((intercept.estimate - logit(p0)).abs() < 1e-8);
        assert!((group.estimate - (logit(p1) - logit(p0))).abs() < 1e-8);

        // Woolf standard errors for a 2x2 table
        let se_intercept = (1.0 / 80.0 + 1.0 / 320.0_f64).sqrt();
        let se_group = (1.0 / 80.0 + 1.0 / 320.0 + 1.0 / 180.0 + 1.0 / 420.0_f64).sqrt();
        assert!((intercept.std_error - se_intercept).abs() < 1e-8);
        assert!((group.std_error - se_group).abs() < 1e-8);

        assert!((group.odds_ratio - (p1 / (1.0 - p1)) / (p0 / (1.0 - p0))).abs() < 1e-8);
        assert!(group.p_value < 0.01);
    }

    #[test]
    fn test_confidence_interval_brackets_estimate() {
        let (design, y) = two_group(300, 60, 300, 75);
        let fit = fit_logit(&design, &y).unwrap();
        for c in &fit.coefficients {
            assert!(c.ci_lower < c.estimate && c.estimate < c.ci_upper);
            let half_width = (c.ci_upper - c.ci_lower) / 2.0;
            assert!((half_width - 1.959963984540054 * c.std_error).abs() < 1e-8);
            assert!((c.z_value - c.estimate / c.std_error).abs() < 1e-12);
        }
    }

    #[test]
    fn test_log_likelihoods() {
        let (design, y) = two_group(400, 80, 600, 180);
        let fit = fit_logit(&design, &y).unwrap();

        let ll = 80.0 * 0.2f64.ln()
            + 320.0 * 0.8f64.ln()
            + 180.0 * 0.3f64.ln()
            + 420.0 * 0.7f64.ln();
        let p = 260.0 / 1000.0f64;
        let ll_null = 260.0 * p.ln() + 740.0 * (1.0 - p).ln();

        assert!((fit.log_likelihood - ll).abs() < 1e-6);
        assert!((fit.null_log_likelihood - ll_null).abs() < 1e-6);
        assert!(fit.pseudo_r_squared > 0.0 && fit.pseudo_r_squared < 1.0);
        assert_eq!(fit.observations, 1000);
    }

    #[test]
    fn test_intercept_only_model() {
        let x = DMatrix::from_element(50, 1, 1.0);
        let y = DVector::from_fn(50, |r, _| if r < 10 { 1.0 } else { 0.0 });
        let design = DesignMatrix::new(vec!["intercept".into()], x).unwrap();
        let fit = fit_logit(&design, &y).unwrap();

        assert!((fit.coefficients[0].estimate - logit(0.2)).abs() < 1e-8);
        assert!(fit.pseudo_r_squared.abs() < 1e-10);
    }

    #[test]
    fn test_collinear_design_is_rank_deficient() {
        let x = DMatrix::from_fn(20, 3, |r, c| match c {
            0 => 1.0,
            1 => (r % 2) as f64,
            _ => 1.0 - (r % 2) as f64,
        });
        let y = DVector::from_fn(20, |r, _| if r % 3 == 0 { 1.0 } else { 0.0 });
        let design = DesignMatrix::new(vec!["intercept".into(), "a".into(), "b".into()], x).unwrap();
        let err = fit_logit(&design, &y).unwrap_err();
        assert!(matches!(
            err,
            RegressionError::RankDeficient {
                rank: 2,
                columns: 3
            }
        ));
    }

    #[test]
    fn test_outcome_length_mismatch() {
        let (design, _) = two_group(10, 2, 10, 3);
        let y = DVector::zeros(5);
        assert!(matches!(
            fit_logit(&design, &y),
            Err(RegressionError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_numeric_helpers() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!((sigmoid(800.0) - 1.0).abs() < 1e-15);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!((log1p_exp(1000.0) - 1000.0).abs() < 1e-9);
        assert!((log1p_exp(0.0) - 2f64.ln()).abs() < 1e-15);
        assert_eq!(xlogx(0.0), 0.0);
    }
}
