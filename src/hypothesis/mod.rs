// Hypothesis tests for the landing page experiment
//
// H0: the new page converts at the same rate as the old page.
// H1: the new page converts at a higher rate.
//
// Two independent procedures are provided:
// - A Monte Carlo simulation of the null sampling distribution of the
//   difference in conversion rates (binomial draws at the pooled rate)
// - The closed-form two-proportion z-test (normal approximation)
//
// Both are one-sided in the "larger" direction when called with the
// treatment arm first. As the number of simulated trials grows, the simulated
// p-value converges to the z-test p-value.

mod simulation;
mod ztest;

pub use simulation::{
    simulate_differences, simulate_null, Histogram, HistogramBin, NullSimulation,
};
pub use ztest::{proportions_ztest, Alternative, ZTestResult};

use statrs::function::erf::{erfc, erfc_inv};
use std::f64::consts::SQRT_2;
use thiserror::Error;

/// Errors for hypothesis test inputs
#[derive(Error, Debug)]
pub enum HypothesisError {
    #[error("Cannot test a group with no observations")]
    EmptyGroup,

    #[error("Successes ({successes}) exceed observations ({observations})")]
    InvalidCounts { successes: u64, observations: u64 },

    #[error("Simulation needs at least one trial")]
    NoTrials,

    #[error("Invalid sampling distribution: {0}")]
    Distribution(String),
}

pub type Result<T> = std::result::Result<T, HypothesisError>;

/// Standard normal survival function P(Z > z)
pub fn normal_sf(z: f64) -> f64 {
    0.5 * erfc(z / SQRT_2)
}

/// Standard normal CDF P(Z <= z)
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / SQRT_2)
}

/// Standard normal quantile for probability `p` in (0, 1)
pub fn normal_quantile(p: f64) -> f64 {
    -SQRT_2 * erfc_inv(2.0 * p)
}
