// Null-hypothesis simulation of the difference in conversion rates
//
// Under H0 both arms convert with the pooled observed rate. Each trial draws
// one binomial count per arm (sized like the real arm) and records
// treatment_rate - control_rate. The p-value is the fraction of trials whose
// difference strictly exceeds the observed difference.

use super::{HypothesisError, Result};
use crate::stats::ArmCounts;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Binomial, Distribution};
use serde::Serialize;

/// Empirical null distribution and the resulting one-sided p-value
#[derive(Debug, Clone, Serialize)]
pub struct NullSimulation {
    /// Conversion probability used for both arms
    pub null_rate: f64,
    pub treatment_size: u64,
    pub control_size: u64,
    /// Observed treatment rate minus control rate
    pub observed_difference: f64,
    pub trials: usize,
    /// Seed used, if the run was made reproducible
    pub seed: Option<u64>,
    pub p_value: f64,
    pub mean_difference: f64,
    pub std_difference: f64,
    pub histogram: Histogram,
    /// Raw simulated differences
    #[serde(skip)]
    pub differences: Vec<f64>,
}

/// One histogram bin over `[lower, upper)` (the last bin is closed)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width histogram spanning the sample range
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    pub fn from_values(values: &[f64], bin_count: usize) -> Self {
        if values.is_empty() || bin_count == 0 {
            return Self::default();
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        // Degenerate sample: widen to a unit interval around the value
        let (min, max) = if max > min {
            (min, max)
        } else {
            (min - 0.5, max + 0.5)
        };
        let width = (max - min) / bin_count as f64;

        let mut bins: Vec<HistogramBin> = (0..bin_count)
            .map(|i| HistogramBin {
                lower: min + width * i as f64,
                upper: if i + 1 == bin_count {
                    max
                } else {
                    min + width * (i + 1) as f64
                },
                count: 0,
            })
            .collect();

        for &value in values {
            let index = (((value - min) / width) as usize).min(bin_count - 1);
            bins[index].count += 1;
        }

        Self { bins }
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    pub fn max_count(&self) -> usize {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }
}

/// Draw `trials` simulated rate differences at `null_rate`
pub fn simulate_differences<R: Rng + ?Sized>(
    null_rate: f64,
    treatment_size: u64,
    control_size: u64,
    trials: usize,
    rng: &mut R,
) -> Result<Vec<f64>> {
    if treatment_size == 0 || control_size == 0 {
        return Err(HypothesisError::EmptyGroup);
    }

    let treatment = Binomial::new(treatment_size, null_rate)
        .map_err(|e| HypothesisError::Distribution(e.to_string()))?;
    let control = Binomial::new(control_size, null_rate)
        .map_err(|e| HypothesisError::Distribution(e.to_string()))?;

    let differences = (0..trials)
        .map(|_| {
            let new_rate = treatment.sample(&mut *rng) as f64 / treatment_size as f64;
            let old_rate = control.sample(&mut *rng) as f64 / control_size as f64;
            new_rate - old_rate
        })
        .collect();

    Ok(differences)
}

/// Run the null simulation for the observed arms
///
/// With `seed = None` the generator is seeded from OS entropy and the
/// p-value varies from run to run.
pub fn simulate_null(
    treatment: ArmCounts,
    control: ArmCounts,
    trials: usize,
    seed: Option<u64>,
    histogram_bins: usize,
) -> Result<NullSimulation> {
    if trials == 0 {
        return Err(HypothesisError::NoTrials);
    }

    let total = treatment.observations + control.observations;
    let null_rate = (treatment.conversions + control.conversions) as f64 / total as f64;
    let observed_difference = treatment.rate() - control.rate();

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let differences = simulate_differences(
        null_rate,
        treatment.observations,
        control.observations,
        trials,
        &mut rng,
    )?;

    let exceeding = differences
        .iter()
        .filter(|&&d| d > observed_difference)
        .count();
    let p_value = exceeding as f64 / trials as f64;

    let mean_difference = differences.iter().sum::<f64>() / trials as f64;
    let std_difference = (differences
        .iter()
        .map(|d| (d - mean_difference).powi(2))
        .sum::<f64>()
        / trials as f64)
        .sqrt();

    tracing::debug!(
        trials,
        null_rate,
        observed_difference,
        p_value,
        "null simulation complete"
    );

    Ok(NullSimulation {
        null_rate,
        treatment_size: treatment.observations,
        control_size: control.observations,
        observed_difference,
        trials,
        seed,
        p_value,
        mean_difference,
        std_difference,
        histogram: Histogram::from_values(&differences, histogram_bins),
        differences,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_counts_every_value() {
        let values = vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];
        let hist = Histogram::from_values(&values, 5);
        assert_eq!(hist.bins.len(), 5);
        assert_eq!(hist.total(), values.len());
        // Max value lands in the closed last bin
        assert_eq!(hist.bins[4].upper, 1.0);
        assert!(hist.bins[4].count >= 1);
    }

    #[test]
    fn test_histogram_edges_are_contiguous() {
        let values = vec![-0.03, -0.01, 0.0, 0.02, 0.025];
        let hist = Histogram::from_values(&values, 4);
        for pair in hist.bins.windows(2) {
            assert!((pair[0].upper - pair[1].lower).abs() < 1e-15);
        }
        assert_eq!(hist.bins[0].lower, -0.03);
    }

    #[test]
    fn test_histogram_degenerate_inputs() {
        assert!(Histogram::from_values(&[], 10).bins.is_empty());
        assert!(Histogram::from_values(&[1.0], 0).bins.is_empty());

        let constant = Histogram::from_values(&[2.0, 2.0, 2.0], 3);
        assert_eq!(constant.total(), 3);
        assert_eq!(constant.max_count(), 3);
    }

    #[test]
    fn test_simulate_differences_length_and_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let diffs = simulate_differences(0.3, 100, 120, 500, &mut rng).unwrap();
        assert_eq!(diffs.len(), 500);
        assert!(diffs.iter().all(|d| (-1.0..=1.0).contains(d)));
    }

    #[test]
    fn test_simulate_differences_rejects_bad_rate() {
        let mut rng = StdRng::seed_from_u64(7);
        let err = simulate_differences(1.5, 100, 100, 10, &mut rng).unwrap_err();
        assert!(matches!(err, HypothesisError::Distribution(_)));
    }

    #[test]
    fn test_zero_trials_rejected() {
        let arm = ArmCounts {
            observations: 10,
            conversions: 3,
        };
        assert!(matches!(
            simulate_null(arm, arm, 0, Some(1), 30),
            Err(HypothesisError::NoTrials)
        ));
    }

    #[test]
    fn test_null_rate_is_pooled() {
        let treatment = ArmCounts {
            observations: 100,
            conversions: 30,
        };
        let control = ArmCounts {
            observations: 300,
            conversions: 50,
        };
        let sim = simulate_null(treatment, control, 100, Some(3), 10).unwrap();
        assert_eq!(sim.null_rate, 80.0 / 400.0);
        assert!((sim.observed_difference - (0.3 - 50.0 / 300.0)).abs() < 1e-15);
        assert_eq!(sim.histogram.total(), 100);
        assert_eq!(sim.differences.len(), 100);
    }
}
