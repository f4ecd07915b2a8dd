//! Conversion rate statistics
//!
//! Every statistic here is the arithmetic mean of the binary `converted`
//! outcome over some partition of the dataset. Empty partitions are not
//! guarded: their rate is `0 / 0 = NaN`.

use crate::dataset::{Category, Dataset, Observation, Variant};
use serde::Serialize;
use std::collections::BTreeMap;

/// Observation and conversion counts of one arm or group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ArmCounts {
    pub observations: u64,
    pub conversions: u64,
}

impl ArmCounts {
    /// Tally counts over a set of observations
    pub fn tally<'a>(observations: impl IntoIterator<Item = &'a Observation>) -> Self {
        observations
            .into_iter()
            .fold(Self::default(), |mut counts, observation| {
                counts.observations += 1;
                counts.conversions += u64::from(observation.converted);
                counts
            })
    }

    /// Conversion rate (NaN when there are no observations)
    pub fn rate(&self) -> f64 {
        self.conversions as f64 / self.observations as f64
    }
}

/// Conversion rate of one level of a categorical column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRate {
    pub label: String,
    pub observations: u64,
    pub conversions: u64,
    pub rate: f64,
}

/// Everything Part I of the report quotes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionSummary {
    pub overall_rate: f64,
    pub control: ArmCounts,
    pub treatment: ArmCounts,
    pub control_rate: f64,
    pub treatment_rate: f64,
    pub treatment_share: f64,
    pub by_location: Vec<GroupRate>,
    pub by_device: Vec<GroupRate>,
}

/// Proportion of all users who converted
pub fn overall_conversion_rate(dataset: &Dataset) -> f64 {
    ArmCounts::tally(dataset.observations()).rate()
}

/// Conversion rate within one arm
pub fn variant_conversion_rate(dataset: &Dataset, variant: Variant) -> f64 {
    variant_counts(dataset, variant).rate()
}

pub fn variant_counts(dataset: &Dataset, variant: Variant) -> ArmCounts {
    ArmCounts::tally(dataset.variant_partition(variant))
}

/// Proportion of users shown the new page
pub fn treatment_share(dataset: &Dataset) -> f64 {
    let treated = dataset.variant_partition(Variant::Treatment).count();
    treated as f64 / dataset.len() as f64
}

/// Conversion rate per level of `category`, ordered by level name
pub fn conversion_rate_by(dataset: &Dataset, category: Category) -> Vec<GroupRate> {
    let mut groups: BTreeMap<&str, ArmCounts> = BTreeMap::new();
    for observation in dataset.observations() {
        let counts = groups.entry(category.level(observation)).or_default();
        counts.observations += 1;
        counts.conversions += u64::from(observation.converted);
    }

    groups
        .into_iter()
        .map(|(label, counts)| GroupRate {
            label: label.to_string(),
            observations: counts.observations,
            conversions: counts.conversions,
            rate: counts.rate(),
        })
        .collect()
}

/// Compute all descriptive statistics in one pass over the report
pub fn summarize(dataset: &Dataset) -> ConversionSummary {
    let control = variant_counts(dataset, Variant::Control);
    let treatment = variant_counts(dataset, Variant::Treatment);

    ConversionSummary {
        overall_rate: overall_conversion_rate(dataset),
        control,
        treatment,
        control_rate: control.rate(),
        treatment_rate: treatment.rate(),
        treatment_share: treatment_share(dataset),
        by_location: conversion_rate_by(dataset, Category::Location),
        by_device: conversion_rate_by(dataset, Category::Device),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let csv = "\
timestamp,variant_id,converted,user_id,location,device
01/01/2024,0,1,1,Asia,Mobile
01/01/2024,0,0,2,Europe,Mobile
01/01/2024,0,0,3,Europe,Desktop
01/01/2024,1,1,4,Asia,Desktop
01/01/2024,1,1,5,Europe,Tablet
01/01/2024,1,0,6,Other,Mobile
01/01/2024,1,0,7,Asia,Mobile
01/01/2024,0,1,8,Other,Tablet
";
        Dataset::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_overall_rate() {
        assert_eq!(overall_conversion_rate(&dataset()), 0.5);
    }

    #[test]
    fn test_variant_rates() {
        let ds = dataset();
        assert_eq!(variant_conversion_rate(&ds, Variant::Control), 0.5);
        assert_eq!(variant_conversion_rate(&ds, Variant::Treatment), 0.5);
        assert_eq!(
            variant_counts(&ds, Variant::Treatment),
            ArmCounts {
                observations: 4,
                conversions: 2
            }
        );
    }

    #[test]
    fn test_treatment_share() {
        assert_eq!(treatment_share(&dataset()), 0.5);
    }

    #[test]
    fn test_rate_by_location_sorted_by_label() {
        let rates = conversion_rate_by(&dataset(), Category::Location);
        let labels: Vec<_> = rates.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Asia", "Europe", "Other"]);

        assert_eq!(rates[0].observations, 3);
        assert_eq!(rates[0].conversions, 2);
        assert!((rates[0].rate - 2.0 / 3.0).abs() < 1e-12);
        assert!((rates[1].rate - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(rates[2].rate, 0.5);
    }

    #[test]
    fn test_rate_by_device() {
        let rates = conversion_rate_by(&dataset(), Category::Device);
        let tablet = rates.iter().find(|g| g.label == "Tablet").unwrap();
        assert_eq!(tablet.rate, 1.0);
        let mobile = rates.iter().find(|g| g.label == "Mobile").unwrap();
        assert_eq!(mobile.rate, 0.25);
    }

    #[test]
    fn test_empty_partition_is_nan() {
        let csv = "timestamp,variant_id,converted,user_id,location,device\n01/01/2024,0,1,1,Asia,Mobile\n";
        let ds = Dataset::from_reader(csv.as_bytes()).unwrap();
        assert!(variant_conversion_rate(&ds, Variant::Treatment).is_nan());
        assert_eq!(treatment_share(&ds), 0.0);
    }

    #[test]
    fn test_summarize_is_consistent() {
        let summary = summarize(&dataset());
        assert_eq!(summary.control.observations + summary.treatment.observations, 8);
        assert_eq!(summary.control_rate, summary.control.rate());
        assert_eq!(summary.by_location.len(), 3);
        assert_eq!(summary.by_device.len(), 3);
    }
}
