// One-hot encoding of the categorical columns into a design matrix
//
// Every level of `location` and `device` becomes an indicator column named
// `<column>_<level>` (levels in sorted order). No level is dropped here: the
// baseline category is chosen by the predictor subset of each model.

use super::{RegressionError, Result};
use crate::dataset::{Category, Dataset};
use nalgebra::{DMatrix, DVector};
use std::collections::BTreeSet;

/// Name of the constant column
pub const INTERCEPT: &str = "intercept";

/// Name of the treatment indicator column
pub const VARIANT: &str = "variant_id";

/// Named-column numeric matrix used as regression input
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    columns: Vec<String>,
    data: DMatrix<f64>,
}

impl DesignMatrix {
    pub fn new(columns: Vec<String>, data: DMatrix<f64>) -> Result<Self> {
        if columns.len() != data.ncols() {
            return Err(RegressionError::DimensionMismatch {
                expected: data.ncols(),
                actual: columns.len(),
            });
        }
        Ok(Self { columns, data })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| RegressionError::UnknownColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<DVector<f64>> {
        let index = self.column_index(name)?;
        Ok(self.data.column(index).into_owned())
    }

    /// Sub-matrix with the named columns, in the given order
    pub fn select(&self, names: &[&str]) -> Result<DesignMatrix> {
        let indices = names
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Result<Vec<_>>>()?;

        Ok(DesignMatrix {
            columns: names.iter().map(|n| n.to_string()).collect(),
            data: self.data.select_columns(indices.iter()),
        })
    }

    /// Values of the first `n` rows
    pub fn head(&self, n: usize) -> Vec<Vec<f64>> {
        (0..n.min(self.nrows()))
            .map(|r| self.data.row(r).iter().copied().collect())
            .collect()
    }
}

/// Design matrix plus the binary outcome vector
#[derive(Debug, Clone)]
pub struct EncodedData {
    pub design: DesignMatrix,
    pub outcome: DVector<f64>,
}

/// Sorted distinct levels of one categorical column
pub fn levels(dataset: &Dataset, category: Category) -> Vec<String> {
    dataset
        .observations()
        .iter()
        .map(|o| category.level(o))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Indicator column names for one categorical column
pub fn indicator_names(category: Category, levels: &[String]) -> Vec<String> {
    levels
        .iter()
        .map(|level| format!("{}_{}", category.column_name(), level))
        .collect()
}

/// Encode the dataset as `intercept, variant_id, location_*, device_*`
pub fn encode(dataset: &Dataset) -> EncodedData {
    let location_levels = levels(dataset, Category::Location);
    let device_levels = levels(dataset, Category::Device);

    let mut columns = vec![INTERCEPT.to_string(), VARIANT.to_string()];
    columns.extend(indicator_names(Category::Location, &location_levels));
    columns.extend(indicator_names(Category::Device, &device_levels));

    let observations = dataset.observations();
    let location_offset = 2;
    let device_offset = location_offset + location_levels.len();

    let mut data = DMatrix::<f64>::zeros(observations.len(), columns.len());
    for (row, observation) in observations.iter().enumerate() {
        data[(row, 0)] = 1.0;
        data[(row, 1)] = f64::from(observation.variant.id());

        // Levels come from this dataset, so every lookup succeeds
        if let Ok(i) = location_levels.binary_search(&observation.location) {
            data[(row, location_offset + i)] = 1.0;
        }
        if let Ok(i) = device_levels.binary_search(&observation.device) {
            data[(row, device_offset + i)] = 1.0;
        }
    }

    let outcome = DVector::from_iterator(
        observations.len(),
        observations.iter().map(|o| f64::from(u8::from(o.converted))),
    );

    tracing::debug!(
        rows = observations.len(),
        columns = columns.len(),
        "encoded design matrix"
    );

    EncodedData {
        design: DesignMatrix { columns, data },
        outcome,
    }
}
