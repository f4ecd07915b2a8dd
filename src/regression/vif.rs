// Variance inflation factor (multicollinearity diagnostic)
//
// VIF_i = 1 / (1 - R²_i), where R²_i comes from the least-squares regression
// of column i on all other columns of the same matrix. No intercept is added:
// R²_i is centered only when the other columns already span a constant
// (explicit constant column or indicator groups summing to one), uncentered
// otherwise. Exact collinearity gives +inf.

use super::encoding::DesignMatrix;
use super::{RegressionError, Result};
use nalgebra::{DMatrix, DVector};
use serde::Serialize;

/// Singular values below this are treated as zero in least squares
const SVD_EPS: f64 = 1e-10;

/// Relative residual below which a fit is considered exact
const EXACT_FIT_TOLERANCE: f64 = 1e-12;

/// VIF of one design column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VifEntry {
    pub feature: String,
    pub vif: f64,
}

impl VifEntry {
    /// Conventional rule of thumb for problematic collinearity
    pub fn is_severe(&self) -> bool {
        self.vif > 5.0
    }
}

/// Least-squares residual sum of squares of `y` on `x`
fn residual_sum_of_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<f64> {
    let beta = x
        .clone()
        .svd(true, true)
        .solve(y, SVD_EPS)
        .map_err(|e| RegressionError::LeastSquares(e.to_string()))?;
    let residuals = y - x * beta;
    Ok(residuals.norm_squared())
}

/// Whether the column space of `x` contains the all-ones vector
fn spans_constant(x: &DMatrix<f64>) -> Result<bool> {
    let ones = DVector::from_element(x.nrows(), 1.0);
    let ssr = residual_sum_of_squares(x, &ones)?;
    Ok(ssr <= EXACT_FIT_TOLERANCE * x.nrows() as f64)
}

/// VIF of column `index` of `x`
pub fn variance_inflation_factor(x: &DMatrix<f64>, index: usize) -> Result<f64> {
    if index >= x.ncols() {
        return Err(RegressionError::DimensionMismatch {
            expected: x.ncols(),
            actual: index + 1,
        });
    }
    if x.nrows() == 0 {
        return Err(RegressionError::EmptyDesign);
    }
    // A lone column has nothing to be collinear with
    if x.ncols() == 1 {
        return Ok(1.0);
    }

    let y = x.column(index).into_owned();
    let others: Vec<usize> = (0..x.ncols()).filter(|&c| c != index).collect();
    let x_others = x.select_columns(others.iter());

    let ssr = residual_sum_of_squares(&x_others, &y)?;
    if ssr <= EXACT_FIT_TOLERANCE * y.norm_squared().max(1.0) {
        return Ok(f64::INFINITY);
    }

    let tss = if spans_constant(&x_others)? {
        let mean = y.mean();
        y.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
    } else {
        y.norm_squared()
    };

    let r_squared = 1.0 - ssr / tss;
    Ok(1.0 / (1.0 - r_squared))
}

/// VIF of every column of a design matrix, in column order
pub fn vif_table(design: &DesignMatrix) -> Result<Vec<VifEntry>> {
    design
        .columns()
        .iter()
        .enumerate()
        .map(|(index, feature)| {
            Ok(VifEntry {
                feature: feature.clone(),
                vif: variance_inflation_factor(design.matrix(), index)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Intercept plus two weakly related regressors
    fn well_conditioned() -> DMatrix<f64> {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let b = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        DMatrix::from_fn(8, 3, |r, c| match c {
            0 => 1.0,
            1 => a[r],
            _ => b[r],
        })
    }

    #[test]
    fn test_independent_columns_have_low_vif() {
        let x = well_conditioned();
        for index in 1..3 {
            let vif = variance_inflation_factor(&x, index).unwrap();
            assert!((1.0..2.0).contains(&vif), "vif[{}] = {}", index, vif);
        }
    }

    #[test]
    fn test_vif_matches_centered_r_squared() {
        // Two regressors plus intercept: VIF = 1 / (1 - corr²)
        let x = well_conditioned();
        let a: Vec<f64> = (0..8).map(|r| x[(r, 1)]).collect();
        let b: Vec<f64> = (0..8).map(|r| x[(r, 2)]).collect();
        let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
        let (ma, mb) = (mean(&a), mean(&b));
        let cov: f64 = a.iter().zip(&b).map(|(x, y)| (x - ma) * (y - mb)).sum();
        let va: f64 = a.iter().map(|x| (x - ma).powi(2)).sum();
        let vb: f64 = b.iter().map(|y| (y - mb).powi(2)).sum();
        let corr2 = cov * cov / (va * vb);

        let vif = variance_inflation_factor(&x, 1).unwrap();
        assert!((vif - 1.0 / (1.0 - corr2)).abs() < 1e-9);
    }

    #[test]
    fn test_near_duplicate_column_is_severe() {
        let mut x = well_conditioned();
        x = x.insert_column(3, 0.0);
        for r in 0..8 {
            x[(r, 3)] = x[(r, 1)] * 2.0 + if r % 2 == 0 { 0.01 } else { -0.01 };
        }
        let vif = variance_inflation_factor(&x, 1).unwrap();
        assert!(vif > 5.0, "vif = {}", vif);
    }

    #[test]
    fn test_exact_collinearity_is_infinite() {
        // Indicator columns summing to the intercept
        let x = DMatrix::from_row_slice(
            4,
            3,
            &[
                1.0, 1.0, 0.0, //
                1.0, 0.0, 1.0, //
                1.0, 1.0, 0.0, //
                1.0, 0.0, 1.0, //
            ],
        );
        for index in 0..3 {
            assert_eq!(variance_inflation_factor(&x, index).unwrap(), f64::INFINITY);
        }
    }

    #[test]
    fn test_single_column() {
        let x = DMatrix::from_element(5, 1, 1.0);
        assert_eq!(variance_inflation_factor(&x, 0).unwrap(), 1.0);
    }

    #[test]
    fn test_index_out_of_range() {
        let x = well_conditioned();
        assert!(variance_inflation_factor(&x, 3).is_err());
    }

    #[test]
    fn test_vif_table_names_columns() {
        let design = DesignMatrix::new(
            vec!["intercept".into(), "a".into(), "b".into()],
            well_conditioned(),
        )
        .unwrap();
        let table = vif_table(&design).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table[1].feature, "a");
        assert!(!table[1].is_severe());
    }
}
