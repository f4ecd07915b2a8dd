// Regression analysis of conversion against page variant, location and device
//
// Pipeline:
// 1. One-hot encode the categorical columns into a named design matrix
// 2. Diagnose multicollinearity with variance inflation factors
// 3. Fit two reduced logistic regression models by maximum likelihood
//
// The reduced predictor subsets are fixed (see `models`): the full one-hot
// matrix is exactly collinear (indicator groups sum to the intercept), which
// the full VIF table makes visible.

mod encoding;
mod logistic;
mod models;
mod vif;

pub use encoding::{
    encode, indicator_names, levels, DesignMatrix, EncodedData, INTERCEPT, VARIANT,
};
pub use logistic::{
    fit_logit, Coefficient, LogitFit, CONFIDENCE_LEVEL, MAX_ITERATIONS, TOLERANCE,
};
pub use models::{
    fit_model, fit_reduced_models, ModelReport, ModelSpec, DEVICE_MODEL, LOCATION_MODEL,
    REDUCED_MODELS,
};
pub use vif::{variance_inflation_factor, vif_table, VifEntry};

use thiserror::Error;

/// Errors for design construction and model fitting
#[derive(Error, Debug)]
pub enum RegressionError {
    #[error("Unknown design column '{0}'")]
    UnknownColumn(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Design matrix is empty")]
    EmptyDesign,

    #[error("Design matrix is rank deficient (rank {rank} < {columns} columns)")]
    RankDeficient { rank: usize, columns: usize },

    #[error("Information matrix is singular")]
    SingularInformation,

    #[error("Least squares failed: {0}")]
    LeastSquares(String),
}

pub type Result<T> = std::result::Result<T, RegressionError>;
