// The two reduced logistic regression models of the report
//
// Predictor subsets are fixed. Each keeps the intercept and the treatment
// indicator and leaves out at least one level per categorical column so the
// dropped levels act as the baseline:
// - Location model: baseline location is `Other`, device not modeled
// - Device model: Asia versus every other location, baseline device `Tablet`

use super::encoding::{EncodedData, INTERCEPT, VARIANT};
use super::logistic::{fit_logit, LogitFit};
use super::vif::{vif_table, VifEntry};
use super::Result;
use serde::Serialize;

/// A named predictor subset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: &'static str,
    pub predictors: &'static [&'static str],
}

pub const LOCATION_MODEL: ModelSpec = ModelSpec {
    name: "Model 1 - Reduced Variables (location)",
    predictors: &[
        INTERCEPT,
        VARIANT,
        "location_Asia",
        "location_North America",
        "location_Europe",
    ],
};

pub const DEVICE_MODEL: ModelSpec = ModelSpec {
    name: "Model 2 - Reduced Variables (device)",
    predictors: &[
        INTERCEPT,
        VARIANT,
        "location_Asia",
        "device_Desktop",
        "device_Mobile",
    ],
};

/// Models fitted by the report, in order
pub const REDUCED_MODELS: [ModelSpec; 2] = [LOCATION_MODEL, DEVICE_MODEL];

/// VIF diagnostics and fit of one reduced model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReport {
    pub name: String,
    pub predictors: Vec<String>,
    pub vif: Vec<VifEntry>,
    pub fit: LogitFit,
}

/// Recompute VIFs on the subset, then fit `converted ~ subset`
pub fn fit_model(encoded: &EncodedData, spec: &ModelSpec) -> Result<ModelReport> {
    let design = encoded.design.select(spec.predictors)?;
    let vif = vif_table(&design)?;
    let fit = fit_logit(&design, &encoded.outcome)?;

    tracing::info!(
        model = spec.name,
        converged = fit.converged,
        iterations = fit.iterations,
        "fitted reduced model"
    );

    Ok(ModelReport {
        name: spec.name.to_string(),
        predictors: design.columns().to_vec(),
        vif,
        fit,
    })
}

/// Fit every model in [`REDUCED_MODELS`]
pub fn fit_reduced_models(encoded: &EncodedData) -> Result<Vec<ModelReport>> {
    REDUCED_MODELS
        .iter()
        .map(|spec| fit_model(encoded, spec))
        .collect()
}
