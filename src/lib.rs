//! abtest-report - conversion analysis of a landing page A/B test
//!
//! This library loads the experiment export, computes conversion rates,
//! tests whether the new page converts better than the old one (simulation
//! under the null and a two-proportion z-test), fits logistic regression
//! models on the user segments and renders the results as one report.

pub mod analysis;
pub mod chart;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod html_output;
pub mod hypothesis;
pub mod json_output;
pub mod narrative;
pub mod regression;
pub mod stats;
pub mod text_output;
