//! Scenario orchestration on top of the projection engine
//!
//! Reporting and plotting are left to callers; this layer only produces
//! ordered input/output pairs.

pub mod scenario_runner;
pub mod sensitivity;

pub use scenario_runner::{ScenarioOutcome, ScenarioRunner};
pub use sensitivity::{baseline_factory, linspace, roic_sensitivity, Sensitivity, SweepReport};
