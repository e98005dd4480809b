//! Log message constants
//!
//! Centralizes the text of every log line so wording stays consistent between
//! the library and the sweep driver.

/// Driver lifecycle messages
pub mod application {
    pub const STARTING: &str = "Starting ROIC lever sweep";
    pub const FACTS_LOADED: &str = "Baseline facts loaded";
    pub const FINISHED: &str = "Sweep finished";
}

/// Fact table loading
pub mod facts {
    pub const TABLE_LOADED: &str = "Fact table loaded from file";
    pub const UNKNOWN_KEY: &str = "Ignoring unrecognised fact key";
    pub const UNBALANCED: &str =
        "Baseline balance sheet does not balance: assets differ from liabilities plus equity";
}

/// Projection engine
pub mod projection {
    pub const LEVERS_INITIALIZED: &str = "Levers initialized from baseline";
    pub const FLEET_RESIZED: &str = "Fleet resized to required trucks";
    pub const NEGATIVE_LANDFILL_LABOR: &str =
        "Landfill labor residual is negative; driver and depot costs exceed reported labor";
    pub const NEGATIVE_OTHER_OPEX: &str =
        "Other opex residual is negative; fleet-driven costs exceed reported other opex";
}

/// Scenario sweeps
pub mod scenarios {
    pub const SCENARIO_EVALUATED: &str = "Scenario evaluated";
    pub const SWEEP_COMPLETED: &str = "Scenario sweep completed";
}
