//! ROIC Levers - a financial projection and sensitivity engine
//!
//! Derives a hypothetical income statement and invested-capital position for
//! a waste-collection business from fixed baseline facts and a handful of
//! operational levers, and sweeps those levers to show how they move ROIC.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use domain::Model;
pub use error::{Error, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_baseline_model_reproduces_reported_roic() {
        let facts = Arc::new(domain::FactTable::baseline().to_facts().unwrap());
        let mut model = Model::new(Arc::clone(&facts), domain::Assumptions::default()).unwrap();
        model.initialize_levers().unwrap();

        let direct = facts.roic(domain::TaxRate::default()).unwrap();
        let projected = model.new_roic().unwrap();
        assert!((projected - direct).abs() / direct < 1e-9);
    }
}
