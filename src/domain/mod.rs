//! Domain types and the projection engine
//!
//! Baseline facts flow one way: fact table, then typed facts, then operating
//! metrics, then the levers and projections of a [`projection::Model`].

pub mod fact_table;
pub mod facts;
pub mod guard;
pub mod levers;
pub mod operations;
pub mod projection;
pub mod values;

pub use fact_table::{FactGroup, FactTable};
pub use facts::BaselineFacts;
pub use levers::{Assumptions, Lever, Levers};
pub use operations::{OperationsMetrics, OpexDecomposition};
pub use projection::{growth_forecast, Model, OpexBreakdown, ProjectionResult};
pub use values::{CollectionShare, OverheadShare, TaxRate};
