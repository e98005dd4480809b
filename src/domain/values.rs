//! Validated scalar types used by the projection
//!
//! Rates and fractions are constrained on construction so that a lever edit can
//! never smuggle a NaN or an out-of-range percentage into the engine.

use nutype::nutype;

/// Corporate tax rate applied to EBIT when computing NOPAT
#[nutype(
    validate(finite, greater_or_equal = 0.0, less_or_equal = 1.0),
    default = 0.21,
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        PartialOrd,
        Default,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct TaxRate(f64);

/// Depot overhead expressed as a share of depot labor cost
#[nutype(
    validate(finite, greater_or_equal = 0.0, less_or_equal = 1.0),
    default = 0.5,
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        PartialOrd,
        Default,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct OverheadShare(f64);

/// Share of operating revenue attributed to collection rather than landfill
#[nutype(
    validate(finite, greater_or_equal = 0.0, less_or_equal = 1.0),
    default = 0.8,
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        PartialOrd,
        Default,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct CollectionShare(f64);

impl CollectionShare {
    /// The landfill share (1 - collection share)
    pub fn complement(&self) -> f64 {
        1.0 - self.into_inner()
    }
}
