//! Checked arithmetic for the projection pipeline
//!
//! Every division and every derived figure goes through these helpers so that a
//! degenerate input surfaces as a [`DomainError`] at the point it is produced
//! instead of travelling downstream as NaN or infinity.

use crate::error::DomainError;

/// Relative distance from an integer under which a fleet quotient is treated as exact
pub const FLEET_ROUNDING_TOLERANCE: f64 = 1e-9;

/// `numerator / denominator`, rejecting a zero or non-finite denominator
pub fn ratio(numerator: f64, denominator: f64, field: &'static str) -> Result<f64, DomainError> {
    if denominator == 0.0 {
        return Err(DomainError::ZeroDenominator { field });
    }
    if !denominator.is_finite() {
        return Err(DomainError::NonFinite { quantity: field });
    }
    finite(numerator / denominator, field)
}

/// Passes `value` through if it is finite
pub fn finite(value: f64, quantity: &'static str) -> Result<f64, DomainError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DomainError::NonFinite { quantity })
    }
}

/// Passes `value` through if it is finite and strictly positive
pub fn positive(value: f64, quantity: &'static str) -> Result<f64, DomainError> {
    let value = finite(value, quantity)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(DomainError::NonPositive { quantity, value })
    }
}

/// Passes `value` through if it is finite and not negative
pub fn non_negative(value: f64, quantity: &'static str) -> Result<f64, DomainError> {
    let value = finite(value, quantity)?;
    if value < 0.0 {
        return Err(DomainError::Negative { quantity, value });
    }
    Ok(value)
}

/// Ceiling of a non-negative quotient, snapping values within
/// [`FLEET_ROUNDING_TOLERANCE`] of an integer onto that integer.
///
/// `78.00000000000001` trucks is 78 trucks, not 79.
pub fn ceil_count(value: f64, quantity: &'static str) -> Result<u32, DomainError> {
    let value = finite(value, quantity)?;
    if value < 0.0 {
        return Err(DomainError::NonPositive { quantity, value });
    }
    let nearest = value.round();
    let snapped = if (value - nearest).abs() <= FLEET_ROUNDING_TOLERANCE * value.max(1.0) {
        nearest
    } else {
        value.ceil()
    };
    if snapped > f64::from(u32::MAX) {
        return Err(DomainError::NonFinite { quantity });
    }
    Ok(snapped as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_rejects_zero_denominator() {
        assert_eq!(
            ratio(1.0, 0.0, "truck.fuel_econ_km_l"),
            Err(DomainError::ZeroDenominator {
                field: "truck.fuel_econ_km_l"
            })
        );
        assert_eq!(ratio(6.0, 3.0, "x"), Ok(2.0));
    }

    #[test]
    fn test_finite_rejects_nan_and_infinity() {
        assert!(finite(f64::NAN, "x").is_err());
        assert!(finite(f64::INFINITY, "x").is_err());
        assert_eq!(finite(-3.5, "x"), Ok(-3.5));
    }

    #[test]
    fn test_positive_rejects_zero() {
        assert!(matches!(
            positive(0.0, "lifts_per_truck_day"),
            Err(DomainError::NonPositive { .. })
        ));
    }

    #[test]
    fn test_non_negative_accepts_zero() {
        assert_eq!(non_negative(0.0, "x"), Ok(0.0));
        assert_eq!(
            non_negative(-1.0, "assumptions.truck_salvage_value"),
            Err(DomainError::Negative {
                quantity: "assumptions.truck_salvage_value",
                value: -1.0
            })
        );
    }

    #[test]
    fn test_ceil_count_rounds_up_fractional_trucks() {
        assert_eq!(ceil_count(77.2, "trucks"), Ok(78));
        assert_eq!(ceil_count(0.0, "trucks"), Ok(0));
    }

    #[test]
    fn test_ceil_count_absorbs_floating_point_noise() {
        assert_eq!(ceil_count(78.000_000_000_01, "trucks"), Ok(78));
        assert_eq!(ceil_count(77.999_999_999_99, "trucks"), Ok(78));
        assert_eq!(ceil_count(78.001, "trucks"), Ok(79));
    }

    #[test]
    fn test_ceil_count_rejects_negative() {
        assert!(ceil_count(-1.0, "trucks").is_err());
    }
}
