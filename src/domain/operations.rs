//! Steady-state operating rates derived from the baseline
//!
//! All per-unit rates the projection needs are computed once, up front, when a
//! model is built. A zero denominator in the baseline fails here with the
//! offending field named, before any projection can run.

use serde::{Deserialize, Serialize};

use crate::domain::facts::BaselineFacts;
use crate::domain::guard::{finite, ratio};
use crate::error::DomainError;

/// Per-unit rates of the baseline operation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperationsMetrics {
    pub lifts_per_truck_day: f64,
    pub avg_volume_per_lift: f64,
    pub avg_tonnes_per_m3: f64,
    pub driver_cost_per_truck_day: f64,
    pub fuel_cost_per_truck_day: f64,
    pub maintenance_cost_per_truck_day: f64,
    /// Baseline m3 collected per customer per year
    pub volume_per_customer: f64,
    /// Baseline disposal expense per tonne disposed
    pub cost_per_tonne: f64,
}

/// Other operating expense split into its truck-driven parts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpexDecomposition {
    pub remaining_other_opex: f64,
    pub fuel_cost: f64,
    pub maintenance_cost: f64,
}

impl OperationsMetrics {
    pub fn from_facts(facts: &BaselineFacts) -> Result<Self, DomainError> {
        let productivity = &facts.productivity;
        let truck = &facts.truck;
        let labor = &facts.labor;

        let truck_days = productivity.working_days_per_year * productivity.avg_num_trucks;
        if productivity.avg_num_trucks == 0.0 {
            return Err(DomainError::ZeroDenominator {
                field: "productivity.avg_num_trucks",
            });
        }
        let lifts_per_truck_day = ratio(
            productivity.total_lifts,
            truck_days,
            "productivity.working_days_per_year",
        )?;

        let km_per_truck_day = ratio(
            productivity.avg_km_per_truck_per_year,
            productivity.working_days_per_year,
            "productivity.working_days_per_year",
        )?;
        let litres_per_truck_day = ratio(km_per_truck_day, truck.fuel_econ_km_l, "truck.fuel_econ_km_l")?;

        Ok(Self {
            lifts_per_truck_day,
            avg_volume_per_lift: ratio(
                productivity.total_m3_collected,
                productivity.total_lifts,
                "productivity.total_lifts",
            )?,
            avg_tonnes_per_m3: ratio(
                productivity.total_tonnes_disposed,
                productivity.total_m3_collected,
                "productivity.total_m3_collected",
            )?,
            driver_cost_per_truck_day: finite(
                labor.driver_hourly_wage * labor.hours_per_shift,
                "driver_cost_per_truck_day",
            )?,
            fuel_cost_per_truck_day: finite(
                litres_per_truck_day * truck.fuel_cost_per_l,
                "fuel_cost_per_truck_day",
            )?,
            maintenance_cost_per_truck_day: ratio(
                truck.maintenance_per_truck_per_year,
                productivity.working_days_per_year,
                "productivity.working_days_per_year",
            )?,
            volume_per_customer: ratio(
                productivity.total_m3_collected,
                productivity.num_customers,
                "productivity.num_customers",
            )?,
            cost_per_tonne: ratio(
                facts.income_statement.opex.disposal,
                productivity.total_tonnes_disposed,
                "productivity.total_tonnes_disposed",
            )?,
        })
    }

    /// Fuel and maintenance at the baseline fleet, and what is left of other opex
    pub fn decompose_opex(&self, facts: &BaselineFacts) -> OpexDecomposition {
        let productivity = &facts.productivity;
        let fleet_days = productivity.avg_num_trucks * productivity.working_days_per_year;
        let fuel_cost = self.fuel_cost_per_truck_day * fleet_days;
        let maintenance_cost = self.maintenance_cost_per_truck_day * fleet_days;

        OpexDecomposition {
            remaining_other_opex: facts.income_statement.opex.other_opex
                - (fuel_cost + maintenance_cost),
            fuel_cost,
            maintenance_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fact_table::{FactGroup, FactTable};

    fn metrics() -> (BaselineFacts, OperationsMetrics) {
        let facts = FactTable::baseline().to_facts().unwrap();
        let metrics = OperationsMetrics::from_facts(&facts).unwrap();
        (facts, metrics)
    }

    #[test]
    fn test_baseline_rates() {
        let (_, metrics) = metrics();

        assert!((metrics.lifts_per_truck_day - 14.589_277_389).abs() < 1e-6);
        assert!((metrics.avg_volume_per_lift - 2.872_720_543).abs() < 1e-6);
        assert!((metrics.driver_cost_per_truck_day - 152.1).abs() < 1e-9);
        assert!((metrics.fuel_cost_per_truck_day - 213.379_415).abs() < 1e-4);
        assert!((metrics.maintenance_cost_per_truck_day - 84.134_191).abs() < 1e-4);
    }

    #[test]
    fn test_cost_per_tonne() {
        let (facts, metrics) = metrics();
        let expected = facts.income_statement.opex.disposal / facts.productivity.total_tonnes_disposed;
        assert_eq!(metrics.cost_per_tonne, expected);
    }

    #[test]
    fn test_zero_trucks_fails_fast() {
        let mut table = FactTable::baseline();
        table.set(FactGroup::Productivity, "avg_num_trucks", 0.0);
        let facts = table.to_facts().unwrap();

        assert_eq!(
            OperationsMetrics::from_facts(&facts),
            Err(DomainError::ZeroDenominator {
                field: "productivity.avg_num_trucks"
            })
        );
    }

    #[test]
    fn test_zero_fuel_economy_names_the_field() {
        let mut table = FactTable::baseline();
        table.set(FactGroup::Truck, "fuel_econ_km_l", 0.0);
        let facts = table.to_facts().unwrap();

        assert_eq!(
            OperationsMetrics::from_facts(&facts),
            Err(DomainError::ZeroDenominator {
                field: "truck.fuel_econ_km_l"
            })
        );
    }

    #[test]
    fn test_opex_decomposition_sums_to_reported_other_opex() {
        let (facts, metrics) = metrics();
        let split = metrics.decompose_opex(&facts);
        let total = split.remaining_other_opex + split.fuel_cost + split.maintenance_cost;

        assert!((total - facts.income_statement.opex.other_opex).abs() < 1e-6);
        assert!(split.remaining_other_opex > 0.0);
    }
}
