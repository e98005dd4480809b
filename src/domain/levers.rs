//! Scenario levers and the fixed assumptions that accompany them

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::guard::{finite, non_negative, positive, ratio};
use crate::domain::values::{CollectionShare, OverheadShare};
use crate::error::DomainError;

/// Fixed planning assumptions that are not observable in the baseline facts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Assumptions {
    /// Purchase price of one collection truck
    pub truck_cost: f64,
    pub truck_salvage_value: f64,
    pub truck_useful_life_years: f64,
    pub trucks_per_depot: f64,
    pub employees_per_depot: f64,
    /// Depot overhead as a share of depot labor
    pub depot_overhead_pct: OverheadShare,
    /// Share of operating revenue earned by collection; the rest is landfill revenue
    pub collection_allocation_fraction: CollectionShare,
    /// Elasticity of SG&A to collected volume
    pub sga_volume_elasticity: f64,
}

impl Assumptions {
    /// Reject assumptions that would divide by a non-positive quantity or
    /// run depreciation backwards
    pub fn validate(&self) -> Result<(), DomainError> {
        positive(
            self.truck_useful_life_years,
            "assumptions.truck_useful_life_years",
        )?;
        positive(self.trucks_per_depot, "assumptions.trucks_per_depot")?;
        positive(self.employees_per_depot, "assumptions.employees_per_depot")?;
        non_negative(self.truck_cost, "assumptions.truck_cost")?;
        non_negative(self.truck_salvage_value, "assumptions.truck_salvage_value")?;
        self.depreciable_amount()?;
        finite(self.sga_volume_elasticity, "assumptions.sga_volume_elasticity")?;
        Ok(())
    }

    fn depreciable_amount(&self) -> Result<f64, DomainError> {
        non_negative(
            self.truck_cost - self.truck_salvage_value,
            "assumptions.truck_cost - assumptions.truck_salvage_value",
        )
    }

    /// Straight-line annual depreciation of one truck
    pub fn depreciation_per_truck(&self) -> Result<f64, DomainError> {
        let life = positive(
            self.truck_useful_life_years,
            "assumptions.truck_useful_life_years",
        )?;
        ratio(
            self.depreciable_amount()?,
            life,
            "assumptions.truck_useful_life_years",
        )
    }
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            truck_cost: 350_000.0,
            truck_salvage_value: 50_000.0,
            truck_useful_life_years: 10.0,
            trucks_per_depot: 20.0,
            employees_per_depot: 5.0,
            depot_overhead_pct: OverheadShare::default(),
            collection_allocation_fraction: CollectionShare::default(),
            sga_volume_elasticity: 0.75,
        }
    }
}

/// The five primary scenario levers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Levers {
    pub lifts_per_truck_day: f64,
    pub avg_tonnes_per_m3: f64,
    pub revenue_per_m3: f64,
    pub num_customers: f64,
    pub trucks_total: u32,
}

/// Selects one primary lever for generic get/set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lever {
    LiftsPerTruckDay,
    AvgTonnesPerM3,
    RevenuePerM3,
    NumCustomers,
    TrucksTotal,
}

impl Lever {
    pub const ALL: [Lever; 5] = [
        Lever::LiftsPerTruckDay,
        Lever::AvgTonnesPerM3,
        Lever::RevenuePerM3,
        Lever::NumCustomers,
        Lever::TrucksTotal,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Lever::LiftsPerTruckDay => "lifts_per_truck_day",
            Lever::AvgTonnesPerM3 => "avg_tonnes_per_m3",
            Lever::RevenuePerM3 => "revenue_per_m3",
            Lever::NumCustomers => "num_customers",
            Lever::TrucksTotal => "trucks_total",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lever| lever.name() == name)
    }
}

impl fmt::Display for Lever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Levers {
    pub fn get(&self, lever: Lever) -> f64 {
        match lever {
            Lever::LiftsPerTruckDay => self.lifts_per_truck_day,
            Lever::AvgTonnesPerM3 => self.avg_tonnes_per_m3,
            Lever::RevenuePerM3 => self.revenue_per_m3,
            Lever::NumCustomers => self.num_customers,
            Lever::TrucksTotal => f64::from(self.trucks_total),
        }
    }

    /// Set one lever, rejecting values the projection could not use
    pub fn set(&mut self, lever: Lever, value: f64) -> Result<(), DomainError> {
        let invalid = |reason| DomainError::InvalidLever {
            lever: lever.name(),
            value,
            reason,
        };
        if !value.is_finite() {
            return Err(invalid("value must be finite"));
        }
        if value < 0.0 {
            return Err(invalid("value must not be negative"));
        }

        match lever {
            Lever::LiftsPerTruckDay => {
                if value == 0.0 {
                    return Err(invalid("a truck must make at least some lifts"));
                }
                self.lifts_per_truck_day = value;
            }
            Lever::AvgTonnesPerM3 => self.avg_tonnes_per_m3 = value,
            Lever::RevenuePerM3 => self.revenue_per_m3 = value,
            Lever::NumCustomers => self.num_customers = value,
            Lever::TrucksTotal => {
                if value.fract() != 0.0 || value > f64::from(u32::MAX) {
                    return Err(invalid("trucks come in whole numbers"));
                }
                self.trucks_total = value as u32;
            }
        }
        Ok(())
    }
}
