//! Canned sensitivity sweeps built on the scenario runner

use std::num::NonZeroUsize;
use std::sync::Arc;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::application::scenario_runner::{ScenarioOutcome, ScenarioRunner};
use crate::domain::facts::BaselineFacts;
use crate::domain::levers::{Assumptions, Lever};
use crate::domain::projection::Model;
use crate::domain::values::TaxRate;
use crate::Result;

/// Factory producing a model with levers initialized from the baseline
pub fn baseline_factory(
    facts: Arc<BaselineFacts>,
    assumptions: Assumptions,
    tax_rate: TaxRate,
) -> impl Fn() -> Result<Model> + Send + Sync {
    move || {
        let mut model = Model::new(Arc::clone(&facts), assumptions)?.with_tax_rate(tax_rate);
        model.initialize_levers()?;
        Ok(model)
    }
}

/// `steps` evenly spaced values from `min` to `max` inclusive
pub fn linspace(min: f64, max: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (steps - 1) as f64;
            (0..steps).map(|i| min + step * i as f64).collect()
        }
    }
}

/// Which lever a ROIC sensitivity sweep moves
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    /// Sweep values are absolute lifts per truck day
    #[display("lifts_per_truck_day")]
    LiftsPerTruckDay,
    /// Sweep values are relative increases in tonnes per m3
    #[display("density")]
    Density,
    /// Sweep values are relative increases in customers; the fleet is held
    #[display("growth")]
    Growth,
    /// As `Growth`, but the fleet is resized to serve all demand
    #[display("growth_with_fleet_resize")]
    GrowthWithFleetResize,
}

impl Sensitivity {
    pub fn apply(&self, model: &mut Model, value: f64) -> Result<()> {
        match self {
            Sensitivity::LiftsPerTruckDay => model.set_lever(Lever::LiftsPerTruckDay, value),
            Sensitivity::Density => scale_lever(model, Lever::AvgTonnesPerM3, value),
            Sensitivity::Growth => scale_lever(model, Lever::NumCustomers, value),
            Sensitivity::GrowthWithFleetResize => {
                scale_lever(model, Lever::NumCustomers, value)?;
                model.resize_fleet()?;
                Ok(())
            }
        }
    }
}

fn scale_lever(model: &mut Model, lever: Lever, increase: f64) -> Result<()> {
    let current = model.lever(lever)?;
    model.set_lever(lever, current * (1.0 + increase))
}

/// ROIC for each sweep value, in order
pub fn roic_sensitivity<F>(
    runner: &ScenarioRunner<F>,
    sensitivity: Sensitivity,
    values: Vec<f64>,
    workers: NonZeroUsize,
) -> Result<Vec<ScenarioOutcome<f64, f64>>>
where
    F: Fn() -> Result<Model> + Sync,
{
    let mutate = |model: &mut Model, value: &f64| sensitivity.apply(model, *value);
    let query = |model: &Model| model.new_roic();
    if workers.get() == 1 {
        runner.run(values, mutate, query)
    } else {
        runner.run_parallel(values, mutate, query, workers)
    }
}

/// Fleet needed to serve each customer count at baseline productivity
pub fn trucks_for_customers<F>(
    runner: &ScenarioRunner<F>,
    customer_counts: Vec<f64>,
) -> Result<Vec<ScenarioOutcome<f64, u32>>>
where
    F: Fn() -> Result<Model>,
{
    runner.run(
        customer_counts,
        |model, customers: &f64| model.set_lever(Lever::NumCustomers, *customers),
        |model| model.trucks_required(),
    )
}

/// Collection revenue lost for each (customers, trucks) pairing
pub fn lost_revenue<F>(
    runner: &ScenarioRunner<F>,
    pairings: Vec<(f64, u32)>,
) -> Result<Vec<ScenarioOutcome<(f64, u32), f64>>>
where
    F: Fn() -> Result<Model>,
{
    runner.run(
        pairings,
        |model, (customers, trucks): &(f64, u32)| {
            model.set_lever(Lever::NumCustomers, *customers)?;
            model.set_lever(Lever::TrucksTotal, f64::from(*trucks))
        },
        |model| model.lost_revenue(),
    )
}

/// A finished ROIC sweep, ready for export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub sensitivity: Sensitivity,
    pub baseline_roic: f64,
    pub points: Vec<(f64, f64)>,
}

/// Input/output pairs as `(x, y)` tuples for plotting
pub fn as_series<P: Clone, T: Clone>(outcomes: &[ScenarioOutcome<P, T>]) -> Vec<(P, T)> {
    outcomes
        .iter()
        .map(|outcome| (outcome.input.clone(), outcome.output.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fact_table::FactTable;

    fn runner() -> ScenarioRunner<impl Fn() -> Result<Model> + Send + Sync> {
        let facts = Arc::new(FactTable::baseline().to_facts().unwrap());
        ScenarioRunner::new(baseline_factory(
            facts,
            Assumptions::default(),
            TaxRate::default(),
        ))
    }

    fn one() -> NonZeroUsize {
        NonZeroUsize::new(1).unwrap()
    }

    #[test]
    fn test_linspace_includes_both_ends() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_fewer_lifts_per_truck_lowers_roic() {
        let outcomes =
            roic_sensitivity(&runner(), Sensitivity::LiftsPerTruckDay, vec![10.0, 12.0], one())
                .unwrap();
        let baseline = runner().run(vec![()], |_, _| Ok(()), |m| m.new_roic()).unwrap()[0].output;

        assert!(outcomes[0].output < outcomes[1].output);
        assert!(outcomes[1].output < baseline);
    }

    #[test]
    fn test_denser_waste_costs_more_to_dispose() {
        let outcomes =
            roic_sensitivity(&runner(), Sensitivity::Density, vec![0.0, 0.1], one()).unwrap();
        assert!(outcomes[1].output < outcomes[0].output);
    }

    #[test]
    fn test_growth_without_trucks_is_capacity_bound() {
        let held = roic_sensitivity(&runner(), Sensitivity::Growth, vec![0.0, 0.1], one()).unwrap();
        let resized =
            roic_sensitivity(&runner(), Sensitivity::GrowthWithFleetResize, vec![0.1], one())
                .unwrap();

        assert!((held[1].output - held[0].output).abs() < 1e-9);
        assert!(resized[0].output > held[1].output);
    }

    #[test]
    fn test_parallel_sensitivity_keeps_order() {
        let values = linspace(10.0, 18.0, 9);
        let sequential =
            roic_sensitivity(&runner(), Sensitivity::LiftsPerTruckDay, values.clone(), one())
                .unwrap();
        let parallel = roic_sensitivity(
            &runner(),
            Sensitivity::LiftsPerTruckDay,
            values,
            NonZeroUsize::new(4).unwrap(),
        )
        .unwrap();

        assert_eq!(as_series(&sequential), as_series(&parallel));
    }

    #[test]
    fn test_trucks_for_customers() {
        let outcomes = trucks_for_customers(&runner(), vec![22_519.0, 1.1 * 22_519.0]).unwrap();
        assert_eq!(outcomes[0].output, 78);
        assert_eq!(outcomes[1].output, 86);
    }

    #[test]
    fn test_lost_revenue_only_when_short_of_trucks() {
        let outcomes = lost_revenue(
            &runner(),
            vec![(22_519.0, 78), (2.0 * 22_519.0, 78), (2.0 * 22_519.0, 200)],
        )
        .unwrap();

        assert!(outcomes[0].output.abs() < 1e-3);
        assert!(outcomes[1].output > 0.0);
        assert_eq!(outcomes[2].output, 0.0);
    }
}
