//! Financial projection engine
//!
//! A [`Model`] pairs one set of [`Levers`] with a shared, read-only
//! [`BaselineFacts`] and derives a hypothetical income statement and
//! invested-capital position from them. Every `new_*` query is recomputed from
//! the current levers on each call; nothing is cached.
//!
//! Evaluation order is fixed: levers are initialized (which sizes the baseline
//! fleet with [`Model::trucks_required`]), then served demand is clamped to the
//! capacity of `trucks_total`. Changing a lever never resizes the fleet on its
//! own; call [`Model::resize_fleet`] for that.
//!
//! Two figures are residual allocations pinned to the *baseline* truck count:
//! [`Model::landfill_labor_cost`] and [`Model::other_opex_remaining`]. Neither
//! is ever evaluated against `trucks_total`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::domain::facts::BaselineFacts;
use crate::domain::guard::{ceil_count, finite, positive, ratio};
use crate::domain::levers::{Assumptions, Lever, Levers};
use crate::domain::operations::OperationsMetrics;
use crate::domain::values::TaxRate;
use crate::error::{DomainError, StateError};
use crate::infrastructure::log_messages::projection as log;
use crate::Result;

/// One scenario: baseline reference, derived rates, assumptions and levers
#[derive(Debug, Clone)]
pub struct Model {
    facts: Arc<BaselineFacts>,
    metrics: OperationsMetrics,
    assumptions: Assumptions,
    tax_rate: TaxRate,
    levers: Option<Levers>,
}

/// Operating expense of a projection, by category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpexBreakdown {
    pub labor_subcontract: f64,
    pub disposal: f64,
    pub other_operating: f64,
    pub sga: f64,
    /// Other income/expense, management fees and non-recurring items
    pub pass_through: f64,
    pub total: f64,
}

/// Snapshot of every projected figure for the current levers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub levers: Levers,
    pub total_demand: f64,
    pub demand_served: f64,
    pub trucks_required: u32,
    pub new_revenue: f64,
    pub new_opex: OpexBreakdown,
    pub new_depreciation: f64,
    pub new_ebitda: f64,
    pub new_ebit: f64,
    pub new_nopat: f64,
    pub new_fixed_assets: f64,
    pub new_invested_capital: f64,
    pub new_roic: f64,
}

impl Model {
    /// Build a model over shared baseline facts.
    ///
    /// Fails if the assumptions are unusable or the baseline cannot produce
    /// finite operating rates. Levers start uninitialized.
    #[instrument(skip(facts))]
    pub fn new(facts: Arc<BaselineFacts>, assumptions: Assumptions) -> Result<Self> {
        assumptions.validate()?;
        let metrics = OperationsMetrics::from_facts(&facts)?;
        let model = Self {
            facts,
            metrics,
            assumptions,
            tax_rate: TaxRate::default(),
            levers: None,
        };

        let landfill_labor = model.landfill_labor_cost()?;
        if landfill_labor < 0.0 {
            warn!(landfill_labor, "{}", log::NEGATIVE_LANDFILL_LABOR);
        }
        let other_opex = model.other_opex_remaining()?;
        if other_opex < 0.0 {
            warn!(other_opex, "{}", log::NEGATIVE_OTHER_OPEX);
        }
        Ok(model)
    }

    pub fn with_tax_rate(mut self, tax_rate: TaxRate) -> Self {
        self.tax_rate = tax_rate;
        self
    }

    /// Populate the levers from the baseline. Runs once per model.
    #[instrument(skip(self))]
    pub fn initialize_levers(&mut self) -> Result<()> {
        if self.levers.is_some() {
            return Err(StateError::LeversAlreadyInitialized.into());
        }

        let revenue_per_m3 = ratio(
            self.facts.income_statement.revenue.operating_revenue
                * self.assumptions.collection_allocation_fraction.into_inner(),
            self.facts.productivity.total_m3_collected,
            "productivity.total_m3_collected",
        )?;
        let num_customers = self.facts.productivity.num_customers;
        let trucks_total = self.fleet_for(num_customers, self.metrics.lifts_per_truck_day)?;

        let levers = Levers {
            lifts_per_truck_day: self.metrics.lifts_per_truck_day,
            avg_tonnes_per_m3: self.metrics.avg_tonnes_per_m3,
            revenue_per_m3,
            num_customers,
            trucks_total,
        };
        debug!(?levers, "{}", log::LEVERS_INITIALIZED);
        self.levers = Some(levers);
        Ok(())
    }

    /// Replace the levers wholesale, with or without prior initialization
    pub fn set_levers(&mut self, levers: Levers) {
        self.levers = Some(levers);
    }

    pub fn is_initialized(&self) -> bool {
        self.levers.is_some()
    }

    pub fn levers(&self) -> std::result::Result<&Levers, StateError> {
        self.levers.as_ref().ok_or(StateError::LeversUninitialized)
    }

    pub(crate) fn levers_mut(&mut self) -> std::result::Result<&mut Levers, StateError> {
        self.levers.as_mut().ok_or(StateError::LeversUninitialized)
    }

    pub fn lever(&self, lever: Lever) -> Result<f64> {
        Ok(self.levers()?.get(lever))
    }

    pub fn set_lever(&mut self, lever: Lever, value: f64) -> Result<()> {
        self.levers_mut()?.set(lever, value)?;
        Ok(())
    }

    pub fn facts(&self) -> &BaselineFacts {
        &self.facts
    }

    pub fn metrics(&self) -> &OperationsMetrics {
        &self.metrics
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    fn baseline_trucks(&self) -> f64 {
        self.facts.productivity.avg_num_trucks
    }

    fn working_days(&self) -> f64 {
        self.facts.productivity.working_days_per_year
    }

    /// `trucks_total` as a count the cost formulas can use
    fn fleet(&self) -> Result<f64> {
        let trucks = self.levers()?.trucks_total;
        if trucks == 0 {
            return Err(DomainError::InfeasibleFleet { trucks }.into());
        }
        Ok(f64::from(trucks))
    }

    fn fleet_for(&self, num_customers: f64, lifts_per_truck_day: f64) -> Result<u32> {
        let lifts_per_truck_day = positive(lifts_per_truck_day, "lifts_per_truck_day")?;
        let annual_demand = finite(
            num_customers * self.metrics.volume_per_customer,
            "total_demand",
        )?;
        let daily_demand = ratio(
            annual_demand,
            self.working_days(),
            "productivity.working_days_per_year",
        )?;
        let per_truck = ratio(
            daily_demand,
            self.metrics.avg_volume_per_lift * lifts_per_truck_day,
            "avg_volume_per_lift",
        )?;
        Ok(ceil_count(per_truck, "trucks_required")?)
    }

    // --- demand and capacity ---

    /// Annual m3 demanded by the current customer base
    pub fn total_demand(&self) -> Result<f64> {
        let levers = self.levers()?;
        Ok(finite(
            levers.num_customers * self.metrics.volume_per_customer,
            "total_demand",
        )?)
    }

    /// Smallest whole fleet that can lift the whole of current demand
    pub fn trucks_required(&self) -> Result<u32> {
        let levers = self.levers()?;
        self.fleet_for(levers.num_customers, levers.lifts_per_truck_day)
    }

    /// Set `trucks_total` to [`Model::trucks_required`] and return it
    #[instrument(skip(self))]
    pub fn resize_fleet(&mut self) -> Result<u32> {
        let required = self.trucks_required()?;
        self.levers_mut()?.trucks_total = required;
        debug!(trucks_total = required, "{}", log::FLEET_RESIZED);
        Ok(required)
    }

    /// Annual m3 the current fleet can lift
    pub fn annual_capacity(&self) -> Result<f64> {
        let levers = self.levers()?;
        let lifts_per_truck_day = positive(levers.lifts_per_truck_day, "lifts_per_truck_day")?;
        Ok(finite(
            self.fleet()?
                * lifts_per_truck_day
                * self.metrics.avg_volume_per_lift
                * self.working_days(),
            "annual_capacity",
        )?)
    }

    /// Demand the fleet can actually serve; the excess is lost, not deferred
    pub fn demand_served(&self) -> Result<f64> {
        Ok(self.total_demand()?.min(self.annual_capacity()?))
    }

    /// Collection revenue forgone because demand exceeds capacity
    pub fn lost_revenue(&self) -> Result<f64> {
        let unmet = self.total_demand()? - self.demand_served()?;
        Ok(finite(unmet * self.levers()?.revenue_per_m3, "lost_revenue")?)
    }

    /// Served volume relative to the baseline volume, minus one
    pub fn volume_growth(&self) -> Result<f64> {
        let ratio = ratio(
            self.demand_served()?,
            self.facts.productivity.total_m3_collected,
            "productivity.total_m3_collected",
        )?;
        Ok(ratio - 1.0)
    }

    // --- labor ---

    pub fn driver_labor_cost(&self, trucks: f64) -> Result<f64> {
        Ok(finite(
            self.metrics.driver_cost_per_truck_day * self.working_days() * trucks,
            "driver_labor_cost",
        )?)
    }

    /// Depot staff for the depots `trucks` require, paid at the driver rate
    pub fn depot_labor_cost(&self, trucks: f64) -> Result<f64> {
        let depots = ceil_count(
            ratio(
                trucks,
                positive(self.assumptions.trucks_per_depot, "assumptions.trucks_per_depot")?,
                "assumptions.trucks_per_depot",
            )?,
            "depots",
        )?;
        Ok(finite(
            f64::from(depots)
                * self.assumptions.employees_per_depot
                * self.working_days()
                * self.metrics.driver_cost_per_truck_day,
            "depot_labor_cost",
        )?)
    }

    /// Labor expense not explained by drivers or depots at the baseline fleet
    pub fn landfill_labor_cost(&self) -> Result<f64> {
        let baseline = self.baseline_trucks();
        Ok(finite(
            self.facts.income_statement.opex.labor_subcontract
                - self.driver_labor_cost(baseline)?
                - self.depot_labor_cost(baseline)?,
            "landfill_labor_cost",
        )?)
    }

    pub fn new_labor_subcontract(&self) -> Result<f64> {
        let trucks = self.fleet()?;
        Ok(self.driver_labor_cost(trucks)?
            + self.depot_labor_cost(trucks)?
            + self.landfill_labor_cost()?)
    }

    // --- other operating cost ---

    pub fn fuel_cost(&self, trucks: f64) -> Result<f64> {
        Ok(finite(
            self.metrics.fuel_cost_per_truck_day * self.working_days() * trucks,
            "fuel_cost",
        )?)
    }

    pub fn maintenance_cost(&self, trucks: f64) -> Result<f64> {
        Ok(finite(
            self.metrics.maintenance_cost_per_truck_day * self.working_days() * trucks,
            "maintenance_cost",
        )?)
    }

    pub fn depot_overhead_cost(&self, trucks: f64) -> Result<f64> {
        Ok(self.assumptions.depot_overhead_pct.into_inner() * self.depot_labor_cost(trucks)?)
    }

    /// Other opex not explained by fuel, maintenance or depot overhead at the baseline fleet
    pub fn other_opex_remaining(&self) -> Result<f64> {
        let baseline = self.baseline_trucks();
        let fleet_driven = self.depot_overhead_cost(baseline)?
            + self.maintenance_cost(baseline)?
            + self.fuel_cost(baseline)?;
        Ok(finite(
            self.facts.income_statement.opex.other_opex - fleet_driven,
            "other_opex_remaining",
        )?)
    }

    pub fn new_other_operating_cost(&self) -> Result<f64> {
        let trucks = self.fleet()?;
        Ok(self.fuel_cost(trucks)?
            + self.maintenance_cost(trucks)?
            + self.depot_overhead_cost(trucks)?
            + self.other_opex_remaining()?)
    }

    // --- disposal and SG&A ---

    /// Baseline disposal expense per tonne disposed
    pub fn cost_per_tonne(&self) -> f64 {
        self.metrics.cost_per_tonne
    }

    pub fn new_disposal_cost(&self) -> Result<f64> {
        let levers = self.levers()?;
        Ok(finite(
            levers.avg_tonnes_per_m3 * self.demand_served()? * self.cost_per_tonne(),
            "new_disposal_cost",
        )?)
    }

    /// SG&A scaled with served volume at the configured elasticity
    pub fn new_sga(&self) -> Result<f64> {
        let elasticity = self.assumptions.sga_volume_elasticity;
        Ok(finite(
            self.facts.income_statement.opex.sga * (1.0 + elasticity * self.volume_growth()?),
            "new_sga",
        )?)
    }

    // --- income statement ---

    /// Revenue from the landfill side of the business, unaffected by any lever
    pub fn landfill_revenue(&self) -> f64 {
        self.facts.income_statement.revenue.operating_revenue
            * self.assumptions.collection_allocation_fraction.complement()
    }

    pub fn new_revenue(&self) -> Result<f64> {
        let levers = self.levers()?;
        Ok(finite(
            self.demand_served()? * levers.revenue_per_m3 + self.landfill_revenue(),
            "new_revenue",
        )?)
    }

    pub fn new_opex_breakdown(&self) -> Result<OpexBreakdown> {
        let labor_subcontract = self.new_labor_subcontract()?;
        let disposal = self.new_disposal_cost()?;
        let other_operating = self.new_other_operating_cost()?;
        let sga = self.new_sga()?;
        let pass_through = self.facts.income_statement.opex.pass_through();
        let total = finite(
            labor_subcontract + disposal + other_operating + sga + pass_through,
            "new_operating_cost",
        )?;

        Ok(OpexBreakdown {
            labor_subcontract,
            disposal,
            other_operating,
            sga,
            pass_through,
            total,
        })
    }

    pub fn new_operating_cost(&self) -> Result<f64> {
        Ok(self.new_opex_breakdown()?.total)
    }

    /// Straight-line charge for the baseline fleet
    pub fn baseline_fleet_depreciation(&self) -> Result<f64> {
        Ok(self.assumptions.depreciation_per_truck()? * self.baseline_trucks())
    }

    /// Depreciation on everything but the fleet, held at its baseline level
    pub fn non_fleet_depreciation(&self) -> Result<f64> {
        Ok(self.facts.income_statement.da.depreciation - self.baseline_fleet_depreciation()?)
    }

    /// Non-fleet depreciation plus straight-line depreciation of the larger of
    /// the current and baseline fleets; trucks are never disposed of.
    pub fn new_depreciation(&self) -> Result<f64> {
        let depreciated_fleet = self.fleet()?.max(self.baseline_trucks());
        Ok(finite(
            self.non_fleet_depreciation()?
                + self.assumptions.depreciation_per_truck()? * depreciated_fleet,
            "new_depreciation",
        )?)
    }

    pub fn new_ebitda(&self) -> Result<f64> {
        Ok(self.new_revenue()? - self.new_operating_cost()?)
    }

    pub fn new_ebit(&self) -> Result<f64> {
        let amortization = self.facts.income_statement.da.amortization;
        Ok(self.new_ebitda()? - (amortization + self.new_depreciation()?))
    }

    pub fn new_nopat(&self, tax_rate: TaxRate) -> Result<f64> {
        Ok(self.new_ebit()? * (1.0 - tax_rate.into_inner()))
    }

    /// Book value added by growing the fleet beyond the baseline.
    ///
    /// The baseline fleet and other-property book values are each scaled by
    /// the fleet growth ratio and added once. A smaller fleet adds nothing.
    pub fn new_fixed_assets(&self) -> Result<f64> {
        let growth = ratio(
            self.fleet()?,
            self.baseline_trucks(),
            "productivity.avg_num_trucks",
        )? - 1.0;
        let fixed_assets = &self.facts.balance_sheet.fixed_assets;
        Ok(finite(
            (fixed_assets.of_which_fleet + fixed_assets.of_which_other) * growth.max(0.0),
            "new_fixed_assets",
        )?)
    }

    pub fn new_invested_capital(&self) -> Result<f64> {
        Ok(self.facts.balance_sheet.invested_capital() + self.new_fixed_assets()?)
    }

    pub fn new_roic(&self) -> Result<f64> {
        Ok(ratio(
            self.new_nopat(self.tax_rate)?,
            self.new_invested_capital()?,
            "new_invested_capital",
        )?)
    }

    /// Every projected figure at once
    pub fn project(&self) -> Result<ProjectionResult> {
        let new_opex = self.new_opex_breakdown()?;
        let new_revenue = self.new_revenue()?;
        let new_depreciation = self.new_depreciation()?;
        let new_ebitda = new_revenue - new_opex.total;
        let new_ebit =
            new_ebitda - (self.facts.income_statement.da.amortization + new_depreciation);
        let new_nopat = new_ebit * (1.0 - self.tax_rate.into_inner());
        let new_fixed_assets = self.new_fixed_assets()?;
        let new_invested_capital = self.facts.balance_sheet.invested_capital() + new_fixed_assets;

        Ok(ProjectionResult {
            levers: *self.levers()?,
            total_demand: self.total_demand()?,
            demand_served: self.demand_served()?,
            trucks_required: self.trucks_required()?,
            new_revenue,
            new_opex,
            new_depreciation,
            new_ebitda,
            new_ebit,
            new_nopat,
            new_fixed_assets,
            new_invested_capital,
            new_roic: ratio(new_nopat, new_invested_capital, "new_invested_capital")?,
        })
    }
}

/// `base` compounded at `rate` for each of the next `horizon` years
pub fn growth_forecast(base: f64, horizon: u32, rate: f64) -> Vec<f64> {
    (1..=horizon)
        .map(|year| base * (1.0 + rate).powf(f64::from(year)))
        .collect()
}
