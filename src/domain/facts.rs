//! Baseline facts for the collection business
//!
//! These are the historical figures every scenario is measured against. They are
//! loaded once, wrapped in an `Arc`, and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::domain::guard;
use crate::domain::values::TaxRate;
use crate::error::DomainError;

/// Fleet productivity over the baseline year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Productivity {
    pub avg_num_trucks: f64,
    pub total_lifts: f64,
    pub total_m3_collected: f64,
    pub avg_km_per_truck_per_year: f64,
    pub total_tonnes_disposed: f64,
    pub working_days_per_year: f64,
    pub num_customers: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Truck {
    /// Body capacity in m3
    pub capacity: f64,
    pub fuel_econ_km_l: f64,
    pub fuel_cost_per_l: f64,
    pub maintenance_per_truck_per_year: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Labor {
    pub driver_hourly_wage: f64,
    pub hours_per_shift: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Revenue {
    pub operating_revenue: f64,
}

/// Operating expense lines, as reported
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpEx {
    pub labor_subcontract: f64,
    pub disposal: f64,
    pub other_opex: f64,
    pub sga: f64,
    pub other_inc_exp: f64,
    pub management_fees: f64,
    pub non_rec_items: f64,
}

impl OpEx {
    pub fn total(&self) -> f64 {
        self.labor_subcontract
            + self.disposal
            + self.other_opex
            + self.sga
            + self.other_inc_exp
            + self.management_fees
            + self.non_rec_items
    }

    /// Lines carried into every scenario unchanged
    pub fn pass_through(&self) -> f64 {
        self.other_inc_exp + self.management_fees + self.non_rec_items
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepreciationAndAmortization {
    pub depreciation: f64,
    pub amortization: f64,
}

impl DepreciationAndAmortization {
    pub fn total(&self) -> f64 {
        self.depreciation + self.amortization
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatementFacts {
    pub revenue: Revenue,
    pub opex: OpEx,
    pub da: DepreciationAndAmortization,
}

impl IncomeStatementFacts {
    pub fn total_opex(&self) -> f64 {
        self.opex.total()
    }

    pub fn total_da(&self) -> f64 {
        self.da.total()
    }

    pub fn ebitda(&self) -> f64 {
        self.revenue.operating_revenue - self.total_opex()
    }

    pub fn ebit(&self) -> f64 {
        self.ebitda() - self.total_da()
    }

    pub fn nopat(&self, tax_rate: TaxRate) -> f64 {
        self.ebit() * (1.0 - tax_rate.into_inner())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentAssets {
    pub cash: f64,
    pub accounts_receivable: f64,
    pub bad_debts_provision: f64,
    pub properties_intended_for_sale: f64,
    pub other_receivables: f64,
    pub prepayments: f64,
    pub inventory: f64,
    pub contract_costs_incurred: f64,
    pub financial_instruments: f64,
    pub short_term_investments: f64,
}

impl CurrentAssets {
    pub fn total(&self) -> f64 {
        self.cash
            + self.accounts_receivable
            + self.bad_debts_provision
            + self.properties_intended_for_sale
            + self.other_receivables
            + self.prepayments
            + self.inventory
            + self.contract_costs_incurred
            + self.financial_instruments
            + self.short_term_investments
    }
}

/// Fixed assets at cost less accumulated depreciation.
///
/// The `of_which_*` fields split the net book value by asset class and are
/// informational; they do not enter [`FixedAssets::total`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedAssets {
    pub fixed_assets_at_cost: f64,
    pub depreciation: f64,
    pub of_which_fleet: f64,
    pub of_which_pe: f64,
    pub of_which_other: f64,
}

impl FixedAssets {
    pub fn total(&self) -> f64 {
        self.fixed_assets_at_cost + self.depreciation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntangibleAssets {
    pub goodwill: f64,
    pub amortisation: f64,
}

impl IntangibleAssets {
    pub fn total(&self) -> f64 {
        self.goodwill + self.amortisation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentLiabilities {
    pub trade_payables: f64,
    pub accruals: f64,
    pub accrued_income_tax: f64,
    pub deferred_income: f64,
    pub financial_instruments: f64,
}

impl CurrentLiabilities {
    pub fn total(&self) -> f64 {
        self.trade_payables
            + self.accruals
            + self.accrued_income_tax
            + self.deferred_income
            + self.financial_instruments
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LongTermDebt {
    pub term_debt: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Equity {
    pub retained_earnings: f64,
    pub reserves: f64,
    pub intercompany: f64,
}

impl Equity {
    pub fn total(&self) -> f64 {
        self.retained_earnings + self.reserves + self.intercompany
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetFacts {
    pub current_assets: CurrentAssets,
    pub fixed_assets: FixedAssets,
    pub intangible_assets: IntangibleAssets,
    pub current_liabilities: CurrentLiabilities,
    pub long_term_debt: LongTermDebt,
    pub equity: Equity,
}

impl BalanceSheetFacts {
    pub fn total_assets(&self) -> f64 {
        self.current_assets.total() + self.fixed_assets.total() + self.intangible_assets.total()
    }

    pub fn total_liabilities(&self) -> f64 {
        self.current_liabilities.total() + self.long_term_debt.term_debt
    }

    pub fn total_equity(&self) -> f64 {
        self.equity.total()
    }

    /// Rounded assets minus rounded liabilities and equity
    pub fn balance_gap(&self) -> f64 {
        self.total_assets().round() - (self.total_liabilities() + self.total_equity()).round()
    }

    /// Assets equal liabilities plus equity within one currency unit
    pub fn is_balanced(&self) -> bool {
        self.balance_gap().abs() <= 1.0
    }

    /// Net working capital plus net fixed and intangible assets, excluding cash
    pub fn invested_capital(&self) -> f64 {
        self.current_assets.total() - self.current_liabilities.total()
            + self.fixed_assets.total()
            + self.intangible_assets.total()
            - self.current_assets.cash
    }
}

/// The complete, immutable baseline dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineFacts {
    pub productivity: Productivity,
    pub truck: Truck,
    pub labor: Labor,
    pub income_statement: IncomeStatementFacts,
    pub balance_sheet: BalanceSheetFacts,
}

/// Revenue broken into price and quantity drivers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevenueDrivers {
    pub num_customers: f64,
    pub lifts_per_customer: f64,
    pub m3_per_lift: f64,
    /// Blended over all operating revenue, landfill included
    pub revenue_per_m3: f64,
}

impl BaselineFacts {
    /// ROIC computed straight from the reported statements
    pub fn roic(&self, tax_rate: TaxRate) -> Result<f64, DomainError> {
        guard::ratio(
            self.income_statement.nopat(tax_rate),
            self.balance_sheet.invested_capital(),
            "balance_sheet.invested_capital",
        )
    }

    pub fn revenue_drivers(&self) -> Result<RevenueDrivers, DomainError> {
        let productivity = &self.productivity;
        Ok(RevenueDrivers {
            num_customers: productivity.num_customers,
            lifts_per_customer: guard::ratio(
                productivity.total_lifts,
                productivity.num_customers,
                "productivity.num_customers",
            )?,
            m3_per_lift: guard::ratio(
                productivity.total_m3_collected,
                productivity.total_lifts,
                "productivity.total_lifts",
            )?,
            revenue_per_m3: guard::ratio(
                self.income_statement.revenue.operating_revenue,
                productivity.total_m3_collected,
                "productivity.total_m3_collected",
            )?,
        })
    }

    pub fn disposal_per_lift(&self) -> Result<f64, DomainError> {
        guard::ratio(
            self.income_statement.opex.disposal,
            self.productivity.total_lifts,
            "productivity.total_lifts",
        )
    }

    pub fn revenue_per_tonne(&self) -> Result<f64, DomainError> {
        guard::ratio(
            self.income_statement.revenue.operating_revenue,
            self.productivity.total_tonnes_disposed,
            "productivity.total_tonnes_disposed",
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::fact_table::FactTable;

    fn baseline() -> super::BaselineFacts {
        FactTable::baseline().to_facts().unwrap()
    }

    #[test]
    fn test_baseline_ebitda_matches_reported_figure() {
        let facts = baseline();
        assert!((facts.income_statement.ebitda() - 11_761_036.0).abs() <= 1.0);
        assert!((facts.income_statement.ebit() - 6_996_070.0).abs() <= 1.5);
    }

    #[test]
    fn test_invested_capital_excludes_cash() {
        let facts = baseline();
        let ic = facts.balance_sheet.invested_capital();
        assert!((ic - 22_590_031.68).abs() < 0.01);
    }

    #[test]
    fn test_baseline_roic() {
        let facts = baseline();
        let roic = facts.roic(Default::default()).unwrap();
        assert!((roic - 0.244_660_76).abs() < 1e-6);
    }

    #[test]
    fn test_reported_balance_sheet_does_not_balance() {
        let facts = baseline();
        assert!(!facts.balance_sheet.is_balanced());
        assert!(facts.balance_sheet.balance_gap() > 0.0);
    }

    #[test]
    fn test_revenue_drivers_multiply_back_to_revenue() {
        let facts = baseline();
        let drivers = facts.revenue_drivers().unwrap();
        let rebuilt = drivers.num_customers
            * drivers.lifts_per_customer
            * drivers.m3_per_lift
            * drivers.revenue_per_m3;
        let revenue = facts.income_statement.revenue.operating_revenue;
        assert!((rebuilt - revenue).abs() / revenue < 1e-12);
    }
}
