//! Grouped key/value fact table and its conversion into [`BaselineFacts`]
//!
//! A fact table is the on-disk (or built-in) shape of the baseline: twelve named
//! groups, each a flat map of snake_case keys to numbers. Any format the
//! `config` crate understands can be loaded.

use std::collections::BTreeMap;
use std::path::Path;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::domain::facts::{
    BalanceSheetFacts, BaselineFacts, CurrentAssets, CurrentLiabilities,
    DepreciationAndAmortization, Equity, FixedAssets, IncomeStatementFacts, IntangibleAssets,
    Labor, LongTermDebt, OpEx, Productivity, Revenue, Truck,
};
use crate::error::ConfigurationError;
use crate::infrastructure::log_messages::facts as log;
use crate::Result;

/// The recognised groups of a fact table
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FactGroup {
    CurrentAssets,
    FixedAssets,
    IntangibleAssets,
    CurrentLiabilities,
    LongTermDebt,
    Equity,
    Revenue,
    OpEx,
    DepreciationAndAmortization,
    Productivity,
    Truck,
    Labor,
}

impl FactGroup {
    pub const ALL: [FactGroup; 12] = [
        FactGroup::CurrentAssets,
        FactGroup::FixedAssets,
        FactGroup::IntangibleAssets,
        FactGroup::CurrentLiabilities,
        FactGroup::LongTermDebt,
        FactGroup::Equity,
        FactGroup::Revenue,
        FactGroup::OpEx,
        FactGroup::DepreciationAndAmortization,
        FactGroup::Productivity,
        FactGroup::Truck,
        FactGroup::Labor,
    ];

    /// Key used for this group in fact files
    pub fn key(&self) -> &'static str {
        match self {
            FactGroup::CurrentAssets => "current_assets",
            FactGroup::FixedAssets => "fixed_assets",
            FactGroup::IntangibleAssets => "intangible_assets",
            FactGroup::CurrentLiabilities => "current_liabilities",
            FactGroup::LongTermDebt => "long_term_debt",
            FactGroup::Equity => "equity",
            FactGroup::Revenue => "revenue",
            FactGroup::OpEx => "opex",
            FactGroup::DepreciationAndAmortization => "depreciation_and_amortization",
            FactGroup::Productivity => "productivity",
            FactGroup::Truck => "truck",
            FactGroup::Labor => "labor",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|group| group.key() == key)
    }
}

/// Baseline figures as grouped key/value maps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactTable {
    groups: BTreeMap<String, BTreeMap<String, f64>>,
}

impl FactTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, group: FactGroup, key: &str, value: f64) -> &mut Self {
        self.groups
            .entry(group.key().to_string())
            .or_default()
            .insert(key.to_string(), value);
        self
    }

    pub fn get(&self, group: FactGroup, key: &str) -> Option<f64> {
        self.groups
            .get(group.key())
            .and_then(|values| values.get(key))
            .copied()
    }

    pub fn remove(&mut self, group: FactGroup, key: &str) -> Option<f64> {
        self.groups
            .get_mut(group.key())
            .and_then(|values| values.remove(key))
    }

    /// Load a fact table from a TOML, JSON or YAML file
    #[instrument]
    pub fn from_file(path: &Path) -> Result<Self> {
        let table = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize::<FactTable>()?;
        debug!(groups = table.groups.len(), "{}", log::TABLE_LOADED);
        Ok(table)
    }

    /// The historical dataset for the baseline year
    pub fn baseline() -> Self {
        let mut table = Self::new();
        table
            .set(FactGroup::CurrentAssets, "cash", 9_643.2)
            .set(FactGroup::CurrentAssets, "accounts_receivable", 3_021_787.36)
            .set(FactGroup::CurrentAssets, "bad_debts_provision", -23_061.92)
            .set(FactGroup::CurrentAssets, "properties_intended_for_sale", 0.0)
            .set(FactGroup::CurrentAssets, "other_receivables", 157_719.68)
            .set(FactGroup::CurrentAssets, "prepayments", 88_105.12)
            .set(FactGroup::CurrentAssets, "inventory", 36_297.12)
            .set(FactGroup::CurrentAssets, "contract_costs_incurred", 0.0)
            .set(FactGroup::CurrentAssets, "financial_instruments", 0.0)
            .set(FactGroup::CurrentAssets, "short_term_investments", 0.0)
            .set(FactGroup::FixedAssets, "fixed_assets_at_cost", 25_283_989.76)
            .set(FactGroup::FixedAssets, "depreciation", -13_039_216.8)
            .set(FactGroup::FixedAssets, "of_which_fleet", 2_932_328.852_694_6)
            .set(FactGroup::FixedAssets, "of_which_pe", 6_158_490.590_658_7)
            .set(FactGroup::FixedAssets, "of_which_other", 3_152_953.516_646_7)
            .set(FactGroup::IntangibleAssets, "goodwill", 15_709_844.64)
            .set(FactGroup::IntangibleAssets, "amortisation", -4_924_309.76)
            .set(FactGroup::CurrentLiabilities, "trade_payables", 1_278_883.84)
            .set(FactGroup::CurrentLiabilities, "accruals", 375_642.08)
            .set(FactGroup::CurrentLiabilities, "accrued_income_tax", 0.0)
            .set(FactGroup::CurrentLiabilities, "deferred_income", 2_066_597.6)
            .set(FactGroup::CurrentLiabilities, "financial_instruments", 0.0)
            .set(FactGroup::LongTermDebt, "term_debt", 1_200_523.68)
            .set(FactGroup::Equity, "retained_earnings", 55_879_869.76)
            .set(FactGroup::Equity, "reserves", 0.0)
            .set(FactGroup::Equity, "intercompany", -34_488_626.72)
            .set(FactGroup::Revenue, "operating_revenue", 39_778_916.847_903)
            .set(FactGroup::OpEx, "labor_subcontract", 5_988_550.334_661_6)
            .set(FactGroup::OpEx, "disposal", 6_485_195.316_492_2)
            .set(FactGroup::OpEx, "other_opex", 11_788_263.327_227)
            .set(FactGroup::OpEx, "sga", 2_540_439.506_991_5)
            .set(FactGroup::OpEx, "other_inc_exp", -320_642.232_37)
            .set(FactGroup::OpEx, "management_fees", 1_536_074.536_72)
            .set(FactGroup::OpEx, "non_rec_items", 0.0)
            .set(
                FactGroup::DepreciationAndAmortization,
                "depreciation",
                4_685_375.920_846_6,
            )
            .set(
                FactGroup::DepreciationAndAmortization,
                "amortization",
                79_591.293_499_997,
            )
            .set(FactGroup::Productivity, "avg_num_trucks", 78.0)
            .set(FactGroup::Productivity, "total_lifts", 375_528.0)
            .set(FactGroup::Productivity, "total_m3_collected", 1_078_787.0)
            .set(
                FactGroup::Productivity,
                "avg_km_per_truck_per_year",
                42_971.331_458_261,
            )
            .set(FactGroup::Productivity, "total_tonnes_disposed", 97_928.0)
            .set(FactGroup::Productivity, "working_days_per_year", 330.0)
            .set(FactGroup::Productivity, "num_customers", 22_519.0)
            .set(FactGroup::Truck, "capacity", 45.0)
            .set(FactGroup::Truck, "fuel_econ_km_l", 1.19)
            .set(FactGroup::Truck, "fuel_cost_per_l", 1.95)
            .set(
                FactGroup::Truck,
                "maintenance_per_truck_per_year",
                27_764.283_157_894_7,
            )
            .set(FactGroup::Labor, "driver_hourly_wage", 15.21)
            .set(FactGroup::Labor, "hours_per_shift", 10.0);
        table
    }

    /// Validate the table and build the typed baseline
    pub fn to_facts(&self) -> std::result::Result<BaselineFacts, ConfigurationError> {
        if let Some(unknown) = self
            .groups
            .keys()
            .find(|key| FactGroup::from_key(key).is_none())
        {
            return Err(ConfigurationError::UnknownGroup(unknown.clone()));
        }

        let mut group = self.reader(FactGroup::Productivity);
        let productivity = Productivity {
            avg_num_trucks: group.quantity("avg_num_trucks")?,
            total_lifts: group.quantity("total_lifts")?,
            total_m3_collected: group.quantity("total_m3_collected")?,
            avg_km_per_truck_per_year: group.quantity("avg_km_per_truck_per_year")?,
            total_tonnes_disposed: group.quantity("total_tonnes_disposed")?,
            working_days_per_year: group.quantity("working_days_per_year")?,
            num_customers: group.quantity("num_customers")?,
        };
        group.finish();

        let mut group = self.reader(FactGroup::Truck);
        let truck = Truck {
            capacity: group.quantity("capacity")?,
            fuel_econ_km_l: group.quantity("fuel_econ_km_l")?,
            fuel_cost_per_l: group.quantity("fuel_cost_per_l")?,
            maintenance_per_truck_per_year: group.quantity("maintenance_per_truck_per_year")?,
        };
        group.finish();

        let mut group = self.reader(FactGroup::Labor);
        let labor = Labor {
            driver_hourly_wage: group.quantity("driver_hourly_wage")?,
            hours_per_shift: group.quantity("hours_per_shift")?,
        };
        group.finish();

        let mut group = self.reader(FactGroup::Revenue);
        let revenue = Revenue {
            operating_revenue: group.amount("operating_revenue")?,
        };
        group.finish();

        let mut group = self.reader(FactGroup::OpEx);
        let opex = OpEx {
            labor_subcontract: group.amount("labor_subcontract")?,
            disposal: group.amount("disposal")?,
            other_opex: group.amount("other_opex")?,
            sga: group.amount("sga")?,
            other_inc_exp: group.amount("other_inc_exp")?,
            management_fees: group.amount("management_fees")?,
            non_rec_items: group.amount("non_rec_items")?,
        };
        group.finish();

        let mut group = self.reader(FactGroup::DepreciationAndAmortization);
        let da = DepreciationAndAmortization {
            depreciation: group.amount("depreciation")?,
            amortization: group.amount("amortization")?,
        };
        group.finish();

        let mut group = self.reader(FactGroup::CurrentAssets);
        let current_assets = CurrentAssets {
            cash: group.amount("cash")?,
            accounts_receivable: group.amount("accounts_receivable")?,
            bad_debts_provision: group.amount("bad_debts_provision")?,
            properties_intended_for_sale: group.amount("properties_intended_for_sale")?,
            other_receivables: group.amount("other_receivables")?,
            prepayments: group.amount("prepayments")?,
            inventory: group.amount("inventory")?,
            contract_costs_incurred: group.amount("contract_costs_incurred")?,
            financial_instruments: group.amount("financial_instruments")?,
            short_term_investments: group.amount("short_term_investments")?,
        };
        group.finish();

        let mut group = self.reader(FactGroup::FixedAssets);
        let fixed_assets = FixedAssets {
            fixed_assets_at_cost: group.amount("fixed_assets_at_cost")?,
            depreciation: group.amount("depreciation")?,
            of_which_fleet: group.amount("of_which_fleet")?,
            of_which_pe: group.amount("of_which_pe")?,
            of_which_other: group.amount("of_which_other")?,
        };
        group.finish();

        let mut group = self.reader(FactGroup::IntangibleAssets);
        let intangible_assets = IntangibleAssets {
            goodwill: group.amount("goodwill")?,
            amortisation: group.amount("amortisation")?,
        };
        group.finish();

        let mut group = self.reader(FactGroup::CurrentLiabilities);
        let current_liabilities = CurrentLiabilities {
            trade_payables: group.amount("trade_payables")?,
            accruals: group.amount("accruals")?,
            accrued_income_tax: group.amount("accrued_income_tax")?,
            deferred_income: group.amount("deferred_income")?,
            financial_instruments: group.amount("financial_instruments")?,
        };
        group.finish();

        let mut group = self.reader(FactGroup::LongTermDebt);
        let long_term_debt = LongTermDebt {
            term_debt: group.amount("term_debt")?,
        };
        group.finish();

        let mut group = self.reader(FactGroup::Equity);
        let equity = Equity {
            retained_earnings: group.amount("retained_earnings")?,
            reserves: group.amount("reserves")?,
            intercompany: group.amount("intercompany")?,
        };
        group.finish();

        let balance_sheet = BalanceSheetFacts {
            current_assets,
            fixed_assets,
            intangible_assets,
            current_liabilities,
            long_term_debt,
            equity,
        };
        if !balance_sheet.is_balanced() {
            warn!(gap = balance_sheet.balance_gap(), "{}", log::UNBALANCED);
        }

        Ok(BaselineFacts {
            productivity,
            truck,
            labor,
            income_statement: IncomeStatementFacts { revenue, opex, da },
            balance_sheet,
        })
    }

    fn reader(&self, group: FactGroup) -> GroupReader<'_> {
        GroupReader {
            group,
            values: self.groups.get(group.key()),
            consumed: Vec::new(),
        }
    }
}

/// Pulls typed fields out of one group, remembering which keys were used
struct GroupReader<'a> {
    group: FactGroup,
    values: Option<&'a BTreeMap<String, f64>>,
    consumed: Vec<&'static str>,
}

impl GroupReader<'_> {
    /// Any finite monetary amount; signs carry meaning on the statements
    fn amount(&mut self, key: &'static str) -> std::result::Result<f64, ConfigurationError> {
        let value = self
            .values
            .and_then(|values| values.get(key))
            .copied()
            .ok_or_else(|| ConfigurationError::MissingFact {
                group: self.group.key().to_string(),
                key: key.to_string(),
            })?;
        self.consumed.push(key);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(self.malformed(key, "value is not a finite number"))
        }
    }

    /// A physical count or rate, which can never be negative
    fn quantity(&mut self, key: &'static str) -> std::result::Result<f64, ConfigurationError> {
        let value = self.amount(key)?;
        if value < 0.0 {
            return Err(self.malformed(key, "value must not be negative"));
        }
        Ok(value)
    }

    fn malformed(&self, key: &str, reason: &str) -> ConfigurationError {
        ConfigurationError::MalformedFact {
            group: self.group.key().to_string(),
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    fn finish(self) {
        let Some(values) = self.values else {
            return;
        };
        for key in values.keys() {
            if !self.consumed.contains(&key.as_str()) {
                warn!(group = %self.group, key = %key, "{}", log::UNKNOWN_KEY);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_baseline_table_converts() {
        let facts = FactTable::baseline().to_facts().unwrap();
        assert_eq!(facts.productivity.avg_num_trucks, 78.0);
        assert_eq!(facts.labor.hours_per_shift, 10.0);
    }

    #[test]
    fn test_missing_fact_is_a_configuration_error() {
        let mut table = FactTable::baseline();
        table.remove(FactGroup::Truck, "fuel_econ_km_l");

        assert_eq!(
            table.to_facts(),
            Err(ConfigurationError::MissingFact {
                group: "truck".to_string(),
                key: "fuel_econ_km_l".to_string(),
            })
        );
    }

    #[test]
    fn test_non_finite_fact_is_malformed() {
        let mut table = FactTable::baseline();
        table.set(FactGroup::OpEx, "sga", f64::NAN);

        assert!(matches!(
            table.to_facts(),
            Err(ConfigurationError::MalformedFact { key, .. }) if key == "sga"
        ));
    }

    #[test]
    fn test_negative_quantity_is_malformed() {
        let mut table = FactTable::baseline();
        table.set(FactGroup::Productivity, "working_days_per_year", -1.0);

        assert!(matches!(
            table.to_facts(),
            Err(ConfigurationError::MalformedFact { .. })
        ));
    }

    #[test]
    fn test_unknown_group_is_rejected() {
        let mut table = FactTable::baseline();
        table
            .groups
            .insert("cash_flow".to_string(), BTreeMap::new());

        assert_eq!(
            table.to_facts(),
            Err(ConfigurationError::UnknownGroup("cash_flow".to_string()))
        );
    }

    #[test]
    fn test_group_keys_round_trip() {
        for group in FactGroup::ALL {
            assert_eq!(FactGroup::from_key(group.key()), Some(group));
        }
        assert_eq!(FactGroup::OpEx.to_string(), "OpEx");
    }

    #[test]
    fn test_table_loads_from_json_file() {
        let json = serde_json::to_string(&FactTable::baseline()).unwrap();
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let loaded = FactTable::from_file(file.path()).unwrap();
        assert_eq!(loaded.to_facts().unwrap(), FactTable::baseline().to_facts().unwrap());
    }

    #[test]
    fn test_table_loads_integers_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[productivity]\navg_num_trucks = 78\nworking_days_per_year = 330").unwrap();

        let loaded = FactTable::from_file(file.path()).unwrap();
        assert_eq!(loaded.get(FactGroup::Productivity, "avg_num_trucks"), Some(78.0));
        assert!(matches!(
            loaded.to_facts(),
            Err(ConfigurationError::MissingFact { .. })
        ));
    }
}
