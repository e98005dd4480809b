use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

use crate::application::sensitivity::Sensitivity;
use crate::domain::fact_table::FactTable;
use crate::domain::facts::BaselineFacts;
use crate::domain::levers::Assumptions;
use crate::domain::values::TaxRate;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub facts: FactsSettings,
    #[serde(default)]
    pub assumptions: Assumptions,
    pub projection: ProjectionSettings,
    pub sweep: SweepSettings,
    pub logging: LoggingSettings,
}

/// Where the baseline fact table comes from; the built-in dataset when unset
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FactsSettings {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProjectionSettings {
    pub tax_rate: TaxRate,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SweepSettings {
    pub sensitivity: Sensitivity,
    pub min: f64,
    pub max: f64,
    pub steps: usize,
    pub workers: usize,
}

impl SweepSettings {
    pub fn workers(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.workers).unwrap_or(NonZeroUsize::MIN)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::builder()?.build()?.try_deserialize()
    }

    /// Defaults, then `config/*` files, then `ROIC_LEVERS__*` environment variables
    pub fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        Ok(Config::builder()
            .set_default("projection.tax_rate", 0.21)?
            .set_default("sweep.sensitivity", "lifts_per_truck_day")?
            .set_default("sweep.min", 10.0)?
            .set_default("sweep.max", 18.0)?
            .set_default("sweep.steps", 9)?
            .set_default("sweep.workers", 1)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("ROIC_LEVERS").separator("__")))
    }

    /// The configured fact table, or the built-in baseline, as shared facts
    pub fn load_facts(&self) -> crate::Result<Arc<BaselineFacts>> {
        let table = match &self.facts.path {
            Some(path) => FactTable::from_file(Path::new(path))?,
            None => FactTable::baseline(),
        };
        Ok(Arc::new(table.to_facts()?))
    }
}
