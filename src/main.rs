use anyhow::Result;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

use roic_levers::application::sensitivity::as_series;
use roic_levers::application::{
    baseline_factory, linspace, roic_sensitivity, ScenarioRunner, SweepReport,
};
use roic_levers::config::{LogFormat, LoggingSettings, Settings};
use roic_levers::infrastructure::log_messages::application as log;

fn init_tracing(logging: &LoggingSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.init(),
    }
}

#[instrument(skip(settings))]
fn run(settings: Settings) -> Result<SweepReport> {
    let facts = settings.load_facts()?;
    let tax_rate = settings.projection.tax_rate;
    let baseline_roic = facts.roic(tax_rate)?;
    info!(baseline_roic, "{}", log::FACTS_LOADED);

    let sweep = &settings.sweep;
    let runner = ScenarioRunner::new(baseline_factory(facts, settings.assumptions, tax_rate));
    let outcomes = roic_sensitivity(
        &runner,
        sweep.sensitivity,
        linspace(sweep.min, sweep.max, sweep.steps),
        sweep.workers(),
    )?;

    Ok(SweepReport {
        sensitivity: sweep.sensitivity,
        baseline_roic,
        points: as_series(&outcomes),
    })
}

fn main() -> Result<()> {
    let settings = Settings::new()?;
    init_tracing(&settings.logging);

    info!(sensitivity = %settings.sweep.sensitivity, "{}", log::STARTING);
    let report = run(settings)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    info!(points = report.points.len(), "{}", log::FINISHED);

    Ok(())
}
