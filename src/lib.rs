//! Solar charge-controller history analysis.
//!
//! Reads a Victron MPPT history export, checks its data quality, summarizes
//! yield and consumption, derives cost and payback figures, and writes a
//! text report, a JSON summary and PNG charts.

pub mod chart;
pub mod config;
pub mod cost;
pub mod error;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod quality;
pub mod record;
pub mod reports;
pub mod types;
pub mod util;

pub use config::AppConfig;
pub use cost::CostAnalyzer;
pub use error::{Result, SolarError, ValidationError};
pub use loader::RowPolicy;
pub use pipeline::{SolarPipeline, SolarTable};
pub use quality::DataQualityChecker;
pub use record::SolarRecord;
pub use types::{CostMetrics, DataQualityReport, SolarSummary};

use tracing::warn;
use types::SummaryFile;

/// Everything produced by one batch run.
#[derive(Debug)]
pub struct RunOutput {
    pub summary: SolarSummary,
    pub cost: CostMetrics,
    pub data_quality: DataQualityReport,
    pub report: String,
}

/// Load, validate, summarize and price one CSV, writing every output file
/// named in `config`.
pub fn run(config: &AppConfig) -> Result<RunOutput> {
    let mut pipeline = SolarPipeline::new(&config.input_csv, config.row_policy)?;
    pipeline.load()?;

    let data_quality = DataQualityChecker::new(config.voltage_range()).validate(&pipeline)?;
    let summary = pipeline.summarize()?;
    let cost = CostAnalyzer::new(config.system_costs.clone()).compute(&summary, config.rate_per_kwh);
    let report = reports::render_report(&summary, &cost);

    output::write_text(&config.report_path, &report)?;
    output::write_json(
        &config.summary_json_path,
        &SummaryFile {
            summary: &summary,
            cost: &cost,
            data_quality: &data_quality,
        },
    )?;

    let table = pipeline.table()?;
    if table.is_empty() {
        warn!("No records loaded; skipping charts");
    } else {
        chart::render_dashboard(table, &config.chart_path)?;
        chart::render_yield_chart(table, &config.yield_chart_path)?;
        chart::render_battery_voltage_chart(table, &config.voltage_chart_path)?;
    }

    Ok(RunOutput {
        summary,
        cost,
        data_quality,
        report,
    })
}
