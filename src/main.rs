// Entry point for the batch report.
//
// One run reads the configured CSV, prints the data-quality table and the
// cost report, and leaves the report, JSON summary and dashboard on disk.
use anyhow::Context;
use solar_report::{config, output, util};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Analyzing {} at ${:.3}/kWh ({:?} row policy)",
        config.input_csv.display(),
        config.rate_per_kwh,
        config.row_policy
    );

    let run = solar_report::run(&config)
        .with_context(|| format!("failed to process {}", config.input_csv.display()))?;

    println!("Data quality checks:\n");
    println!("{}\n", output::quality_table(&run.data_quality));
    if !run.data_quality.all_passed() {
        println!(
            "Warning: {} of {} data quality checks failed.\n",
            util::format_int(run.data_quality.failed_checks),
            util::format_int(run.data_quality.total_checks)
        );
    }

    println!("{}", run.report);
    println!(
        "Processed {} days, net savings ${}.",
        util::format_int(run.summary.record_count),
        util::format_number(run.cost.net_savings_usd, 2)
    );
    println!(
        "Outputs: {}, {}, {}, {}, {}",
        config.report_path.display(),
        config.summary_json_path.display(),
        config.chart_path.display(),
        config.yield_chart_path.display(),
        config.voltage_chart_path.display()
    );
    Ok(())
}
