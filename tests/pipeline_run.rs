use chrono::NaiveDate;
use solar_report::cost::PAYBACK_NOT_ACHIEVABLE_YEARS;
use solar_report::quality::YIELD_NON_NEGATIVE_CHECK;
use solar_report::{
    run, AppConfig, CostAnalyzer, DataQualityChecker, RowPolicy, SolarError, SolarPipeline,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

const HEADER: &str = "Days ago,Date,Yield(Wh),Consumption(Wh),Max. PV power(W),Max. PV voltage(V),Min. battery voltage(V),Max. battery voltage(V),Time in bulk(m),Time in absorption(m),Time in float(m),Last error,2nd last error,3rd last error,4th last error";

fn row(days_ago: u32, date: &str, yield_wh: &str, consumption_wh: &str) -> String {
    format!("{days_ago},{date},{yield_wh},{consumption_wh},85,21.3,12.4,14.4,240,60,180,0,0,0,0")
}

fn csv_file(rows: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for r in rows {
        writeln!(file, "{r}").unwrap();
    }
    file
}

fn three_days() -> NamedTempFile {
    csv_file(&[
        row(0, "10/12/25", "300", "50"),
        row(1, "10/11/25", "200", "50"),
        row(2, "10/10/25", "100", "50"),
    ])
}

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, d).unwrap()
}

fn config_in(dir: &TempDir, csv: &Path) -> AppConfig {
    AppConfig {
        input_csv: csv.to_path_buf(),
        report_path: dir.path().join("cost_report.txt"),
        summary_json_path: dir.path().join("summary.json"),
        chart_path: dir.path().join("dashboard.png"),
        yield_chart_path: dir.path().join("yield.png"),
        voltage_chart_path: dir.path().join("voltage.png"),
        ..AppConfig::default()
    }
}

#[test]
fn three_row_table_prices_out() {
    let file = three_days();
    let mut pipeline = SolarPipeline::new(file.path(), RowPolicy::Strict).unwrap();
    assert_eq!(pipeline.load().unwrap().len(), 3);

    let summary = pipeline.summarize().unwrap();
    assert_eq!(summary.total_yield_wh, 600.0);
    assert_eq!(summary.total_consumption_wh, 150.0);
    assert_eq!(summary, pipeline.summarize().unwrap());

    let m = CostAnalyzer::default().compute(&summary, 0.14);
    assert!((m.total_solar_kwh - 0.6).abs() < 1e-9);
    assert!((m.solar_value_usd - 0.084).abs() < 1e-9);
    assert!((m.total_consumption_kwh - 0.15).abs() < 1e-9);
    assert!((m.consumption_cost_usd - 0.021).abs() < 1e-9);
    assert!((m.net_savings_usd - 0.063).abs() < 1e-9);
    assert!((m.solar_offset_pct - 400.0).abs() < 1e-9);
}

#[test]
fn filter_is_an_order_preserving_subsequence() {
    let file = three_days();
    let mut pipeline = SolarPipeline::new(file.path(), RowPolicy::Strict).unwrap();
    let full = pipeline.load().unwrap().clone();

    let filtered = pipeline.filter_by_date_range(date(10, 10), date(10, 11)).unwrap();
    assert!(filtered
        .records()
        .iter()
        .all(|r| r.date >= date(10, 10) && r.date <= date(10, 11)));
    let days_ago: Vec<u32> = filtered.records().iter().map(|r| r.days_ago).collect();
    assert_eq!(days_ago, vec![1, 2]);

    let everything = pipeline.filter_by_date_range(date(1, 1), date(12, 31)).unwrap();
    assert_eq!(everything, full);

    let none = pipeline.filter_by_date_range(date(11, 1), date(11, 2)).unwrap();
    assert!(none.is_empty());
    assert_eq!(none.summarize().record_count, 0);
}

#[test]
fn strict_load_reports_offending_row() {
    let file = csv_file(&[
        row(0, "10/12/25", "300", "50"),
        row(1, "10/11/25", "-5", "50"),
    ]);
    let mut pipeline = SolarPipeline::new(file.path(), RowPolicy::Strict).unwrap();
    let err = pipeline.load().unwrap_err();
    match err {
        SolarError::Row { line, source } => {
            assert_eq!(line, 3);
            assert_eq!(source.field(), "Yield(Wh)");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(pipeline.summarize(), Err(SolarError::NotLoaded)));
}

#[test]
fn lenient_load_skips_and_quality_check_flags() {
    let file = csv_file(&[
        row(0, "10/12/25", "300", "50"),
        row(1, "10/11/25", "-5", "50"),
        row(2, "10/10/25", "100", "50"),
    ]);
    let mut pipeline = SolarPipeline::new(file.path(), RowPolicy::Lenient).unwrap();
    assert_eq!(pipeline.load().unwrap().len(), 2);
    assert_eq!(pipeline.load_report().unwrap().skipped_rows, 1);

    let report = DataQualityChecker::default().validate(&pipeline).unwrap();
    assert!(report.failed_checks >= 1);
    let negative = report.result(YIELD_NON_NEGATIVE_CHECK).unwrap();
    assert!(!negative.passed);
    assert!(negative.message.ends_with("lines 3"));
}

#[test]
fn quality_and_strict_load_agree_on_line_numbers() {
    let rows = [
        row(0, "10/12/25", "300", "50"),
        row(1, "10/11/25", "200", "50"),
        row(2, "10/10/25", "-5", "50"),
    ];
    let strict_file = csv_file(&rows);
    let mut strict = SolarPipeline::new(strict_file.path(), RowPolicy::Strict).unwrap();
    let line = match strict.load().unwrap_err() {
        SolarError::Row { line, .. } => line,
        other => panic!("unexpected error: {other}"),
    };
    assert_eq!(line, 4);

    let lenient_file = csv_file(&rows);
    let mut lenient = SolarPipeline::new(lenient_file.path(), RowPolicy::Lenient).unwrap();
    lenient.load().unwrap();
    let report = DataQualityChecker::default().validate(&lenient).unwrap();
    let negative = report.result(YIELD_NON_NEGATIVE_CHECK).unwrap();
    assert!(negative.message.ends_with(&format!("lines {line}")));
}

#[test]
fn validate_requires_loaded_data() {
    let file = three_days();
    let pipeline = SolarPipeline::new(file.path(), RowPolicy::Strict).unwrap();
    let err = DataQualityChecker::default().validate(&pipeline).unwrap_err();
    assert!(matches!(err, SolarError::NotLoaded));
}

#[test]
fn full_run_writes_every_output() {
    let file = three_days();
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir, file.path());

    let out = run(&config).unwrap();
    assert!(out.data_quality.all_passed());
    assert_eq!(out.summary.record_count, 3);

    let report = std::fs::read_to_string(&config.report_path).unwrap();
    assert_eq!(report, out.report);
    assert!(report.contains("Analysis Period: 3 days"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&config.summary_json_path).unwrap()).unwrap();
    assert_eq!(json["summary"]["record_count"], 3);
    assert_eq!(json["data_quality"]["failed_checks"], 0);
    assert_eq!(json["cost"]["payback"].as_array().unwrap().len(), 3);

    for chart in [
        &config.chart_path,
        &config.yield_chart_path,
        &config.voltage_chart_path,
    ] {
        let bytes = std::fs::read(chart).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG", "{} is not a PNG", chart.display());
    }
}

#[test]
fn net_loss_run_uses_payback_sentinel() {
    let file = csv_file(&[
        row(0, "10/12/25", "50", "400"),
        row(1, "10/11/25", "40", "380"),
    ]);
    let dir = tempfile::tempdir().unwrap();
    let out = run(&config_in(&dir, file.path())).unwrap();
    assert!(out.cost.projected_annual_usd < 0.0);
    assert!(out
        .cost
        .payback
        .iter()
        .all(|p| p.years == PAYBACK_NOT_ACHIEVABLE_YEARS));
    assert!(out.report.contains("  - $2,000 system = not achievable"));
}

#[test]
fn missing_input_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir, &PathBuf::from("/nonexistent/SolarHistory.csv"));
    assert!(matches!(run(&config), Err(SolarError::NotFound(_))));
    assert!(!config.report_path.exists());
}

#[test]
fn bundled_sample_history_is_clean() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/SolarHistory.csv");
    let mut pipeline = SolarPipeline::new(&path, RowPolicy::Strict).unwrap();
    let table = pipeline.load().unwrap().clone();
    assert_eq!(table.len(), 14);

    let report = DataQualityChecker::default().validate(&pipeline).unwrap();
    assert!(report.all_passed(), "{:?}", report.results);

    let summary = pipeline.summarize().unwrap();
    assert!(summary.total_yield_wh > 0.0);
    assert!(summary.min_battery_voltage_v > 0.0);
    assert!(summary.min_battery_voltage_v <= summary.max_battery_voltage_v);

    let sorted = table.sorted_by_date();
    assert!(sorted.records().windows(2).all(|w| w[0].date <= w[1].date));
}
