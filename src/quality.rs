//! Data-quality checks over a freshly loaded CSV.
//!
//! Checks run against the raw string table rather than parsed records, so
//! values that the record model would reject (blank, negative, badly dated)
//! are still reported here instead of vanishing with a skipped row.

use crate::error::Result;
use crate::loader::{data_line, RawTable};
use crate::pipeline::SolarPipeline;
use crate::types::{canonical_header, DataQualityReport, RawRow, ValidationResult, REQUIRED_COLUMNS};
use crate::util::{non_blank, parse_date, parse_f64_field};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{info, warn};

pub const REQUIRED_COLUMNS_CHECK: &str = "required_columns_exist";
pub const CRITICAL_NOT_NULL_CHECK: &str = "critical_fields_not_null";
pub const YIELD_NON_NEGATIVE_CHECK: &str = "yield_non_negative";
pub const DATE_FORMAT_CHECK: &str = "date_format_valid";
pub const BATTERY_VOLTAGE_CHECK: &str = "battery_voltage_in_range";

// Offending line numbers listed in a message before it is truncated.
const MAX_LISTED_ROWS: usize = 5;

/// Plausible battery voltage bounds, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct VoltageRange {
    pub min_v: f64,
    pub max_v: f64,
}

impl Default for VoltageRange {
    fn default() -> Self {
        Self {
            min_v: 0.0,
            max_v: 20.0,
        }
    }
}

impl VoltageRange {
    pub fn contains(&self, v: f64) -> bool {
        v >= self.min_v && v <= self.max_v
    }
}

#[derive(Debug, Clone, Default)]
pub struct DataQualityChecker {
    voltage_range: VoltageRange,
}

impl DataQualityChecker {
    pub fn new(voltage_range: VoltageRange) -> Self {
        Self { voltage_range }
    }

    /// Check the data held by a loaded pipeline.
    pub fn validate(&self, pipeline: &SolarPipeline) -> Result<DataQualityReport> {
        Ok(self.check(pipeline.raw()?))
    }

    /// Run every check in order. Findings never abort the run; each check
    /// contributes exactly one result.
    pub fn check(&self, table: &RawTable) -> DataQualityReport {
        let results = vec![
            check_required_columns(&table.headers),
            check_critical_not_null(&table.rows),
            check_yield_non_negative(&table.rows),
            check_date_format(&table.rows),
            check_battery_voltage(&table.rows, self.voltage_range),
        ];
        let report = DataQualityReport::from_results(results);
        if report.all_passed() {
            info!("All {} data quality checks passed", report.total_checks);
        } else {
            for r in report.results.iter().filter(|r| !r.passed) {
                warn!("Data quality check {} failed: {}", r.name, r.message);
            }
        }
        report
    }
}

fn pass(name: &'static str) -> ValidationResult {
    ValidationResult {
        name,
        passed: true,
        message: String::new(),
    }
}

/// File line numbers (header = line 1) of the rows where `bad` holds, the
/// same numbering strict loading reports.
fn offending_rows(rows: &[RawRow], bad: impl Fn(&RawRow) -> bool) -> Vec<u64> {
    rows.iter()
        .enumerate()
        .filter(|(_, r)| bad(r))
        .map(|(i, _)| data_line(i))
        .collect()
}

fn row_result(name: &'static str, what: &str, offenders: &[u64]) -> ValidationResult {
    if offenders.is_empty() {
        return pass(name);
    }
    let listed: Vec<String> = offenders
        .iter()
        .take(MAX_LISTED_ROWS)
        .map(u64::to_string)
        .collect();
    let more = if offenders.len() > MAX_LISTED_ROWS { ", ..." } else { "" };
    ValidationResult {
        name,
        passed: false,
        message: format!(
            "{} row(s) {}: lines {}{}",
            offenders.len(),
            what,
            listed.join(", "),
            more
        ),
    }
}

fn check_required_columns(headers: &[String]) -> ValidationResult {
    let present: HashSet<&str> = headers.iter().filter_map(|h| canonical_header(h)).collect();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !present.contains(c))
        .collect();
    if missing.is_empty() {
        pass(REQUIRED_COLUMNS_CHECK)
    } else {
        ValidationResult {
            name: REQUIRED_COLUMNS_CHECK,
            passed: false,
            message: format!("missing required columns: {}", missing.join(", ")),
        }
    }
}

fn check_critical_not_null(rows: &[RawRow]) -> ValidationResult {
    let offenders = offending_rows(rows, |r| {
        [&r.yield_wh, &r.consumption_wh, &r.date]
            .iter()
            .any(|v| non_blank(v.as_deref()).is_none())
    });
    row_result(
        CRITICAL_NOT_NULL_CHECK,
        "missing Yield(Wh), Consumption(Wh) or Date",
        &offenders,
    )
}

fn check_yield_non_negative(rows: &[RawRow]) -> ValidationResult {
    let offenders = offending_rows(rows, |r| {
        matches!(parse_f64_field("Yield(Wh)", r.yield_wh.as_deref()), Ok(v) if v < 0.0)
    });
    row_result(YIELD_NON_NEGATIVE_CHECK, "with negative Yield(Wh)", &offenders)
}

fn check_date_format(rows: &[RawRow]) -> ValidationResult {
    // Blank dates are reported by the null check.
    let offenders = offending_rows(rows, |r| {
        non_blank(r.date.as_deref()).is_some_and(|d| parse_date(d).is_none())
    });
    row_result(DATE_FORMAT_CHECK, "with Date not in MM/DD/YY format", &offenders)
}

fn check_battery_voltage(rows: &[RawRow], range: VoltageRange) -> ValidationResult {
    let offenders = offending_rows(rows, |r| {
        [
            ("Min. battery voltage(V)", &r.min_battery_voltage_v),
            ("Max. battery voltage(V)", &r.max_battery_voltage_v),
        ]
        .into_iter()
        .any(|(field, v)| matches!(parse_f64_field(field, v.as_deref()), Ok(v) if !range.contains(v)))
    });
    let what = format!(
        "with battery voltage outside {:.1}-{:.1} V",
        range.min_v, range.max_v
    );
    row_result(BATTERY_VOLTAGE_CHECK, &what, &offenders)
}
