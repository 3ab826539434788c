use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tabled::Tabled;

/// Number of columns in a Victron MPPT history export.
pub const EXPECTED_COLUMNS: usize = 15;

/// Canonical header of every column, paired with the alternative spellings
/// accepted for it. Must stay in sync with the serde attributes on [`RawRow`].
pub const COLUMN_ALIASES: [(&str, &[&str]); EXPECTED_COLUMNS] = [
    ("Days ago", &[]),
    ("Date", &[]),
    ("Yield(Wh)", &[]),
    ("Consumption(Wh)", &[]),
    ("Max. PV power(W)", &["Max PV Power(W)"]),
    ("Max. PV voltage(V)", &["Max PV Voltage(V)"]),
    ("Min. battery voltage(V)", &["Min. Battery Voltage(V)"]),
    ("Max. battery voltage(V)", &["Max. Battery Voltage(V)"]),
    ("Time in bulk(m)", &["Time in Bulk(min)"]),
    ("Time in absorption(m)", &["Time in Absorption(min)"]),
    ("Time in float(m)", &["Time in Float(min)"]),
    ("Last error", &[]),
    ("2nd last error", &[]),
    ("3rd last error", &[]),
    ("4th last error", &[]),
];

/// Columns that must be present for a record to be built. The four error
/// code columns are optional.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "Days ago",
    "Date",
    "Yield(Wh)",
    "Consumption(Wh)",
    "Max. PV power(W)",
    "Max. PV voltage(V)",
    "Min. battery voltage(V)",
    "Max. battery voltage(V)",
    "Time in bulk(m)",
    "Time in absorption(m)",
    "Time in float(m)",
];

// Any accepted header spelling -> canonical header.
static HEADER_LOOKUP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for (canonical, aliases) in COLUMN_ALIASES {
        map.insert(canonical, canonical);
        for alias in aliases {
            map.insert(*alias, canonical);
        }
    }
    map
});

/// Resolve a header as found in the file to its canonical name.
pub fn canonical_header(header: &str) -> Option<&'static str> {
    HEADER_LOOKUP.get(header.trim()).copied()
}

/// One CSV row exactly as read, before any type coercion.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RawRow {
    #[serde(rename = "Days ago")]
    pub days_ago: Option<String>,
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "Yield(Wh)")]
    pub yield_wh: Option<String>,
    #[serde(rename = "Consumption(Wh)")]
    pub consumption_wh: Option<String>,
    #[serde(rename = "Max. PV power(W)", alias = "Max PV Power(W)")]
    pub max_pv_power_w: Option<String>,
    #[serde(rename = "Max. PV voltage(V)", alias = "Max PV Voltage(V)")]
    pub max_pv_voltage_v: Option<String>,
    #[serde(rename = "Min. battery voltage(V)", alias = "Min. Battery Voltage(V)")]
    pub min_battery_voltage_v: Option<String>,
    #[serde(rename = "Max. battery voltage(V)", alias = "Max. Battery Voltage(V)")]
    pub max_battery_voltage_v: Option<String>,
    #[serde(rename = "Time in bulk(m)", alias = "Time in Bulk(min)")]
    pub time_in_bulk_min: Option<String>,
    #[serde(rename = "Time in absorption(m)", alias = "Time in Absorption(min)")]
    pub time_in_absorption_min: Option<String>,
    #[serde(rename = "Time in float(m)", alias = "Time in Float(min)")]
    pub time_in_float_min: Option<String>,
    #[serde(rename = "Last error")]
    pub last_error: Option<String>,
    #[serde(rename = "2nd last error")]
    pub second_last_error: Option<String>,
    #[serde(rename = "3rd last error")]
    pub third_last_error: Option<String>,
    #[serde(rename = "4th last error")]
    pub fourth_last_error: Option<String>,
}

/// Aggregate statistics over a table of records.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SolarSummary {
    pub total_yield_wh: f64,
    pub total_consumption_wh: f64,
    pub max_pv_power_w: f64,
    pub max_pv_voltage_v: f64,
    pub min_battery_voltage_v: f64,
    pub max_battery_voltage_v: f64,
    pub record_count: usize,
}

/// Payback estimate for one reference system cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Payback {
    pub system_cost_usd: f64,
    /// Years until cumulative savings cover the cost, or
    /// [`crate::cost::PAYBACK_NOT_ACHIEVABLE_YEARS`] when not achievable.
    pub years: f64,
    /// False when projected annual savings are not positive.
    pub achievable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostMetrics {
    pub rate_per_kwh: f64,
    pub days_analyzed: usize,
    pub total_solar_kwh: f64,
    pub total_consumption_kwh: f64,
    pub solar_value_usd: f64,
    pub consumption_cost_usd: f64,
    pub net_savings_usd: f64,
    pub solar_offset_pct: f64,
    pub avg_daily_solar_kwh: f64,
    pub avg_daily_consumption_kwh: f64,
    pub projected_annual_usd: f64,
    pub payback: Vec<Payback>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub name: &'static str,
    pub passed: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQualityReport {
    pub total_checks: usize,
    pub passed_checks: usize,
    pub failed_checks: usize,
    pub results: Vec<ValidationResult>,
}

impl DataQualityReport {
    pub fn from_results(results: Vec<ValidationResult>) -> Self {
        let passed_checks = results.iter().filter(|r| r.passed).count();
        Self {
            total_checks: results.len(),
            passed_checks,
            failed_checks: results.len() - passed_checks,
            results,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed_checks == 0
    }

    pub fn result(&self, name: &str) -> Option<&ValidationResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

/// Console row for the data-quality preview table.
#[derive(Debug, Tabled, Clone)]
pub struct QualityRow {
    #[tabled(rename = "Check")]
    pub check: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Details")]
    pub details: String,
}

impl From<&ValidationResult> for QualityRow {
    fn from(r: &ValidationResult) -> Self {
        QualityRow {
            check: r.name.to_string(),
            status: if r.passed { "PASS" } else { "FAIL" }.to_string(),
            details: r.message.clone(),
        }
    }
}

/// Everything written to the JSON summary file.
#[derive(Debug, Serialize)]
pub struct SummaryFile<'a> {
    pub summary: &'a SolarSummary,
    pub cost: &'a CostMetrics,
    pub data_quality: &'a DataQualityReport,
}
