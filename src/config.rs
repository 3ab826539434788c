//! Run configuration: a TOML file plus a few environment overrides.

use crate::cost::{DEFAULT_RATE_PER_KWH, DEFAULT_SYSTEM_COSTS};
use crate::error::{Result, SolarError};
use crate::loader::RowPolicy;
use crate::quality::VoltageRange;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "SOLAR_REPORT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "solar_report.toml";

fn default_input_csv() -> PathBuf {
    PathBuf::from("data/SolarHistory.csv")
}

fn default_report_path() -> PathBuf {
    PathBuf::from("cost_report.txt")
}

fn default_summary_json_path() -> PathBuf {
    PathBuf::from("summary.json")
}

fn default_chart_path() -> PathBuf {
    PathBuf::from("solar_dashboard.png")
}

fn default_yield_chart_path() -> PathBuf {
    PathBuf::from("yield_over_time.png")
}

fn default_voltage_chart_path() -> PathBuf {
    PathBuf::from("battery_voltage.png")
}

fn default_rate() -> f64 {
    DEFAULT_RATE_PER_KWH
}

fn default_system_costs() -> Vec<f64> {
    DEFAULT_SYSTEM_COSTS.to_vec()
}

fn default_voltage_max() -> f64 {
    VoltageRange::default().max_v
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_input_csv")]
    pub input_csv: PathBuf,

    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,

    #[serde(default = "default_summary_json_path")]
    pub summary_json_path: PathBuf,

    /// Dashboard PNG output
    #[serde(default = "default_chart_path")]
    pub chart_path: PathBuf,

    #[serde(default = "default_yield_chart_path")]
    pub yield_chart_path: PathBuf,

    #[serde(default = "default_voltage_chart_path")]
    pub voltage_chart_path: PathBuf,

    /// Electricity price in USD per kWh
    #[serde(default = "default_rate")]
    pub rate_per_kwh: f64,

    /// Reference system costs (USD) payback is quoted for
    #[serde(default = "default_system_costs")]
    pub system_costs: Vec<f64>,

    #[serde(default)]
    pub row_policy: RowPolicy,

    #[serde(default)]
    pub voltage_min_v: f64,

    #[serde(default = "default_voltage_max")]
    pub voltage_max_v: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input_csv: default_input_csv(),
            report_path: default_report_path(),
            summary_json_path: default_summary_json_path(),
            chart_path: default_chart_path(),
            yield_chart_path: default_yield_chart_path(),
            voltage_chart_path: default_voltage_chart_path(),
            rate_per_kwh: default_rate(),
            system_costs: default_system_costs(),
            row_policy: RowPolicy::default(),
            voltage_min_v: 0.0,
            voltage_max_v: default_voltage_max(),
        }
    }
}

impl AppConfig {
    pub fn voltage_range(&self) -> VoltageRange {
        VoltageRange {
            min_v: self.voltage_min_v,
            max_v: self.voltage_max_v,
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .map_err(|e| SolarError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.rate_per_kwh.is_finite() || self.rate_per_kwh < 0.0 {
            return Err(SolarError::Config(format!(
                "rate_per_kwh must be a non-negative number, got {}",
                self.rate_per_kwh
            )));
        }
        if self.voltage_min_v > self.voltage_max_v {
            return Err(SolarError::Config(format!(
                "voltage_min_v ({}) exceeds voltage_max_v ({})",
                self.voltage_min_v, self.voltage_max_v
            )));
        }
        Ok(())
    }

    /// Apply `SOLAR_CSV`, `SOLAR_RATE` and `SOLAR_REPORT_PATH` overrides.
    pub fn apply_env(mut self, get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(csv) = get("SOLAR_CSV") {
            self.input_csv = PathBuf::from(csv);
        }
        if let Some(rate) = get("SOLAR_RATE") {
            self.rate_per_kwh = rate
                .trim()
                .parse()
                .map_err(|_| SolarError::Config(format!("invalid SOLAR_RATE: {rate:?}")))?;
        }
        if let Some(report) = get("SOLAR_REPORT_PATH") {
            self.report_path = PathBuf::from(report);
        }
        self.validate()?;
        Ok(self)
    }
}

/// Load the config named by `SOLAR_REPORT_CONFIG` (or `solar_report.toml`),
/// falling back to defaults when the file does not exist, then apply
/// environment overrides.
pub fn load_config() -> Result<AppConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config_from(Path::new(&path))?.apply_env(|key| std::env::var(key).ok())
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        AppConfig::from_toml(&content)
    } else {
        Ok(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.input_csv, PathBuf::from("data/SolarHistory.csv"));
        assert_eq!(config.chart_path, PathBuf::from("solar_dashboard.png"));
        assert_eq!(config.yield_chart_path, PathBuf::from("yield_over_time.png"));
        assert_eq!(config.rate_per_kwh, 0.14);
        assert_eq!(config.system_costs, vec![1000.0, 2000.0, 3000.0]);
        assert_eq!(config.row_policy, RowPolicy::Strict);
        assert_eq!(config.voltage_range(), VoltageRange { min_v: 0.0, max_v: 20.0 });
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            input_csv = "history.csv"
            rate_per_kwh = 0.21
            row_policy = "lenient"
            voltage_max_v = 32.0
            "#,
        )
        .unwrap();
        assert_eq!(config.input_csv, PathBuf::from("history.csv"));
        assert_eq!(config.rate_per_kwh, 0.21);
        assert_eq!(config.row_policy, RowPolicy::Lenient);
        assert_eq!(config.voltage_max_v, 32.0);
        assert_eq!(config.report_path, PathBuf::from("cost_report.txt"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            AppConfig::from_toml("rate_per_kwh = -1.0"),
            Err(SolarError::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("voltage_min_v = 30.0"),
            Err(SolarError::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("unknown_key = 1"),
            Err(SolarError::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([("SOLAR_CSV", "other.csv"), ("SOLAR_RATE", " 0.3 ")]);
        let config = AppConfig::default()
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.input_csv, PathBuf::from("other.csv"));
        assert_eq!(config.rate_per_kwh, 0.3);

        let err = AppConfig::default()
            .apply_env(|k| (k == "SOLAR_RATE").then(|| "cheap".to_string()))
            .unwrap_err();
        assert!(matches!(err, SolarError::Config(_)));
    }

    #[test]
    fn test_load_from_file_or_default() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "report_path = \"out/report.txt\"").unwrap();
        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.report_path, PathBuf::from("out/report.txt"));

        let missing = load_config_from(Path::new("/nonexistent/solar_report.toml")).unwrap();
        assert_eq!(missing, AppConfig::default());
    }
}
