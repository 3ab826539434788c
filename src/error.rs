//! Error types for loading, validating and reporting on solar history data.

use std::path::PathBuf;
use thiserror::Error;

/// Why a single CSV row could not become a [`crate::record::SolarRecord`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing value for {field}")]
    Missing { field: &'static str },

    #[error("invalid number for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("negative value for {field}: {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("date must be in MM/DD/YY format, got: {value:?}")]
    InvalidDate { value: String },

    #[error("min battery voltage {min} exceeds max battery voltage {max}")]
    VoltageOrder { min: f64, max: f64 },
}

impl ValidationError {
    /// Canonical CSV header of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field }
            | Self::InvalidNumber { field, .. }
            | Self::Negative { field, .. } => field,
            Self::InvalidDate { .. } => "Date",
            Self::VoltageOrder { .. } => "Min. battery voltage(V)",
        }
    }
}

#[derive(Debug, Error)]
pub enum SolarError {
    #[error("CSV file not found: {0}")]
    NotFound(PathBuf),

    #[error("CSV file is empty: {0}")]
    EmptyFile(PathBuf),

    #[error("line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: {source}")]
    Row {
        line: u64,
        #[source]
        source: ValidationError,
    },

    #[error("data has not been loaded; call load() first")]
    NotLoaded,

    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("chart rendering failed: {0}")]
    Chart(String),
}

pub type Result<T> = std::result::Result<T, SolarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_field() {
        let err = ValidationError::InvalidNumber {
            field: "Yield(Wh)",
            value: "abc".to_string(),
        };
        assert_eq!(err.field(), "Yield(Wh)");
        assert_eq!(err.to_string(), "invalid number for Yield(Wh): \"abc\"");

        let err = ValidationError::InvalidDate {
            value: "2025-10-01".to_string(),
        };
        assert_eq!(err.field(), "Date");
    }

    #[test]
    fn test_row_error_reports_line() {
        let err = SolarError::Row {
            line: 4,
            source: ValidationError::Missing { field: "Consumption(Wh)" },
        };
        assert_eq!(err.to_string(), "line 4: missing value for Consumption(Wh)");
    }
}
