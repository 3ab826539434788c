use crate::error::Result;
use crate::types::{DataQualityReport, QualityRow};
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table};
use tracing::info;

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text)?;
    info!("Report saved to {}", path.display());
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    info!("Summary saved to {}", path.display());
    Ok(())
}

/// Markdown table of every check and its outcome.
pub fn quality_table(report: &DataQualityReport) -> String {
    let rows: Vec<QualityRow> = report.results.iter().map(QualityRow::from).collect();
    Table::new(rows).with(Style::markdown()).to_string()
}
