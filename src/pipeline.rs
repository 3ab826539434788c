//! Load a charge-controller history CSV and compute summary statistics.

use crate::error::{Result, SolarError};
use crate::loader::{self, LoadReport, RawTable, RowPolicy};
use crate::record::SolarRecord;
use crate::types::SolarSummary;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Parsed records in file order. The Victron export is newest-first, so
/// call [`SolarTable::sorted_by_date`] before any time-series work.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolarTable {
    records: Vec<SolarRecord>,
}

impl SolarTable {
    pub fn new(records: Vec<SolarRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SolarRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Extract one numeric column.
    pub fn column(&self, f: impl Fn(&SolarRecord) -> f64) -> Vec<f64> {
        self.records.iter().map(f).collect()
    }

    /// Chronological copy of the table. Records sharing a date keep their
    /// relative order.
    pub fn sorted_by_date(&self) -> SolarTable {
        let mut records = self.records.clone();
        records.sort_by_key(|r| r.date);
        SolarTable { records }
    }

    /// Records with `start <= date <= end`, in their original order.
    pub fn filter_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> SolarTable {
        self.records
            .iter()
            .filter(|r| r.date >= start && r.date <= end)
            .cloned()
            .collect()
    }

    /// Totals and extrema in a single pass. An empty table yields the
    /// all-zero summary.
    pub fn summarize(&self) -> SolarSummary {
        let Some(first) = self.records.first() else {
            return SolarSummary::default();
        };
        let init = SolarSummary {
            total_yield_wh: 0.0,
            total_consumption_wh: 0.0,
            max_pv_power_w: first.max_pv_power_w,
            max_pv_voltage_v: first.max_pv_voltage_v,
            min_battery_voltage_v: first.min_battery_voltage_v,
            max_battery_voltage_v: first.max_battery_voltage_v,
            record_count: self.records.len(),
        };
        self.records.iter().fold(init, |mut acc, r| {
            acc.total_yield_wh += r.yield_wh;
            acc.total_consumption_wh += r.consumption_wh;
            acc.max_pv_power_w = acc.max_pv_power_w.max(r.max_pv_power_w);
            acc.max_pv_voltage_v = acc.max_pv_voltage_v.max(r.max_pv_voltage_v);
            acc.min_battery_voltage_v = acc.min_battery_voltage_v.min(r.min_battery_voltage_v);
            acc.max_battery_voltage_v = acc.max_battery_voltage_v.max(r.max_battery_voltage_v);
            acc
        })
    }
}

impl FromIterator<SolarRecord> for SolarTable {
    fn from_iter<I: IntoIterator<Item = SolarRecord>>(iter: I) -> Self {
        SolarTable::new(iter.into_iter().collect())
    }
}

/// State of one run over one CSV file.
#[derive(Debug)]
pub struct SolarPipeline {
    csv_path: PathBuf,
    policy: RowPolicy,
    loaded: Option<Loaded>,
}

#[derive(Debug)]
struct Loaded {
    raw: RawTable,
    table: SolarTable,
    report: LoadReport,
}

impl SolarPipeline {
    /// Create a pipeline for `csv_path`. Fails if the file does not exist.
    pub fn new(csv_path: impl AsRef<Path>, policy: RowPolicy) -> Result<Self> {
        let csv_path = csv_path.as_ref().to_path_buf();
        if !csv_path.exists() {
            return Err(SolarError::NotFound(csv_path));
        }
        info!("Initialized SolarPipeline with {}", csv_path.display());
        Ok(Self {
            csv_path,
            policy,
            loaded: None,
        })
    }

    /// Read and parse the CSV. Calling it again reloads from disk.
    pub fn load(&mut self) -> Result<&SolarTable> {
        let raw = loader::read_raw(&self.csv_path)?;
        let (records, report) = loader::parse_records(&raw, self.policy)?;
        info!(
            "Loaded {} rows from {} ({} skipped)",
            report.loaded_rows,
            self.csv_path.display(),
            report.skipped_rows
        );
        let loaded = self.loaded.insert(Loaded {
            raw,
            table: SolarTable::new(records),
            report,
        });
        Ok(&loaded.table)
    }

    fn loaded(&self) -> Result<&Loaded> {
        self.loaded.as_ref().ok_or(SolarError::NotLoaded)
    }

    pub fn table(&self) -> Result<&SolarTable> {
        Ok(&self.loaded()?.table)
    }

    pub fn raw(&self) -> Result<&RawTable> {
        Ok(&self.loaded()?.raw)
    }

    pub fn load_report(&self) -> Result<&LoadReport> {
        Ok(&self.loaded()?.report)
    }

    pub fn summarize(&self) -> Result<SolarSummary> {
        let summary = self.table()?.summarize();
        debug!("Generated summary: {:?}", summary);
        Ok(summary)
    }

    pub fn filter_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<SolarTable> {
        let filtered = self.table()?.filter_by_date_range(start, end);
        info!("Filtered {} rows between {} and {}", filtered.len(), start, end);
        Ok(filtered)
    }
}
