use crate::error::{Result, SolarError};
use crate::record::SolarRecord;
use crate::types::{RawRow, EXPECTED_COLUMNS};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// What to do with a data row that fails record validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    /// Abort the whole load on the first invalid row.
    #[default]
    Strict,
    /// Skip invalid rows and count them in [`LoadReport::skipped_rows`].
    Lenient,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub skipped_rows: usize,
}

/// The CSV as read from disk: header names plus one [`RawRow`] per data line.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Data rows start on line 2; the header occupies line 1.
pub(crate) fn data_line(index: usize) -> u64 {
    index as u64 + 2
}

fn check_width(record: &StringRecord, line: u64) -> Result<()> {
    if record.len() != EXPECTED_COLUMNS {
        return Err(SolarError::ColumnCount {
            line,
            expected: EXPECTED_COLUMNS,
            found: record.len(),
        });
    }
    Ok(())
}

/// Read the whole CSV into memory without interpreting any values.
///
/// Fails if the file is missing, has no data rows, or any line does not
/// have exactly [`EXPECTED_COLUMNS`] fields.
pub fn read_raw(path: &Path) -> Result<RawTable> {
    if !path.exists() {
        return Err(SolarError::NotFound(path.to_path_buf()));
    }
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;

    let headers = rdr.headers()?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(SolarError::EmptyFile(path.to_path_buf()));
    }
    check_width(&headers, 1)?;

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        check_width(&record, data_line(idx))?;
        rows.push(record.deserialize::<RawRow>(Some(&headers))?);
    }
    if rows.is_empty() {
        return Err(SolarError::EmptyFile(path.to_path_buf()));
    }

    debug!("Read {} raw rows from {}", rows.len(), path.display());
    Ok(RawTable {
        headers: headers.iter().map(str::to_string).collect(),
        rows,
    })
}

/// Turn raw rows into records according to `policy`.
pub fn parse_records(raw: &RawTable, policy: RowPolicy) -> Result<(Vec<SolarRecord>, LoadReport)> {
    let mut records = Vec::with_capacity(raw.len());
    let mut skipped_rows = 0usize;

    for (idx, row) in raw.rows.iter().enumerate() {
        match SolarRecord::from_raw(row) {
            Ok(rec) => records.push(rec),
            Err(source) => {
                let line = data_line(idx);
                match policy {
                    RowPolicy::Strict => return Err(SolarError::Row { line, source }),
                    RowPolicy::Lenient => {
                        warn!("Skipping line {}: {}", line, source);
                        skipped_rows += 1;
                    }
                }
            }
        }
    }

    let report = LoadReport {
        total_rows: raw.len(),
        loaded_rows: records.len(),
        skipped_rows,
    };
    Ok((records, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "Days ago,Date,Yield(Wh),Consumption(Wh),Max. PV power(W),Max. PV voltage(V),Min. battery voltage(V),Max. battery voltage(V),Time in bulk(m),Time in absorption(m),Time in float(m),Last error,2nd last error,3rd last error,4th last error";

    fn csv_file(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{body}").unwrap();
        file
    }

    #[test]
    fn test_missing_file() {
        let err = read_raw(Path::new("/nonexistent/SolarHistory.csv")).unwrap_err();
        assert!(matches!(err, SolarError::NotFound(_)));
    }

    #[test]
    fn test_empty_file() {
        let file = csv_file("");
        assert!(matches!(read_raw(file.path()), Err(SolarError::EmptyFile(_))));

        let file = csv_file(&format!("{HEADER}\n"));
        assert!(matches!(read_raw(file.path()), Err(SolarError::EmptyFile(_))));
    }

    #[test]
    fn test_wrong_column_count() {
        let file = csv_file(&format!(
            "{HEADER}\n0,10/12/25,310,120,95,21.4,12.4,14.4,180,60,240,0,0,0\n"
        ));
        let err = read_raw(file.path()).unwrap_err();
        assert!(matches!(
            err,
            SolarError::ColumnCount { line: 2, expected: 15, found: 14 }
        ));
    }

    #[test]
    fn test_alias_headers_are_accepted() {
        let header = HEADER
            .replace("Max. PV power(W)", "Max PV Power(W)")
            .replace("Time in bulk(m)", "Time in Bulk(min)");
        let file = csv_file(&format!(
            "{header}\n0,10/12/25,310,120,95,21.4,12.4,14.4,180,60,240,0,0,0,0\n"
        ));
        let raw = read_raw(file.path()).unwrap();
        assert_eq!(raw.rows[0].max_pv_power_w.as_deref(), Some("95"));
        assert_eq!(raw.rows[0].time_in_bulk_min.as_deref(), Some("180"));
    }

    #[test]
    fn test_policies() {
        let file = csv_file(&format!(
            "{HEADER}\n\
             0,10/12/25,310,120,95,21.4,12.4,14.4,180,60,240,0,0,0,0\n\
             1,10/11/25,,120,95,21.4,12.4,14.4,180,60,240,0,0,0,0\n\
             2,10/10/25,200,100,80,20.1,12.2,14.3,200,50,200,0,0,0,0\n"
        ));
        let raw = read_raw(file.path()).unwrap();
        assert_eq!(raw.len(), 3);

        let err = parse_records(&raw, RowPolicy::Strict).unwrap_err();
        match err {
            SolarError::Row { line, source } => {
                assert_eq!(line, 3);
                assert_eq!(source.field(), "Yield(Wh)");
            }
            other => panic!("unexpected error: {other}"),
        }

        let (records, report) = parse_records(&raw, RowPolicy::Lenient).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            report,
            LoadReport { total_rows: 3, loaded_rows: 2, skipped_rows: 1 }
        );
    }
}
