//! In-memory tabular data for sensor logs.
//!
//! Sensor logs are small enough to read fully into memory. Cells are kept
//! as raw strings so values pass through to the merged corpus unmodified.

use std::path::Path;
use thiserror::Error;

/// A headered table of string cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Errors reading or writing tabular files.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: csv::Error,
    },
}

impl Table {
    /// Create an empty table with the given headers.
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Read a CSV file fully into memory.
    ///
    /// The first record is treated as the header row. Ragged or otherwise
    /// unparseable files are an error; callers decide whether that skips
    /// the sensor or aborts.
    pub fn read_csv(path: &Path) -> Result<Self, TableError> {
        let read_err = |source| TableError::Read {
            path: path.display().to_string(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(read_err)?;

        let headers = reader
            .headers()
            .map_err(read_err)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(read_err)?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Write the table as a CSV file, replacing any existing file.
    pub fn write_csv(&self, path: &Path) -> Result<(), TableError> {
        let write_err = |source| TableError::Write {
            path: path.display().to_string(),
            source,
        };

        let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
        writer.write_record(&self.headers).map_err(write_err)?;
        for row in &self.rows {
            writer.write_record(row).map_err(write_err)?;
        }
        writer.flush().map_err(|e| TableError::Write {
            path: path.display().to_string(),
            source: csv::Error::from(e),
        })?;

        Ok(())
    }

    /// Keep every `stride`-th row starting from row 0, reindexed
    /// contiguously. A stride of zero is treated as 1.
    pub fn decimate(&self, stride: usize) -> Self {
        let stride = stride.max(1);
        Self {
            headers: self.headers.clone(),
            rows: self.rows.iter().step_by(stride).cloned().collect(),
        }
    }

    /// Drop all rows past `len`.
    pub fn truncate(&mut self, len: usize) {
        self.rows.truncate(len);
    }

    /// Append a row. The caller is responsible for matching the width.
    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns, per the header row.
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Cell at (row, col), or `"0"` when the row or column is out of
    /// range. Out-of-range reads happen when an optional sensor log is
    /// shorter than the required ones.
    pub fn cell_or_zero(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_csv(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("drivesense-table-{name}"));
        std::fs::write(&path, content).unwrap();
        path
    }

    fn numbered_csv(rows: usize) -> String {
        let mut s = String::from("x,y\n");
        for i in 0..rows {
            s.push_str(&format!("{i},{}\n", i * 2));
        }
        s
    }

    #[test]
    fn test_read_csv_headers_and_rows() {
        let path = temp_csv("basic.csv", "a,b,c\n1,2,3\n4,5,6\n");
        let table = Table::read_csv(&path).unwrap();
        assert_eq!(table.headers(), &["a", "b", "c"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1], vec!["4", "5", "6"]);
    }

    #[test]
    fn test_read_csv_ragged_is_error() {
        let path = temp_csv("ragged.csv", "a,b\n1,2\n3\n");
        assert!(Table::read_csv(&path).is_err());
    }

    #[test]
    fn test_read_csv_missing_file_is_error() {
        let path = std::env::temp_dir().join("drivesense-table-missing.csv");
        let _ = std::fs::remove_file(&path);
        assert!(Table::read_csv(&path).is_err());
    }

    #[test]
    fn test_decimate_97_rows_stride_10() {
        let path = temp_csv("decimate.csv", &numbered_csv(97));
        let table = Table::read_csv(&path).unwrap();
        let sampled = table.decimate(10);

        // Rows 0, 10, ..., 90 survive, reindexed 0..9.
        assert_eq!(sampled.len(), 10);
        assert_eq!(sampled.rows()[0][0], "0");
        assert_eq!(sampled.rows()[9][0], "90");
    }

    #[test]
    fn test_decimate_stride_zero_keeps_all_rows() {
        let path = temp_csv("stride0.csv", &numbered_csv(5));
        let table = Table::read_csv(&path).unwrap();
        assert_eq!(table.decimate(0).len(), 5);
    }

    #[test]
    fn test_cell_or_zero_out_of_range() {
        let mut table = Table::new(vec!["a".into()]);
        table.push_row(vec!["7".into()]);
        assert_eq!(table.cell_or_zero(0, 0), "7");
        assert_eq!(table.cell_or_zero(1, 0), "0");
        assert_eq!(table.cell_or_zero(0, 3), "0");
    }

    #[test]
    fn test_write_csv_round_trip() {
        let mut table = Table::new(vec!["a".into(), "b".into()]);
        table.push_row(vec!["1".into(), "2".into()]);
        let path = std::env::temp_dir().join("drivesense-table-roundtrip.csv");
        table.write_csv(&path).unwrap();

        let restored = Table::read_csv(&path).unwrap();
        assert_eq!(restored, table);
    }
}
