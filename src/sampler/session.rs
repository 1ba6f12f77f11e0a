//! Per-session sensor merge.
//!
//! One session folder yields one merged table. Accelerometer and gyroscope
//! are required; GPS and proximity degrade to zero-filled columns. Rows
//! are paired by index after decimation: row i of the accelerometer goes
//! with row i of the gyroscope. There is no timestamp alignment, which
//! assumes the source logs were captured at synchronized rates.

use crate::sampler::classify::{classify_sensor_files, SensorKind};
use crate::sampler::table::{Table, TableError};
use std::path::Path;
use thiserror::Error;

/// Label for a driving session, derived from its parent folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorLabel {
    Safe,
    Risky,
}

impl BehaviorLabel {
    /// Numeric label written to the corpus.
    pub fn as_u8(&self) -> u8 {
        match self {
            BehaviorLabel::Safe => 0,
            BehaviorLabel::Risky => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorLabel::Safe => "safe",
            BehaviorLabel::Risky => "risky",
        }
    }
}

/// A merged session ready for the corpus.
#[derive(Debug, Clone)]
pub struct SessionTable {
    /// Source folder name, kept for traceability
    pub day: String,
    pub label: BehaviorLabel,
    pub table: Table,
}

/// Reasons a session folder is excluded from the corpus.
///
/// These abort only the session, never the run.
#[derive(Debug, Error)]
pub enum SessionSkip {
    #[error("no CSV files found")]
    NoCsvFiles,

    #[error("missing required sensor: {0}")]
    MissingSensor(SensorKind),

    #[error("unreadable {kind} log: {source}")]
    UnreadableSensor {
        kind: SensorKind,
        #[source]
        source: TableError,
    },

    #[error("failed to scan session folder: {0}")]
    Scan(#[from] std::io::Error),
}

/// Read and decimate one required sensor log.
fn sample_required(path: &Path, kind: SensorKind, stride: usize) -> Result<Table, SessionSkip> {
    let table =
        Table::read_csv(path).map_err(|source| SessionSkip::UnreadableSensor { kind, source })?;
    let sampled = table.decimate(stride);
    tracing::info!(
        sensor = kind.label(),
        raw_rows = table.len(),
        sampled_rows = sampled.len(),
        "sampled sensor log"
    );
    Ok(sampled)
}

/// Read and decimate an optional sensor log.
///
/// An unreadable optional log degrades to "sensor absent" instead of
/// skipping the session.
fn sample_optional(path: &Path, kind: SensorKind, stride: usize) -> Option<Table> {
    match Table::read_csv(path) {
        Ok(table) => {
            let sampled = table.decimate(stride);
            tracing::info!(
                sensor = kind.label(),
                raw_rows = table.len(),
                sampled_rows = sampled.len(),
                "sampled sensor log"
            );
            Some(sampled)
        }
        Err(e) => {
            tracing::warn!(sensor = kind.label(), error = %e, "skipping unreadable optional log");
            None
        }
    }
}

/// Merge one session folder into a labeled table.
pub fn merge_session(
    day_dir: &Path,
    label: BehaviorLabel,
    stride: usize,
) -> Result<SessionTable, SessionSkip> {
    let day = day_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let files = classify_sensor_files(day_dir)?;
    if files.is_empty() {
        return Err(SessionSkip::NoCsvFiles);
    }

    let accel_path = files
        .get(SensorKind::Accelerometer)
        .ok_or(SessionSkip::MissingSensor(SensorKind::Accelerometer))?;
    let gyro_path = files
        .get(SensorKind::Gyroscope)
        .ok_or(SessionSkip::MissingSensor(SensorKind::Gyroscope))?;

    tracing::info!(day = %day, sensors = ?files.found_labels(), "merging session");

    let mut accel = sample_required(accel_path, SensorKind::Accelerometer, stride)?;
    let mut gyro = sample_required(gyro_path, SensorKind::Gyroscope, stride)?;

    let min_rows = accel.len().min(gyro.len());
    accel.truncate(min_rows);
    gyro.truncate(min_rows);

    let gps = files
        .get(SensorKind::Gps)
        .and_then(|p| sample_optional(p, SensorKind::Gps, stride))
        .map(|mut t| {
            t.truncate(min_rows);
            if t.len() < min_rows {
                tracing::warn!(
                    day = %day,
                    have = t.len(),
                    need = min_rows,
                    "gps log shorter than required sensors, padding with zeros"
                );
            }
            t
        });
    let proximity = files
        .get(SensorKind::Proximity)
        .and_then(|p| sample_optional(p, SensorKind::Proximity, stride))
        .map(|mut t| {
            t.truncate(min_rows);
            if t.len() < min_rows {
                tracing::warn!(
                    day = %day,
                    have = t.len(),
                    need = min_rows,
                    "proximity log shorter than required sensors, padding with zeros"
                );
            }
            t
        });

    // Columns are renamed positionally per sensor; the source header
    // semantics carry over by position, not by name.
    let mut headers: Vec<String> = Vec::new();
    for i in 0..accel.width() {
        headers.push(format!("accel_{i}"));
    }
    for i in 0..gyro.width() {
        headers.push(format!("gyro_{i}"));
    }
    match &gps {
        Some(t) => {
            for i in 0..t.width() {
                headers.push(format!("gps_{i}"));
            }
        }
        None => {
            for i in 0..3 {
                headers.push(format!("gps_{i}"));
            }
        }
    }
    headers.push("proximity".to_string());
    headers.push("behavior".to_string());
    headers.push("day".to_string());

    let mut merged = Table::new(headers);
    for row in 0..min_rows {
        let mut cells: Vec<String> = Vec::with_capacity(merged.width());
        for col in 0..accel.width() {
            cells.push(accel.cell_or_zero(row, col).to_string());
        }
        for col in 0..gyro.width() {
            cells.push(gyro.cell_or_zero(row, col).to_string());
        }
        match &gps {
            Some(t) => {
                for col in 0..t.width() {
                    cells.push(t.cell_or_zero(row, col).to_string());
                }
            }
            None => cells.extend(["0".to_string(), "0".to_string(), "0".to_string()]),
        }
        match &proximity {
            Some(t) => cells.push(t.cell_or_zero(row, 0).to_string()),
            None => cells.push("0".to_string()),
        }
        cells.push(label.as_u8().to_string());
        cells.push(day.clone());
        merged.push_row(cells);
    }

    tracing::info!(day = %day, rows = merged.len(), columns = merged.width(), "merged session");

    Ok(SessionTable {
        day,
        label,
        table: merged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn numbered_csv(prefix: &str, cols: usize, rows: usize) -> String {
        let headers: Vec<String> = (0..cols).map(|c| format!("{prefix}{c}")).collect();
        let mut s = headers.join(",");
        s.push('\n');
        for r in 0..rows {
            let row: Vec<String> = (0..cols).map(|c| format!("{r}.{c}")).collect();
            s.push_str(&row.join(","));
            s.push('\n');
        }
        s
    }

    fn session_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("drivesense-session-{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_merge_required_only_zero_fills_optionals() {
        let dir = session_dir("required-only");
        std::fs::write(dir.join("accel.csv"), numbered_csv("ax", 3, 100)).unwrap();
        std::fs::write(dir.join("gyro.csv"), numbered_csv("gx", 3, 80)).unwrap();

        let session = merge_session(&dir, BehaviorLabel::Risky, 10).unwrap();

        // min(ceil(100/10), ceil(80/10)) = min(10, 8) = 8 rows.
        assert_eq!(session.table.len(), 8);
        assert_eq!(
            session.table.headers(),
            &[
                "accel_0", "accel_1", "accel_2", "gyro_0", "gyro_1", "gyro_2", "gps_0", "gps_1",
                "gps_2", "proximity", "behavior", "day"
            ]
        );

        for row in session.table.rows() {
            assert_eq!(&row[6..10], &["0", "0", "0", "0"]);
            assert_eq!(row[10], "1");
        }
    }

    #[test]
    fn test_merge_missing_gyro_skips_session() {
        let dir = session_dir("no-gyro");
        std::fs::write(dir.join("accel.csv"), numbered_csv("ax", 3, 50)).unwrap();

        let err = merge_session(&dir, BehaviorLabel::Safe, 10).unwrap_err();
        assert!(matches!(
            err,
            SessionSkip::MissingSensor(SensorKind::Gyroscope)
        ));
    }

    #[test]
    fn test_merge_empty_folder_skips_session() {
        let dir = session_dir("empty");
        let err = merge_session(&dir, BehaviorLabel::Safe, 10).unwrap_err();
        assert!(matches!(err, SessionSkip::NoCsvFiles));
    }

    #[test]
    fn test_merge_unreadable_accel_skips_session() {
        let dir = session_dir("bad-accel");
        std::fs::write(dir.join("accel.csv"), "a,b\n1,2\n3\n").unwrap();
        std::fs::write(dir.join("gyro.csv"), numbered_csv("gx", 3, 50)).unwrap();

        let err = merge_session(&dir, BehaviorLabel::Safe, 10).unwrap_err();
        assert!(matches!(
            err,
            SessionSkip::UnreadableSensor {
                kind: SensorKind::Accelerometer,
                ..
            }
        ));
    }

    #[test]
    fn test_merge_with_gps_and_proximity() {
        let dir = session_dir("full");
        std::fs::write(dir.join("accel.csv"), numbered_csv("ax", 3, 40)).unwrap();
        std::fs::write(dir.join("gyro.csv"), numbered_csv("gx", 3, 40)).unwrap();
        std::fs::write(dir.join("gps.csv"), numbered_csv("lx", 3, 40)).unwrap();
        std::fs::write(dir.join("prox.csv"), numbered_csv("px", 2, 40)).unwrap();

        let session = merge_session(&dir, BehaviorLabel::Safe, 10).unwrap();
        assert_eq!(session.table.len(), 4);

        let first = &session.table.rows()[0];
        // GPS row 0 carried over, proximity takes only the first column.
        assert_eq!(&first[6..9], &["0.0", "0.1", "0.2"]);
        assert_eq!(first[9], "0.0");
        assert_eq!(first[10], "0");
    }

    #[test]
    fn test_merge_short_gps_padded_with_zeros() {
        let dir = session_dir("short-gps");
        std::fs::write(dir.join("accel.csv"), numbered_csv("ax", 2, 60)).unwrap();
        std::fs::write(dir.join("gyro.csv"), numbered_csv("gx", 2, 60)).unwrap();
        std::fs::write(dir.join("gps.csv"), numbered_csv("lx", 3, 20)).unwrap();

        let session = merge_session(&dir, BehaviorLabel::Safe, 10).unwrap();
        assert_eq!(session.table.len(), 6);

        // GPS has 2 sampled rows; rows beyond that read as zeros.
        assert_eq!(&session.table.rows()[1][4..7], &["1.0", "1.1", "1.2"]);
        assert_eq!(&session.table.rows()[3][4..7], &["0", "0", "0"]);
    }

    #[test]
    fn test_merge_unreadable_gps_degrades_to_zero_columns() {
        let dir = session_dir("bad-gps");
        std::fs::write(dir.join("accel.csv"), numbered_csv("ax", 2, 30)).unwrap();
        std::fs::write(dir.join("gyro.csv"), numbered_csv("gx", 2, 30)).unwrap();
        std::fs::write(dir.join("gps.csv"), "a,b\n1\n").unwrap();

        let session = merge_session(&dir, BehaviorLabel::Risky, 10).unwrap();
        assert_eq!(&session.table.rows()[0][4..7], &["0", "0", "0"]);
    }
}
