//! Sensor log classification by filename.
//!
//! Session folders contain CSV logs whose names identify the sensor
//! (`Accelerometer.csv`, `gyro_log.csv`, `GPS Location.csv`, ...). The
//! match is a case-insensitive substring check; when several files match
//! the same sensor the last one in sorted order wins.

use std::fmt;
use std::path::{Path, PathBuf};

/// The sensors a session folder can contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Accelerometer,
    Gyroscope,
    Gps,
    Proximity,
}

impl SensorKind {
    pub fn label(&self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::Gyroscope => "gyroscope",
            SensorKind::Gps => "gps",
            SensorKind::Proximity => "proximity",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The sensor logs found in one session folder.
///
/// A `None` entry means the session simply has no log for that sensor.
#[derive(Debug, Clone, Default)]
pub struct SensorFiles {
    pub accelerometer: Option<PathBuf>,
    pub gyroscope: Option<PathBuf>,
    pub gps: Option<PathBuf>,
    pub proximity: Option<PathBuf>,
}

impl SensorFiles {
    pub fn get(&self, kind: SensorKind) -> Option<&Path> {
        match kind {
            SensorKind::Accelerometer => self.accelerometer.as_deref(),
            SensorKind::Gyroscope => self.gyroscope.as_deref(),
            SensorKind::Gps => self.gps.as_deref(),
            SensorKind::Proximity => self.proximity.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.accelerometer.is_none()
            && self.gyroscope.is_none()
            && self.gps.is_none()
            && self.proximity.is_none()
    }

    /// Labels of the sensors present, for diagnostics.
    pub fn found_labels(&self) -> Vec<&'static str> {
        [
            SensorKind::Accelerometer,
            SensorKind::Gyroscope,
            SensorKind::Gps,
            SensorKind::Proximity,
        ]
        .iter()
        .filter(|k| self.get(**k).is_some())
        .map(|k| k.label())
        .collect()
    }
}

/// Classify the CSV files in a session folder by sensor.
pub fn classify_sensor_files(dir: &Path) -> std::io::Result<SensorFiles> {
    let mut csv_files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .collect();
    csv_files.sort();

    let mut files = SensorFiles::default();
    for path in csv_files {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_lowercase(),
            None => continue,
        };

        if name.contains("accel") {
            files.accelerometer = Some(path);
        } else if name.contains("gyro") {
            files.gyroscope = Some(path);
        } else if name.contains("gps") || name.contains("location") {
            files.gps = Some(path);
        } else if name.contains("prox") {
            files.proximity = Some(path);
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_dir(name: &str, files: &[&str]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("drivesense-classify-{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        for f in files {
            std::fs::write(dir.join(f), "a,b\n1,2\n").unwrap();
        }
        dir
    }

    #[test]
    fn test_classify_all_sensors() {
        let dir = session_dir(
            "all",
            &[
                "Accelerometer.csv",
                "Gyroscope.csv",
                "GPS_log.csv",
                "Proximity.csv",
            ],
        );
        let files = classify_sensor_files(&dir).unwrap();
        assert!(files.accelerometer.is_some());
        assert!(files.gyroscope.is_some());
        assert!(files.gps.is_some());
        assert!(files.proximity.is_some());
    }

    #[test]
    fn test_classify_location_matches_gps() {
        let dir = session_dir("loc", &["location_trace.csv"]);
        let files = classify_sensor_files(&dir).unwrap();
        assert!(files.gps.is_some());
        assert!(files.accelerometer.is_none());
    }

    #[test]
    fn test_classify_ignores_non_csv() {
        let dir = session_dir("noise", &["accel.txt", "readme.md"]);
        let files = classify_sensor_files(&dir).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_classify_last_match_wins() {
        let dir = session_dir("dupes", &["accel_a.csv", "accel_b.csv"]);
        let files = classify_sensor_files(&dir).unwrap();
        let kept = files.accelerometer.unwrap();
        assert!(kept.to_string_lossy().ends_with("accel_b.csv"));
    }

    #[test]
    fn test_found_labels() {
        let dir = session_dir("labels", &["accel.csv", "gyro.csv"]);
        let files = classify_sensor_files(&dir).unwrap();
        assert_eq!(files.found_labels(), vec!["accelerometer", "gyroscope"]);
    }
}
