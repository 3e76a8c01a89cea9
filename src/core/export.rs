use crate::config::settings::{ExportConfig, ExportFormat};
use crate::domain::model::{AlertReport, CountOutlier, SnapshotMatch, StaticShip};
use crate::domain::ports::Storage;
use crate::utils::error::{AlertError, Result};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

const OUTLIER_COLUMNS: [&str; 7] = [
    "harbour",
    "date",
    "ship_type",
    "count",
    "bound",
    "bound_type",
    "breach_pct",
];
const STATIC_COLUMNS: [&str; 5] = ["harbour", "lon", "lat", "ship_type", "periods"];
const SNAPSHOT_COLUMNS: [&str; 9] = [
    "harbour",
    "lon",
    "lat",
    "reference_id",
    "reference_date",
    "reference_ship_type",
    "current_id",
    "current_date",
    "current_ship_type",
];

/// Flat csv row for a [`SnapshotMatch`].
#[derive(Debug, Serialize)]
struct SnapshotRow<'a> {
    harbour: &'a str,
    lon: f64,
    lat: f64,
    reference_id: &'a str,
    reference_date: NaiveDateTime,
    reference_ship_type: &'a str,
    current_id: &'a str,
    current_date: NaiveDateTime,
    current_ship_type: &'a str,
}

impl<'a> From<&'a SnapshotMatch> for SnapshotRow<'a> {
    fn from(m: &'a SnapshotMatch) -> Self {
        Self {
            harbour: &m.harbour,
            lon: m.lon,
            lat: m.lat,
            reference_id: &m.reference.id,
            reference_date: m.reference.date,
            reference_ship_type: &m.reference.ship_type,
            current_id: &m.current.id,
            current_date: m.current.date,
            current_ship_type: &m.current.ship_type,
        }
    }
}

/// Timestamp prefix of one export, e.g. `20201001_134501`.
pub fn export_stamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

fn to_csv<T: Serialize>(rows: &[T], columns: &[&str]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if rows.is_empty() {
        writer.write_record(columns)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| AlertError::IoError(e.into_error()))
}

fn encode<T: Serialize>(rows: &[T], columns: &[&str], format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => to_csv(rows, columns),
        ExportFormat::Json => Ok(serde_json::to_vec_pretty(rows)?),
    }
}

/// Outliers, most recent date first. Equal dates keep detection order.
pub fn sort_outliers(outliers: &mut [CountOutlier]) {
    outliers.sort_by(|a, b| b.date.cmp(&a.date));
}

pub struct AlertExporter<'a, S: Storage> {
    storage: &'a S,
    config: &'a ExportConfig,
}

impl<'a, S: Storage> AlertExporter<'a, S> {
    pub fn new(storage: &'a S, config: &'a ExportConfig) -> Self {
        Self { storage, config }
    }

    fn file_name(&self, stamp: &str, suffix: &str, extension: &str) -> String {
        format!("{}_{}.{}", stamp, suffix, extension)
    }

    fn path_of(&self, file_name: &str) -> String {
        format!("{}/{}", self.config.alerts_dir.trim_end_matches('/'), file_name)
    }

    /// Write the enabled alert lists and return the written paths, relative to storage.
    pub async fn export(&self, report: &AlertReport, stamp: &str) -> Result<Vec<String>> {
        let format = self.config.format;
        let extension = format.extension();
        let mut files: Vec<(String, Vec<u8>)> = Vec::new();

        if self.config.outliers {
            let mut outliers = report.count_outliers.clone();
            sort_outliers(&mut outliers);
            files.push((
                self.file_name(stamp, "outliers", extension),
                encode(&outliers, &OUTLIER_COLUMNS, format)?,
            ));
        }

        if self.config.static_ships {
            files.push((
                self.file_name(stamp, "static", extension),
                encode::<StaticShip>(&report.static_ships, &STATIC_COLUMNS, format)?,
            ));
        }

        if self.config.snapshots {
            let data = match format {
                ExportFormat::Csv => {
                    let rows: Vec<SnapshotRow> =
                        report.snapshot_matches.iter().map(SnapshotRow::from).collect();
                    to_csv(&rows, &SNAPSHOT_COLUMNS)?
                }
                ExportFormat::Json => serde_json::to_vec_pretty(&report.snapshot_matches)?,
            };
            files.push((self.file_name(stamp, "snapshots", extension), data));
        }

        let mut written = Vec::with_capacity(files.len() + 1);
        for (name, data) in &files {
            let path = self.path_of(name);
            tracing::debug!("Writing {} ({} bytes)", path, data.len());
            self.storage.write_file(&path, data).await?;
            written.push(path);
        }

        if self.config.archive && !files.is_empty() {
            let archive = build_archive(&files)?;
            let path = self.path_of(&self.file_name(stamp, "alerts", "zip"));
            tracing::debug!("Writing archive {} ({} bytes)", path, archive.len());
            self.storage.write_file(&path, &archive).await?;
            written.push(path);
        }

        Ok(written)
    }
}

fn build_archive(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
        zip.write_all(data)?;
    }
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{parse_date, BoundType, Observation};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn text(&self, path: &str) -> String {
            let files = self.files.lock().await;
            String::from_utf8(files.get(path).cloned().unwrap_or_default()).unwrap()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                AlertError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn outlier(date: &str, count: usize) -> CountOutlier {
        CountOutlier {
            harbour: "all".to_string(),
            date: parse_date(date).unwrap(),
            ship_type: "cargo".to_string(),
            count,
            bound: 4.0,
            bound_type: BoundType::BoundMax,
            breach_pct: None,
        }
    }

    fn report() -> AlertReport {
        let observation = |id: &str, date: &str| Observation {
            id: id.to_string(),
            date: parse_date(date).unwrap(),
            ship_type: "cargo".to_string(),
            lon: Some(1.0),
            lat: Some(2.0),
        };
        AlertReport {
            count_outliers: vec![outlier("2020-01-01", 5), outlier("2020-03-01", 9)],
            static_ships: vec![],
            snapshot_matches: vec![SnapshotMatch {
                harbour: "all".to_string(),
                lon: 1.0,
                lat: 2.0,
                reference: observation("a", "2020-01-01"),
                current: observation("b", "2020-01-02"),
            }],
        }
    }

    #[tokio::test]
    async fn test_export_csv() {
        let storage = MockStorage::default();
        let config = ExportConfig::default();
        let written = AlertExporter::new(&storage, &config)
            .export(&report(), "20201001_120000")
            .await
            .unwrap();

        assert_eq!(
            written,
            vec![
                "alerts/20201001_120000_outliers.csv",
                "alerts/20201001_120000_static.csv",
                "alerts/20201001_120000_snapshots.csv",
            ]
        );

        let outliers = storage.text("alerts/20201001_120000_outliers.csv").await;
        let lines: Vec<&str> = outliers.lines().collect();
        assert_eq!(lines[0], "harbour,date,ship_type,count,bound,bound_type,breach_pct");
        assert!(lines[1].starts_with("all,2020-03-01T00:00:00,cargo,9,"));
        assert!(lines[1].ends_with(",bound_max,"));
        assert!(lines[2].contains("2020-01-01"));

        // 空清單仍輸出標題列
        let statics = storage.text("alerts/20201001_120000_static.csv").await;
        assert_eq!(statics.trim_end(), "harbour,lon,lat,ship_type,periods");

        let snapshots = storage.text("alerts/20201001_120000_snapshots.csv").await;
        assert!(snapshots.starts_with("harbour,lon,lat,reference_id,reference_date"));
        assert!(snapshots.contains(",a,2020-01-01T00:00:00,cargo,b,"));
    }

    #[tokio::test]
    async fn test_export_json_with_archive() {
        let storage = MockStorage::default();
        let config = ExportConfig {
            format: ExportFormat::Json,
            static_ships: false,
            archive: true,
            ..ExportConfig::default()
        };
        let written = AlertExporter::new(&storage, &config)
            .export(&report(), "stamp")
            .await
            .unwrap();

        assert_eq!(
            written,
            vec![
                "alerts/stamp_outliers.json",
                "alerts/stamp_snapshots.json",
                "alerts/stamp_alerts.zip",
            ]
        );

        let outliers: Vec<CountOutlier> =
            serde_json::from_str(&storage.text("alerts/stamp_outliers.json").await).unwrap();
        assert_eq!(outliers[0].count, 9);

        let archive = storage.read_file("alerts/stamp_alerts.zip").await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(archive)).unwrap();
        assert_eq!(archive.len(), 2);
        assert!(archive.by_name("stamp_outliers.json").is_ok());
    }

    #[test]
    fn test_sort_outliers_is_stable() {
        let mut outliers = vec![
            outlier("2020-01-01", 1),
            outlier("2020-02-01", 2),
            outlier("2020-01-01", 3),
        ];
        sort_outliers(&mut outliers);
        let counts: Vec<usize> = outliers.iter().map(|o| o.count).collect();
        assert_eq!(counts, vec![2, 1, 3]);
    }
}
