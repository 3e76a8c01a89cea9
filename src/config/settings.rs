use crate::core::detector::{DetectionSettings, MAX_SMOOTH};
use crate::domain::model::{parse_date, DateRange};
use crate::utils::error::{AlertError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_path, validate_positive_number, validate_range,
    validate_required_field, validate_threshold, Validate,
};
use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub detection: DetectionSettings,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataMode {
    /// One file split at `date_min`: before it is the reference, `[date_min, date_max)` is current.
    #[default]
    Range,
    /// Two snapshot files compared as they are.
    Snapshots,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default)]
    pub mode: DataMode,
    #[serde(default = "default_observations")]
    pub observations: String,
    #[serde(default = "default_date_min")]
    pub date_min: Option<String>,
    #[serde(default = "default_date_max")]
    pub date_max: Option<String>,
    pub snapshot_reference: Option<String>,
    pub snapshot_current: Option<String>,
    /// GeoJSON harbour boundaries. Without it the whole dataset is one harbour.
    pub harbours: Option<String>,
}

fn default_root() -> String {
    "data".to_string()
}

fn default_observations() -> String {
    "starships_clean.csv".to_string()
}

fn default_date_min() -> Option<String> {
    Some("2020-01-01".to_string())
}

fn default_date_max() -> Option<String> {
    Some("2020-10-01".to_string())
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            mode: DataMode::default(),
            observations: default_observations(),
            date_min: default_date_min(),
            date_max: default_date_max(),
            snapshot_reference: None,
            snapshot_current: None,
            harbours: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Relative to `data.root`.
    #[serde(default = "default_alerts_dir")]
    pub alerts_dir: String,
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default = "enabled")]
    pub outliers: bool,
    #[serde(default = "enabled")]
    pub static_ships: bool,
    #[serde(default = "enabled")]
    pub snapshots: bool,
    /// Also bundle the written files in one zip archive.
    #[serde(default)]
    pub archive: bool,
}

fn default_alerts_dir() -> String {
    "alerts".to_string()
}

fn enabled() -> bool {
    true
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            alerts_dir: default_alerts_dir(),
            format: ExportFormat::default(),
            outliers: true,
            static_ships: true,
            snapshots: true,
            archive: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub enabled: bool,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static pattern compiles"))
}

impl Settings {
    /// 從 TOML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析設定
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| AlertError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_ROOT})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn data_root(&self) -> PathBuf {
        PathBuf::from(&self.data.root)
    }

    pub fn date_min(&self) -> Result<Option<NaiveDateTime>> {
        parse_optional_date("data.date_min", self.data.date_min.as_deref())
    }

    pub fn date_max(&self) -> Result<Option<NaiveDateTime>> {
        parse_optional_date("data.date_max", self.data.date_max.as_deref())
    }

    /// Reference and current windows for [`DataMode::Range`].
    pub fn periods(&self) -> Result<(DateRange, DateRange)> {
        let date_min = *validate_required_field("data.date_min", &self.date_min()?)?;
        let date_max = self.date_max()?;
        Ok((
            DateRange::before(date_min),
            DateRange::new(Some(date_min), date_max),
        ))
    }

    /// Input files relative to `data.root`, reference first.
    pub fn snapshot_files(&self) -> Result<(&str, &str)> {
        let reference = validate_required_field("data.snapshot_reference", &self.data.snapshot_reference)?;
        let current = validate_required_field("data.snapshot_current", &self.data.snapshot_current)?;
        Ok((reference.as_str(), current.as_str()))
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("data.root", &self.data.root)?;
        validate_path("export.alerts_dir", &self.export.alerts_dir)?;

        match self.data.mode {
            DataMode::Range => {
                validate_path("data.observations", &self.data.observations)?;
                validate_file_extension("data.observations", &self.data.observations, &["csv"])?;
                let (_, current) = self.periods()?;
                if let (Some(min), Some(max)) = (current.date_min, current.date_max) {
                    if max <= min {
                        return Err(AlertError::InvalidConfigValueError {
                            field: "data.date_max".to_string(),
                            value: max.to_string(),
                            reason: "date_max must be after date_min".to_string(),
                        });
                    }
                }
            }
            DataMode::Snapshots => {
                let (reference, current) = self.snapshot_files()?;
                validate_file_extension("data.snapshot_reference", reference, &["csv"])?;
                validate_file_extension("data.snapshot_current", current, &["csv"])?;
            }
        }

        if let Some(harbours) = &self.data.harbours {
            validate_file_extension("data.harbours", harbours, &["geojson", "json"])?;
        }

        validate_threshold("detection.threshold", self.detection.threshold)?;
        validate_positive_number("detection.n_periods_min", self.detection.n_periods_min, 1)?;
        if let Some(smooth) = self.detection.smooth {
            validate_range("detection.smooth", smooth, 0, MAX_SMOOTH)?;
        }
        if let Some(smooth) = self.detection.snapshot_smooth {
            validate_range("detection.snapshot_smooth", smooth, 0, MAX_SMOOTH)?;
        }

        Ok(())
    }
}

fn parse_optional_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDateTime>> {
    value
        .map(|raw| {
            parse_date(raw).ok_or_else(|| AlertError::InvalidConfigValueError {
                field: field.to_string(),
                value: raw.to_string(),
                reason: "Expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS".to_string(),
            })
        })
        .transpose()
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_follow_reference_run() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings.data.root, "data");
        assert_eq!(settings.data.mode, DataMode::Range);
        assert_eq!(settings.detection.threshold, 1.7);
        assert_eq!(settings.detection.smooth, Some(5));
        assert_eq!(settings.detection.snapshot_smooth, Some(3));
        assert_eq!(settings.export.format, ExportFormat::Csv);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_parse_full_settings() {
        let toml_content = r#"
[data]
root = "./input"
mode = "snapshots"
snapshot_reference = "snap_1.csv"
snapshot_current = "snap_2.csv"
harbours = "harbours.geojson"

[detection]
threshold = 2.0
n_periods_min = 2
smooth = 4
snapshots = false

[export]
format = "json"
archive = true

[monitoring]
enabled = true
"#;

        let settings = Settings::from_toml_str(toml_content).unwrap();
        assert_eq!(settings.data.mode, DataMode::Snapshots);
        assert_eq!(settings.snapshot_files().unwrap(), ("snap_1.csv", "snap_2.csv"));
        assert_eq!(settings.detection.n_periods_min, 2);
        assert!(!settings.detection.snapshots);
        assert!(settings.detection.static_objects);
        assert_eq!(settings.export.format.extension(), "json");
        assert!(settings.export.archive);
        assert!(settings.monitoring.enabled);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_zero_smooth_keeps_raw_positions() {
        use crate::core::detector::Detector;
        use crate::domain::model::Observation;

        let settings =
            Settings::from_toml_str("[detection]\nsmooth = 0\nsnapshot_smooth = 0\n").unwrap();
        assert!(settings.validate().is_ok());

        let sighting = |id: &str, date: &str, lon: f64, lat: f64| Observation {
            id: id.to_string(),
            date: parse_date(date).unwrap(),
            ship_type: "cargo".to_string(),
            lon: Some(lon),
            lat: Some(lat),
        };
        // about 20 km apart, same whole degree
        let reference = vec![sighting("a", "2020-01-01", 10.2, 43.1)];
        let current = vec![sighting("b", "2020-02-01", 10.4, 43.3)];

        let report = Detector::new(&reference, &current)
            .run(&settings.detection)
            .unwrap();
        assert!(report.static_ships.is_empty());
        assert!(report.snapshot_matches.is_empty());
    }

    #[test]
    fn test_periods_split_at_date_min() {
        let settings = Settings::default();
        let (reference, current) = settings.periods().unwrap();
        let split = parse_date("2020-01-01").unwrap();
        assert_eq!(reference.date_max, Some(split));
        assert_eq!(reference.date_min, None);
        assert_eq!(current.date_min, Some(split));
        assert_eq!(current.date_max, parse_date("2020-10-01"));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("HARBOUR_WATCH_TEST_ROOT", "/srv/harbour");

        let settings = Settings::from_toml_str(
            r#"
[data]
root = "${HARBOUR_WATCH_TEST_ROOT}"
observations = "${HARBOUR_WATCH_UNSET_VAR}.csv"
"#,
        )
        .unwrap();
        assert_eq!(settings.data.root, "/srv/harbour");
        assert_eq!(settings.data.observations, "${HARBOUR_WATCH_UNSET_VAR}.csv");

        std::env::remove_var("HARBOUR_WATCH_TEST_ROOT");
    }

    #[test]
    fn test_validation_errors() {
        let bad_threshold = Settings::from_toml_str("[detection]\nthreshold = 0.0\n").unwrap();
        assert!(bad_threshold.validate().is_err());

        let inverted = Settings::from_toml_str(
            "[data]\ndate_min = \"2020-05-01\"\ndate_max = \"2020-01-01\"\n",
        )
        .unwrap();
        assert!(inverted.validate().is_err());

        let missing_snapshot = Settings::from_toml_str("[data]\nmode = \"snapshots\"\n").unwrap();
        assert!(matches!(
            missing_snapshot.validate(),
            Err(AlertError::MissingConfigError { .. })
        ));

        let bad_date = Settings::from_toml_str("[data]\ndate_min = \"yesterday\"\n").unwrap();
        assert!(bad_date.validate().is_err());

        let bad_smooth = Settings::from_toml_str("[detection]\nsmooth = 20\n").unwrap();
        assert!(bad_smooth.validate().is_err());
    }

    #[test]
    fn test_unknown_mode_is_a_parse_error() {
        assert!(matches!(
            Settings::from_toml_str("[data]\nmode = \"stream\"\n"),
            Err(AlertError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_settings_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[detection]\nthreshold = 3.0\n")
            .unwrap();

        let settings = Settings::from_file(temp_file.path()).unwrap();
        assert_eq!(settings.detection.threshold, 3.0);
    }
}
