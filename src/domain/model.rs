use chrono::{NaiveDate, NaiveDateTime};
use crate::domain::harbour::Harbour;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One sighting of a ship, as read from the observations csv.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDateTime,
    pub ship_type: String,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
}

impl Observation {
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.lon, self.lat) {
            (Some(lon), Some(lat)) => Some((lon, lat)),
            _ => None,
        }
    }
}

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Accepts a bare date (midnight) or one of the usual datetime layouts.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", raw)))
}

/// Half-open date window `[date_min, date_max)`; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub date_min: Option<NaiveDateTime>,
    pub date_max: Option<NaiveDateTime>,
}

impl DateRange {
    pub fn new(date_min: Option<NaiveDateTime>, date_max: Option<NaiveDateTime>) -> Self {
        Self { date_min, date_max }
    }

    pub fn before(date_max: NaiveDateTime) -> Self {
        Self::new(None, Some(date_max))
    }

    pub fn contains(&self, date: &NaiveDateTime) -> bool {
        self.date_min.map_or(true, |min| *date >= min)
            && self.date_max.map_or(true, |max| *date < max)
    }
}

/// Everything a detection run reads: the two periods and the harbours to split them by.
#[derive(Debug, Clone, Default)]
pub struct DetectionInput {
    pub reference: Vec<Observation>,
    pub current: Vec<Observation>,
    pub harbours: Vec<Harbour>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundType {
    BoundMin,
    BoundMax,
}

impl std::fmt::Display for BoundType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundType::BoundMin => write!(f, "bound_min"),
            BoundType::BoundMax => write!(f, "bound_max"),
        }
    }
}

/// A per-date ship count that left the reference band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountOutlier {
    pub harbour: String,
    pub date: NaiveDateTime,
    pub ship_type: String,
    pub count: usize,
    pub bound: f64,
    pub bound_type: BoundType,
    /// Distance to the bound in percent of the bound, two decimals. Empty when the bound is 0.
    pub breach_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticShip {
    pub harbour: String,
    pub lon: f64,
    pub lat: f64,
    pub ship_type: String,
    pub periods: usize,
}

/// The same position seen in both snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMatch {
    pub harbour: String,
    pub lon: f64,
    pub lat: f64,
    pub reference: Observation,
    pub current: Observation,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertReport {
    pub count_outliers: Vec<CountOutlier>,
    pub static_ships: Vec<StaticShip>,
    pub snapshot_matches: Vec<SnapshotMatch>,
}

impl AlertReport {
    pub fn total(&self) -> usize {
        self.count_outliers.len() + self.static_ships.len() + self.snapshot_matches.len()
    }

    pub fn merge(&mut self, other: AlertReport) {
        self.count_outliers.extend(other.count_outliers);
        self.static_ships.extend(other.static_ships);
        self.snapshot_matches.extend(other.snapshot_matches);
    }

    /// Number of alerts of any kind raised for each harbour.
    pub fn counts_by_harbour(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        let harbours = self
            .count_outliers
            .iter()
            .map(|a| a.harbour.as_str())
            .chain(self.static_ships.iter().map(|a| a.harbour.as_str()))
            .chain(self.snapshot_matches.iter().map(|a| a.harbour.as_str()));
        for harbour in harbours {
            *counts.entry(harbour).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(value: &str) -> NaiveDateTime {
        parse_date(value).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(at("2020-01-01"), at("2020-01-01 00:00:00"));
        assert_eq!(at("2020-03-04T10:30:00"), at("2020-03-04 10:30:00"));
        assert!(parse_date("01/02/2020").is_none());
    }

    #[test]
    fn test_date_range_is_half_open() {
        let range = DateRange::new(Some(at("2020-01-01")), Some(at("2020-10-01")));
        assert!(range.contains(&at("2020-01-01")));
        assert!(range.contains(&at("2020-09-30 23:59:59")));
        assert!(!range.contains(&at("2020-10-01")));
        assert!(!range.contains(&at("2019-12-31")));
        assert!(DateRange::default().contains(&at("1970-01-01")));
    }

    #[test]
    fn test_counts_by_harbour() {
        let ship = |harbour: &str| StaticShip {
            harbour: harbour.to_string(),
            lon: 0.0,
            lat: 0.0,
            ship_type: "cargo".to_string(),
            periods: 1,
        };
        let mut report = AlertReport::default();
        report.static_ships = vec![ship("north"), ship("south"), ship("north")];
        report.count_outliers.push(CountOutlier {
            harbour: "south".to_string(),
            date: at("2020-01-01"),
            ship_type: "cargo".to_string(),
            count: 9,
            bound: 4.0,
            bound_type: BoundType::BoundMax,
            breach_pct: Some(125.0),
        });

        let counts = report.counts_by_harbour();
        assert_eq!(counts.get("north"), Some(&2));
        assert_eq!(counts.get("south"), Some(&2));
        assert_eq!(report.total(), 4);
    }

    #[test]
    fn test_position_requires_both_coordinates() {
        let obs = Observation {
            id: "1".to_string(),
            date: at("2020-01-01"),
            ship_type: "cargo".to_string(),
            lon: Some(1.0),
            lat: None,
        };
        assert!(obs.position().is_none());
    }
}
