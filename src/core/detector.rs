//! Outlier and static-position scans over two observation periods.
//!
//! The reference period (t0) gives the expected behaviour, the current period (t1) is
//! checked against it.

use crate::core::stats::CountStats;
use crate::domain::geo::{coordinate_key, round_to};
use crate::domain::model::{
    AlertReport, BoundType, CountOutlier, Observation, SnapshotMatch, StaticShip,
};
use crate::utils::error::{AlertError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Largest accepted rounding precision, in decimals.
pub const MAX_SMOOTH: u32 = 12;

pub const ALL_HARBOURS: &str = "all";

/// User settings for one detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSettings {
    /// Number of standard deviations a count may move away from the mean.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "enabled")]
    pub large_variations: bool,
    #[serde(default = "enabled")]
    pub static_objects: bool,
    #[serde(default = "default_n_periods_min")]
    pub n_periods_min: usize,
    /// Decimals positions are rounded to. `0` keeps raw positions.
    #[serde(default = "default_smooth")]
    pub smooth: Option<u32>,
    #[serde(default = "enabled")]
    pub snapshots: bool,
    #[serde(default = "default_snapshot_smooth")]
    pub snapshot_smooth: Option<u32>,
}

fn default_threshold() -> f64 {
    1.7
}

fn enabled() -> bool {
    true
}

fn default_n_periods_min() -> usize {
    1
}

fn default_smooth() -> Option<u32> {
    Some(5)
}

fn default_snapshot_smooth() -> Option<u32> {
    Some(3)
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            large_variations: true,
            static_objects: true,
            n_periods_min: default_n_periods_min(),
            smooth: default_smooth(),
            snapshots: true,
            snapshot_smooth: default_snapshot_smooth(),
        }
    }
}

fn check_threshold(threshold: f64) -> Result<()> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(AlertError::InvalidParameter {
            name: "threshold".to_string(),
            reason: format!("must be a finite number greater than 0, got {}", threshold),
        });
    }
    Ok(())
}

fn check_smooth(smooth: Option<u32>) -> Result<()> {
    match smooth {
        Some(precision) if precision > MAX_SMOOTH => Err(AlertError::InvalidParameter {
            name: "smooth".to_string(),
            reason: format!("must be at most {} decimals, got {}", MAX_SMOOTH, precision),
        }),
        _ => Ok(()),
    }
}

/// `0` turns rounding off, same as `None`.
fn smoothed(position: (f64, f64), smooth: Option<u32>) -> (f64, f64) {
    match smooth {
        Some(precision) if precision > 0 => {
            (round_to(position.0, precision), round_to(position.1, precision))
        }
        _ => position,
    }
}

/// `(count - bound) / bound` in percent, two decimals. `None` for a zero bound.
pub fn breach_pct(count: usize, bound: f64) -> Option<f64> {
    if bound == 0.0 {
        return None;
    }
    Some(round_to((count as f64 - bound) / bound * 100.0, 2))
}

/// Counts per ship type and date. Every sighting opens its group but only sightings with
/// a longitude are counted, so a group can hold a zero.
fn counts_by_type(observations: &[Observation]) -> BTreeMap<&str, BTreeMap<NaiveDateTime, usize>> {
    let mut counts: BTreeMap<&str, BTreeMap<NaiveDateTime, usize>> = BTreeMap::new();
    for obs in observations {
        let count = counts
            .entry(obs.ship_type.as_str())
            .or_default()
            .entry(obs.date)
            .or_insert(0);
        if obs.lon.is_some() {
            *count += 1;
        }
    }
    counts
}

pub struct Detector<'a> {
    reference: &'a [Observation],
    current: &'a [Observation],
    harbour: String,
}

impl<'a> Detector<'a> {
    pub fn new(reference: &'a [Observation], current: &'a [Observation]) -> Self {
        Self {
            reference,
            current,
            harbour: ALL_HARBOURS.to_string(),
        }
    }

    /// Label the alerts of this detector with a harbour id.
    pub fn for_harbour(mut self, harbour: impl Into<String>) -> Self {
        self.harbour = harbour.into();
        self
    }

    /// Per-date counts of the current period outside `mean ± threshold * std` of the
    /// reference counts, per ship type.
    pub fn detect_large_variations(&self, threshold: f64) -> Result<Vec<CountOutlier>> {
        check_threshold(threshold)?;

        let reference = counts_by_type(self.reference);
        let current = counts_by_type(self.current);
        let mut outliers = Vec::new();

        for (ship_type, per_date) in &reference {
            let samples: Vec<usize> = per_date.values().copied().collect();
            let Some((bound_min, bound_max)) =
                CountStats::from_counts(&samples).and_then(|stats| stats.bounds(threshold))
            else {
                tracing::debug!(
                    "Skipping '{}': {} reference date(s) is not enough for a deviation",
                    ship_type,
                    samples.len()
                );
                continue;
            };

            let Some(new_counts) = current.get(ship_type) else {
                continue;
            };

            for (bound_type, bound) in [
                (BoundType::BoundMin, bound_min),
                (BoundType::BoundMax, bound_max),
            ] {
                for (date, &count) in new_counts {
                    let breached = match bound_type {
                        BoundType::BoundMin => (count as f64) < bound,
                        BoundType::BoundMax => (count as f64) > bound,
                    };
                    if breached {
                        outliers.push(CountOutlier {
                            harbour: self.harbour.clone(),
                            date: *date,
                            ship_type: ship_type.to_string(),
                            count,
                            bound,
                            bound_type,
                            breach_pct: breach_pct(count, bound),
                        });
                    }
                }
            }
        }

        tracing::debug!(
            "[{}] {} count outliers at threshold {}",
            self.harbour,
            outliers.len(),
            threshold
        );
        Ok(outliers)
    }

    /// Positions occupied repeatedly by the same ship type over both periods.
    ///
    /// `periods` is the number of repeat sightings, so a position seen on three dates has
    /// two periods. Coarse smoothing can fold distinct ships onto one position; use
    /// [`Detector::detect_static_objects_2_snaps`] when dates matter.
    pub fn detect_static_objects(
        &self,
        n_periods_min: usize,
        smooth: Option<u32>,
    ) -> Result<Vec<StaticShip>> {
        if n_periods_min < 1 {
            return Err(AlertError::InvalidParameter {
                name: "n_periods_min".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        check_smooth(smooth)?;

        struct Seen<'o> {
            first: usize,
            occurrences: usize,
            position: (f64, f64),
            ship_type: &'o str,
        }

        let mut seen: HashMap<(u64, u64, &str), Seen> = HashMap::new();
        let sightings = self
            .reference
            .iter()
            .chain(self.current.iter())
            .filter_map(|obs| obs.position().map(|pos| (obs, smoothed(pos, smooth))));

        for (index, (obs, position)) in sightings.enumerate() {
            let key = (
                coordinate_key(position.0),
                coordinate_key(position.1),
                obs.ship_type.as_str(),
            );
            seen.entry(key)
                .or_insert(Seen {
                    first: index,
                    occurrences: 0,
                    position,
                    ship_type: &obs.ship_type,
                })
                .occurrences += 1;
        }

        let mut repeated: Vec<Seen> = seen
            .into_values()
            .filter(|s| s.occurrences > n_periods_min)
            .collect();
        repeated.sort_by(|a, b| {
            b.occurrences
                .cmp(&a.occurrences)
                .then(a.first.cmp(&b.first))
        });

        let statics: Vec<StaticShip> = repeated
            .into_iter()
            .map(|s| StaticShip {
                harbour: self.harbour.clone(),
                lon: s.position.0,
                lat: s.position.1,
                ship_type: s.ship_type.to_string(),
                periods: s.occurrences - 1,
            })
            .collect();

        tracing::debug!(
            "[{}] {} static positions over at least {} period(s)",
            self.harbour,
            statics.len(),
            n_periods_min
        );
        Ok(statics)
    }

    /// Pairs of sightings, one per period, at the same position.
    ///
    /// Meant for two snapshots; on longer periods every combination is reported.
    pub fn detect_static_objects_2_snaps(&self, smooth: Option<u32>) -> Result<Vec<SnapshotMatch>> {
        check_smooth(smooth)?;

        let mut current_at: HashMap<(u64, u64), Vec<&Observation>> = HashMap::new();
        for obs in self.current {
            if let Some(position) = obs.position() {
                let (lon, lat) = smoothed(position, smooth);
                current_at
                    .entry((coordinate_key(lon), coordinate_key(lat)))
                    .or_default()
                    .push(obs);
            }
        }

        let mut matches = Vec::new();
        for reference in self.reference {
            let Some(position) = reference.position() else {
                continue;
            };
            let (lon, lat) = smoothed(position, smooth);
            if let Some(hits) = current_at.get(&(coordinate_key(lon), coordinate_key(lat))) {
                matches.extend(hits.iter().map(|current| SnapshotMatch {
                    harbour: self.harbour.clone(),
                    lon,
                    lat,
                    reference: reference.clone(),
                    current: (*current).clone(),
                }));
            }
        }

        tracing::debug!("[{}] {} positions shared by both snapshots", self.harbour, matches.len());
        Ok(matches)
    }

    /// Number of count outliers each threshold would raise.
    pub fn preview_thresholds(&self, thresholds: &[f64]) -> Result<Vec<(f64, usize)>> {
        thresholds
            .iter()
            .map(|&threshold| Ok((threshold, self.detect_large_variations(threshold)?.len())))
            .collect()
    }

    /// Run every scan enabled in `settings`.
    pub fn run(&self, settings: &DetectionSettings) -> Result<AlertReport> {
        let mut report = AlertReport::default();

        if settings.large_variations {
            report.count_outliers = self.detect_large_variations(settings.threshold)?;
        }
        if settings.static_objects {
            report.static_ships = self.detect_static_objects(settings.n_periods_min, settings.smooth)?;
        }
        if settings.snapshots {
            report.snapshot_matches = self.detect_static_objects_2_snaps(settings.snapshot_smooth)?;
        }

        Ok(report)
    }
}
