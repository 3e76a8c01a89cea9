use crate::adapters::csv_source::{load_observations, read_observations};
use crate::adapters::geojson::GeoJsonHarbourStore;
use crate::adapters::storage::LocalStorage;
use crate::config::settings::{DataMode, Settings};
use crate::core::detector::Detector;
use crate::core::export::{export_stamp, AlertExporter};
use crate::domain::harbour::Harbour;
use crate::domain::model::{AlertReport, DateRange, DetectionInput, Observation};
use crate::domain::ports::{HarbourStore, Pipeline, Storage};
use crate::utils::error::Result;

/// Loads the two periods, runs the detector per harbour and exports the alerts.
pub struct AlertPipeline<S: Storage, H: HarbourStore> {
    storage: S,
    harbours: Option<H>,
    settings: Settings,
    stamp: Option<String>,
}

impl AlertPipeline<LocalStorage, GeoJsonHarbourStore<LocalStorage>> {
    /// Storage rooted at `data.root`, harbours from `data.harbours` when set.
    pub fn from_settings(settings: Settings) -> Self {
        let storage = LocalStorage::new(settings.data_root());
        let harbours = settings
            .data
            .harbours
            .as_ref()
            .map(|path| GeoJsonHarbourStore::new(storage.clone(), path.clone()));
        Self::new(storage, harbours, settings)
    }
}

impl<S: Storage, H: HarbourStore> AlertPipeline<S, H> {
    pub fn new(storage: S, harbours: Option<H>, settings: Settings) -> Self {
        Self {
            storage,
            harbours,
            settings,
            stamp: None,
        }
    }

    /// Fixed export prefix instead of the current time.
    pub fn with_stamp(mut self, stamp: impl Into<String>) -> Self {
        self.stamp = Some(stamp.into());
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    async fn load_periods(&self) -> Result<(Vec<Observation>, Vec<Observation>)> {
        match self.settings.data.mode {
            DataMode::Range => {
                let (reference_range, current_range) = self.settings.periods()?;
                let data = self.storage.read_file(&self.settings.data.observations).await?;

                let mut reference = Vec::new();
                let mut current = Vec::new();
                for obs in load_observations(&data, DateRange::default())? {
                    if reference_range.contains(&obs.date) {
                        reference.push(obs);
                    } else if current_range.contains(&obs.date) {
                        current.push(obs);
                    }
                }
                Ok((reference, current))
            }
            DataMode::Snapshots => {
                let (reference_file, current_file) = self.settings.snapshot_files()?;
                let reference =
                    read_observations(&self.storage, reference_file, DateRange::default()).await?;
                let current =
                    read_observations(&self.storage, current_file, DateRange::default()).await?;
                Ok((reference, current))
            }
        }
    }

    /// Outlier count per threshold, summed over harbours.
    pub async fn preview(&self, thresholds: &[f64]) -> Result<Vec<(f64, usize)>> {
        let input = self.extract().await?;
        let mut totals: Vec<(f64, usize)> = thresholds.iter().map(|&t| (t, 0)).collect();

        for (harbour, reference, current) in split_by_harbour(&input) {
            let preview = Detector::new(&reference, &current)
                .for_harbour(harbour)
                .preview_thresholds(thresholds)?;
            for (total, (_, count)) in totals.iter_mut().zip(preview) {
                total.1 += count;
            }
        }

        Ok(totals)
    }
}

fn inside(observations: &[Observation], harbour: &Harbour) -> Vec<Observation> {
    observations
        .iter()
        .filter(|obs| {
            obs.position()
                .is_some_and(|(lon, lat)| harbour.covers(lon, lat))
        })
        .cloned()
        .collect()
}

/// `(harbour id, reference, current)` per harbour, or the whole input under one
/// implicit harbour when none are configured.
fn split_by_harbour(input: &DetectionInput) -> Vec<(String, Vec<Observation>, Vec<Observation>)> {
    if input.harbours.is_empty() {
        return vec![(
            crate::core::detector::ALL_HARBOURS.to_string(),
            input.reference.clone(),
            input.current.clone(),
        )];
    }

    input
        .harbours
        .iter()
        .map(|harbour| {
            (
                harbour.id.clone(),
                inside(&input.reference, harbour),
                inside(&input.current, harbour),
            )
        })
        .collect()
}

#[async_trait::async_trait]
impl<S: Storage, H: HarbourStore> Pipeline for AlertPipeline<S, H> {
    async fn extract(&self) -> Result<DetectionInput> {
        let (reference, current) = self.load_periods().await?;
        let harbours = match &self.harbours {
            Some(store) => store.load_harbours().await?,
            None => Vec::new(),
        };

        tracing::debug!(
            "Reference period: {} observations, current period: {} observations, {} harbours",
            reference.len(),
            current.len(),
            harbours.len()
        );

        Ok(DetectionInput {
            reference,
            current,
            harbours,
        })
    }

    async fn transform(&self, input: DetectionInput) -> Result<AlertReport> {
        let mut report = AlertReport::default();

        for (harbour, reference, current) in split_by_harbour(&input) {
            tracing::debug!(
                "[{}] scanning {} + {} observations",
                harbour,
                reference.len(),
                current.len()
            );
            let alerts = Detector::new(&reference, &current)
                .for_harbour(harbour)
                .run(&self.settings.detection)?;
            report.merge(alerts);
        }

        Ok(report)
    }

    async fn load(&self, report: AlertReport) -> Result<Vec<String>> {
        let stamp = self.stamp.clone().unwrap_or_else(export_stamp);
        AlertExporter::new(&self.storage, &self.settings.export)
            .export(&report, &stamp)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geo::HarbourArea;
    use crate::domain::model::parse_date;

    fn at(id: &str, date: &str, lon: f64, lat: f64) -> Observation {
        Observation {
            id: id.to_string(),
            date: parse_date(date).unwrap(),
            ship_type: "cargo".to_string(),
            lon: Some(lon),
            lat: Some(lat),
        }
    }

    fn square(id: &str, x0: f64) -> Harbour {
        let area = HarbourArea::new(vec![(x0, 0.0), (x0 + 10.0, 0.0), (x0 + 10.0, 10.0), (x0, 10.0)]).unwrap();
        Harbour::new(id, id.to_uppercase()).with_area(area)
    }

    #[test]
    fn test_split_without_harbours_keeps_everything() {
        let input = DetectionInput {
            reference: vec![at("a", "2020-01-01", 1.0, 1.0)],
            current: vec![at("b", "2020-02-01", 50.0, 50.0)],
            harbours: vec![],
        };
        let split = split_by_harbour(&input);
        assert_eq!(split.len(), 1);
        assert_eq!(split[0].0, "all");
        assert_eq!(split[0].1.len(), 1);
        assert_eq!(split[0].2.len(), 1);
    }

    #[test]
    fn test_split_by_harbour_area() {
        let input = DetectionInput {
            reference: vec![at("a", "2020-01-01", 1.0, 1.0), at("b", "2020-01-01", 25.0, 5.0)],
            current: vec![at("c", "2020-02-01", 15.0, 5.0), at("d", "2020-02-01", 99.0, 5.0)],
            harbours: vec![square("west", 0.0), square("east", 10.0), square("far", 20.0)],
        };
        let split = split_by_harbour(&input);
        let sizes: Vec<(&str, usize, usize)> = split
            .iter()
            .map(|(h, r, c)| (h.as_str(), r.len(), c.len()))
            .collect();
        assert_eq!(sizes, vec![("west", 1, 0), ("east", 0, 1), ("far", 1, 0)]);
    }
}
