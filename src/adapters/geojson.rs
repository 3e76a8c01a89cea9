use crate::domain::geo::HarbourArea;
use crate::domain::harbour::{Harbour, Pier};
use crate::domain::ports::{HarbourStore, Storage};
use crate::utils::error::{AlertError, Result};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<HarbourProperties>,
    geometry: Option<Geometry>,
}

#[derive(Debug, Default, Deserialize)]
struct HarbourProperties {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    piers: Vec<Pier>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Unsupported,
}

fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn outer_ring(geometry: Geometry, feature: &str) -> Result<Vec<(f64, f64)>> {
    let ring = match geometry {
        Geometry::Polygon { coordinates } => coordinates.into_iter().next(),
        // 只取第一個多邊形的外環
        Geometry::MultiPolygon { coordinates } => coordinates
            .into_iter()
            .next()
            .and_then(|polygon| polygon.into_iter().next()),
        Geometry::Unsupported => {
            return Err(AlertError::GeoJsonError {
                message: format!("feature '{}': only Polygon and MultiPolygon are supported", feature),
            })
        }
    };

    ring.unwrap_or_default()
        .into_iter()
        .map(|position| match position.as_slice() {
            [lon, lat, ..] => Ok((*lon, *lat)),
            _ => Err(AlertError::GeoJsonError {
                message: format!("feature '{}': position needs at least two numbers", feature),
            }),
        })
        .collect()
}

/// Harbours from a GeoJSON `FeatureCollection`.
///
/// The harbour id is `properties.id`, then the feature `id`, then the feature index.
/// The name defaults to the id. `properties.piers` may carry the berth layout.
pub fn parse_harbours(data: &[u8]) -> Result<Vec<Harbour>> {
    let collection: FeatureCollection = serde_json::from_slice(data)?;
    if collection.kind != "FeatureCollection" {
        return Err(AlertError::GeoJsonError {
            message: format!("expected a FeatureCollection, found '{}'", collection.kind),
        });
    }

    let mut harbours = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        let properties = feature.properties.unwrap_or_default();
        let id = properties
            .id
            .as_ref()
            .and_then(id_to_string)
            .or_else(|| feature.id.as_ref().and_then(id_to_string))
            .unwrap_or_else(|| index.to_string());
        let name = properties.name.unwrap_or_else(|| id.clone());

        let geometry = feature.geometry.ok_or_else(|| AlertError::GeoJsonError {
            message: format!("feature '{}' has no geometry", id),
        })?;
        let area = HarbourArea::new(outer_ring(geometry, &id)?).ok_or_else(|| {
            AlertError::GeoJsonError {
                message: format!("feature '{}': polygon needs at least three vertices", id),
            }
        })?;

        let mut harbour = Harbour::new(id, name).with_area(area);
        harbour.piers = properties.piers;
        harbours.push(harbour);
    }

    Ok(harbours)
}

/// Harbour records backed by a GeoJSON file in storage.
pub struct GeoJsonHarbourStore<S: Storage> {
    storage: S,
    path: String,
}

impl<S: Storage> GeoJsonHarbourStore<S> {
    pub fn new(storage: S, path: impl Into<String>) -> Self {
        Self {
            storage,
            path: path.into(),
        }
    }
}

impl<S: Storage> HarbourStore for GeoJsonHarbourStore<S> {
    async fn load_harbours(&self) -> Result<Vec<Harbour>> {
        let data = self.storage.read_file(&self.path).await?;
        let harbours = parse_harbours(&data)?;
        tracing::debug!("Loaded {} harbours from {}", harbours.len(), self.path);
        Ok(harbours)
    }
}
