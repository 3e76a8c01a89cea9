use serde::{Deserialize, Serialize};

/// Round to `precision` decimals, ties to even.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round_ties_even() / factor
}

/// Hashable form of a position. `-0.0` and `0.0` map to the same key.
pub fn coordinate_key(value: f64) -> u64 {
    if value == 0.0 {
        0f64.to_bits()
    } else {
        value.to_bits()
    }
}

/// Outer ring of a harbour polygon, as (lon, lat) vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawArea")]
pub struct HarbourArea {
    ring: Vec<(f64, f64)>,
}

#[derive(Deserialize)]
struct RawArea {
    ring: Vec<(f64, f64)>,
}

impl TryFrom<RawArea> for HarbourArea {
    type Error = String;

    fn try_from(raw: RawArea) -> Result<Self, Self::Error> {
        let vertices = raw.ring.len();
        HarbourArea::new(raw.ring)
            .ok_or_else(|| format!("harbour area needs at least three vertices, got {}", vertices))
    }
}

impl HarbourArea {
    /// Returns `None` for rings with fewer than three distinct vertices.
    pub fn new(mut ring: Vec<(f64, f64)>) -> Option<Self> {
        // GeoJSON rings repeat the first vertex at the end
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() < 3 {
            return None;
        }
        Some(Self { ring })
    }

    pub fn vertices(&self) -> &[(f64, f64)] {
        &self.ring
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let n = self.ring.len();
        let mut inside = false;
        let mut j = n - 1;

        for i in 0..n {
            let (xi, yi) = self.ring[i];
            let (xj, yj) = self.ring[j];

            if on_segment((xi, yi), (xj, yj), (lon, lat)) {
                return true;
            }

            if (yi > lat) != (yj > lat) {
                let x_cross = (xj - xi) * (lat - yi) / (yj - yi) + xi;
                if lon < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }

        inside
    }
}

fn on_segment(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> bool {
    let cross = (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0);
    if cross.abs() > 1e-12 {
        return false;
    }
    p.0 >= a.0.min(b.0) && p.0 <= a.0.max(b.0) && p.1 >= a.1.min(b.1) && p.1 <= a.1.max(b.1)
}
