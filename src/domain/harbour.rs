//! Harbour layout (piers and berths), ships and the movements registry.

use crate::domain::geo::HarbourArea;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    pub id: String,
    pub name: String,
    pub ship_type: String,
    /// Length overall, in metres.
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Berth {
    pub id: String,
    pub length: f64,
    #[serde(default)]
    pub equipments: BTreeMap<String, String>,
    #[serde(default)]
    pub occupant: Option<String>,
}

impl Berth {
    pub fn new(id: impl Into<String>, length: f64) -> Self {
        Self {
            id: id.into(),
            length,
            equipments: BTreeMap::new(),
            occupant: None,
        }
    }

    pub fn with_equipment(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.equipments.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }

    pub fn fits(&self, ship: &Ship) -> bool {
        self.is_empty() && self.length >= ship.length
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pier {
    pub id: String,
    #[serde(default)]
    pub berths: Vec<Berth>,
}

impl Pier {
    pub fn new(id: impl Into<String>, berths: Vec<Berth>) -> Self {
        Self {
            id: id.into(),
            berths,
        }
    }
}

/// Address of a berth inside a harbour.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BerthRef {
    pub pier: String,
    pub berth: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Harbour {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub area: Option<HarbourArea>,
    #[serde(default)]
    pub piers: Vec<Pier>,
}

impl Harbour {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            area: None,
            piers: Vec::new(),
        }
    }

    pub fn with_area(mut self, area: HarbourArea) -> Self {
        self.area = Some(area);
        self
    }

    pub fn add_pier(&mut self, pier: Pier) {
        self.piers.push(pier);
    }

    /// A harbour without an area covers every position.
    pub fn covers(&self, lon: f64, lat: f64) -> bool {
        self.area.as_ref().map_or(true, |area| area.contains(lon, lat))
    }

    pub fn berths(&self) -> impl Iterator<Item = (&Pier, &Berth)> {
        self.piers
            .iter()
            .flat_map(|pier| pier.berths.iter().map(move |berth| (pier, berth)))
    }

    pub fn free_berths(&self) -> impl Iterator<Item = (&Pier, &Berth)> {
        self.berths().filter(|(_, berth)| berth.is_empty())
    }

    pub fn berth_of(&self, ship_id: &str) -> Option<BerthRef> {
        self.berths()
            .find(|(_, berth)| berth.occupant.as_deref() == Some(ship_id))
            .map(|(pier, berth)| BerthRef {
                pier: pier.id.clone(),
                berth: berth.id.clone(),
            })
    }

    pub(crate) fn berth_mut(&mut self, at: &BerthRef) -> Option<&mut Berth> {
        self.piers
            .iter_mut()
            .find(|pier| pier.id == at.pier)?
            .berths
            .iter_mut()
            .find(|berth| berth.id == at.berth)
    }

    /// First free berth long enough for the ship, in pier then berth order.
    pub fn find_berth_for(&self, ship: &Ship) -> Option<BerthRef> {
        self.berths()
            .find(|(_, berth)| berth.fits(ship))
            .map(|(pier, berth)| BerthRef {
                pier: pier.id.clone(),
                berth: berth.id.clone(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Arrival,
    Departure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub harbour: String,
    pub ship_id: String,
    pub kind: MovementKind,
    pub at: NaiveDateTime,
    pub berth: BerthRef,
}

/// Append-only log of arrivals and departures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Movements {
    movements: Vec<Movement>,
}

impl Movements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, movement: Movement) {
        self.movements.push(movement);
    }

    pub fn all(&self) -> &[Movement] {
        &self.movements
    }

    pub fn for_ship<'a>(&'a self, ship_id: &'a str) -> impl Iterator<Item = &'a Movement> + 'a {
        self.movements.iter().filter(move |m| m.ship_id == ship_id)
    }

    pub fn len(&self) -> usize {
        self.movements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }
}
