//! Harbour registry: lookups, point location, berth allocation and movements.

use crate::domain::harbour::{BerthRef, Harbour, Movement, MovementKind, Movements, Ship};
use crate::domain::ports::HarbourStore;
use crate::utils::error::{AlertError, Result};
use chrono::NaiveDateTime;

#[derive(Debug, Clone, Default)]
pub struct HarbourApi {
    harbours: Vec<Harbour>,
    movements: Movements,
}

impl HarbourApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_harbours(harbours: Vec<Harbour>) -> Self {
        let mut api = Self::new();
        for harbour in harbours {
            api.register(harbour);
        }
        api
    }

    pub async fn load<H: HarbourStore>(store: &H) -> Result<Self> {
        Ok(Self::from_harbours(store.load_harbours().await?))
    }

    /// Add a harbour, replacing and returning any harbour with the same id.
    pub fn register(&mut self, harbour: Harbour) -> Option<Harbour> {
        match self.harbours.iter_mut().find(|h| h.id == harbour.id) {
            Some(existing) => Some(std::mem::replace(existing, harbour)),
            None => {
                self.harbours.push(harbour);
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Result<&Harbour> {
        self.harbours
            .iter()
            .find(|h| h.id == id)
            .ok_or_else(|| AlertError::UnknownHarbour { id: id.to_string() })
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Harbour> {
        self.harbours
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| AlertError::UnknownHarbour { id: id.to_string() })
    }

    /// Case-insensitive name lookup.
    pub fn find_by_name(&self, name: &str) -> Option<&Harbour> {
        self.harbours
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
    }

    pub fn list(&self) -> &[Harbour] {
        &self.harbours
    }

    /// First harbour, in registration order, whose area holds the point.
    /// Harbours without an area are never returned.
    pub fn locate(&self, lon: f64, lat: f64) -> Option<&Harbour> {
        self.harbours.iter().find(|h| {
            h.area
                .as_ref()
                .is_some_and(|area| area.contains(lon, lat))
        })
    }

    /// Put the ship on the first free berth long enough for it and log the arrival.
    pub fn dock(&mut self, harbour_id: &str, ship: &Ship, at: NaiveDateTime) -> Result<BerthRef> {
        if self.harbours.iter().any(|h| h.berth_of(&ship.id).is_some()) {
            return Err(AlertError::ShipAlreadyDocked {
                ship: ship.id.clone(),
            });
        }

        let harbour = self.get_mut(harbour_id)?;
        let berth_ref = harbour
            .find_berth_for(ship)
            .ok_or_else(|| AlertError::NoBerthAvailable {
                harbour: harbour_id.to_string(),
                ship: ship.id.clone(),
                length: ship.length,
            })?;
        if let Some(berth) = harbour.berth_mut(&berth_ref) {
            berth.occupant = Some(ship.id.clone());
        }

        tracing::debug!(
            "Ship {} docked at {}/{}/{}",
            ship.id,
            harbour_id,
            berth_ref.pier,
            berth_ref.berth
        );
        self.movements.record(Movement {
            harbour: harbour_id.to_string(),
            ship_id: ship.id.clone(),
            kind: MovementKind::Arrival,
            at,
            berth: berth_ref.clone(),
        });
        Ok(berth_ref)
    }

    /// Free the ship's berth and log the departure.
    pub fn undock(&mut self, harbour_id: &str, ship_id: &str, at: NaiveDateTime) -> Result<BerthRef> {
        let harbour = self.get_mut(harbour_id)?;
        let berth_ref = harbour
            .berth_of(ship_id)
            .ok_or_else(|| AlertError::ShipNotDocked {
                harbour: harbour_id.to_string(),
                ship: ship_id.to_string(),
            })?;
        if let Some(berth) = harbour.berth_mut(&berth_ref) {
            berth.occupant = None;
        }

        self.movements.record(Movement {
            harbour: harbour_id.to_string(),
            ship_id: ship_id.to_string(),
            kind: MovementKind::Departure,
            at,
            berth: berth_ref.clone(),
        });
        Ok(berth_ref)
    }

    pub fn movements(&self) -> &Movements {
        &self.movements
    }
}
