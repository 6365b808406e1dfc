//! Static registry of mission targets.
//!
//! The builtin catalog ships as embedded JSON so the engine, the briefing
//! generator and tests all resolve the same target set without touching the
//! filesystem.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geo::LatLng;

pub const BUILTIN_LOCATIONS: &str = include_str!("data/locations.json");

/// Identifier for a catalog target. Identity of a [`Location`] is its id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub String);

impl LocationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LocationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Terrain class of a target. Drives speed, risk and resource-drain factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Marine,
    Nature,
    Ruins,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Marine => "marine",
            Category::Nature => "nature",
            Category::Ruins => "ruins",
            Category::Other => "other",
        }
    }

    /// Multiplier applied to the base travel speed when heading into this terrain.
    pub fn speed_modifier(&self) -> f64 {
        match self {
            Category::Marine => 0.6,
            Category::Nature => 0.8,
            Category::Ruins => 0.9,
            Category::Other => 1.0,
        }
    }

    /// Flat risk contribution a leg picks up from its destination terrain.
    pub fn terrain_factor(&self) -> f64 {
        match self {
            Category::Marine => 4.0,
            Category::Nature => 3.0,
            Category::Ruins => 2.0,
            Category::Other => 1.0,
        }
    }

    /// Multiplier applied to hourly supply and fatigue drain.
    pub fn drain_multiplier(&self) -> f64 {
        match self {
            Category::Nature => 1.5,
            Category::Marine => 1.2,
            Category::Ruins => 1.1,
            Category::Other => 1.0,
        }
    }

    /// Equipment integrity wears faster in rough terrain.
    pub fn integrity_multiplier(&self) -> f64 {
        match self {
            Category::Nature | Category::Ruins => 1.5,
            _ => 1.0,
        }
    }
}

/// Immutable target entry. Owned by the catalog, handed out by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub coords: LatLng,
    pub category: Category,
    pub base_risk: f64,
    pub access_complexity: u8,
    #[serde(default)]
    pub required_gear: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    locations: Vec<Location>,
}

/// Read-only lookup table over the known targets.
#[derive(Debug, Clone)]
pub struct LocationCatalog {
    by_id: HashMap<LocationId, Location>,
    order: Vec<LocationId>,
}

impl LocationCatalog {
    /// Catalog backed by the embedded target data.
    pub fn builtin() -> Arc<Self> {
        let file: CatalogFile =
            serde_json::from_str(BUILTIN_LOCATIONS).expect("builtin location catalog is valid");
        Arc::new(Self::from_locations(file.locations))
    }

    pub fn from_locations(locations: Vec<Location>) -> Self {
        let order: Vec<LocationId> = locations.iter().map(|l| l.id.clone()).collect();
        let by_id = locations.into_iter().map(|l| (l.id.clone(), l)).collect();
        Self { by_id, order }
    }

    pub fn get(&self, id: &LocationId) -> Option<&Location> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &LocationId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Targets in catalog declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_loads() {
        let catalog = LocationCatalog::builtin();
        assert!(catalog.len() >= 10);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn lookup_by_id() {
        let catalog = LocationCatalog::builtin();
        let loc = catalog
            .get(&LocationId::from("great-blue-hole"))
            .expect("known id resolves");
        assert_eq!(loc.name, "Great Blue Hole");
        assert_eq!(loc.category, Category::Marine);
        assert_eq!(loc.base_risk, 5.0);
        assert!(!catalog.contains(&LocationId::from("atlantis")));
    }

    #[test]
    fn iteration_preserves_declaration_order() {
        let catalog = LocationCatalog::builtin();
        let first = catalog.iter().next().expect("non-empty");
        assert_eq!(first.id.as_str(), "great-blue-hole");
    }
}
