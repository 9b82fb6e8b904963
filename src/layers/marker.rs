use crate::core::geo::{LatLng, LatLngBounds};
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A point of interest shown on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Marker {
    pub fn new(id: impl Into<String>, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude,
            longitude,
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    pub fn distance_km_from(&self, origin: &LatLng) -> f64 {
        origin.distance_km(&self.position())
    }
}

/// The markers of one render pass, indexed by id.
///
/// Markers with unusable coordinates are dropped on construction, so every
/// consumer downstream can assume finite, in-range positions.
#[derive(Debug, Clone, Default)]
pub struct MarkerSet {
    markers: Vec<Marker>,
    index: FxHashMap<String, usize>,
}

impl MarkerSet {
    pub fn new(markers: Vec<Marker>) -> Self {
        let mut kept = Vec::with_capacity(markers.len());
        let mut index = FxHashMap::default();

        for marker in markers {
            if !marker.position().is_valid() {
                log::warn!(
                    "Dropping marker '{}' with invalid coordinates ({}, {})",
                    marker.id,
                    marker.latitude,
                    marker.longitude
                );
                continue;
            }
            if index.contains_key(&marker.id) {
                log::warn!("Duplicate marker id '{}', keeping the first", marker.id);
                continue;
            }
            index.insert(marker.id.clone(), kept.len());
            kept.push(marker);
        }

        Self {
            markers: kept,
            index,
        }
    }

    /// Like [`MarkerSet::new`], but the first marker with unusable
    /// coordinates is an error instead of being dropped
    pub fn try_new(markers: Vec<Marker>) -> crate::Result<Self> {
        if let Some(bad) = markers.iter().find(|m| !m.position().is_valid()) {
            return Err(crate::MapError::InvalidCoordinates(format!(
                "marker '{}' at ({}, {})",
                bad.id, bad.latitude, bad.longitude
            )));
        }
        Ok(Self::new(markers))
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn as_slice(&self) -> &[Marker] {
        &self.markers
    }

    /// Looks a marker up by id; a dangling id simply yields `None`
    pub fn get(&self, id: &str) -> Option<&Marker> {
        self.index.get(id).map(|&i| &self.markers[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn bounds(&self) -> Option<LatLngBounds> {
        LatLngBounds::from_points(self.markers.iter().map(Marker::position))
    }

    pub fn centroid(&self) -> Option<LatLng> {
        LatLng::centroid(self.markers.iter().map(Marker::position))
    }

    /// Markers ordered by distance from `origin`, closest first
    pub fn nearest_to(&self, origin: &LatLng) -> Vec<(&Marker, f64)> {
        let mut ranked: Vec<(&Marker, f64)> = self
            .markers
            .iter()
            .map(|m| (m, m.distance_km_from(origin)))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        ranked
    }
}

impl From<Vec<Marker>> for MarkerSet {
    fn from(markers: Vec<Marker>) -> Self {
        Self::new(markers)
    }
}

impl PartialEq for MarkerSet {
    fn eq(&self, other: &Self) -> bool {
        self.markers == other.markers
    }
}
