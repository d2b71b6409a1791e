// Test mocks for the engine's trait boundaries.
//
// - MockPlaceStore — stateful in-memory place hierarchy
// - MockShoutStore — stateful in-memory shout set
// - MockGeocode — programmed geocode/venue responses; unprogrammed
//   endpoints answer like a dead provider
//
// Plus helpers for constructing geocode fixtures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use geocode_client::{
    AddressComponent, Bounds, GeocodeError, GeocodeResult, Geometry, LatLng, VenuePayload,
};
use shoutmap_common::{haversine_km, GeoPoint, Place, Shout};

use crate::traits::{GeocodeApi, PlaceStore, Result, ShoutStore};

// ---------------------------------------------------------------------------
// MockPlaceStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockPlaceStore {
    places: Mutex<HashMap<Uuid, Place>>,
    create_calls: AtomicUsize,
}

impl MockPlaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a place without counting it as a store create.
    pub fn seed(&self, place: Place) {
        self.places.lock().unwrap().insert(place.id, place);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn all(&self) -> Vec<Place> {
        self.places.lock().unwrap().values().cloned().collect()
    }

    pub fn by_external_id(&self, external_id: &str) -> Vec<Place> {
        self.places
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.external_id.as_deref() == Some(external_id))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PlaceStore for MockPlaceStore {
    async fn get(&self, id: Uuid) -> Result<Option<Place>> {
        Ok(self.places.lock().unwrap().get(&id).cloned())
    }

    async fn nearest(&self, location: GeoPoint) -> Result<Option<Place>> {
        let places = self.places.lock().unwrap();
        Ok(places
            .values()
            .min_by(|a, b| {
                let da = haversine_km(a.lat, a.lng, location.lat, location.lng);
                let db = haversine_km(b.lat, b.lng, location.lat, location.lng);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .cloned())
    }

    async fn within_radius(&self, location: GeoPoint, radius_km: f64) -> Result<Vec<Place>> {
        let places = self.places.lock().unwrap();
        Ok(places
            .values()
            .filter(|p| haversine_km(p.lat, p.lng, location.lat, location.lng) <= radius_km)
            .cloned()
            .collect())
    }

    async fn ancestor_chain(&self, place_id: Uuid, max_depth: usize) -> Result<Vec<Place>> {
        let places = self.places.lock().unwrap();
        let mut chain = Vec::new();
        let mut current = places.get(&place_id).cloned();
        while let Some(place) = current {
            let parent_id = place.parent_id;
            chain.push(place);
            if chain.len() > max_depth {
                break;
            }
            current = parent_id.and_then(|id| places.get(&id).cloned());
        }
        Ok(chain)
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Place>> {
        let places = self.places.lock().unwrap();
        Ok(places
            .values()
            .find(|p| p.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn create(&self, place: &Place) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut places = self.places.lock().unwrap();
        // MERGE semantics on external_id
        if let Some(external_id) = &place.external_id {
            if places
                .values()
                .any(|p| p.external_id.as_deref() == Some(external_id))
            {
                return Ok(());
            }
        }
        places.insert(place.id, place.clone());
        Ok(())
    }

    async fn reparent_children(&self, deleted_id: Uuid, new_parent: Option<Uuid>) -> Result<()> {
        let mut places = self.places.lock().unwrap();
        let new_depth = new_parent
            .and_then(|id| places.get(&id).map(|p| p.depth + 1))
            .unwrap_or(0);
        for place in places.values_mut() {
            if place.parent_id == Some(deleted_id) {
                place.parent_id = new_parent;
                place.depth = new_depth;
            }
        }
        places.remove(&deleted_id);
        Ok(())
    }

    async fn increment_shout_count(&self, place_id: Uuid, delta: i64) -> Result<()> {
        let mut places = self.places.lock().unwrap();
        if let Some(place) = places.get_mut(&place_id) {
            let next = place.shout_count as i64 + delta;
            place.shout_count = next.max(0) as u32;
        }
        Ok(())
    }

    async fn places_with_trends(&self) -> Result<Vec<Place>> {
        let places = self.places.lock().unwrap();
        Ok(places
            .values()
            .filter(|p| p.shout_count > 0 || !p.sentiment.is_empty() || p.feeling.is_some())
            .cloned()
            .collect())
    }

    async fn save_trends(&self, batch: &[Place]) -> Result<()> {
        let mut places = self.places.lock().unwrap();
        for updated in batch {
            if let Some(place) = places.get_mut(&updated.id) {
                place.shout_count = updated.shout_count;
                place.sentiment = updated.sentiment;
                place.feeling = updated.feeling;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockShoutStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockShoutStore {
    shouts: Mutex<HashMap<Uuid, Shout>>,
}

impl MockShoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, shout: Shout) {
        self.shouts.lock().unwrap().insert(shout.id, shout);
    }

    pub fn get(&self, id: Uuid) -> Option<Shout> {
        self.shouts.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.shouts.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ShoutStore for MockShoutStore {
    async fn create(&self, shout: &Shout) -> Result<()> {
        self.shouts.lock().unwrap().insert(shout.id, shout.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.shouts.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn shouts_near(&self, location: GeoPoint, radius_km: f64) -> Result<Vec<Shout>> {
        let shouts = self.shouts.lock().unwrap();
        let mut near: Vec<Shout> = shouts
            .values()
            .filter(|s| {
                haversine_km(s.location.lat, s.location.lng, location.lat, location.lng)
                    <= radius_km
            })
            .cloned()
            .collect();
        near.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(near)
    }

    async fn shouts_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Shout>> {
        let shouts = self.shouts.lock().unwrap();
        Ok(shouts
            .values()
            .filter(|s| s.created_at >= cutoff)
            .cloned()
            .collect())
    }

    async fn increment_echoes(&self, id: Uuid, delta: i64) -> Result<()> {
        let mut shouts = self.shouts.lock().unwrap();
        if let Some(shout) = shouts.get_mut(&id) {
            let next = shout.echoes as i64 + delta;
            shout.echoes = next.max(0) as u32;
        }
        Ok(())
    }

    async fn increment_flags(&self, id: Uuid) -> Result<()> {
        let mut shouts = self.shouts.lock().unwrap();
        if let Some(shout) = shouts.get_mut(&id) {
            shout.flags += 1;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockGeocode
// ---------------------------------------------------------------------------

/// Programmed geocode provider. Endpoints without a programmed response
/// answer `Status("UNKNOWN_ERROR")`, which is how a dead provider looks to
/// the importer.
#[derive(Default)]
pub struct MockGeocode {
    geocode: Mutex<Option<Vec<GeocodeResult>>>,
    venues: Mutex<Option<VenuePayload>>,
    geocode_calls: AtomicUsize,
}

impl MockGeocode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_geocode(self, results: Vec<GeocodeResult>) -> Self {
        *self.geocode.lock().unwrap() = Some(results);
        self
    }

    pub fn on_venues(self, payload: VenuePayload) -> Self {
        *self.venues.lock().unwrap() = Some(payload);
        self
    }

    pub fn geocode_calls(&self) -> usize {
        self.geocode_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeocodeApi for MockGeocode {
    async fn reverse_geocode(
        &self,
        _location: GeoPoint,
        _levels: &[&str],
    ) -> std::result::Result<Vec<GeocodeResult>, GeocodeError> {
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        self.geocode
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| GeocodeError::Status("UNKNOWN_ERROR".to_string()))
    }

    async fn nearby_venues(
        &self,
        _location: GeoPoint,
        _radius_m: u32,
        _categories: &[&str],
    ) -> std::result::Result<VenuePayload, GeocodeError> {
        self.venues
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| GeocodeError::Status("UNKNOWN_ERROR".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

/// An administrative geocode result with a bounding box spanning
/// `half_span_deg` degrees around the center.
pub fn admin_result(
    place_id: &str,
    name: &str,
    level: &str,
    lat: f64,
    lng: f64,
    half_span_deg: f64,
) -> GeocodeResult {
    GeocodeResult {
        place_id: place_id.to_string(),
        types: vec![level.to_string(), "political".to_string()],
        name: None,
        address_components: Some(vec![AddressComponent {
            long_name: name.to_string(),
            short_name: Some(name.to_string()),
            types: vec![level.to_string(), "political".to_string()],
        }]),
        geometry: Geometry {
            location: LatLng { lat, lng },
            bounds: Some(Bounds {
                northeast: LatLng {
                    lat: lat + half_span_deg,
                    lng: lng + half_span_deg,
                },
                southwest: LatLng {
                    lat: lat - half_span_deg,
                    lng: lng - half_span_deg,
                },
            }),
        },
    }
}

/// A current-generation venue result (no bounds, `name` populated).
pub fn venue_result(place_id: &str, name: &str, categories: &[&str], lat: f64, lng: f64) -> GeocodeResult {
    GeocodeResult {
        place_id: place_id.to_string(),
        types: categories.iter().map(|c| c.to_string()).collect(),
        name: Some(name.to_string()),
        address_components: None,
        geometry: Geometry {
            location: LatLng { lat, lng },
            bounds: None,
        },
    }
}
