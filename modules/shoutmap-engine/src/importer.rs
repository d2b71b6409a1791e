use std::sync::Arc;

use tracing::{debug, info, warn};

use geocode_client::{GeocodeResult, VenuePayload, VenueRecord};
use shoutmap_common::{
    category_radius_m, clean_name, haversine_km, venue_search_categories, GeoPoint, Place,
    ShoutMapError, DEFAULT_RADIUS_M, ESTABLISHMENT, IGNORED_VENUE_CATEGORIES,
};

use crate::singleflight::CreationGate;
use crate::traits::{GeocodeApi, PlaceStore, Result};

/// Administrative levels requested from the geocode endpoint, coarsest
/// first. The import walks them in this order, linking each matched level
/// under the previous one.
pub const ADMIN_LEVELS: [&str; 4] = [
    "country",
    "administrative_area_level_1",
    "locality",
    "neighborhood",
];

/// Canonical intermediate between either provider response shape and a
/// Place. All normalization happens here, before any business logic runs.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceDraft {
    pub external_id: String,
    pub name: String,
    pub location: GeoPoint,
    pub categories: Vec<String>,
    pub radius_m: f64,
}

impl PlaceDraft {
    /// Normalize an administrative geocode result. The display name is the
    /// first address component, cleaned; the radius is half the diagonal of
    /// the bounding box when one is supplied.
    pub fn from_admin_result(result: &GeocodeResult) -> Option<Self> {
        let raw_name = result
            .address_components
            .as_ref()
            .and_then(|c| c.first())
            .map(|c| c.long_name.clone())
            .or_else(|| result.name.clone())?;

        let radius_m = match &result.geometry.bounds {
            Some(bounds) => {
                let diagonal_km = haversine_km(
                    bounds.northeast.lat,
                    bounds.northeast.lng,
                    bounds.southwest.lat,
                    bounds.southwest.lng,
                );
                diagonal_km * 1000.0 / 2.0
            }
            None => category_radius_m(&result.types).unwrap_or(DEFAULT_RADIUS_M),
        };

        Some(Self {
            external_id: result.place_id.clone(),
            name: clean_name(&raw_name),
            location: GeoPoint::new(result.geometry.location.lat, result.geometry.location.lng),
            categories: result.types.clone(),
            radius_m,
        })
    }

    /// Normalize a current-generation venue result (the geocode result shape
    /// with `name` populated).
    pub fn from_modern_venue(result: &GeocodeResult) -> Option<Self> {
        let name = result.name.clone()?;
        let mut categories = result.types.clone();
        if !categories.iter().any(|c| c == ESTABLISHMENT) {
            categories.push(ESTABLISHMENT.to_string());
        }
        let radius_m = category_radius_m(&categories).unwrap_or(DEFAULT_RADIUS_M);

        Some(Self {
            external_id: result.place_id.clone(),
            name: clean_name(&name),
            location: GeoPoint::new(result.geometry.location.lat, result.geometry.location.lng),
            categories,
            radius_m,
        })
    }

    /// Normalize an older-generation venue record.
    pub fn from_legacy_venue(venue: &VenueRecord) -> Self {
        let mut categories = venue.categories.clone();
        if !categories.iter().any(|c| c == ESTABLISHMENT) {
            categories.push(ESTABLISHMENT.to_string());
        }
        let radius_m = category_radius_m(&categories).unwrap_or(DEFAULT_RADIUS_M);

        Self {
            external_id: venue.id.clone(),
            name: clean_name(&venue.name),
            location: GeoPoint::new(venue.location.lat, venue.location.lng),
            categories,
            radius_m,
        }
    }

    /// Flatten either venue payload generation into drafts.
    pub fn from_venue_payload(payload: &VenuePayload) -> Vec<Self> {
        match payload {
            VenuePayload::Legacy { response, .. } => response
                .venues
                .iter()
                .map(PlaceDraft::from_legacy_venue)
                .collect(),
            VenuePayload::Modern { results, .. } => results
                .iter()
                .filter_map(PlaceDraft::from_modern_venue)
                .collect(),
        }
    }

    /// Low-signal results carry only ignore-listed categories; importing
    /// them as leaves adds noise without locating value.
    pub fn is_low_signal(&self) -> bool {
        let informative = self.categories.iter().any(|c| {
            c != ESTABLISHMENT && !IGNORED_VENUE_CATEGORIES.iter().any(|ig| ig == c)
        });
        !informative
    }
}

/// Normalizes geocode/venue responses into Place records, assigns parent
/// links level by level, and persists new nodes through the creation gate.
pub struct GeocodeImporter<P, G> {
    store: Arc<P>,
    geocode: Arc<G>,
    gate: Arc<CreationGate>,
    venue_radius_m: u32,
}

impl<P: PlaceStore, G: GeocodeApi> GeocodeImporter<P, G> {
    pub fn new(store: Arc<P>, geocode: Arc<G>, gate: Arc<CreationGate>, venue_radius_m: u32) -> Self {
        Self {
            store,
            geocode,
            gate,
            venue_radius_m,
        }
    }

    /// Import the hierarchy enclosing `location`. Returns a venue containing
    /// the point at sufficient radius when one exists, otherwise the finest
    /// administrative node. Geocode failure surfaces to the caller; venue
    /// lookup failure does not.
    pub async fn import(&self, location: GeoPoint, accuracy_m: f64) -> Result<Place> {
        let mut results = self
            .geocode
            .reverse_geocode(location, &ADMIN_LEVELS)
            .await
            .map_err(|e| ShoutMapError::UpstreamUnavailable(e.to_string()))?;

        // The provider answers finest-to-coarsest; build the chain from the
        // country down.
        results.reverse();

        let mut parent: Option<Place> = None;
        let mut cursor = 0;
        for level in ADMIN_LEVELS {
            let Some(offset) = results[cursor..]
                .iter()
                .position(|r| r.types.iter().any(|t| t == level))
            else {
                // A level may be absent (e.g. no neighborhood).
                debug!(level, "No geocode result for level");
                continue;
            };
            let index = cursor + offset;
            cursor = index + 1;

            let Some(draft) = PlaceDraft::from_admin_result(&results[index]) else {
                continue;
            };
            let place = self.create_draft(draft, parent.as_ref()).await?;
            parent = Some(place);
        }

        let Some(finest) = parent else {
            return Err(ShoutMapError::NotFound);
        };
        info!(finest = %finest.name, depth = finest.depth, "Administrative chain imported");

        match self
            .geocode
            .nearby_venues(location, self.venue_radius_m, &venue_search_categories())
            .await
        {
            Ok(payload) => {
                let mut best: Option<Place> = None;
                for draft in PlaceDraft::from_venue_payload(&payload) {
                    if draft.is_low_signal() {
                        continue;
                    }
                    let venue = self.create_draft(draft, Some(&finest)).await?;
                    if best.is_none() && venue.contains(location) && venue.radius_m >= accuracy_m {
                        best = Some(venue);
                    }
                }
                Ok(best.unwrap_or(finest))
            }
            Err(err) => {
                warn!(error = %err, "Venue lookup failed, keeping administrative chain");
                Ok(finest)
            }
        }
    }

    /// Create a place from a draft unless one with the same external id
    /// already exists. Serialized per external id by the gate.
    async fn create_draft(&self, draft: PlaceDraft, parent: Option<&Place>) -> Result<Place> {
        let external_id = draft.external_id.clone();
        let store = &self.store;
        self.gate
            .create_or_join(&external_id, || async move {
                if let Some(existing) = store.find_by_external_id(&draft.external_id).await? {
                    return Ok(existing);
                }
                let place = Place::new_child(
                    Some(draft.external_id),
                    draft.name,
                    draft.location,
                    draft.radius_m,
                    draft.categories,
                    parent,
                );
                store.create(&place).await?;
                Ok(place)
            })
            .await
    }
}
