// Trait abstractions for the resolver, ranker, and trend job dependencies.
//
// PlaceStore / ShoutStore — typed store operations, production-backed by the
//   Neo4j stores in shoutmap-graph.
// GeocodeApi — the external geocode/venue provider behind one trait.
//
// These enable deterministic testing with MockPlaceStore, MockShoutStore and
// MockGeocode: no network, no database. `cargo test` in seconds.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use geocode_client::{GeocodeError, GeocodeResult, VenuePayload};
use shoutmap_common::{GeoPoint, Place, Shout, ShoutMapError};
use shoutmap_graph::{GraphPlaceStore, GraphShoutStore};

pub type Result<T> = std::result::Result<T, ShoutMapError>;

// ---------------------------------------------------------------------------
// PlaceStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PlaceStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Place>>;

    /// The place nearest to `location`, if any exists at all.
    async fn nearest(&self, location: GeoPoint) -> Result<Option<Place>>;

    /// Candidate places around `location`. Callers re-check real distance.
    async fn within_radius(&self, location: GeoPoint, radius_km: f64) -> Result<Vec<Place>>;

    /// The containment chain from a place to its root, leaf first; element 0
    /// is the place itself, at most `max_depth` edges are followed.
    async fn ancestor_chain(&self, place_id: Uuid, max_depth: usize) -> Result<Vec<Place>>;

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Place>>;

    /// Persist a new place. Callers serialize creations per external id (the
    /// resolver's gate); the store keeps external ids unique regardless.
    async fn create(&self, place: &Place) -> Result<()>;

    /// Reattach a deleted place's children to `new_parent`.
    async fn reparent_children(&self, deleted_id: Uuid, new_parent: Option<Uuid>) -> Result<()>;

    /// Atomic counter update, store-side — never read-modify-write.
    async fn increment_shout_count(&self, place_id: Uuid, delta: i64) -> Result<()>;

    /// Places currently carrying a trend aggregate.
    async fn places_with_trends(&self) -> Result<Vec<Place>>;

    /// Persist recomputed aggregates in one batch.
    async fn save_trends(&self, places: &[Place]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// ShoutStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ShoutStore: Send + Sync {
    async fn create(&self, shout: &Shout) -> Result<()>;

    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Bounded candidate fetch for ranking; not the final answer.
    async fn shouts_near(&self, location: GeoPoint, radius_km: f64) -> Result<Vec<Shout>>;

    /// Shouts created at or after `cutoff`.
    async fn shouts_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Shout>>;

    /// Atomic echo counter update, floored at zero.
    async fn increment_echoes(&self, id: Uuid, delta: i64) -> Result<()>;

    /// Atomic abuse-flag increment.
    async fn increment_flags(&self, id: Uuid) -> Result<()>;
}

// ---------------------------------------------------------------------------
// GeocodeApi
// ---------------------------------------------------------------------------

#[async_trait]
pub trait GeocodeApi: Send + Sync {
    /// Reverse-geocode a coordinate into administrative results, restricted
    /// to the given component levels. Results arrive finest-to-coarsest.
    async fn reverse_geocode(
        &self,
        location: GeoPoint,
        levels: &[&str],
    ) -> std::result::Result<Vec<GeocodeResult>, GeocodeError>;

    /// Venues near a coordinate, in whichever generation the provider speaks.
    async fn nearby_venues(
        &self,
        location: GeoPoint,
        radius_m: u32,
        categories: &[&str],
    ) -> std::result::Result<VenuePayload, GeocodeError>;
}

#[async_trait]
impl GeocodeApi for geocode_client::GeocodeClient {
    async fn reverse_geocode(
        &self,
        location: GeoPoint,
        levels: &[&str],
    ) -> std::result::Result<Vec<GeocodeResult>, GeocodeError> {
        self.reverse_geocode(location.lat, location.lng, levels).await
    }

    async fn nearby_venues(
        &self,
        location: GeoPoint,
        radius_m: u32,
        categories: &[&str],
    ) -> std::result::Result<VenuePayload, GeocodeError> {
        self.nearby_venues(location.lat, location.lng, radius_m, categories)
            .await
    }
}

// ---------------------------------------------------------------------------
// Production store impls
// ---------------------------------------------------------------------------

fn db_err(err: neo4rs::Error) -> ShoutMapError {
    ShoutMapError::Database(err.to_string())
}

#[async_trait]
impl PlaceStore for GraphPlaceStore {
    async fn get(&self, id: Uuid) -> Result<Option<Place>> {
        self.get(id).await.map_err(db_err)
    }

    async fn nearest(&self, location: GeoPoint) -> Result<Option<Place>> {
        self.nearest(location).await.map_err(db_err)
    }

    async fn within_radius(&self, location: GeoPoint, radius_km: f64) -> Result<Vec<Place>> {
        self.within_radius(location, radius_km).await.map_err(db_err)
    }

    async fn ancestor_chain(&self, place_id: Uuid, max_depth: usize) -> Result<Vec<Place>> {
        self.ancestor_chain(place_id, max_depth).await.map_err(db_err)
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Place>> {
        self.find_by_external_id(external_id).await.map_err(db_err)
    }

    async fn create(&self, place: &Place) -> Result<()> {
        self.create(place).await.map_err(db_err)
    }

    async fn reparent_children(&self, deleted_id: Uuid, new_parent: Option<Uuid>) -> Result<()> {
        self.reparent_children(deleted_id, new_parent)
            .await
            .map_err(db_err)
    }

    async fn increment_shout_count(&self, place_id: Uuid, delta: i64) -> Result<()> {
        self.increment_shout_count(place_id, delta)
            .await
            .map_err(db_err)
    }

    async fn places_with_trends(&self) -> Result<Vec<Place>> {
        self.places_with_trends().await.map_err(db_err)
    }

    async fn save_trends(&self, places: &[Place]) -> Result<()> {
        self.save_trends(places).await.map_err(db_err)
    }
}

#[async_trait]
impl ShoutStore for GraphShoutStore {
    async fn create(&self, shout: &Shout) -> Result<()> {
        self.create(shout).await.map_err(db_err)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.delete(id).await.map_err(db_err)
    }

    async fn shouts_near(&self, location: GeoPoint, radius_km: f64) -> Result<Vec<Shout>> {
        self.shouts_near(location, radius_km).await.map_err(db_err)
    }

    async fn shouts_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Shout>> {
        self.shouts_since(cutoff).await.map_err(db_err)
    }

    async fn increment_echoes(&self, id: Uuid, delta: i64) -> Result<()> {
        self.increment_echoes(id, delta).await.map_err(db_err)
    }

    async fn increment_flags(&self, id: Uuid) -> Result<()> {
        self.increment_flags(id).await.map_err(db_err)
    }
}
