use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use shoutmap_common::{Feeling, GeoPoint, Shout, ShoutMapError};

use crate::resolver::PlaceResolver;
use crate::traits::{GeocodeApi, PlaceStore, Result, ShoutStore};

/// Longest content a shout may carry.
pub const MAX_CONTENT_LEN: usize = 255;

/// Input for a new shout. `place_id` may be pre-resolved by the caller;
/// otherwise the resolver picks the enclosing place at the reported GPS
/// accuracy before the shout is persisted.
#[derive(Debug, Clone)]
pub struct NewShout {
    pub user_id: Uuid,
    pub location: Option<GeoPoint>,
    pub place_id: Option<Uuid>,
    pub feeling: Feeling,
    pub content: String,
    pub accuracy_m: f64,
}

/// The shout write path: validation, place resolution, persistence, and the
/// counter side effects around it.
pub struct ShoutComposer<P, S, G> {
    resolver: Arc<PlaceResolver<P, G>>,
    places: Arc<P>,
    shouts: Arc<S>,
}

impl<P: PlaceStore, S: ShoutStore, G: GeocodeApi> ShoutComposer<P, S, G> {
    pub fn new(resolver: Arc<PlaceResolver<P, G>>, places: Arc<P>, shouts: Arc<S>) -> Self {
        Self {
            resolver,
            places,
            shouts,
        }
    }

    /// Validate and persist a new shout. Invalid input is rejected before
    /// any I/O. A shout always resolves to some enclosing place before it
    /// becomes queryable; resolution failures degrade to a coarser place
    /// rather than blocking the post.
    pub async fn post(&self, new: NewShout) -> Result<Shout> {
        if new.content.trim().is_empty() {
            return Err(ShoutMapError::InvalidInput("Empty content".to_string()));
        }
        if new.content.chars().count() > MAX_CONTENT_LEN {
            return Err(ShoutMapError::InvalidInput(format!(
                "Content should not be larger than {MAX_CONTENT_LEN} characters"
            )));
        }
        let Some(location) = new.location else {
            return Err(ShoutMapError::InvalidInput("Empty location".to_string()));
        };

        let place = match new.place_id {
            Some(id) => self
                .places
                .get(id)
                .await?
                .ok_or(ShoutMapError::NotFound)?,
            None => self.resolver.resolve(location, new.accuracy_m).await?,
        };

        let shout = Shout {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            location,
            place_id: place.id,
            feeling: new.feeling,
            content: new.content,
            created_at: Utc::now(),
            echoes: 0,
            flags: 0,
        };

        self.shouts.create(&shout).await?;
        self.places.increment_shout_count(place.id, 1).await?;

        info!(shout_id = %shout.id, place = %place.name, "Shout posted");
        Ok(shout)
    }

    /// Delete a shout and release its place's counter.
    pub async fn delete(&self, shout: &Shout) -> Result<()> {
        self.shouts.delete(shout.id).await?;
        self.places.increment_shout_count(shout.place_id, -1).await?;
        Ok(())
    }

    pub async fn echo(&self, shout_id: Uuid) -> Result<()> {
        self.shouts.increment_echoes(shout_id, 1).await
    }

    pub async fn unecho(&self, shout_id: Uuid) -> Result<()> {
        self.shouts.increment_echoes(shout_id, -1).await
    }

    pub async fn flag(&self, shout_id: Uuid) -> Result<()> {
        self.shouts.increment_flags(shout_id).await
    }
}
