use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::warn;

use shoutmap_common::{distance_m, GeoPoint, Place, Shout, ShoutMapError};

use crate::resolver::MAX_CHAIN_DEPTH;
use crate::traits::{PlaceStore, Result, ShoutStore};

/// Feed size when the caller does not ask for one.
pub const DEFAULT_FEED_LIMIT: usize = 15;

/// Hard cap on one feed page.
pub const MAX_FEED_LIMIT: usize = 30;

/// Candidate fetch radius. Bounds the query, not the answer.
pub const FEED_QUERY_RADIUS_KM: f64 = 20_000.0;

/// Twenty minutes of staleness costs as much as one meter of distance.
const MINUTES_PER_METER: f64 = 20.0;

/// Ten echoes buy back one meter of distance.
const ECHOES_PER_METER: f64 = 10.0;

/// A shout with its display place (possibly a coarse ancestor) and rank
/// score; lower scores are more relevant.
#[derive(Debug, Clone)]
pub struct RankedShout {
    pub shout: Shout,
    pub place: Place,
    pub score: f64,
}

/// Ranks nearby shouts by a composite of distance, recency, and engagement.
pub struct FeedRanker<P, S> {
    places: Arc<P>,
    shouts: Arc<S>,
}

impl<P: PlaceStore, S: ShoutStore> FeedRanker<P, S> {
    pub fn new(places: Arc<P>, shouts: Arc<S>) -> Self {
        Self { places, shouts }
    }

    /// List shouts around `location`, most relevant first. A missing
    /// location is rejected before any I/O; zero candidates is an empty
    /// list, not an error.
    pub async fn list_shouts(
        &self,
        location: Option<GeoPoint>,
        limit: Option<usize>,
        page: usize,
    ) -> Result<Vec<RankedShout>> {
        let Some(location) = location else {
            return Err(ShoutMapError::InvalidInput("Empty location".to_string()));
        };
        let limit = limit.unwrap_or(DEFAULT_FEED_LIMIT).clamp(1, MAX_FEED_LIMIT);

        let candidates = self
            .shouts
            .shouts_near(location, FEED_QUERY_RADIUS_KM)
            .await?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        // Ancestor chains for distinct candidates are independent; fetch
        // them concurrently.
        let chains = join_all(
            candidates
                .iter()
                .map(|shout| self.places.ancestor_chain(shout.place_id, MAX_CHAIN_DEPTH)),
        )
        .await;

        let now = Utc::now();
        let mut ranked = Vec::with_capacity(candidates.len());
        for (shout, chain) in candidates.into_iter().zip(chains) {
            let chain = match chain {
                Ok(chain) => chain,
                Err(err) => {
                    warn!(shout_id = %shout.id, error = %err, "Ancestor fetch failed, degrading");
                    Vec::new()
                }
            };

            let meters = distance_m(location, shout.location);
            let minutes = (now - shout.created_at).num_seconds() as f64 / 60.0;
            let echoes = shout.echoes as f64;
            let score = meters + minutes / MINUTES_PER_METER - echoes / ECHOES_PER_METER;

            let Some(place) = display_place(&chain, meters) else {
                warn!(shout_id = %shout.id, "No place chain for shout, dropping candidate");
                continue;
            };

            ranked.push(RankedShout {
                shout,
                place,
                score,
            });
        }

        ranked.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Paging is a slice over the sorted list; the score is not a
        // store-native field, so it cannot be pushed into the query.
        Ok(ranked.into_iter().skip(page * limit).take(limit).collect())
    }
}

/// The deepest place depth shown to a viewer this far away. Closer viewers
/// see finer-grained names; distant viewers only city/region-level ones.
fn display_depth_cap(meters: f64) -> Option<u32> {
    if meters > 20_000.0 {
        Some(1)
    } else if meters > 500.0 {
        Some(2)
    } else if meters > 100.0 {
        Some(3)
    } else {
        None
    }
}

/// Pick the display place from a leaf-to-root chain: the finest ancestor
/// whose depth fits the viewer's distance bucket.
fn display_place(chain: &[Place], meters: f64) -> Option<Place> {
    match display_depth_cap(meters) {
        None => chain.first().cloned(),
        Some(cap) => chain
            .iter()
            .find(|place| place.depth <= cap)
            .cloned()
            .or_else(|| chain.last().cloned()),
    }
}
