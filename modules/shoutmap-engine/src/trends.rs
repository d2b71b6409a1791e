use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info};
use uuid::Uuid;

use shoutmap_common::{Place, SentimentCounts};

use crate::traits::{PlaceStore, Result, ShoutStore};

/// Trailing window the recompute rescans.
pub const TREND_WINDOW_HOURS: i64 = 24;

/// What one recompute run touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendStats {
    pub places_updated: usize,
    pub shouts_scanned: usize,
}

/// Periodic batch job that re-derives per-place sentiment and shout-count
/// aggregates from the recent shout corpus. Idempotent per run.
pub struct TrendAggregator<P, S> {
    places: Arc<P>,
    shouts: Arc<S>,
    running: AtomicBool,
}

impl<P: PlaceStore, S: ShoutStore> TrendAggregator<P, S> {
    pub fn new(places: Arc<P>, shouts: Arc<S>) -> Self {
        Self {
            places,
            shouts,
            running: AtomicBool::new(false),
        }
    }

    /// Clear every existing aggregate, rescan the trailing window, and
    /// persist all touched places in one batch. Only venue-grade places
    /// accumulate tallies; bare regions are cleared and left empty.
    pub async fn recompute(&self) -> Result<TrendStats> {
        let mut touched: HashMap<Uuid, Place> = HashMap::new();

        for place in self.places.places_with_trends().await? {
            touched.insert(place.id, cleared(place));
        }

        let cutoff = Utc::now() - Duration::hours(TREND_WINDOW_HOURS);
        let recent = self.shouts.shouts_since(cutoff).await?;
        let shouts_scanned = recent.len();

        let wanted: HashSet<Uuid> = recent.iter().map(|s| s.place_id).collect();
        for place_id in wanted {
            if touched.contains_key(&place_id) {
                continue;
            }
            if let Some(place) = self.places.get(place_id).await? {
                if place.is_venue() {
                    touched.insert(place_id, cleared(place));
                }
            }
        }

        for shout in &recent {
            let Some(place) = touched.get_mut(&shout.place_id) else {
                continue;
            };
            if !place.is_venue() {
                continue;
            }
            place.shout_count += 1;
            place.sentiment.add(shout.feeling);
        }

        for place in touched.values_mut() {
            place.feeling = place.sentiment.top();
        }

        let batch: Vec<Place> = touched.into_values().collect();
        self.places.save_trends(&batch).await?;

        Ok(TrendStats {
            places_updated: batch.len(),
            shouts_scanned,
        })
    }

    /// Run one recompute unless another is already in flight.
    pub async fn run_once(&self) {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("Trend recompute already in progress, skipping");
            return;
        }

        match self.recompute().await {
            Ok(stats) => info!(
                places = stats.places_updated,
                shouts = stats.shouts_scanned,
                "Trend aggregates recomputed"
            ),
            Err(err) => error!(error = %err, "Trend recompute failed"),
        }

        self.running.store(false, Ordering::SeqCst);
    }

    /// Spawn a background loop that recomputes trends on a timer.
    pub fn spawn_trend_loop(self: &Arc<Self>, interval_hours: u64)
    where
        P: 'static,
        S: 'static,
    {
        let aggregator = Arc::clone(self);
        tokio::spawn(async move {
            let interval = std::time::Duration::from_secs(interval_hours * 3600);
            loop {
                tokio::time::sleep(interval).await;
                aggregator.run_once().await;
            }
        });

        info!(interval_hours, "Trend recompute loop started");
    }
}

fn cleared(mut place: Place) -> Place {
    place.shout_count = 0;
    place.sentiment = SentimentCounts::default();
    place.feeling = None;
    place
}
