use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use shoutmap_common::Place;

use crate::traits::Result;

type Slot = Arc<Mutex<Option<Place>>>;

/// At-most-one in-flight creation per external place id.
///
/// The first caller for a key runs its creation while holding the key's
/// slot; concurrent callers for the same key await the slot and reuse the
/// settled result instead of racing to create a duplicate. The registry
/// entry is dropped once the creation settles, success or failure, so later
/// requests start from scratch.
pub struct CreationGate {
    inflight: Mutex<HashMap<String, Slot>>,
}

impl CreationGate {
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn create_or_join<F, Fut>(&self, external_id: &str, create: F) -> Result<Place>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Place>>,
    {
        let slot = {
            let mut inflight = self.inflight.lock().await;
            inflight
                .entry(external_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(None)))
                .clone()
        };

        let mut guard = slot.lock().await;
        if let Some(place) = guard.as_ref() {
            debug!(external_id, "Joining settled creation");
            return Ok(place.clone());
        }

        let result = create().await;
        if let Ok(place) = &result {
            *guard = Some(place.clone());
        }

        let mut inflight = self.inflight.lock().await;
        inflight.remove(external_id);

        result
    }
}

impl Default for CreationGate {
    fn default() -> Self {
        Self::new()
    }
}
