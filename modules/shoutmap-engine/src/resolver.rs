use std::sync::Arc;

use tracing::{debug, info, warn};

use shoutmap_common::{GeoPoint, Place, ShoutMapError};

use crate::importer::GeocodeImporter;
use crate::singleflight::CreationGate;
use crate::traits::{GeocodeApi, PlaceStore, Result};

/// How many parent edges a single resolution may climb.
pub const MAX_CHAIN_DEPTH: usize = 6;

/// Outcome of walking the locally known hierarchy.
enum LocalWalk {
    /// A candidate that contains the point and is big enough for the
    /// requested accuracy. May still be a bare political region.
    Fit(Place),
    /// The chain ran out; the coarsest ancestor seen, if any.
    Exhausted(Option<Place>),
}

/// Resolves a coordinate to the most specific enclosing place satisfying a
/// requested accuracy, importing from the geocode provider when the local
/// hierarchy has nothing acceptable.
pub struct PlaceResolver<P, G> {
    store: Arc<P>,
    importer: GeocodeImporter<P, G>,
}

impl<P: PlaceStore, G: GeocodeApi> PlaceResolver<P, G> {
    pub fn new(store: Arc<P>, geocode: Arc<G>, venue_radius_m: u32) -> Self {
        let gate = Arc::new(CreationGate::new());
        let importer = GeocodeImporter::new(Arc::clone(&store), geocode, gate, venue_radius_m);
        Self { store, importer }
    }

    /// Resolve `location` to a place whose radius is at least `accuracy_m`
    /// and which contains the point. Political regions are never acceptable
    /// terminal resolutions while the importer is reachable; when it is not,
    /// the best locally known ancestor wins over failing the caller.
    pub async fn resolve(&self, location: GeoPoint, accuracy_m: f64) -> Result<Place> {
        let local = self.walk_local(location, accuracy_m).await?;

        if let LocalWalk::Fit(place) = &local {
            if !place.is_political() {
                debug!(place = %place.name, "Resolved locally");
                return Ok(place.clone());
            }
        }

        match self.importer.import(location, accuracy_m).await {
            Ok(imported) => {
                // Retry the walk once against the freshly imported hierarchy.
                let chain = self.store.ancestor_chain(imported.id, MAX_CHAIN_DEPTH).await?;
                match walk_chain(&chain, location, accuracy_m) {
                    Some(place) => {
                        info!(place = %place.name, "Resolved after import");
                        Ok(place.clone())
                    }
                    None => Ok(imported),
                }
            }
            Err(err) => {
                warn!(error = %err, "Import failed, falling back to local ancestor");
                match local {
                    LocalWalk::Fit(place) => Ok(place),
                    LocalWalk::Exhausted(Some(coarsest)) => Ok(coarsest),
                    LocalWalk::Exhausted(None) => Err(ShoutMapError::NotFound),
                }
            }
        }
    }

    async fn walk_local(&self, location: GeoPoint, accuracy_m: f64) -> Result<LocalWalk> {
        let Some(nearest) = self.store.nearest(location).await? else {
            return Ok(LocalWalk::Exhausted(None));
        };

        let chain = self.store.ancestor_chain(nearest.id, MAX_CHAIN_DEPTH).await?;
        match walk_chain(&chain, location, accuracy_m) {
            Some(place) => Ok(LocalWalk::Fit(place.clone())),
            None => Ok(LocalWalk::Exhausted(chain.into_iter().last())),
        }
    }
}

/// Climb a leaf-to-root chain until a node both contains the point and is
/// big enough for the requested accuracy.
fn walk_chain(chain: &[Place], location: GeoPoint, accuracy_m: f64) -> Option<&Place> {
    chain
        .iter()
        .find(|place| place.contains(location) && place.radius_m >= accuracy_m)
}
