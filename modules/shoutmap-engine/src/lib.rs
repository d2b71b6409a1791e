pub mod importer;
pub mod posting;
pub mod ranker;
pub mod resolver;
pub mod singleflight;
pub mod testing;
pub mod traits;
pub mod trends;

pub use importer::{GeocodeImporter, PlaceDraft, ADMIN_LEVELS};
pub use posting::{NewShout, ShoutComposer, MAX_CONTENT_LEN};
pub use ranker::{FeedRanker, RankedShout};
pub use resolver::PlaceResolver;
pub use singleflight::CreationGate;
pub use traits::{GeocodeApi, PlaceStore, Result, ShoutStore};
pub use trends::{TrendAggregator, TrendStats};
