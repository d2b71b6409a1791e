pub mod client;
pub mod place_store;
pub mod shout_store;

pub use client::GraphClient;
pub use neo4rs::query;
pub use place_store::GraphPlaceStore;
pub use shout_store::GraphShoutStore;
