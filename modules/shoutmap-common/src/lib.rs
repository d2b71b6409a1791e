pub mod types;
pub mod categories;
pub mod config;
pub mod error;

pub use types::*;
pub use categories::*;
pub use config::Config;
pub use error::ShoutMapError;
