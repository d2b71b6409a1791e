use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Neo4j
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,

    // Geocode provider
    pub geocode_api_key: String,
    pub geocode_base_url: String,
    pub geocode_timeout_secs: u64,

    // Venue lookup
    pub venue_search_radius_m: u32,

    // Trend aggregation
    pub trend_interval_hours: u64,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            neo4j_uri: required_env("NEO4J_URI"),
            neo4j_user: required_env("NEO4J_USER"),
            neo4j_password: required_env("NEO4J_PASSWORD"),
            geocode_api_key: required_env("GEOCODE_API_KEY"),
            geocode_base_url: env::var("GEOCODE_BASE_URL")
                .unwrap_or_else(|_| "https://maps.googleapis.com/maps/api".to_string()),
            geocode_timeout_secs: env::var("GEOCODE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("GEOCODE_TIMEOUT_SECS must be a number"),
            venue_search_radius_m: env::var("VENUE_SEARCH_RADIUS_M")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .expect("VENUE_SEARCH_RADIUS_M must be a number"),
            trend_interval_hours: env::var("TREND_INTERVAL_HOURS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .expect("TREND_INTERVAL_HOURS must be a number"),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
