use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::categories::{ESTABLISHMENT, POLITICAL};

// --- Geo Types ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Haversine great-circle distance between two lat/lng points in kilometers.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let lat1_r = lat1.to_radians();
    let lat2_r = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1_r.cos() * lat2_r.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Haversine distance in meters between two points.
pub fn distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    haversine_km(a.lat, a.lng, b.lat, b.lng) * 1000.0
}

// --- Feeling ---

/// The fixed sentiment palette a shout carries. `ALL` order is also the
/// tie-break order for trend aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feeling {
    Red,
    Blue,
    Black,
}

impl Feeling {
    pub const ALL: [Feeling; 3] = [Feeling::Red, Feeling::Blue, Feeling::Black];

    /// Strict parse used for input validation. Unknown names are rejected,
    /// not defaulted.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "red" => Some(Feeling::Red),
            "blue" => Some(Feeling::Blue),
            "black" => Some(Feeling::Black),
            _ => None,
        }
    }
}

impl std::fmt::Display for Feeling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Feeling::Red => write!(f, "red"),
            Feeling::Blue => write!(f, "blue"),
            Feeling::Black => write!(f, "black"),
        }
    }
}

/// Per-feeling tallies aggregated onto a place by the trend job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub red: u32,
    pub blue: u32,
    pub black: u32,
}

impl SentimentCounts {
    pub fn get(&self, feeling: Feeling) -> u32 {
        match feeling {
            Feeling::Red => self.red,
            Feeling::Blue => self.blue,
            Feeling::Black => self.black,
        }
    }

    pub fn add(&mut self, feeling: Feeling) {
        match feeling {
            Feeling::Red => self.red += 1,
            Feeling::Blue => self.blue += 1,
            Feeling::Black => self.black += 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.red == 0 && self.blue == 0 && self.black == 0
    }

    /// The feeling with the highest tally. Ties go to the earlier entry in
    /// the palette order; all-zero tallies have no winner.
    pub fn top(&self) -> Option<Feeling> {
        let mut best: Option<(Feeling, u32)> = None;
        for feeling in Feeling::ALL {
            let count = self.get(feeling);
            if count > 0 && best.map_or(true, |(_, b)| count > b) {
                best = Some((feeling, count));
            }
        }
        best.map(|(f, _)| f)
    }
}

// --- ACL declaration ---

/// Desired visibility for an entity type. The store enforces it; the core
/// only declares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AclPolicy {
    pub public_read: bool,
    pub public_write: bool,
    pub owner_write: bool,
}

// --- Place ---

/// A node in the geographic containment hierarchy, country down to venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub id: Uuid,
    /// The external provider's place identifier, when imported.
    pub external_id: Option<String>,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Containment radius in meters.
    pub radius_m: f64,
    pub categories: Vec<String>,
    /// Hierarchy depth. Root (country) is 0; always parent.depth + 1 below.
    pub depth: u32,
    pub parent_id: Option<Uuid>,
    pub shout_count: u32,
    pub sentiment: SentimentCounts,
    /// Trending feeling, set by the aggregator.
    pub feeling: Option<Feeling>,
    pub created_at: DateTime<Utc>,
}

impl Place {
    pub const ACL: AclPolicy = AclPolicy {
        public_read: true,
        public_write: false,
        owner_write: false,
    };

    /// Construct a place under `parent`, deriving depth from the parent just
    /// fetched. Depth is never computed any other way.
    pub fn new_child(
        external_id: Option<String>,
        name: String,
        location: GeoPoint,
        radius_m: f64,
        categories: Vec<String>,
        parent: Option<&Place>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            external_id,
            name,
            lat: location.lat,
            lng: location.lng,
            radius_m,
            categories,
            depth: parent.map_or(0, |p| p.depth + 1),
            parent_id: parent.map(|p| p.id),
            shout_count: 0,
            sentiment: SentimentCounts::default(),
            feeling: None,
            created_at: Utc::now(),
        }
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    pub fn distance_m(&self, point: GeoPoint) -> f64 {
        distance_m(self.location(), point)
    }

    /// A point is contained when its distance to the center is strictly
    /// less than the radius.
    pub fn contains(&self, point: GeoPoint) -> bool {
        self.distance_m(point) < self.radius_m
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    /// Bare administrative/political region — never an acceptable terminal
    /// resolution for a user-facing place tag.
    pub fn is_political(&self) -> bool {
        self.has_category(POLITICAL)
    }

    /// Venue-grade place (anything the venue endpoint produced).
    pub fn is_venue(&self) -> bool {
        self.has_category(ESTABLISHMENT)
    }
}

// --- Shout ---

/// A user-authored, geotagged, short-lived social post. `place_id` may point
/// at a coarse ancestor of the true creation point; it is set before the
/// shout becomes queryable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shout {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location: GeoPoint,
    pub place_id: Uuid,
    pub feeling: Feeling,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub echoes: u32,
    pub flags: u32,
}

impl Shout {
    pub const ACL: AclPolicy = AclPolicy {
        public_read: true,
        public_write: false,
        owner_write: true,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_sf_to_oakland() {
        // SF to Oakland is ~13km
        let dist = haversine_km(37.7749, -122.4194, 37.8044, -122.2712);
        assert!(
            (dist - 13.0).abs() < 2.0,
            "SF to Oakland should be ~13km, got {dist}"
        );
    }

    #[test]
    fn haversine_same_point_is_zero() {
        let dist = haversine_km(-23.5505, -46.6333, -23.5505, -46.6333);
        assert!(dist < 0.001, "Same point should be 0km, got {dist}");
    }

    #[test]
    fn feeling_parse_is_strict() {
        assert_eq!(Feeling::parse("red"), Some(Feeling::Red));
        assert_eq!(Feeling::parse("mauve"), None);
        assert_eq!(Feeling::parse(""), None);
    }

    #[test]
    fn sentiment_top_breaks_ties_in_palette_order() {
        let counts = SentimentCounts {
            red: 2,
            blue: 2,
            black: 1,
        };
        assert_eq!(counts.top(), Some(Feeling::Red));

        let counts = SentimentCounts {
            red: 0,
            blue: 3,
            black: 3,
        };
        assert_eq!(counts.top(), Some(Feeling::Blue));

        assert_eq!(SentimentCounts::default().top(), None);
    }

    #[test]
    fn containment_is_strict() {
        let place = Place::new_child(
            None,
            "Café Astor".to_string(),
            GeoPoint::new(-22.9847, -43.1986),
            40.0,
            vec!["cafe".to_string()],
            None,
        );
        assert!(place.contains(GeoPoint::new(-22.9847, -43.1986)));
        // ~1.1km away
        assert!(!place.contains(GeoPoint::new(-22.9947, -43.1986)));
    }

    #[test]
    fn child_depth_follows_parent() {
        let country = Place::new_child(
            None,
            "Brasil".to_string(),
            GeoPoint::new(-14.235, -51.925),
            2_500_000.0,
            vec!["country".to_string(), "political".to_string()],
            None,
        );
        let city = Place::new_child(
            None,
            "Rio de Janeiro".to_string(),
            GeoPoint::new(-22.9068, -43.1729),
            20_000.0,
            vec!["locality".to_string(), "political".to_string()],
            Some(&country),
        );
        assert_eq!(country.depth, 0);
        assert_eq!(city.depth, 1);
        assert_eq!(city.parent_id, Some(country.id));
        assert!(city.is_political());
        assert!(!city.is_venue());
    }
}
