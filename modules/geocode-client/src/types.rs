use serde::Deserialize;

// --- Reverse geocode ---

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

/// One result from either the geocode endpoint (administrative regions,
/// carries `address_components` and bounds) or the modern venue endpoint
/// (carries `name` instead).
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResult {
    pub place_id: String,
    #[serde(default)]
    pub types: Vec<String>,
    pub name: Option<String>,
    pub address_components: Option<Vec<AddressComponent>>,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    pub short_name: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
    pub bounds: Option<Bounds>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Bounds {
    pub northeast: LatLng,
    pub southwest: LatLng,
}

// --- Nearby venues ---

/// The venue endpoint answers in one of two shapes depending on provider
/// generation. Both are deserialized into typed variants here; callers never
/// presence-check fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VenuePayload {
    /// Older generation: `{status, response: {venues: [...]}}`.
    Legacy {
        status: String,
        response: VenueEnvelope,
    },
    /// Current generation: `{status, results: [...]}` — the geocode result
    /// shape with `name` and `types` populated.
    Modern {
        status: String,
        results: Vec<GeocodeResult>,
    },
}

impl VenuePayload {
    pub fn status(&self) -> &str {
        match self {
            VenuePayload::Legacy { status, .. } => status,
            VenuePayload::Modern { status, .. } => status,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VenueEnvelope {
    #[serde(default)]
    pub venues: Vec<VenueRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VenueRecord {
    pub id: String,
    pub name: String,
    pub location: LatLng,
    #[serde(default)]
    pub categories: Vec<String>,
}
