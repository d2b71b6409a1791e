pub mod error;
pub mod types;

pub use error::{GeocodeError, Result};
pub use types::{
    AddressComponent, Bounds, GeocodeResponse, GeocodeResult, Geometry, LatLng, VenueEnvelope,
    VenuePayload, VenueRecord,
};

use std::time::Duration;

/// Client for the reverse-geocode and nearby-venue endpoints. Calls are
/// bounded by a request timeout; a timeout surfaces as a network error like
/// any other upstream failure.
pub struct GeocodeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeocodeClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Reverse-geocode a coordinate into administrative results, restricted
    /// to the given component levels. Results arrive finest-to-coarsest.
    pub async fn reverse_geocode(
        &self,
        lat: f64,
        lng: f64,
        levels: &[&str],
    ) -> Result<Vec<GeocodeResult>> {
        let url = format!("{}/geocode/json", self.base_url);
        let latlng = format!("{lat},{lng}");
        let components = levels.join("|");

        tracing::debug!(%latlng, %components, "Reverse geocoding");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("latlng", latlng.as_str()),
                ("components", components.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeocodeError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let payload: GeocodeResponse = resp.json().await?;
        if payload.status != "OK" {
            tracing::warn!(status = %payload.status, "Geocode returned non-OK status");
            return Err(GeocodeError::Status(payload.status));
        }

        tracing::debug!(count = payload.results.len(), "Geocode results received");
        Ok(payload.results)
    }

    /// Look up venues near a coordinate, restricted to the given categories.
    /// The payload shape depends on the provider generation; both parse into
    /// `VenuePayload` variants.
    pub async fn nearby_venues(
        &self,
        lat: f64,
        lng: f64,
        radius_m: u32,
        categories: &[&str],
    ) -> Result<VenuePayload> {
        let url = format!("{}/place/nearbysearch/json", self.base_url);
        let location = format!("{lat},{lng}");
        let types = categories.join("|");
        let radius = radius_m.to_string();

        tracing::debug!(%location, radius_m, "Searching nearby venues");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("rankby", "prominence"),
                ("types", types.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeocodeError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let payload: VenuePayload = resp.json().await?;
        if payload.status() != "OK" {
            tracing::warn!(status = %payload.status(), "Venue lookup returned non-OK status");
            return Err(GeocodeError::Status(payload.status().to_string()));
        }

        Ok(payload)
    }
}
