//! Importer behavior: chain building with the forward cursor, normalization
//! of both venue response generations, bounds-derived radii, and the
//! venue ignore-list.

use std::sync::Arc;

use geocode_client::VenuePayload;
use shoutmap_common::{haversine_km, GeoPoint};
use shoutmap_engine::testing::{admin_result, venue_result, MockGeocode, MockPlaceStore};
use shoutmap_engine::{CreationGate, GeocodeImporter, PlaceDraft};

const POINT: GeoPoint = GeoPoint {
    lat: -22.9847,
    lng: -43.1986,
};

fn importer(
    store: &Arc<MockPlaceStore>,
    geocode: MockGeocode,
) -> GeocodeImporter<MockPlaceStore, MockGeocode> {
    GeocodeImporter::new(
        Arc::clone(store),
        Arc::new(geocode),
        Arc::new(CreationGate::new()),
        500,
    )
}

#[tokio::test]
async fn builds_chain_coarsest_to_finest() {
    let store = Arc::new(MockPlaceStore::new());
    let geocode = MockGeocode::new().on_geocode(vec![
        admin_result("ext-ipanema", "Ipanema", "neighborhood", -22.984, -43.198, 0.01),
        admin_result("ext-rio", "Rio de Janeiro", "locality", -22.9068, -43.1729, 0.2),
        admin_result(
            "ext-rj",
            "State of Rio de Janeiro",
            "administrative_area_level_1",
            -22.9,
            -43.2,
            2.0,
        ),
        admin_result("ext-br", "Brazil", "country", -14.235, -51.925, 20.0),
    ]);

    let imported = importer(&store, geocode)
        .import(POINT, 20.0)
        .await
        .unwrap();

    // Venue lookup is dead, so the finest administrative node wins.
    assert_eq!(imported.external_id.as_deref(), Some("ext-ipanema"));
    assert_eq!(imported.depth, 3);

    let country = &store.by_external_id("ext-br")[0];
    let state = &store.by_external_id("ext-rj")[0];
    let city = &store.by_external_id("ext-rio")[0];
    assert_eq!(country.depth, 0);
    assert!(country.parent_id.is_none());
    assert_eq!(state.parent_id, Some(country.id));
    assert_eq!(city.parent_id, Some(state.id));
}

#[tokio::test]
async fn absent_level_links_finer_nodes_under_coarser_parent() {
    let store = Arc::new(MockPlaceStore::new());
    // No locality in the response.
    let geocode = MockGeocode::new().on_geocode(vec![
        admin_result("ext-ipanema", "Ipanema", "neighborhood", -22.984, -43.198, 0.01),
        admin_result(
            "ext-rj",
            "Rio de Janeiro",
            "administrative_area_level_1",
            -22.9,
            -43.2,
            2.0,
        ),
        admin_result("ext-br", "Brazil", "country", -14.235, -51.925, 20.0),
    ]);

    let imported = importer(&store, geocode)
        .import(POINT, 20.0)
        .await
        .unwrap();

    assert_eq!(imported.external_id.as_deref(), Some("ext-ipanema"));
    let state = &store.by_external_id("ext-rj")[0];
    assert_eq!(imported.parent_id, Some(state.id));
    assert_eq!(imported.depth, 2);
}

#[tokio::test]
async fn cursor_skips_unmatched_results() {
    let store = Arc::new(MockPlaceStore::new());
    // A postal-code result sits between country and state; the level scan
    // steps over it without losing its cursor.
    let geocode = MockGeocode::new().on_geocode(vec![
        admin_result("ext-rio", "Rio de Janeiro", "locality", -22.9068, -43.1729, 0.2),
        admin_result("ext-zip", "22410-002", "postal_code", -22.98, -43.2, 0.001),
        admin_result(
            "ext-rj",
            "Rio de Janeiro",
            "administrative_area_level_1",
            -22.9,
            -43.2,
            2.0,
        ),
        admin_result("ext-br", "Brazil", "country", -14.235, -51.925, 20.0),
    ]);

    let imported = importer(&store, geocode)
        .import(POINT, 20.0)
        .await
        .unwrap();

    assert_eq!(imported.external_id.as_deref(), Some("ext-rio"));
    assert_eq!(imported.depth, 2);
    assert!(store.by_external_id("ext-zip").is_empty());
}

#[tokio::test]
async fn low_signal_venues_are_not_imported() {
    let store = Arc::new(MockPlaceStore::new());
    let geocode = MockGeocode::new()
        .on_geocode(vec![admin_result(
            "ext-rio",
            "Rio de Janeiro",
            "locality",
            -22.9068,
            -43.1729,
            0.2,
        )])
        .on_venues(VenuePayload::Modern {
            status: "OK".to_string(),
            results: vec![
                venue_result("ext-noise", "Generic Point", &["point_of_interest"], POINT.lat, POINT.lng),
                venue_result("ext-cafe", "Café Astor", &["food"], POINT.lat, POINT.lng),
            ],
        });

    let imported = importer(&store, geocode)
        .import(POINT, 20.0)
        .await
        .unwrap();

    assert_eq!(imported.external_id.as_deref(), Some("ext-cafe"));
    assert!(store.by_external_id("ext-noise").is_empty());
    let cafe = &store.by_external_id("ext-cafe")[0];
    assert!(cafe.is_venue());
    assert_eq!(cafe.radius_m, 40.0);
}

#[tokio::test]
async fn venue_not_containing_the_point_is_created_but_not_selected() {
    let store = Arc::new(MockPlaceStore::new());
    let geocode = MockGeocode::new()
        .on_geocode(vec![admin_result(
            "ext-rio",
            "Rio de Janeiro",
            "locality",
            -22.9068,
            -43.1729,
            0.2,
        )])
        .on_venues(VenuePayload::Modern {
            status: "OK".to_string(),
            // ~1.1km from POINT, radius 40m: a leaf, but not the answer.
            results: vec![venue_result("ext-far", "Bar Distante", &["food"], -22.9947, -43.1986)],
        });

    let imported = importer(&store, geocode)
        .import(POINT, 20.0)
        .await
        .unwrap();

    assert_eq!(imported.external_id.as_deref(), Some("ext-rio"));
    assert_eq!(store.by_external_id("ext-far").len(), 1);
}

#[test]
fn both_venue_generations_normalize_to_the_same_draft() {
    let legacy: VenuePayload = serde_json::from_str(
        r#"{
            "status": "OK",
            "response": {
                "venues": [
                    {"id": "v1", "name": "Bar do Mineiro",
                     "location": {"lat": -22.92, "lng": -43.18},
                     "categories": ["restaurant"]}
                ]
            }
        }"#,
    )
    .unwrap();
    let modern: VenuePayload = serde_json::from_str(
        r#"{
            "status": "OK",
            "results": [
                {"place_id": "v1", "name": "Bar do Mineiro",
                 "types": ["restaurant"],
                 "geometry": {"location": {"lat": -22.92, "lng": -43.18}}}
            ]
        }"#,
    )
    .unwrap();

    let legacy_drafts = PlaceDraft::from_venue_payload(&legacy);
    let modern_drafts = PlaceDraft::from_venue_payload(&modern);
    assert_eq!(legacy_drafts, modern_drafts);
    assert_eq!(legacy_drafts[0].radius_m, 100.0);
    assert!(legacy_drafts[0]
        .categories
        .iter()
        .any(|c| c == "establishment"));
}

#[test]
fn admin_radius_is_half_the_bounds_diagonal() {
    let result = admin_result("ext-x", "Somewhere", "locality", 0.0, 0.0, 0.1);
    let draft = PlaceDraft::from_admin_result(&result).unwrap();

    let expected_m = haversine_km(0.1, 0.1, -0.1, -0.1) * 1000.0 / 2.0;
    assert!((draft.radius_m - expected_m).abs() < 1.0);
}
