//! Feed ranking: score monotonicity, place truncation by viewer distance,
//! and sort-then-slice paging.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use shoutmap_common::{Feeling, GeoPoint, Place, Shout, ShoutMapError};
use shoutmap_engine::testing::{MockPlaceStore, MockShoutStore};
use shoutmap_engine::FeedRanker;

const VIEWER: GeoPoint = GeoPoint {
    lat: -22.9847,
    lng: -43.1986,
};

/// country(0) → state(1) → city(2) → venue(3), venue centered on VIEWER.
fn seed_hierarchy(store: &MockPlaceStore) -> Place {
    let country = Place::new_child(
        None,
        "Brasil".to_string(),
        GeoPoint::new(-14.235, -51.925),
        2_500_000.0,
        vec!["country".to_string(), "political".to_string()],
        None,
    );
    let state = Place::new_child(
        None,
        "Rio de Janeiro".to_string(),
        GeoPoint::new(-22.9, -43.2),
        200_000.0,
        vec![
            "administrative_area_level_1".to_string(),
            "political".to_string(),
        ],
        Some(&country),
    );
    let city = Place::new_child(
        None,
        "Rio de Janeiro".to_string(),
        GeoPoint::new(-22.9068, -43.1729),
        20_000.0,
        vec!["locality".to_string(), "political".to_string()],
        Some(&state),
    );
    let venue = Place::new_child(
        None,
        "Café Astor".to_string(),
        VIEWER,
        40.0,
        vec!["food".to_string(), "establishment".to_string()],
        Some(&city),
    );
    store.seed(country);
    store.seed(state);
    store.seed(city);
    let leaf = venue.clone();
    store.seed(venue);
    leaf
}

fn shout(place: &Place, location: GeoPoint, age_minutes: i64, echoes: u32) -> Shout {
    Shout {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        location,
        place_id: place.id,
        feeling: Feeling::Red,
        content: "olha isso".to_string(),
        created_at: Utc::now() - Duration::minutes(age_minutes),
        echoes,
        flags: 0,
    }
}

/// Offset a point roughly `meters` north.
fn north_of(point: GeoPoint, meters: f64) -> GeoPoint {
    GeoPoint::new(point.lat + meters / 111_000.0, point.lng)
}

#[tokio::test]
async fn missing_location_is_rejected() {
    let places = Arc::new(MockPlaceStore::new());
    let shouts = Arc::new(MockShoutStore::new());
    let ranker = FeedRanker::new(places, shouts);

    let err = ranker.list_shouts(None, None, 0).await.unwrap_err();
    assert!(matches!(err, ShoutMapError::InvalidInput(_)));
}

#[tokio::test]
async fn zero_candidates_is_an_empty_list() {
    let places = Arc::new(MockPlaceStore::new());
    let shouts = Arc::new(MockShoutStore::new());
    let ranker = FeedRanker::new(places, shouts);

    let feed = ranker.list_shouts(Some(VIEWER), None, 0).await.unwrap();
    assert!(feed.is_empty());
}

#[tokio::test]
async fn closer_shouts_rank_ahead() {
    let places = Arc::new(MockPlaceStore::new());
    let shouts = Arc::new(MockShoutStore::new());
    let venue = seed_hierarchy(&places);

    let near = shout(&venue, north_of(VIEWER, 10.0), 5, 0);
    let far = shout(&venue, north_of(VIEWER, 400.0), 5, 0);
    shouts.seed(near.clone());
    shouts.seed(far.clone());

    let ranker = FeedRanker::new(places, shouts);
    let feed = ranker.list_shouts(Some(VIEWER), None, 0).await.unwrap();

    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0].shout.id, near.id);
    assert!(feed[0].score < feed[1].score);
}

#[tokio::test]
async fn older_shouts_rank_behind() {
    let places = Arc::new(MockPlaceStore::new());
    let shouts = Arc::new(MockShoutStore::new());
    let venue = seed_hierarchy(&places);

    let at = north_of(VIEWER, 10.0);
    let fresh = shout(&venue, at, 1, 0);
    let stale = shout(&venue, at, 300, 0);
    shouts.seed(fresh.clone());
    shouts.seed(stale.clone());

    let ranker = FeedRanker::new(places, shouts);
    let feed = ranker.list_shouts(Some(VIEWER), None, 0).await.unwrap();

    assert_eq!(feed[0].shout.id, fresh.id);
    assert!(feed[0].score <= feed[1].score);
}

#[tokio::test]
async fn equidistant_echo_rich_shout_ranks_first() {
    let places = Arc::new(MockPlaceStore::new());
    let shouts = Arc::new(MockShoutStore::new());
    let venue = seed_hierarchy(&places);

    let at = north_of(VIEWER, 25.0);
    let quiet = shout(&venue, at, 1, 0);
    let echoed = shout(&venue, at, 1, 50);
    shouts.seed(quiet.clone());
    shouts.seed(echoed.clone());

    let ranker = FeedRanker::new(places, shouts);
    let feed = ranker.list_shouts(Some(VIEWER), None, 0).await.unwrap();

    assert_eq!(feed[0].shout.id, echoed.id);
    assert!(feed[0].score < feed[1].score);
}

#[tokio::test]
async fn nearby_viewer_sees_the_leaf_place() {
    let places = Arc::new(MockPlaceStore::new());
    let shouts = Arc::new(MockShoutStore::new());
    let venue = seed_hierarchy(&places);

    shouts.seed(shout(&venue, north_of(VIEWER, 50.0), 1, 0));

    let ranker = FeedRanker::new(places, shouts);
    let feed = ranker.list_shouts(Some(VIEWER), None, 0).await.unwrap();

    assert_eq!(feed[0].place.id, venue.id);
    assert_eq!(feed[0].place.depth, 3);
}

#[tokio::test]
async fn distant_viewer_sees_a_coarse_ancestor() {
    let places = Arc::new(MockPlaceStore::new());
    let shouts = Arc::new(MockShoutStore::new());
    let venue = seed_hierarchy(&places);

    // ~5km away: the display place is capped at city depth.
    shouts.seed(shout(&venue, north_of(VIEWER, 5_000.0), 1, 0));

    let ranker = FeedRanker::new(places, shouts);
    let feed = ranker.list_shouts(Some(VIEWER), None, 0).await.unwrap();

    assert_eq!(feed[0].place.depth, 2);
    assert_eq!(feed[0].place.name, "Rio de Janeiro");

    // The shout itself still points at its true place.
    assert_eq!(feed[0].shout.place_id, venue.id);
}

#[tokio::test]
async fn paging_slices_the_sorted_feed() {
    let places = Arc::new(MockPlaceStore::new());
    let shouts = Arc::new(MockShoutStore::new());
    let venue = seed_hierarchy(&places);

    let mut ids = Vec::new();
    for i in 0..5 {
        let s = shout(&venue, north_of(VIEWER, 10.0 + 50.0 * i as f64), 1, 0);
        ids.push(s.id);
        shouts.seed(s);
    }

    let ranker = FeedRanker::new(places, shouts);
    let page0 = ranker.list_shouts(Some(VIEWER), Some(2), 0).await.unwrap();
    let page1 = ranker.list_shouts(Some(VIEWER), Some(2), 1).await.unwrap();
    let page2 = ranker.list_shouts(Some(VIEWER), Some(2), 2).await.unwrap();

    assert_eq!(page0.len(), 2);
    assert_eq!(page1.len(), 2);
    assert_eq!(page2.len(), 1);
    assert_eq!(page0[0].shout.id, ids[0]);
    assert_eq!(page0[1].shout.id, ids[1]);
    assert_eq!(page1[0].shout.id, ids[2]);
    assert_eq!(page2[0].shout.id, ids[4]);
}
