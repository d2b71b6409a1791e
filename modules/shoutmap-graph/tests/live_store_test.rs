//! Integration test: exercise the place/shout stores against live Neo4j.
//! Run with: cargo test -p shoutmap-graph --test live_store_test -- --ignored --nocapture

use chrono::Utc;
use uuid::Uuid;

use shoutmap_common::{Feeling, GeoPoint, Place, Shout};
use shoutmap_graph::{GraphClient, GraphPlaceStore, GraphShoutStore};

fn load_env() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join(".env");
    if let Ok(content) = std::fs::read_to_string(&path) {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                if std::env::var(key.trim()).is_err() {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }
}

async fn connect() -> GraphClient {
    load_env();
    let uri = std::env::var("NEO4J_URI").expect("NEO4J_URI required");
    let user = std::env::var("NEO4J_USER").expect("NEO4J_USER required");
    let password = std::env::var("NEO4J_PASSWORD").expect("NEO4J_PASSWORD required");
    GraphClient::connect(&uri, &user, &password)
        .await
        .expect("Failed to connect to Neo4j")
}

fn test_point() -> GeoPoint {
    // Offset per run so reruns never collide with stale data.
    let jitter = (Utc::now().timestamp() % 1000) as f64 / 10_000.0;
    GeoPoint::new(-80.0 + jitter, 150.0 + jitter)
}

#[tokio::test]
#[ignore]
async fn place_chain_round_trips() {
    let client = connect().await;
    let store = GraphPlaceStore::new(client.clone());
    let point = test_point();

    let city = Place::new_child(
        Some(format!("it-city-{}", Uuid::new_v4())),
        "Test City".to_string(),
        point,
        20_000.0,
        vec!["locality".to_string(), "political".to_string()],
        None,
    );
    store.create(&city).await.unwrap();

    let venue = Place::new_child(
        Some(format!("it-venue-{}", Uuid::new_v4())),
        "Test Venue".to_string(),
        point,
        40.0,
        vec!["food".to_string(), "establishment".to_string()],
        Some(&city),
    );
    store.create(&venue).await.unwrap();

    let chain = store.ancestor_chain(venue.id, 6).await.unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0].id, venue.id);
    assert_eq!(chain[1].id, city.id);
    assert_eq!(chain[0].depth, chain[1].depth + 1);

    let nearest = store.nearest(point).await.unwrap().unwrap();
    assert!(nearest.id == venue.id || nearest.id == city.id);

    // Duplicate create on the same external id must not add a second node.
    store.create(&venue).await.unwrap();
    let found = store
        .find_by_external_id(venue.external_id.as_deref().unwrap())
        .await
        .unwrap();
    assert!(found.is_some());

    store.reparent_children(venue.id, Some(city.id)).await.unwrap();
    store.reparent_children(city.id, None).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn shout_counters_are_atomic_increments() {
    let client = connect().await;
    let places = GraphPlaceStore::new(client.clone());
    let shouts = GraphShoutStore::new(client.clone());
    let point = test_point();

    let venue = Place::new_child(
        Some(format!("it-venue-{}", Uuid::new_v4())),
        "Counter Venue".to_string(),
        point,
        40.0,
        vec!["food".to_string(), "establishment".to_string()],
        None,
    );
    places.create(&venue).await.unwrap();

    let shout = Shout {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        location: point,
        place_id: venue.id,
        feeling: Feeling::Red,
        content: "integration".to_string(),
        created_at: Utc::now(),
        echoes: 0,
        flags: 0,
    };
    shouts.create(&shout).await.unwrap();
    places.increment_shout_count(venue.id, 1).await.unwrap();

    shouts.increment_echoes(shout.id, 1).await.unwrap();
    shouts.increment_echoes(shout.id, -1).await.unwrap();
    shouts.increment_echoes(shout.id, -1).await.unwrap();

    let near = shouts.shouts_near(point, 1.0).await.unwrap();
    let fetched = near.iter().find(|s| s.id == shout.id).unwrap();
    assert_eq!(fetched.echoes, 0, "echoes floor at zero");

    let place = places.get(venue.id).await.unwrap().unwrap();
    assert_eq!(place.shout_count, 1);

    shouts.delete(shout.id).await.unwrap();
    places.increment_shout_count(venue.id, -1).await.unwrap();
    places.reparent_children(venue.id, None).await.unwrap();
}
