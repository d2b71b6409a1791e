use chrono::{DateTime, NaiveDateTime, Utc};
use neo4rs::query;
use tracing::{info, warn};
use uuid::Uuid;

use shoutmap_common::{haversine_km, Feeling, GeoPoint, Place, SentimentCounts};

use crate::GraphClient;

/// Widening search rings for nearest-place lookup, in kilometers. The store
/// prefilters with a bounding box and picks the haversine minimum app-side.
const NEAREST_RINGS_KM: &[f64] = &[1.0, 50.0, 2500.0, 20_000.0];

/// Candidate cap per bbox query.
const BBOX_LIMIT: i64 = 500;

/// Typed read/write operations for Place nodes. Parent links are
/// `(:Place)-[:WITHIN]->(:Place)` relationships.
pub struct GraphPlaceStore {
    client: GraphClient,
}

impl GraphPlaceStore {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Place>, neo4rs::Error> {
        let q = query("MATCH (p:Place {id: $id}) RETURN p, [(p)-[:WITHIN]->(a) | a.id][0] AS parent_id")
            .param("id", id.to_string());
        let mut stream = self.client.graph.execute(q).await?;
        if let Some(row) = stream.next().await? {
            return Ok(row_to_place(&row));
        }
        Ok(None)
    }

    /// Places whose center falls inside a bbox around `location`, candidates
    /// only — callers re-check real distance.
    pub async fn within_radius(
        &self,
        location: GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<Place>, neo4rs::Error> {
        // ~1 degree lat ≈ 111km, 1 degree lng ≈ 111km * cos(lat)
        let lat_delta = radius_km / 111.0;
        let lng_delta = radius_km / (111.0 * location.lat.to_radians().cos());

        let q = query(
            "MATCH (p:Place)
             WHERE p.lat >= $min_lat AND p.lat <= $max_lat
               AND p.lng >= $min_lng AND p.lng <= $max_lng
             RETURN p, [(p)-[:WITHIN]->(a) | a.id][0] AS parent_id
             LIMIT $limit",
        )
        .param("min_lat", location.lat - lat_delta)
        .param("max_lat", location.lat + lat_delta)
        .param("min_lng", location.lng - lng_delta)
        .param("max_lng", location.lng + lng_delta)
        .param("limit", BBOX_LIMIT);

        let mut places = Vec::new();
        let mut stream = self.client.graph.execute(q).await?;
        while let Some(row) = stream.next().await? {
            if let Some(place) = row_to_place(&row) {
                places.push(place);
            }
        }
        Ok(places)
    }

    /// The place nearest to `location`, searching widening rings so dense
    /// areas never pay for a whole-earth scan.
    pub async fn nearest(&self, location: GeoPoint) -> Result<Option<Place>, neo4rs::Error> {
        for ring_km in NEAREST_RINGS_KM {
            let candidates = self.within_radius(location, *ring_km).await?;
            let best = candidates.into_iter().min_by(|a, b| {
                let da = haversine_km(a.lat, a.lng, location.lat, location.lng);
                let db = haversine_km(b.lat, b.lng, location.lat, location.lng);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            });
            if best.is_some() {
                return Ok(best);
            }
        }
        Ok(None)
    }

    /// The containment chain from a place up to its root, leaf first. The
    /// starting place is element 0.
    pub async fn ancestor_chain(
        &self,
        place_id: Uuid,
        max_depth: usize,
    ) -> Result<Vec<Place>, neo4rs::Error> {
        let q = query(
            "MATCH path = (p:Place {id: $id})-[:WITHIN*0..6]->(a:Place)
             WHERE length(path) <= $max_depth
             RETURN a AS p, [(a)-[:WITHIN]->(pa) | pa.id][0] AS parent_id, length(path) AS hops
             ORDER BY hops ASC",
        )
        .param("id", place_id.to_string())
        .param("max_depth", max_depth as i64);

        let mut chain = Vec::new();
        let mut stream = self.client.graph.execute(q).await?;
        while let Some(row) = stream.next().await? {
            if let Some(place) = row_to_place(&row) {
                chain.push(place);
            }
        }
        Ok(chain)
    }

    pub async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Place>, neo4rs::Error> {
        let q = query(
            "MATCH (p:Place {external_id: $external_id})
             RETURN p, [(p)-[:WITHIN]->(a) | a.id][0] AS parent_id",
        )
        .param("external_id", external_id);
        let mut stream = self.client.graph.execute(q).await?;
        if let Some(row) = stream.next().await? {
            return Ok(row_to_place(&row));
        }
        Ok(None)
    }

    /// Persist a place. MERGE on external_id keeps imported places unique
    /// even if two writers race past the resolver's gate; locally proposed
    /// places (no external id) are plain creates.
    pub async fn create(&self, place: &Place) -> Result<(), neo4rs::Error> {
        let cypher = match &place.external_id {
            Some(_) => {
                "MERGE (p:Place {external_id: $external_id})
                 ON CREATE SET
                    p.id = $id,
                    p.name = $name,
                    p.lat = $lat,
                    p.lng = $lng,
                    p.radius_m = $radius_m,
                    p.categories = $categories,
                    p.depth = $depth,
                    p.shout_count = 0,
                    p.red_count = 0,
                    p.blue_count = 0,
                    p.black_count = 0,
                    p.created_at = datetime($created_at)
                 RETURN p.id AS id"
            }
            None => {
                "CREATE (p:Place {
                    id: $id,
                    external_id: $external_id,
                    name: $name,
                    lat: $lat,
                    lng: $lng,
                    radius_m: $radius_m,
                    categories: $categories,
                    depth: $depth,
                    shout_count: 0,
                    red_count: 0,
                    blue_count: 0,
                    black_count: 0,
                    created_at: datetime($created_at)
                 }) RETURN p.id AS id"
            }
        };

        let q = query(cypher)
            .param("id", place.id.to_string())
            .param("external_id", place.external_id.clone().unwrap_or_default())
            .param("name", place.name.as_str())
            .param("lat", place.lat)
            .param("lng", place.lng)
            .param("radius_m", place.radius_m)
            .param("categories", place.categories.clone())
            .param("depth", place.depth as i64)
            .param("created_at", format_datetime(&place.created_at));

        let mut stream = self.client.graph.execute(q).await?;
        while stream.next().await?.is_some() {}

        if let Some(parent_id) = place.parent_id {
            let q = query(
                "MATCH (p:Place {id: $id}), (parent:Place {id: $parent_id})
                 MERGE (p)-[:WITHIN]->(parent)",
            )
            .param("id", place.id.to_string())
            .param("parent_id", parent_id.to_string());
            let mut stream = self.client.graph.execute(q).await?;
            while stream.next().await?.is_some() {}
        }

        info!(place = %place.name, depth = place.depth, "Place created");
        Ok(())
    }

    /// Reattach a deleted place's children to its parent. Shouts with no
    /// surviving parent to fall back to are deleted outright.
    pub async fn reparent_children(
        &self,
        deleted_id: Uuid,
        new_parent: Option<Uuid>,
    ) -> Result<(), neo4rs::Error> {
        match new_parent {
            Some(parent_id) => {
                let q = query(
                    "MATCH (old:Place {id: $id})
                     OPTIONAL MATCH (child:Place)-[r:WITHIN]->(old)
                     DELETE r
                     WITH old, collect(child) AS children
                     MATCH (parent:Place {id: $parent_id})
                     FOREACH (c IN children |
                        MERGE (c)-[:WITHIN]->(parent)
                        SET c.depth = parent.depth + 1)
                     WITH old, parent
                     OPTIONAL MATCH (s:Shout)-[sr:AT]->(old)
                     DELETE sr
                     WITH old, parent, collect(s) AS shouts
                     FOREACH (s IN shouts | MERGE (s)-[:AT]->(parent))
                     DETACH DELETE old",
                )
                .param("id", deleted_id.to_string())
                .param("parent_id", parent_id.to_string());
                let mut stream = self.client.graph.execute(q).await?;
                while stream.next().await?.is_some() {}
            }
            None => {
                // Root deletion: orphaned shouts go with it.
                let q = query(
                    "MATCH (old:Place {id: $id})
                     OPTIONAL MATCH (s:Shout)-[:AT]->(old)
                     DETACH DELETE s
                     WITH old
                     OPTIONAL MATCH (child:Place)-[r:WITHIN]->(old)
                     DELETE r
                     DETACH DELETE old",
                )
                .param("id", deleted_id.to_string());
                let mut stream = self.client.graph.execute(q).await?;
                while stream.next().await?.is_some() {}
                warn!(place_id = %deleted_id, "Root place deleted, orphaned shouts removed");
            }
        }
        Ok(())
    }

    /// Atomic counter update. Never read-modify-write from the application:
    /// the shout-creation path and the trend job both touch this field.
    pub async fn increment_shout_count(
        &self,
        place_id: Uuid,
        delta: i64,
    ) -> Result<(), neo4rs::Error> {
        let q = query(
            "MATCH (p:Place {id: $id})
             SET p.shout_count =
                 CASE WHEN coalesce(p.shout_count, 0) + $delta < 0
                      THEN 0
                      ELSE coalesce(p.shout_count, 0) + $delta END",
        )
        .param("id", place_id.to_string())
        .param("delta", delta);
        let mut stream = self.client.graph.execute(q).await?;
        while stream.next().await?.is_some() {}
        Ok(())
    }

    /// Places currently carrying a trend aggregate.
    pub async fn places_with_trends(&self) -> Result<Vec<Place>, neo4rs::Error> {
        let q = query(
            "MATCH (p:Place)
             WHERE coalesce(p.shout_count, 0) > 0
                OR coalesce(p.red_count, 0) + coalesce(p.blue_count, 0)
                   + coalesce(p.black_count, 0) > 0
                OR p.feeling IS NOT NULL
             RETURN p, [(p)-[:WITHIN]->(a) | a.id][0] AS parent_id",
        );
        let mut places = Vec::new();
        let mut stream = self.client.graph.execute(q).await?;
        while let Some(row) = stream.next().await? {
            if let Some(place) = row_to_place(&row) {
                places.push(place);
            }
        }
        Ok(places)
    }

    /// Persist recomputed aggregates for a batch of places in one statement.
    pub async fn save_trends(&self, places: &[Place]) -> Result<(), neo4rs::Error> {
        if places.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = places.iter().map(|p| p.id.to_string()).collect();
        let shout_counts: Vec<i64> = places.iter().map(|p| p.shout_count as i64).collect();
        let red: Vec<i64> = places.iter().map(|p| p.sentiment.red as i64).collect();
        let blue: Vec<i64> = places.iter().map(|p| p.sentiment.blue as i64).collect();
        let black: Vec<i64> = places.iter().map(|p| p.sentiment.black as i64).collect();
        let feelings: Vec<String> = places
            .iter()
            .map(|p| p.feeling.map(|f| f.to_string()).unwrap_or_default())
            .collect();

        let q = query(
            "UNWIND range(0, size($ids) - 1) AS i
             MATCH (p:Place {id: $ids[i]})
             SET p.shout_count = $shout_counts[i],
                 p.red_count = $red[i],
                 p.blue_count = $blue[i],
                 p.black_count = $black[i],
                 p.feeling = CASE WHEN $feelings[i] = '' THEN null ELSE $feelings[i] END",
        )
        .param("ids", ids)
        .param("shout_counts", shout_counts)
        .param("red", red)
        .param("blue", blue)
        .param("black", black)
        .param("feelings", feelings);

        let mut stream = self.client.graph.execute(q).await?;
        while stream.next().await?.is_some() {}

        info!(count = places.len(), "Trend aggregates saved");
        Ok(())
    }
}

// --- Row mapping ---

pub fn row_to_place(row: &neo4rs::Row) -> Option<Place> {
    let n: neo4rs::Node = row.get("p").ok()?;

    let id_str: String = n.get("id").ok()?;
    let id = Uuid::parse_str(&id_str).ok()?;

    let external_id: Option<String> = n
        .get("external_id")
        .ok()
        .and_then(|s: String| if s.is_empty() { None } else { Some(s) });
    let name: String = n.get("name").unwrap_or_default();
    let lat: f64 = n.get("lat").unwrap_or(0.0);
    let lng: f64 = n.get("lng").unwrap_or(0.0);
    let radius_m: f64 = n.get("radius_m").unwrap_or(0.0);
    let categories: Vec<String> = n.get("categories").unwrap_or_default();
    let depth: i64 = n.get("depth").unwrap_or(0);
    let shout_count: i64 = n.get("shout_count").unwrap_or(0);
    let red_count: i64 = n.get("red_count").unwrap_or(0);
    let blue_count: i64 = n.get("blue_count").unwrap_or(0);
    let black_count: i64 = n.get("black_count").unwrap_or(0);
    let feeling: Option<Feeling> = n
        .get("feeling")
        .ok()
        .and_then(|s: String| Feeling::parse(&s));

    let parent_id: Option<Uuid> = row
        .get("parent_id")
        .ok()
        .and_then(|s: String| Uuid::parse_str(&s).ok());

    Some(Place {
        id,
        external_id,
        name,
        lat,
        lng,
        radius_m,
        categories,
        depth: depth as u32,
        parent_id,
        shout_count: shout_count as u32,
        sentiment: SentimentCounts {
            red: red_count as u32,
            blue: blue_count as u32,
            black: black_count as u32,
        },
        feeling,
        created_at: parse_datetime_prop(&n, "created_at"),
    })
}

/// Format a DateTime<Utc> as a local datetime string without timezone offset.
/// Neo4j's datetime() requires "YYYY-MM-DDThh:mm:ss" format (no +00:00 suffix).
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

pub(crate) fn parse_datetime_prop(n: &neo4rs::Node, prop: &str) -> DateTime<Utc> {
    if let Ok(s) = n.get::<String>(prop) {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
            return dt.with_timezone(&Utc);
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f") {
            return naive.and_utc();
        }
    }
    Utc::now()
}
