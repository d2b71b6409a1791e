use chrono::{DateTime, Utc};
use neo4rs::query;
use tracing::info;
use uuid::Uuid;

use shoutmap_common::{Feeling, GeoPoint, Shout};

use crate::place_store::{format_datetime, parse_datetime_prop};
use crate::GraphClient;

/// Cap on candidates pulled for one feed request. The ranker's query bounds
/// the candidate set, not the final answer.
const CANDIDATE_LIMIT: i64 = 200;

/// Typed read/write operations for Shout nodes. The shout's place is an
/// `(:Shout)-[:AT]->(:Place)` relationship.
pub struct GraphShoutStore {
    client: GraphClient,
}

impl GraphShoutStore {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, shout: &Shout) -> Result<(), neo4rs::Error> {
        let q = query(
            "MATCH (p:Place {id: $place_id})
             CREATE (s:Shout {
                id: $id,
                user_id: $user_id,
                lat: $lat,
                lng: $lng,
                feeling: $feeling,
                content: $content,
                echoes: $echoes,
                flags: $flags,
                created_at: datetime($created_at)
             })
             CREATE (s)-[:AT]->(p)",
        )
        .param("id", shout.id.to_string())
        .param("user_id", shout.user_id.to_string())
        .param("place_id", shout.place_id.to_string())
        .param("lat", shout.location.lat)
        .param("lng", shout.location.lng)
        .param("feeling", shout.feeling.to_string())
        .param("content", shout.content.as_str())
        .param("echoes", shout.echoes as i64)
        .param("flags", shout.flags as i64)
        .param("created_at", format_datetime(&shout.created_at));

        let mut stream = self.client.graph.execute(q).await?;
        while stream.next().await?.is_some() {}

        info!(shout_id = %shout.id, "Shout created");
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), neo4rs::Error> {
        let q = query("MATCH (s:Shout {id: $id}) DETACH DELETE s").param("id", id.to_string());
        let mut stream = self.client.graph.execute(q).await?;
        while stream.next().await?.is_some() {}
        Ok(())
    }

    /// Candidate shouts whose location falls inside a bbox around the
    /// viewer. Scores and paging happen app-side; this only bounds the set.
    pub async fn shouts_near(
        &self,
        location: GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<Shout>, neo4rs::Error> {
        let lat_delta = (radius_km / 111.0).min(90.0);
        let lng_delta = (radius_km / (111.0 * location.lat.to_radians().cos())).min(180.0);

        let q = query(
            "MATCH (s:Shout)-[:AT]->(p:Place)
             WHERE s.lat >= $min_lat AND s.lat <= $max_lat
               AND s.lng >= $min_lng AND s.lng <= $max_lng
             RETURN s, p.id AS place_id
             ORDER BY s.created_at DESC
             LIMIT $limit",
        )
        .param("min_lat", location.lat - lat_delta)
        .param("max_lat", location.lat + lat_delta)
        .param("min_lng", location.lng - lng_delta)
        .param("max_lng", location.lng + lng_delta)
        .param("limit", CANDIDATE_LIMIT);

        let mut shouts = Vec::new();
        let mut stream = self.client.graph.execute(q).await?;
        while let Some(row) = stream.next().await? {
            if let Some(shout) = row_to_shout(&row) {
                shouts.push(shout);
            }
        }
        Ok(shouts)
    }

    /// All shouts created at or after `cutoff`, for trend recomputation.
    pub async fn shouts_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Shout>, neo4rs::Error> {
        let q = query(
            "MATCH (s:Shout)-[:AT]->(p:Place)
             WHERE s.created_at >= datetime($cutoff)
             RETURN s, p.id AS place_id",
        )
        .param("cutoff", format_datetime(&cutoff));

        let mut shouts = Vec::new();
        let mut stream = self.client.graph.execute(q).await?;
        while let Some(row) = stream.next().await? {
            if let Some(shout) = row_to_shout(&row) {
                shouts.push(shout);
            }
        }
        Ok(shouts)
    }

    /// Atomic echo counter update, floored at zero.
    pub async fn increment_echoes(&self, id: Uuid, delta: i64) -> Result<(), neo4rs::Error> {
        let q = query(
            "MATCH (s:Shout {id: $id})
             SET s.echoes =
                 CASE WHEN coalesce(s.echoes, 0) + $delta < 0
                      THEN 0
                      ELSE coalesce(s.echoes, 0) + $delta END",
        )
        .param("id", id.to_string())
        .param("delta", delta);
        let mut stream = self.client.graph.execute(q).await?;
        while stream.next().await?.is_some() {}
        Ok(())
    }

    /// Atomic abuse-flag increment.
    pub async fn increment_flags(&self, id: Uuid) -> Result<(), neo4rs::Error> {
        let q = query(
            "MATCH (s:Shout {id: $id})
             SET s.flags = coalesce(s.flags, 0) + 1",
        )
        .param("id", id.to_string());
        let mut stream = self.client.graph.execute(q).await?;
        while stream.next().await?.is_some() {}
        Ok(())
    }
}

// --- Row mapping ---

pub fn row_to_shout(row: &neo4rs::Row) -> Option<Shout> {
    let n: neo4rs::Node = row.get("s").ok()?;

    let id_str: String = n.get("id").ok()?;
    let id = Uuid::parse_str(&id_str).ok()?;

    let user_id = Uuid::parse_str(&n.get::<String>("user_id").ok()?).ok()?;

    let place_id_str: String = row.get("place_id").ok()?;
    let place_id = Uuid::parse_str(&place_id_str).ok()?;

    let lat: f64 = n.get("lat").unwrap_or(0.0);
    let lng: f64 = n.get("lng").unwrap_or(0.0);
    let feeling_str: String = n.get("feeling").unwrap_or_default();
    let feeling = Feeling::parse(&feeling_str)?;
    let content: String = n.get("content").unwrap_or_default();
    let echoes: i64 = n.get("echoes").unwrap_or(0);
    let flags: i64 = n.get("flags").unwrap_or(0);

    Some(Shout {
        id,
        user_id,
        location: GeoPoint::new(lat, lng),
        place_id,
        feeling,
        content,
        created_at: parse_datetime_prop(&n, "created_at"),
        echoes: echoes as u32,
        flags: flags as u32,
    })
}
