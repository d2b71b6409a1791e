use neo4rs::{ConfigBuilder, Graph};

/// Shared Neo4j connection handle. Cloning is cheap; both stores hold one.
#[derive(Clone)]
pub struct GraphClient {
    pub(crate) graph: Graph,
}

impl GraphClient {
    /// Connect with the given credentials. Place chains are short and feed
    /// candidate sets are capped, so a small fetch size is enough.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self, neo4rs::Error> {
        let config = ConfigBuilder::default()
            .uri(uri)
            .user(user)
            .password(password)
            .fetch_size(250)
            .max_connections(16)
            .build()?;
        let graph = Graph::connect(config).await?;
        Ok(Self { graph })
    }

    /// The underlying neo4rs graph, for callers issuing raw queries.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }
}
