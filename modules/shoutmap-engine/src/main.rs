use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shoutmap_common::Config;
use shoutmap_engine::TrendAggregator;
use shoutmap_graph::{GraphClient, GraphPlaceStore, GraphShoutStore};

/// Trend worker: runs the aggregate recompute on a timer.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("shoutmap_engine=info".parse()?)
                .add_directive("shoutmap_graph=info".parse()?),
        )
        .init();

    info!("ShoutMap trend worker starting...");

    let config = Config::from_env();

    let client =
        GraphClient::connect(&config.neo4j_uri, &config.neo4j_user, &config.neo4j_password)
            .await?;

    let places = Arc::new(GraphPlaceStore::new(client.clone()));
    let shouts = Arc::new(GraphShoutStore::new(client.clone()));

    let aggregator = Arc::new(TrendAggregator::new(places, shouts));

    // One immediate pass, then the timer loop.
    aggregator.run_once().await;
    aggregator.spawn_trend_loop(config.trend_interval_hours);

    tokio::signal::ctrl_c().await?;
    info!("Trend worker shutting down");
    Ok(())
}
