//! Seismo one-shot ingestion runner.
//!
//! Pulls every event newer than the stored watermark from the USGS feed,
//! writes it to the event store, and exits. Meant to be fired by an external
//! scheduler (cron, EventBridge, a Kubernetes CronJob).
//!
//! # Usage
//!
//! ```bash
//! # Ingest into the default DynamoDB table
//! seismo-ingest
//!
//! # Point at DynamoDB Local and a custom table
//! seismo-ingest --endpoint http://localhost:8000 --table-name earthquake-dev
//!
//! # Dry run against an in-memory store
//! seismo-ingest --store memory
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use seismo_core::metrics::{init_metrics, start_metrics_server};
use seismo_core::store::{self, StoreBackend, StoreConfig};
use seismo_ingest::{FeedConfig, Ingestor, UsgsFeed, WriterConfig};
use tracing_subscriber::EnvFilter;

/// Seismo one-shot ingestion runner.
#[derive(Parser, Debug)]
#[command(name = "seismo-ingest")]
#[command(about = "Fetch new earthquakes from USGS and store them")]
#[command(version)]
struct Args {
    /// Store backend: dynamodb or memory
    #[arg(long, env = "SEISMO_STORE", default_value = "dynamodb")]
    store: StoreBackend,

    /// Events table name
    #[arg(long, env = "EARTHQUAKE_TABLE_NAME", default_value = "earthquake")]
    table_name: String,

    /// AWS region override
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// DynamoDB endpoint override (e.g. DynamoDB Local)
    #[arg(long, env = "DYNAMODB_ENDPOINT")]
    endpoint: Option<String>,

    /// Store operation timeout in milliseconds
    #[arg(long, env = "DYNAMODB_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// USGS event query endpoint
    #[arg(long, env = "USGS_API_URL", default_value = seismo_ingest::feed::DEFAULT_FEED_URL)]
    feed_url: String,

    /// Events requested per feed call
    #[arg(long, env = "USGS_PAGE_LIMIT", default_value = "100")]
    page_limit: usize,

    /// Feed request timeout in seconds
    #[arg(long, default_value = "30")]
    feed_timeout_secs: u64,

    /// Batch-put attempts per batch, including the first
    #[arg(long, default_value = "3")]
    max_attempts: u32,

    /// Retry backoff unit in milliseconds
    #[arg(long, default_value = "100")]
    retry_base_ms: u64,

    /// Metrics HTTP server port (0 to disable)
    #[arg(long, default_value = "0")]
    metrics_port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,seismo_ingest=debug")),
        )
        .init();

    let args = Args::parse();

    if args.metrics_port > 0 {
        let handle = init_metrics()?;
        start_metrics_server(args.metrics_port, handle)
            .await
            .context("Failed to start metrics server")?;
    }

    let store_config = StoreConfig {
        backend: args.store,
        table_name: args.table_name.clone(),
        region: args.region.clone(),
        endpoint: args.endpoint.clone(),
        timeout_ms: args.timeout_ms,
    };

    tracing::info!("Configuration:");
    tracing::info!("  Store: {:?} ({})", store_config.backend, store_config.table_name);
    tracing::info!("  Feed: {}", args.feed_url);
    tracing::info!("  Page limit: {}", args.page_limit);

    let store = store::connect(&store_config)
        .await
        .context("Failed to open event store")?;

    let feed = UsgsFeed::new(FeedConfig {
        url: args.feed_url,
        page_limit: args.page_limit,
        timeout: Duration::from_secs(args.feed_timeout_secs),
    })
    .context("Failed to build feed client")?;

    let ingestor = Ingestor::new(
        store,
        Arc::new(feed),
        WriterConfig {
            max_attempts: args.max_attempts,
            base_delay: Duration::from_millis(args.retry_base_ms),
            ..WriterConfig::default()
        },
    );

    let summary = ingestor.ingest().await.context("Ingestion failed")?;

    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
