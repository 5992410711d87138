//! Application state and configuration.

use std::sync::Arc;
use std::time::Duration;

use seismo_core::store::{self, EventStore, StoreConfig};
use seismo_core::QueryPlanner;
use seismo_ingest::{EventFeed, FeedConfig, Ingestor, UsgsFeed, WriterConfig};

use crate::cache::{EventCache, new_cache};

/// Application configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080").
    pub bind_addr: String,

    /// Event store connection settings.
    pub store: StoreConfig,

    /// Upstream feed settings.
    pub feed: FeedConfig,

    /// Batch writer settings.
    pub writer: WriterConfig,

    /// TTL of cached point lookups.
    pub cache_ttl: Duration,

    /// Prometheus listener port (0 disables it).
    pub metrics_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            store: StoreConfig::default(),
            feed: FeedConfig::default(),
            writer: WriterConfig::default(),
            cache_ttl: Duration::from_secs(60),
            metrics_port: 0,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `SEISMO_BIND_ADDR`: Server bind address (default: "0.0.0.0:8080")
    /// - `SEISMO_CACHE_TTL_SECS`: Point-lookup cache TTL (default: 60)
    /// - `SEISMO_METRICS_PORT`: Prometheus port (default: 0, disabled)
    /// - store variables, see [`StoreConfig::from_env`]
    /// - feed variables, see [`FeedConfig::from_env`]
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = std::env::var("SEISMO_BIND_ADDR").unwrap_or(defaults.bind_addr);

        let cache_ttl = match std::env::var("SEISMO_CACHE_TTL_SECS") {
            Ok(value) => Duration::from_secs(value.parse().map_err(|_| {
                anyhow::anyhow!("SEISMO_CACHE_TTL_SECS must be an integer, got '{value}'")
            })?),
            Err(_) => defaults.cache_ttl,
        };

        let metrics_port = match std::env::var("SEISMO_METRICS_PORT") {
            Ok(value) => value.parse().map_err(|_| {
                anyhow::anyhow!("SEISMO_METRICS_PORT must be a port number, got '{value}'")
            })?,
            Err(_) => defaults.metrics_port,
        };

        let store = StoreConfig::from_env()?;
        let feed = FeedConfig::from_env()?;

        tracing::info!(
            bind_addr = %bind_addr,
            store = ?store.backend,
            table = %store.table_name,
            feed_url = %feed.url,
            cache_ttl_secs = cache_ttl.as_secs(),
            "configuration loaded"
        );

        Ok(Self {
            bind_addr,
            store,
            feed,
            writer: defaults.writer,
            cache_ttl,
            metrics_port,
        })
    }
}

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Read path over the event store.
    pub planner: QueryPlanner,

    /// Write path; holds the run lock.
    pub ingestor: Arc<Ingestor>,

    /// Cache for point lookups.
    pub cache: EventCache,
}

impl AppState {
    /// Connect to the configured store and feed.
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        let store = store::connect(&config.store).await?;
        let feed = UsgsFeed::new(config.feed.clone())?;
        Ok(Self::from_parts(store, Arc::new(feed), config))
    }

    /// Assemble state from an already-open store and feed.
    pub fn from_parts(
        store: Arc<dyn EventStore>,
        feed: Arc<dyn EventFeed>,
        config: Config,
    ) -> Self {
        let ingestor = Ingestor::new(store.clone(), feed, config.writer);
        Self {
            planner: QueryPlanner::new(store),
            ingestor: Arc::new(ingestor),
            cache: new_cache(config.cache_ttl),
        }
    }
}
