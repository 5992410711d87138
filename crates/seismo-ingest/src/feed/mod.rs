//! Upstream event feeds.
//!
//! The ingestion pipeline pulls raw events through the [`EventFeed`] trait,
//! so the orchestrator does not care whether events come from the USGS
//! FDSN endpoint or from a scripted feed in tests.
//!
//! # Available Feeds
//!
//! - [`UsgsFeed`] - USGS earthquake catalog (GeoJSON over HTTP)

mod usgs;

pub use usgs::{DEFAULT_FEED_URL, FeedConfig, UsgsFeed};

use async_trait::async_trait;
use seismo_core::Event;

use crate::Result;

/// A pull-based source of seismic events.
#[async_trait]
pub trait EventFeed: Send + Sync {
    /// Human-readable name for this feed (used in logs).
    fn name(&self) -> &'static str;

    /// Fetch events, optionally bounded below by `start_time`
    /// (inclusive, epoch milliseconds).
    ///
    /// Events are returned as received; no client-side filtering.
    async fn fetch(&self, start_time: Option<i64>) -> Result<Vec<Event>>;
}
