//! Watermark-based incremental fetch.

use std::sync::Arc;

use seismo_core::Event;
use seismo_core::record::GLOBAL_TIME_MARKER;
use seismo_core::store::{EventStore, IndexName, QueryRequest};

use crate::Result;
use crate::feed::EventFeed;

/// Events pulled from the feed together with the watermark used to bound them.
#[derive(Debug, Clone)]
pub struct FetchedEvents {
    /// Most recent stored event time before this fetch.
    pub watermark: Option<i64>,
    pub events: Vec<Event>,
}

/// Reads the store's watermark and pulls newer events from the feed.
#[derive(Clone)]
pub struct FeedFetcher {
    store: Arc<dyn EventStore>,
    feed: Arc<dyn EventFeed>,
}

impl FeedFetcher {
    pub fn new(store: Arc<dyn EventStore>, feed: Arc<dyn EventFeed>) -> Self {
        Self { store, feed }
    }

    /// Most recent `time` currently stored, or `None` for an empty store.
    pub async fn watermark(&self) -> Result<Option<i64>> {
        let request = QueryRequest::new(IndexName::Time, GLOBAL_TIME_MARKER).with_limit(1);
        let page = self.store.query(&request).await?;
        Ok(page.items.first().map(|r| r.time))
    }

    /// Fetch events newer than the stored watermark.
    ///
    /// The feed is asked for events from `watermark + 1` ms; with no
    /// watermark it is called without a lower bound. Feed errors propagate.
    pub async fn fetch_new_events(&self) -> Result<FetchedEvents> {
        let watermark = self.watermark().await?;
        let start_time = watermark.map(|t| t.saturating_add(1));

        tracing::info!(
            feed = self.feed.name(),
            ?watermark,
            "fetching events newer than watermark"
        );

        let events = self.feed.fetch(start_time).await?;
        metrics::counter!("ingest_events_fetched_total").increment(events.len() as u64);

        Ok(FetchedEvents { watermark, events })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use seismo_core::fixtures::event;
    use seismo_core::{MemoryStore, to_storage_record};

    /// Feed that records the start bound it was called with.
    #[derive(Default)]
    struct RecordingFeed {
        calls: Mutex<Vec<Option<i64>>>,
    }

    #[async_trait]
    impl EventFeed for RecordingFeed {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn fetch(&self, start_time: Option<i64>) -> Result<Vec<Event>> {
            self.calls.lock().push(start_time);
            Ok(vec![event("new", 9_999, Some(3.0), "x, Chile", 0)])
        }
    }

    #[tokio::test]
    async fn test_empty_store_fetches_without_bound() {
        let store = Arc::new(MemoryStore::new());
        let feed = Arc::new(RecordingFeed::default());
        let fetcher = FeedFetcher::new(store, feed.clone());

        let fetched = fetcher.fetch_new_events().await.unwrap();
        assert_eq!(fetched.watermark, None);
        assert_eq!(fetched.events.len(), 1);
        assert_eq!(*feed.calls.lock(), vec![None]);
    }

    #[tokio::test]
    async fn test_watermark_plus_one_is_start_bound() {
        let store = Arc::new(MemoryStore::new());
        let records: Vec<_> = [
            event("a", 1_000, Some(2.0), "x, Chile", 0),
            event("b", 5_000, None, "x, Japan", 1),
            event("c", 3_000, Some(6.0), "x, Peru", 0),
        ]
        .iter()
        .map(to_storage_record)
        .collect();
        store.batch_put(&records).await.unwrap();

        let feed = Arc::new(RecordingFeed::default());
        let fetcher = FeedFetcher::new(store, feed.clone());

        assert_eq!(fetcher.watermark().await.unwrap(), Some(5_000));
        let fetched = fetcher.fetch_new_events().await.unwrap();
        assert_eq!(fetched.watermark, Some(5_000));
        assert_eq!(*feed.calls.lock(), vec![Some(5_001)]);
    }
}
