//! Ingestion run orchestration: fetch, transform, write.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use seismo_core::store::EventStore;
use seismo_core::{StorageRecord, to_storage_record};

use super::fetcher::FeedFetcher;
use super::writer::{BatchWriter, WriterConfig};
use crate::feed::EventFeed;
use crate::{Error, Result};

/// Message reported when the feed has nothing newer than the watermark.
pub const UP_TO_DATE_MESSAGE: &str = "Earthquake data is already up to date";

/// Outcome of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    pub message: String,
    /// Records the store acknowledged; may be below `fetched`.
    pub stored_count: usize,
    /// Events returned by the feed before watermark filtering.
    #[serde(skip)]
    pub fetched: usize,
}

/// Drives one ingestion run at a time.
pub struct Ingestor {
    fetcher: FeedFetcher,
    writer: BatchWriter,
    run_lock: Mutex<()>,
}

impl Ingestor {
    pub fn new(
        store: Arc<dyn EventStore>,
        feed: Arc<dyn EventFeed>,
        writer_config: WriterConfig,
    ) -> Self {
        Self {
            fetcher: FeedFetcher::new(store.clone(), feed),
            writer: BatchWriter::new(store, writer_config),
            run_lock: Mutex::new(()),
        }
    }

    /// Run one ingestion pass.
    ///
    /// Fails with [`Error::IngestInProgress`] if another run is active.
    /// Feed errors and store transport errors propagate unchanged.
    pub async fn ingest(&self) -> Result<IngestSummary> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| Error::IngestInProgress)?;

        tracing::info!("Starting earthquake data ingestion");

        match self.run().await {
            Ok(summary) => {
                let outcome = if summary.message == UP_TO_DATE_MESSAGE {
                    "up_to_date"
                } else {
                    "stored"
                };
                metrics::counter!("ingest_runs_total", "outcome" => outcome).increment(1);
                tracing::info!(
                    fetched = summary.fetched,
                    stored = summary.stored_count,
                    "{}",
                    summary.message
                );
                Ok(summary)
            }
            Err(e) => {
                metrics::counter!("ingest_runs_total", "outcome" => failure_outcome(&e))
                    .increment(1);
                tracing::error!("Earthquake data ingestion failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run(&self) -> Result<IngestSummary> {
        let fetched = self.fetcher.fetch_new_events().await?;
        let fetched_count = fetched.events.len();

        // The feed's lower bound is inclusive and may be coarser than ours
        let records: Vec<StorageRecord> = fetched
            .events
            .iter()
            .filter(|e| fetched.watermark.is_none_or(|w| e.time() > w))
            .map(to_storage_record)
            .collect();

        if records.is_empty() {
            return Ok(IngestSummary {
                message: UP_TO_DATE_MESSAGE.to_string(),
                stored_count: 0,
                fetched: fetched_count,
            });
        }

        let stored_count = self.writer.write(&records).await?;
        metrics::counter!("ingest_records_stored_total").increment(stored_count as u64);

        Ok(IngestSummary {
            message: format!("Ingestion completed successfully. Stored {stored_count} new records"),
            stored_count,
            fetched: fetched_count,
        })
    }
}

fn failure_outcome(err: &Error) -> &'static str {
    if err.is_upstream() {
        "upstream_failed"
    } else {
        "failed"
    }
}
