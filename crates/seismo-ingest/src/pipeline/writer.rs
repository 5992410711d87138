//! Retrying batch writer.
//!
//! Records are written in sequential batches of at most
//! [`MAX_BATCH_SIZE`](seismo_core::store::MAX_BATCH_SIZE). When the store
//! reports part of a batch as unprocessed, only that subset is resent,
//! after `2^attempt * base_delay`. Once `max_attempts` is reached the
//! remainder is given up on and logged; the write still succeeds with a
//! reduced count. A transport error aborts the whole write.

use std::sync::Arc;
use std::time::Duration;

use seismo_core::store::{EventStore, MAX_BATCH_SIZE};
use seismo_core::{Error as CoreError, StorageRecord};

use crate::Result;

/// Configuration for the batch writer.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Records per batch request (clamped to 1..=25).
    pub batch_size: usize,

    /// Batch-put attempts per batch, including the first.
    pub max_attempts: u32,

    /// Backoff unit; attempt `n` waits `2^n * base_delay` before the next.
    pub base_delay: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

/// Persists storage records with partial-failure retry.
#[derive(Clone)]
pub struct BatchWriter {
    store: Arc<dyn EventStore>,
    config: WriterConfig,
}

impl BatchWriter {
    pub fn new(store: Arc<dyn EventStore>, mut config: WriterConfig) -> Self {
        config.batch_size = config.batch_size.clamp(1, MAX_BATCH_SIZE);
        config.max_attempts = config.max_attempts.max(1);
        Self { store, config }
    }

    /// Write `records`, returning how many the store acknowledged.
    pub async fn write(&self, records: &[StorageRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut stored = 0;
        for (index, batch) in records.chunks(self.config.batch_size).enumerate() {
            stored += self.write_batch(index, batch).await?;
        }

        tracing::info!(
            stored,
            total = records.len(),
            store = self.store.name(),
            "batch write complete"
        );
        Ok(stored)
    }

    async fn write_batch(&self, index: usize, batch: &[StorageRecord]) -> Result<usize> {
        let mut pending = batch.to_vec();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            metrics::counter!("store_batch_writes_total").increment(1);
            let unprocessed = self.store.batch_put(&pending).await?;

            if unprocessed.is_empty() {
                return Ok(batch.len());
            }

            if attempt >= self.config.max_attempts {
                let lost = unprocessed.len().min(batch.len());
                let degraded = CoreError::StoreWriteDegraded {
                    unprocessed: lost,
                    batch_size: batch.len(),
                };
                tracing::error!(batch = index, attempts = attempt, "{}", degraded);
                metrics::counter!("ingest_records_dropped_total").increment(lost as u64);
                return Ok(batch.len() - lost);
            }

            let delay = self.config.base_delay * 2u32.saturating_pow(attempt);
            tracing::warn!(
                batch = index,
                attempt,
                unprocessed = unprocessed.len(),
                delay_ms = delay.as_millis() as u64,
                "retrying unprocessed records"
            );
            metrics::counter!("store_batch_retries_total").increment(1);
            tokio::time::sleep(delay).await;

            pending = unprocessed;
        }
    }
}
