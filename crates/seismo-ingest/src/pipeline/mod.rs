//! Ingestion pipeline components.
//!
//! - [`FeedFetcher`] - reads the stored watermark and pulls newer events
//! - [`BatchWriter`] - persists storage records with partial-failure retry
//! - [`Ingestor`] - runs fetch, transform, and write as one guarded pass
//!
//! # Architecture
//!
//! ```text
//! [EventStore] ─watermark─▶ [FeedFetcher] ─events─▶ to_storage_record ─▶ [BatchWriter] ─▶ [EventStore]
//!                                 ▲
//!                            [EventFeed]
//! ```
//!
//! Writes are keyed upserts, so re-running a pass over the same events is
//! harmless.

mod fetcher;
mod orchestrator;
mod writer;

pub use fetcher::{FeedFetcher, FetchedEvents};
pub use orchestrator::{IngestSummary, Ingestor, UP_TO_DATE_MESSAGE};
pub use writer::{BatchWriter, WriterConfig};
