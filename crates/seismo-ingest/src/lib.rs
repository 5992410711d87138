//! Seismo ingestion pipeline.
//!
//! This crate pulls new earthquake events from the USGS feed and persists
//! them into the event store.
//!
//! # Modules
//!
//! - [`feed`] - Upstream feed clients (USGS FDSN)
//! - [`pipeline`] - Watermark fetcher, batch writer, and run orchestrator
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   EventStore    │  latest stored time (watermark)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   FeedFetcher   │  USGS query from watermark + 1 ms
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ to_storage_record│  derived attributes + partition markers
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   BatchWriter   │  25-record batches, retry unprocessed subset
//! └─────────────────┘
//! ```

pub mod error;
pub mod feed;
pub mod pipeline;

pub use error::{Error, Result};

pub use feed::{EventFeed, FeedConfig, UsgsFeed};

pub use pipeline::{
    BatchWriter, FeedFetcher, FetchedEvents, IngestSummary, Ingestor, UP_TO_DATE_MESSAGE,
    WriterConfig,
};
