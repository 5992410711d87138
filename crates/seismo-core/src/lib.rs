//! Core types, storage, and query planning for the Seismo earthquake service.
//!
//! This crate provides:
//! - Feed event types (GeoJSON features) and their storage-record transform
//! - The [`EventStore`] abstraction with in-memory and DynamoDB backends
//! - The filter-to-index query planner and opaque pagination cursors
//! - Prometheus metrics helpers
//! - Shared error types

pub mod cursor;
mod error;
mod event;
pub mod metrics;
pub mod query;
pub mod record;
pub mod store;

pub use error::{Error, Result};
pub use event::{Event, EventProperties, FeedResponse};
pub use query::{ALLOWED_FILTERS, QueryFilter, QueryPlanner, QueryResult};
pub use record::{StorageRecord, to_storage_record};
pub use store::{EventStore, MemoryStore, StoreConfig};

#[cfg(any(test, feature = "test-util"))]
pub use event::fixtures;
