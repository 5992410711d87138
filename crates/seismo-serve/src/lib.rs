//! Seismo Serve - HTTP API for earthquake events.
//!
//! A thin axum layer over the seismo engine: it parses request parameters,
//! calls the query planner or the ingestion orchestrator, and shapes JSON
//! responses. All routing and retry logic lives in `seismo-core` and
//! `seismo-ingest`.
//!
//! # Architecture
//!
//! - **AppState**: Query planner, ingestor, lookup cache, configuration
//! - **Hooks**: Ordered middleware chain (request log, cache headers)
//! - **Routes**: Endpoint handlers

pub mod cache;
mod error;
mod hooks;
mod routes;
mod state;

pub use self::cache::{EventCache, get_or_compute, new_cache};
pub use self::error::ApiError;
pub use self::hooks::{add_cache_headers, log_request};
pub use self::routes::router;
pub use self::state::{AppState, Config};
