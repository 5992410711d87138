//! In-memory caching of point lookups with moka.
//!
//! Stored events only change when the same ID is re-ingested, so a short
//! TTL keeps repeated reads off the store without serving noticeably stale
//! data.
//!
//! ## Cache Key Strategy
//!
//! Keys are `<endpoint>:<identifier>`, e.g. `earthquake:us6000rjev`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use seismo_core::Event;

use crate::error::ApiError;

/// Default cache capacity (number of entries).
pub const DEFAULT_CACHE_CAPACITY: u64 = 1000;

/// Cache of events by lookup key.
pub type EventCache = Cache<String, Event>;

/// Create an event cache whose entries expire after `ttl`.
pub fn new_cache(ttl: Duration) -> EventCache {
    Cache::builder()
        .max_capacity(DEFAULT_CACHE_CAPACITY)
        .time_to_live(ttl)
        .build()
}

/// Get a cached event or compute and cache it.
///
/// Concurrent misses on the same key share one `compute`. Errors are
/// returned to every waiter and never cached, so a 404 is re-checked on the
/// next request.
pub async fn get_or_compute<F, Fut>(
    cache: &EventCache,
    key: &str,
    compute: F,
) -> Result<Event, ApiError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Event, ApiError>>,
{
    if let Some(event) = cache.get(key).await {
        tracing::debug!(key = %key, "cache hit");
        return Ok(event);
    }

    tracing::debug!(key = %key, "cache miss, computing");
    cache
        .try_get_with(key.to_string(), compute())
        .await
        .map_err(unshare)
}

/// Recover an owned error from one shared between coalesced waiters.
fn unshare(err: Arc<ApiError>) -> ApiError {
    Arc::try_unwrap(err).unwrap_or_else(|shared| match shared.as_ref() {
        ApiError::InvalidFilters(msg) => ApiError::InvalidFilters(msg.clone()),
        ApiError::InvalidCursor(msg) => ApiError::InvalidCursor(msg.clone()),
        ApiError::BadRequest(msg) => ApiError::BadRequest(msg.clone()),
        ApiError::NotFound(msg) => ApiError::NotFound(msg.clone()),
        ApiError::Conflict(msg) => ApiError::Conflict(msg.clone()),
        ApiError::Upstream(msg) => ApiError::Upstream(msg.clone()),
        ApiError::Internal(e) => ApiError::Internal(anyhow::anyhow!("{e:#}")),
    })
}
