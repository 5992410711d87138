//! API route definitions.

mod earthquakes;
mod health;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use crate::hooks::{add_cache_headers, log_request};
use crate::state::AppState;

/// Build the complete API router.
///
/// # Route Structure
///
/// - `GET /health` - Health check
/// - `GET /earthquakes` - Filtered, paginated query
/// - `GET /earthquakes/{eventId}` - Point lookup (cached)
/// - `POST /earthquakes/ingest` - Run one ingestion pass
///
/// Every request, including unmatched ones, passes through the request-log
/// hook; earthquake routes also pass through the cache-header hook.
pub fn router(state: AppState) -> Router {
    let earthquakes = Router::new()
        .route("/earthquakes", get(earthquakes::list))
        .route("/earthquakes/ingest", post(earthquakes::ingest))
        .route("/earthquakes/{event_id}", get(earthquakes::get_by_id))
        .layer(middleware::from_fn(add_cache_headers));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(earthquakes)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
