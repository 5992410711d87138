//! Prometheus metrics helpers for Seismo.
//!
//! This module provides recorder installation, the optional `/metrics`
//! listener, and descriptions for every metric the service records.
//!
//! # Usage
//!
//! ```rust,ignore
//! use seismo_core::metrics::{init_metrics, start_metrics_server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let handle = init_metrics()?;
//!     start_metrics_server(9091, handle).await?;
//!
//!     metrics::counter!("ingest_runs_total", "outcome" => "stored").increment(1);
//!     Ok(())
//! }
//! ```
//!
//! # Metric Naming Conventions
//!
//! - Prefix: component (`ingest_`, `store_`, `query_`, `feed_`, `http_`)
//! - Suffix: unit or type (`_total`, `_seconds`)
//! - Labels: bounded sets only (outcome, index name)

use axum::{Router, routing::get};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;

use crate::error::{Error, Result};

/// Install the Prometheus recorder and register metric descriptions.
///
/// Fails if a recorder is already installed in this process.
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::Config(format!("failed to install Prometheus recorder: {e}")))?;

    register_metrics();

    Ok(handle)
}

/// Serve `/metrics` on `port` from a background task.
///
/// The listener is bound before returning, so a port conflict surfaces
/// here rather than inside the spawned task.
pub async fn start_metrics_server(port: u16, handle: PrometheusHandle) -> std::io::Result<()> {
    let app = Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Metrics server listening on http://{}/metrics", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("metrics server stopped: {}", e);
        }
    });

    Ok(())
}

fn register_metrics() {
    // =========================================================================
    // Ingestion
    // =========================================================================

    describe_counter!(
        "ingest_runs_total",
        "Ingestion runs by outcome (label: outcome = stored|up_to_date|upstream_failed|failed)"
    );
    describe_counter!(
        "ingest_events_fetched_total",
        "Events returned by the upstream feed"
    );
    describe_counter!(
        "ingest_records_stored_total",
        "Records acknowledged by the store"
    );
    describe_counter!(
        "ingest_records_dropped_total",
        "Records left unprocessed after write retries were exhausted"
    );
    describe_histogram!(
        "feed_fetch_duration_seconds",
        "Time spent fetching one page from the upstream feed"
    );

    // =========================================================================
    // Store writes
    // =========================================================================

    describe_counter!("store_batch_writes_total", "Batch write requests issued");
    describe_counter!(
        "store_batch_retries_total",
        "Batch write retries for unprocessed records"
    );

    // =========================================================================
    // Queries
    // =========================================================================

    describe_counter!(
        "query_requests_total",
        "Planned index queries (label: index)"
    );
    describe_counter!(
        "query_items_returned_total",
        "Events returned across all query pages"
    );

    // =========================================================================
    // HTTP
    // =========================================================================

    describe_counter!(
        "http_requests_total",
        "HTTP requests (labels: endpoint, method, status)"
    );
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request latency (label: endpoint)"
    );
}
