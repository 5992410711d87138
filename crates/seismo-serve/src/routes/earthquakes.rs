//! Earthquake query, lookup, and ingestion endpoints.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::DateTime;
use seismo_core::{Event, QueryFilter};
use seismo_ingest::IngestSummary;
use serde::{Deserialize, Serialize};

use crate::cache::get_or_compute;
use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for the earthquake list.
///
/// Values arrive as strings so malformed numbers and dates produce a
/// descriptive 400 instead of a generic extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarthquakeQuery {
    /// RFC 3339 timestamp, e.g. `2025-01-01T00:00:00Z`.
    pub start_time: Option<String>,
    /// RFC 3339 timestamp.
    pub end_time: Option<String>,
    pub min_magnitude: Option<String>,
    pub max_magnitude: Option<String>,
    /// Last segment of the place string, e.g. "California".
    pub location: Option<String>,
    pub is_tsunami: Option<String>,
    /// Page size, 1-100 (default 10).
    pub limit: Option<String>,
    pub next_token: Option<String>,
}

impl EarthquakeQuery {
    fn into_filter(self) -> Result<QueryFilter, ApiError> {
        Ok(QueryFilter {
            start_time: present(self.start_time)
                .map(|v| parse_time("startTime", &v))
                .transpose()?,
            end_time: present(self.end_time)
                .map(|v| parse_time("endTime", &v))
                .transpose()?,
            min_magnitude: parse_number("minMagnitude", self.min_magnitude)?,
            max_magnitude: parse_number("maxMagnitude", self.max_magnitude)?,
            location: present(self.location),
            tsunami: present(self.is_tsunami)
                .map(|v| parse_bool("isTsunami", &v))
                .transpose()?,
            limit: parse_number("limit", self.limit)?,
            cursor: present(self.next_token),
        })
    }
}

/// Treat empty query values (`?location=`) as absent.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_time(name: &str, value: &str) -> Result<i64, ApiError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|ts| ts.timestamp_millis())
        .map_err(|_| {
            ApiError::BadRequest(format!("{name} must be an RFC 3339 timestamp, got '{value}'"))
        })
}

fn parse_number<T: FromStr>(name: &str, value: Option<String>) -> Result<Option<T>, ApiError> {
    present(value)
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| ApiError::BadRequest(format!("{name} must be a number, got '{v}'")))
        })
        .transpose()
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ApiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ApiError::BadRequest(format!(
            "{name} must be true or false, got '{value}'"
        ))),
    }
}

/// One page of earthquakes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarthquakeListResponse {
    pub data: Vec<Event>,
    pub count: usize,
    pub next_token: Option<String>,
}

/// `GET /earthquakes`
///
/// Filtered, paginated query. Not cached: pages are cheap index reads and
/// the newest page changes with every ingestion run.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<EarthquakeQuery>,
) -> Result<Json<EarthquakeListResponse>, ApiError> {
    let filter = params.into_filter()?;
    let result = state.planner.query(&filter).await?;

    Ok(Json(EarthquakeListResponse {
        data: result.items,
        count: result.count,
        next_token: result.next_cursor,
    }))
}

/// `GET /earthquakes/{eventId}`
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    let cache_key = format!("earthquake:{event_id}");

    let event = get_or_compute(&state.cache, &cache_key, || async {
        Ok(state.planner.get_by_event_id(&event_id).await?)
    })
    .await?;

    Ok(Json(event))
}

/// `POST /earthquakes/ingest`
///
/// Runs one ingestion pass synchronously. Returns 409 while another pass
/// is active.
pub async fn ingest(State(state): State<AppState>) -> Result<Json<IngestSummary>, ApiError> {
    let summary = state.ingestor.ingest().await?;
    Ok(Json(summary))
}
