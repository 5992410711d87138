//! Filter-to-index query planner.
//!
//! Turns a caller's filter set into a single index query, runs it, and
//! returns one page of events plus an opaque cursor.
//!
//! # Index Selection
//!
//! First matching branch wins:
//!
//! ```text
//! tsunami?            ─yes─▶ GSI_Tsunami_Time        tsunami = v [AND time BETWEEN]
//!    │no
//! magnitude range?    ─yes─▶ location? ─yes─▶ GSI_Location_Magnitude  location = v AND magScaled BETWEEN
//!    │no                                 └no─▶ GSI_Magnitude          globalMag = marker AND magScaled BETWEEN
//! location?           ─yes─▶ GSI_Location_Magnitude  location = v
//!    │no
//! (time range or nothing) ─▶ GSI_Time                globalTime = marker [AND time BETWEEN]
//! ```
//!
//! Dimensions the chosen key-condition does not consume are applied as
//! filter conditions, so every supplied filter is honored.

use std::sync::Arc;

use serde::Deserialize;

use crate::cursor;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::record::{
    ATTR_LOCATION, ATTR_MAG_SCALED, ATTR_TIME, GLOBAL_MAGNITUDE_MARKER, GLOBAL_TIME_MARKER, Key,
    scale_magnitude,
};
use crate::store::{EventStore, FilterCondition, IndexName, QueryRequest, Range};

/// Page size used when the caller does not pass one.
pub const DEFAULT_LIMIT: usize = 10;

/// Largest page size a caller may request.
pub const MAX_LIMIT: usize = 100;

/// Filter combinations with a dedicated index path, reported to callers
/// whose filter set is rejected.
pub const ALLOWED_FILTERS: &[&str] = &[
    "startTime,endTime",
    "minMagnitude,maxMagnitude",
    "location,minMagnitude,maxMagnitude",
    "location",
    "isTsunami",
    "isTsunami,startTime,endTime",
];

/// Caller-supplied filters. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    /// Inclusive lower time bound, epoch milliseconds.
    pub start_time: Option<i64>,
    /// Inclusive upper time bound, epoch milliseconds.
    pub end_time: Option<i64>,
    pub min_magnitude: Option<f64>,
    pub max_magnitude: Option<f64>,
    pub location: Option<String>,
    pub tsunami: Option<bool>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub items: Vec<Event>,
    /// Number of items on this page.
    pub count: usize,
    pub next_cursor: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Planning
// ═══════════════════════════════════════════════════════════════════════════

/// Validate `filter` and build the index query it routes to.
///
/// The returned request has no start key; [`QueryPlanner::query`] attaches
/// the decoded cursor.
pub fn plan(filter: &QueryFilter) -> Result<QueryRequest> {
    let limit = page_size(filter.limit)?;
    let time = time_range(filter)?;
    let magnitude = magnitude_range(filter)?;
    let location = filter
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty());

    let time_filter = |range: Range| FilterCondition::Between {
        attr: ATTR_TIME,
        range,
    };

    let mut request = match (filter.tsunami, magnitude, location) {
        (Some(tsunami), _, _) => {
            let mut request = QueryRequest::new(IndexName::TsunamiTime, i64::from(tsunami));
            if let Some(range) = time {
                request = request.with_sort_range(range);
            }
            if let Some(range) = magnitude {
                request = request.with_filter(FilterCondition::Between {
                    attr: ATTR_MAG_SCALED,
                    range,
                });
            }
            if let Some(location) = location {
                request = request.with_filter(FilterCondition::Equals {
                    attr: ATTR_LOCATION,
                    value: location.into(),
                });
            }
            request
        }
        (None, Some(range), Some(location)) => {
            QueryRequest::new(IndexName::LocationMagnitude, location).with_sort_range(range)
        }
        (None, Some(range), None) => {
            QueryRequest::new(IndexName::Magnitude, GLOBAL_MAGNITUDE_MARKER).with_sort_range(range)
        }
        (None, None, Some(location)) => QueryRequest::new(IndexName::LocationMagnitude, location),
        (None, None, None) => {
            let request = QueryRequest::new(IndexName::Time, GLOBAL_TIME_MARKER);
            match time {
                Some(range) => request.with_sort_range(range),
                None => request,
            }
        }
    };

    // Time was consumed as a sort range only on the time-ordered indexes
    let time_in_key = matches!(request.index, IndexName::Time | IndexName::TsunamiTime);
    if let (Some(range), false) = (time, time_in_key) {
        request = request.with_filter(time_filter(range));
    }

    Ok(request.with_limit(limit))
}

fn page_size(limit: Option<usize>) -> Result<usize> {
    match limit {
        None => Ok(DEFAULT_LIMIT),
        Some(n) if (1..=MAX_LIMIT).contains(&n) => Ok(n),
        Some(n) => Err(Error::InvalidFilterCombination(format!(
            "limit must be between 1 and {MAX_LIMIT}, got {n}"
        ))),
    }
}

fn time_range(filter: &QueryFilter) -> Result<Option<Range>> {
    match (filter.start_time, filter.end_time) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) if start <= end => Ok(Some(Range::new(start, end))),
        (Some(_), Some(_)) => Err(Error::InvalidFilterCombination(
            "startTime must not be after endTime".to_string(),
        )),
        _ => Err(Error::InvalidFilterCombination(
            "startTime and endTime must be provided together".to_string(),
        )),
    }
}

fn magnitude_range(filter: &QueryFilter) -> Result<Option<Range>> {
    match (filter.min_magnitude, filter.max_magnitude) {
        (None, None) => Ok(None),
        (Some(min), Some(max)) => {
            if !min.is_finite() || !max.is_finite() {
                return Err(Error::InvalidFilterCombination(
                    "magnitude bounds must be finite numbers".to_string(),
                ));
            }
            let (lo, hi) = (scale_magnitude(min), scale_magnitude(max));
            if lo > hi {
                return Err(Error::InvalidFilterCombination(
                    "minMagnitude must not be greater than maxMagnitude".to_string(),
                ));
            }
            Ok(Some(Range::new(lo, hi)))
        }
        _ => Err(Error::InvalidFilterCombination(
            "minMagnitude and maxMagnitude must be provided together".to_string(),
        )),
    }
}

/// Decode `token` and check it is a position in the index `request` reads.
fn resume_key(token: &str, request: &QueryRequest) -> Result<Key> {
    let key = cursor::decode(token)?;
    let index = request.index;

    let complete = index.key_attrs().iter().all(|attr| key.contains_key(*attr));
    let same_partition =
        key.get(index.partition_attr()) == Some(&request.key_condition.partition);
    // A start key outside the sort range is rejected by the store itself
    let in_range = match request.key_condition.sort {
        Some(range) => key
            .get(index.sort_attr())
            .and_then(|v| v.as_n())
            .is_some_and(|n| range.contains(n)),
        None => true,
    };

    if !complete || !same_partition || !in_range {
        return Err(Error::InvalidCursor(
            "cursor does not belong to this filter set".to_string(),
        ));
    }

    Ok(key)
}

// ═══════════════════════════════════════════════════════════════════════════
// Execution
// ═══════════════════════════════════════════════════════════════════════════

/// Read path over an [`EventStore`].
#[derive(Clone)]
pub struct QueryPlanner {
    store: Arc<dyn EventStore>,
}

impl QueryPlanner {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Run the filtered, paginated query described by `filter`.
    ///
    /// Validation and cursor decoding happen before the store is touched.
    pub async fn query(&self, filter: &QueryFilter) -> Result<QueryResult> {
        let mut request = plan(filter)?;

        if let Some(token) = filter.cursor.as_deref().filter(|t| !t.is_empty()) {
            request.exclusive_start_key = Some(resume_key(token, &request)?);
        }

        tracing::debug!(
            index = %request.index,
            limit = request.limit,
            filters = request.filters.len(),
            resumed = request.exclusive_start_key.is_some(),
            "running planned query"
        );

        let page = self.store.query(&request).await?;

        let next_cursor = page
            .last_evaluated_key
            .as_ref()
            .map(cursor::encode)
            .transpose()?;

        let items: Vec<Event> = page.items.into_iter().map(|r| r.into_event()).collect();

        metrics::counter!("query_requests_total", "index" => request.index.as_str()).increment(1);
        metrics::counter!("query_items_returned_total").increment(items.len() as u64);

        Ok(QueryResult {
            count: items.len(),
            items,
            next_cursor,
        })
    }

    /// Point read by event ID.
    pub async fn get_by_event_id(&self, event_id: &str) -> Result<Event> {
        self.store
            .get(event_id)
            .await?
            .map(|r| r.into_event())
            .ok_or_else(|| Error::NotFound(format!("Earthquake with eventId {event_id} not found")))
    }
}
