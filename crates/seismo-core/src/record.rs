//! Storage records and the pure functions that derive them from feed events.
//!
//! # Index Attributes
//!
//! Every record carries the attributes the secondary indexes are keyed on:
//!
//! | Index | Partition key | Sort key |
//! |---|---|---|
//! | `GSI_Time` | `globalTime` (fan-in marker) | `time` |
//! | `GSI_Magnitude` | `globalMag` (fan-in marker) | `magScaled` |
//! | `GSI_Location_Magnitude` | `location` | `magScaled` |
//! | `GSI_Tsunami_Time` | `tsunami` | `time` |
//!
//! # Fan-in Markers
//!
//! A wide-column index cannot be queried without a partition key. To read
//! *all* records ordered by time (or by magnitude) every record stores the
//! same constant in `globalTime` / `globalMag`, so "no partition filter"
//! becomes "the one partition everybody shares". The markers are part of the
//! stored schema: changing them orphans every existing record from the
//! global indexes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::event::Event;

/// Multiplier applied to magnitudes before they are stored or compared.
pub const MAGNITUDE_SCALE: f64 = 1000.0;

/// Location used when a place string has no usable trailing segment.
pub const UNKNOWN_LOCATION: &str = "N/A";

/// Fan-in marker shared by every record in the global time index.
pub const GLOBAL_TIME_MARKER: &str = "GLOBAL#TIME";

/// Fan-in marker shared by every record in the global magnitude index.
pub const GLOBAL_MAGNITUDE_MARKER: &str = "GLOBAL#MAGNITUDE";

// ═══════════════════════════════════════════════════════════════════════════
// Attribute names
// ═══════════════════════════════════════════════════════════════════════════

pub const ATTR_EVENT_ID: &str = "eventId";
pub const ATTR_TIME: &str = "time";
pub const ATTR_GLOBAL_TIME: &str = "globalTime";
pub const ATTR_GLOBAL_MAG: &str = "globalMag";
pub const ATTR_MAG_SCALED: &str = "magScaled";
pub const ATTR_LOCATION: &str = "location";
pub const ATTR_STATUS: &str = "status";
pub const ATTR_TSUNAMI: &str = "tsunami";
pub const ATTR_FEATURE: &str = "feature";

// ═══════════════════════════════════════════════════════════════════════════
// Keys
// ═══════════════════════════════════════════════════════════════════════════

/// A scalar attribute value as it appears in keys and key-conditions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    N(i64),
    S(String),
}

impl AttrValue {
    pub fn as_n(&self) -> Option<i64> {
        match self {
            Self::N(n) => Some(*n),
            Self::S(_) => None,
        }
    }

    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            Self::N(_) => None,
        }
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        Self::N(n)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::S(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::S(s)
    }
}

/// Composite key: attribute name to scalar value, in stable (sorted) order.
pub type Key = BTreeMap<String, AttrValue>;

// ═══════════════════════════════════════════════════════════════════════════
// Normalizer
// ═══════════════════════════════════════════════════════════════════════════

/// Scale a magnitude to the integer form used by every magnitude index.
///
/// The same function must be applied to stored values and to query bounds,
/// otherwise magnitude ranges stop lining up with the stored keys.
pub fn scale_magnitude(magnitude: f64) -> i64 {
    (magnitude * MAGNITUDE_SCALE).round() as i64
}

/// Derive the location token from a feed `place` string.
///
/// Takes the last non-empty, trimmed comma-delimited segment. A place with
/// no comma at all, or whose segments are all blank, maps to
/// [`UNKNOWN_LOCATION`].
pub fn derive_location(place: &str) -> String {
    if !place.contains(',') {
        return UNKNOWN_LOCATION.to_string();
    }

    place
        .rsplit(',')
        .map(str::trim)
        .find(|segment| !segment.is_empty())
        .unwrap_or(UNKNOWN_LOCATION)
        .to_string()
}

// ═══════════════════════════════════════════════════════════════════════════
// Storage record
// ═══════════════════════════════════════════════════════════════════════════

/// The stored form of one event.
///
/// Keyed by `event_id`; writing a record whose `event_id` already exists
/// replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageRecord {
    pub event_id: String,
    pub time: i64,
    pub global_time: String,
    pub global_mag: String,
    /// Scaled magnitude; `0` when the feed reported none, so every record
    /// is present in both magnitude indexes.
    pub mag_scaled: i64,
    pub location: String,
    pub status: String,
    pub tsunami: u8,
    /// The original event, stored verbatim.
    pub feature: Event,
}

impl StorageRecord {
    /// Map a feed event to its storage record. Pure and deterministic.
    pub fn from_event(event: &Event) -> Self {
        let props = &event.properties;

        Self {
            event_id: event.id.clone(),
            time: props.time,
            global_time: GLOBAL_TIME_MARKER.to_string(),
            global_mag: GLOBAL_MAGNITUDE_MARKER.to_string(),
            mag_scaled: props.mag.map(scale_magnitude).unwrap_or(0),
            location: props
                .place
                .as_deref()
                .map(derive_location)
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
            status: props.status.clone().unwrap_or_default(),
            tsunami: u8::from(props.tsunami.unwrap_or(0) != 0),
            feature: event.clone(),
        }
    }

    /// Look up a scalar attribute by its stored name.
    ///
    /// Returns `None` for unknown names and for absent optional attributes.
    pub fn attribute(&self, name: &str) -> Option<AttrValue> {
        match name {
            ATTR_EVENT_ID => Some(AttrValue::S(self.event_id.clone())),
            ATTR_TIME => Some(AttrValue::N(self.time)),
            ATTR_GLOBAL_TIME => Some(AttrValue::S(self.global_time.clone())),
            ATTR_GLOBAL_MAG => Some(AttrValue::S(self.global_mag.clone())),
            ATTR_MAG_SCALED => Some(AttrValue::N(self.mag_scaled)),
            ATTR_LOCATION => Some(AttrValue::S(self.location.clone())),
            ATTR_STATUS => Some(AttrValue::S(self.status.clone())),
            ATTR_TSUNAMI => Some(AttrValue::N(i64::from(self.tsunami))),
            _ => None,
        }
    }

    /// Consume the record, returning the original event.
    pub fn into_event(self) -> Event {
        self.feature
    }
}

/// Map a feed event to its storage record.
pub fn to_storage_record(event: &Event) -> StorageRecord {
    StorageRecord::from_event(event)
}
