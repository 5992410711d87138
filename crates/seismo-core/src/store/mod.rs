//! Wide-column store abstraction.
//!
//! The engine talks to its store through [`EventStore`], which mirrors the
//! subset of a wide-column database the engine needs: keyed batch upserts,
//! point reads, and index queries made of an exact partition match, an
//! optional sort-key range, and an optional post-read filter.
//!
//! # Backends
//!
//! - [`MemoryStore`] - in-process emulation (local runs and tests)
//! - [`DynamoDbStore`] - Amazon DynamoDB (feature `dynamodb`)
//!
//! # Query Semantics
//!
//! Both backends follow the same rules so that results and cursors behave
//! identically:
//!
//! 1. Only records that carry both key attributes of an index are in it.
//! 2. Records are ordered by the index sort key, then by `eventId`.
//! 3. At most `limit` records are *evaluated*; filters run afterwards, so a
//!    page can hold fewer than `limit` items while more results remain.
//! 4. `last_evaluated_key` is set only when evaluation stopped at `limit`
//!    with records left over.

#[cfg(feature = "dynamodb")]
mod dynamodb;
mod memory;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::record::{
    ATTR_EVENT_ID, ATTR_GLOBAL_MAG, ATTR_GLOBAL_TIME, ATTR_LOCATION, ATTR_MAG_SCALED,
    ATTR_TIME, ATTR_TSUNAMI, AttrValue, Key, StorageRecord,
};

#[cfg(feature = "dynamodb")]
pub use dynamodb::{DynamoDbConfig, DynamoDbStore};
pub use memory::MemoryStore;

/// Maximum number of records a single batch write may carry.
pub const MAX_BATCH_SIZE: usize = 25;

// ═══════════════════════════════════════════════════════════════════════════
// Index schema
// ═══════════════════════════════════════════════════════════════════════════

/// Secondary indexes defined on the events table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexName {
    /// All records by time (fan-in partition).
    Time,
    /// All records by scaled magnitude (fan-in partition).
    Magnitude,
    /// Records of one location by scaled magnitude.
    LocationMagnitude,
    /// Records with one tsunami flag value by time.
    TsunamiTime,
}

impl IndexName {
    /// Physical index name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Time => "GSI_Time",
            Self::Magnitude => "GSI_Magnitude",
            Self::LocationMagnitude => "GSI_Location_Magnitude",
            Self::TsunamiTime => "GSI_Tsunami_Time",
        }
    }

    pub fn partition_attr(self) -> &'static str {
        match self {
            Self::Time => ATTR_GLOBAL_TIME,
            Self::Magnitude => ATTR_GLOBAL_MAG,
            Self::LocationMagnitude => ATTR_LOCATION,
            Self::TsunamiTime => ATTR_TSUNAMI,
        }
    }

    pub fn sort_attr(self) -> &'static str {
        match self {
            Self::Time | Self::TsunamiTime => ATTR_TIME,
            Self::Magnitude | Self::LocationMagnitude => ATTR_MAG_SCALED,
        }
    }

    /// Attributes that make up a position (and thus a cursor) in this index.
    pub fn key_attrs(self) -> [&'static str; 3] {
        [ATTR_EVENT_ID, self.partition_attr(), self.sort_attr()]
    }

    /// Composite key of `record` within this index, or `None` when the
    /// record lacks one of the index key attributes.
    pub fn key_for(self, record: &StorageRecord) -> Option<Key> {
        self.key_attrs()
            .into_iter()
            .map(|attr| record.attribute(attr).map(|v| (attr.to_string(), v)))
            .collect()
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Query request / response
// ═══════════════════════════════════════════════════════════════════════════

/// Inclusive numeric range on an index sort key or a filtered attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub lo: i64,
    pub hi: i64,
}

impl Range {
    pub fn new(lo: i64, hi: i64) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.lo <= value && value <= self.hi
    }
}

/// Key-condition of an index query: `partition == value [AND sort BETWEEN ..]`.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCondition {
    pub partition: AttrValue,
    pub sort: Option<Range>,
}

/// Condition applied to evaluated records after the key-condition.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    Equals { attr: &'static str, value: AttrValue },
    Between { attr: &'static str, range: Range },
}

impl FilterCondition {
    /// Whether `record` satisfies this condition. Absent attributes never match.
    pub fn matches(&self, record: &StorageRecord) -> bool {
        match self {
            Self::Equals { attr, value } => record.attribute(attr).as_ref() == Some(value),
            Self::Between { attr, range } => record
                .attribute(attr)
                .and_then(|v| v.as_n())
                .is_some_and(|n| range.contains(n)),
        }
    }
}

/// A single paginated index query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub index: IndexName,
    pub key_condition: KeyCondition,
    pub filters: Vec<FilterCondition>,
    pub limit: usize,
    /// `false` reads the index in descending sort-key order.
    pub scan_forward: bool,
    pub exclusive_start_key: Option<Key>,
}

impl QueryRequest {
    /// Query `index` for one partition, newest/largest first.
    pub fn new(index: IndexName, partition: impl Into<AttrValue>) -> Self {
        Self {
            index,
            key_condition: KeyCondition {
                partition: partition.into(),
                sort: None,
            },
            filters: Vec::new(),
            limit: 10,
            scan_forward: false,
            exclusive_start_key: None,
        }
    }

    pub fn with_sort_range(mut self, range: Range) -> Self {
        self.key_condition.sort = Some(range);
        self
    }

    pub fn with_filter(mut self, filter: FilterCondition) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_start_key(mut self, key: Option<Key>) -> Self {
        self.exclusive_start_key = key;
        self
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    pub items: Vec<StorageRecord>,
    /// Position to resume from; `None` when the index is exhausted.
    pub last_evaluated_key: Option<Key>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Store trait
// ═══════════════════════════════════════════════════════════════════════════

/// A wide-column store holding [`StorageRecord`]s.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Human-readable backend name (used in logs).
    fn name(&self) -> &'static str;

    /// Upsert up to [`MAX_BATCH_SIZE`] records in one request.
    ///
    /// Returns the records the store did not process (throttling, capacity).
    /// Hard failures return [`Error::StoreTransport`].
    async fn batch_put(&self, records: &[StorageRecord]) -> Result<Vec<StorageRecord>>;

    /// Run one index query.
    async fn query(&self, request: &QueryRequest) -> Result<QueryPage>;

    /// Point read by event ID.
    async fn get(&self, event_id: &str) -> Result<Option<StorageRecord>>;
}

// ═══════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════

/// Which backend to connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    DynamoDb,
}

impl std::str::FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "dynamodb" | "dynamo" => Ok(Self::DynamoDb),
            other => Err(Error::Config(format!(
                "unknown store backend '{other}'. Valid options: memory, dynamodb"
            ))),
        }
    }
}

/// Store connection settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Events table name.
    pub table_name: String,
    /// AWS region override.
    pub region: Option<String>,
    /// Endpoint override (e.g. DynamoDB Local).
    pub endpoint: Option<String>,
    /// Per-operation timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::DynamoDb,
            table_name: "earthquake".to_string(),
            region: None,
            endpoint: None,
            timeout_ms: None,
        }
    }
}

impl StoreConfig {
    /// Load store settings from environment variables.
    ///
    /// Optional:
    /// - `SEISMO_STORE`: `dynamodb` (default) or `memory`
    /// - `EARTHQUAKE_TABLE_NAME`: table name (default: "earthquake")
    /// - `AWS_REGION`: region override
    /// - `DYNAMODB_ENDPOINT`: endpoint override
    /// - `DYNAMODB_TIMEOUT_MS`: operation timeout
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let backend = match std::env::var("SEISMO_STORE") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.backend,
        };

        let table_name = std::env::var("EARTHQUAKE_TABLE_NAME")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.table_name);

        let timeout_ms = match std::env::var("DYNAMODB_TIMEOUT_MS") {
            Ok(value) => Some(value.parse().map_err(|_| {
                Error::Config(format!("DYNAMODB_TIMEOUT_MS must be an integer, got '{value}'"))
            })?),
            Err(_) => None,
        };

        Ok(Self {
            backend,
            table_name,
            region: std::env::var("AWS_REGION").ok(),
            endpoint: std::env::var("DYNAMODB_ENDPOINT").ok(),
            timeout_ms,
        })
    }
}

/// Open the configured store.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn EventStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!("using in-memory event store");
            Ok(Arc::new(MemoryStore::new()))
        }
        #[cfg(feature = "dynamodb")]
        StoreBackend::DynamoDb => {
            let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            let store = DynamoDbStore::new(
                &sdk_config,
                DynamoDbConfig {
                    table_name: config.table_name.clone(),
                    region: config.region.clone(),
                    endpoint: config.endpoint.clone(),
                    timeout_ms: config.timeout_ms,
                },
            );
            tracing::info!(table = %config.table_name, "using DynamoDB event store");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "dynamodb"))]
        StoreBackend::DynamoDb => Err(Error::Config(
            "DynamoDB backend requested but the `dynamodb` feature is disabled".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::fixtures::event;
    use crate::record::to_storage_record;

    #[test]
    fn test_index_names_and_keys() {
        assert_eq!(IndexName::Time.to_string(), "GSI_Time");
        assert_eq!(IndexName::TsunamiTime.partition_attr(), "tsunami");
        assert_eq!(IndexName::TsunamiTime.sort_attr(), "time");
        assert_eq!(IndexName::LocationMagnitude.partition_attr(), "location");
        assert_eq!(IndexName::Magnitude.sort_attr(), "magScaled");
    }

    #[test]
    fn test_key_for_record() {
        let record = to_storage_record(&event("us1", 100, Some(4.5), "x, Chile", 0));
        let key = IndexName::Magnitude.key_for(&record).unwrap();
        assert_eq!(key.len(), 3);
        assert_eq!(key["eventId"], AttrValue::from("us1"));
        assert_eq!(key["globalMag"], AttrValue::from("GLOBAL#MAGNITUDE"));
        assert_eq!(key["magScaled"], AttrValue::N(4500));
    }

    #[test]
    fn test_record_without_magnitude_is_in_every_index() {
        let record = to_storage_record(&event("us1", 100, None, "x, Chile", 0));
        let key = IndexName::LocationMagnitude.key_for(&record).unwrap();
        assert_eq!(key["magScaled"], AttrValue::N(0));
        assert!(IndexName::Magnitude.key_for(&record).is_some());
        assert!(IndexName::Time.key_for(&record).is_some());
    }

    #[test]
    fn test_filter_conditions() {
        let record = to_storage_record(&event("us1", 100, Some(4.5), "x, Chile", 1));
        assert!(
            FilterCondition::Equals {
                attr: ATTR_LOCATION,
                value: "Chile".into()
            }
            .matches(&record)
        );
        assert!(
            FilterCondition::Between {
                attr: ATTR_TIME,
                range: Range::new(100, 100)
            }
            .matches(&record)
        );
        assert!(
            !FilterCondition::Between {
                attr: ATTR_MAG_SCALED,
                range: Range::new(5000, 7000)
            }
            .matches(&record)
        );
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("DynamoDB".parse::<StoreBackend>().unwrap(), StoreBackend::DynamoDb);
        assert!("cassandra".parse::<StoreBackend>().is_err());
    }
}
