//! In-process store that emulates wide-column index queries.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{EventStore, MAX_BATCH_SIZE, QueryPage, QueryRequest};
use crate::error::{Error, Result};
use crate::record::{ATTR_EVENT_ID, StorageRecord};

/// Records keyed by event ID, guarded by a read-write lock.
///
/// Index queries scan the whole map; fine for development data sets and
/// tests, not meant for production volumes.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, StorageRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

/// Position of a record inside an index: (sort key, event ID).
type Position<'a> = (i64, &'a str);

#[async_trait]
impl EventStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn batch_put(&self, records: &[StorageRecord]) -> Result<Vec<StorageRecord>> {
        if records.len() > MAX_BATCH_SIZE {
            return Err(Error::StoreTransport(format!(
                "batch of {} exceeds the {} item limit",
                records.len(),
                MAX_BATCH_SIZE
            )));
        }

        let mut guard = self.records.write();
        for record in records {
            guard.insert(record.event_id.clone(), record.clone());
        }

        Ok(Vec::new())
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryPage> {
        let index = request.index;
        let partition_attr = index.partition_attr();
        let sort_attr = index.sort_attr();

        let start: Option<(i64, String)> = match &request.exclusive_start_key {
            Some(key) => {
                let sort = key.get(sort_attr).and_then(|v| v.as_n());
                let id = key.get(ATTR_EVENT_ID).and_then(|v| v.as_s());
                match (sort, id) {
                    (Some(sort), Some(id)) => Some((sort, id.to_string())),
                    _ => {
                        return Err(Error::StoreTransport(format!(
                            "exclusive start key does not match the key schema of {index}"
                        )));
                    }
                }
            }
            None => None,
        };

        let guard = self.records.read();

        let mut candidates: Vec<(Position<'_>, &StorageRecord)> = guard
            .values()
            .filter(|r| r.attribute(partition_attr).as_ref() == Some(&request.key_condition.partition))
            .filter_map(|r| {
                let sort = r.attribute(sort_attr)?.as_n()?;
                Some(((sort, r.event_id.as_str()), r))
            })
            .filter(|((sort, _), _)| {
                request
                    .key_condition
                    .sort
                    .is_none_or(|range| range.contains(*sort))
            })
            .collect();

        candidates.sort_by(|(a, _), (b, _)| a.cmp(b));
        if !request.scan_forward {
            candidates.reverse();
        }

        // Skip everything up to and including the start position
        let wanted = if request.scan_forward {
            Ordering::Greater
        } else {
            Ordering::Less
        };
        let remaining: Vec<_> = match &start {
            Some((sort, id)) => candidates
                .into_iter()
                .filter(|(pos, _)| pos.cmp(&(*sort, id.as_str())) == wanted)
                .collect(),
            None => candidates,
        };

        let limit = request.limit.max(1);
        let more = remaining.len() > limit;
        let evaluated = &remaining[..remaining.len().min(limit)];

        let last_evaluated_key = if more {
            evaluated.last().and_then(|(_, r)| index.key_for(r))
        } else {
            None
        };

        let items = evaluated
            .iter()
            .map(|(_, r)| *r)
            .filter(|r| request.filters.iter().all(|f| f.matches(r)))
            .cloned()
            .collect();

        Ok(QueryPage {
            items,
            last_evaluated_key,
        })
    }

    async fn get(&self, event_id: &str) -> Result<Option<StorageRecord>> {
        Ok(self.records.read().get(event_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::fixtures::event;
    use crate::record::{
        ATTR_LOCATION, AttrValue, GLOBAL_MAGNITUDE_MARKER, GLOBAL_TIME_MARKER, to_storage_record,
    };
    use crate::store::{FilterCondition, IndexName, Range};

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let records: Vec<_> = [
            event("a", 100, Some(4.5), "x, Chile", 0),
            event("b", 200, Some(6.1), "x, Japan", 1),
            event("c", 300, Some(5.0), "x, Chile", 1),
            event("d", 400, None, "x, Chile", 0),
            event("e", 500, Some(7.2), "x, Japan", 0),
        ]
        .iter()
        .map(to_storage_record)
        .collect();
        store.batch_put(&records).await.unwrap();
        store
    }

    fn ids(page: &QueryPage) -> Vec<&str> {
        page.items.iter().map(|r| r.event_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_record() {
        let store = MemoryStore::new();
        let first = to_storage_record(&event("a", 100, Some(1.0), "x, Chile", 0));
        let second = to_storage_record(&event("a", 100, Some(2.0), "x, Chile", 0));

        store.batch_put(&[first]).await.unwrap();
        store.batch_put(&[second.clone()]).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_rejects_oversized_batch() {
        let store = MemoryStore::new();
        let records: Vec<_> = (0..26)
            .map(|i| to_storage_record(&event(&format!("e{i}"), i, Some(1.0), "x, Chile", 0)))
            .collect();
        assert!(matches!(
            store.batch_put(&records).await,
            Err(Error::StoreTransport(_))
        ));
    }

    #[tokio::test]
    async fn test_time_index_descending() {
        let store = seeded().await;
        let page = store
            .query(&QueryRequest::new(IndexName::Time, GLOBAL_TIME_MARKER).with_limit(10))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec!["e", "d", "c", "b", "a"]);
        assert!(page.last_evaluated_key.is_none());
    }

    #[tokio::test]
    async fn test_magnitude_index_is_ranged() {
        let store = seeded().await;
        let page = store
            .query(
                &QueryRequest::new(IndexName::Magnitude, GLOBAL_MAGNITUDE_MARKER)
                    .with_sort_range(Range::new(5000, 7000))
                    .with_limit(10),
            )
            .await
            .unwrap();
        assert_eq!(ids(&page), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_location_index_includes_missing_magnitude() {
        let store = seeded().await;
        let page = store
            .query(&QueryRequest::new(IndexName::LocationMagnitude, "Chile").with_limit(10))
            .await
            .unwrap();
        // d has no magnitude and sorts last at 0
        assert_eq!(ids(&page), vec!["c", "a", "d"]);
    }

    #[tokio::test]
    async fn test_pagination_resumes_after_last_key() {
        let store = seeded().await;
        let request = QueryRequest::new(IndexName::Time, GLOBAL_TIME_MARKER).with_limit(2);

        let first = store.query(&request).await.unwrap();
        assert_eq!(ids(&first), vec!["e", "d"]);
        let key = first.last_evaluated_key.clone().unwrap();
        assert_eq!(key["time"], AttrValue::N(400));

        let second = store
            .query(&request.clone().with_start_key(Some(key)))
            .await
            .unwrap();
        assert_eq!(ids(&second), vec!["c", "b"]);

        let third = store
            .query(&request.with_start_key(second.last_evaluated_key))
            .await
            .unwrap();
        assert_eq!(ids(&third), vec!["a"]);
        assert!(third.last_evaluated_key.is_none());
    }

    #[tokio::test]
    async fn test_filter_runs_after_limit() {
        let store = seeded().await;
        let request = QueryRequest::new(IndexName::TsunamiTime, 0i64)
            .with_filter(FilterCondition::Equals {
                attr: ATTR_LOCATION,
                value: "Chile".into(),
            })
            .with_limit(2);

        // Evaluates e (Japan) and d (Chile); only d survives the filter
        let page = store.query(&request).await.unwrap();
        assert_eq!(ids(&page), vec!["d"]);
        assert!(page.last_evaluated_key.is_some());

        let next = store
            .query(&request.with_start_key(page.last_evaluated_key))
            .await
            .unwrap();
        assert_eq!(ids(&next), vec!["a"]);
    }

    #[tokio::test]
    async fn test_start_key_with_wrong_schema() {
        let store = seeded().await;
        let mut key = crate::record::Key::new();
        key.insert("eventId".to_string(), AttrValue::from("a"));
        let request =
            QueryRequest::new(IndexName::Time, GLOBAL_TIME_MARKER).with_start_key(Some(key));
        assert!(matches!(
            store.query(&request).await,
            Err(Error::StoreTransport(_))
        ));
    }
}
