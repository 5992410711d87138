//! DynamoDB-backed event store.
//!
//! Records are written as native DynamoDB items: index attributes as `S`/`N`
//! values and the original feature as a nested `M`, so the table stays
//! readable by any other DynamoDB document client.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};
use aws_smithy_types::timeout::TimeoutConfig;
use serde_json::{Map, Number, Value};

use super::{EventStore, FilterCondition, MAX_BATCH_SIZE, QueryPage, QueryRequest};
use crate::error::{Error, Result};
use crate::event::Event;
use crate::record::{
    ATTR_EVENT_ID, ATTR_FEATURE, ATTR_GLOBAL_MAG, ATTR_GLOBAL_TIME, ATTR_LOCATION,
    ATTR_MAG_SCALED, ATTR_STATUS, ATTR_TIME, ATTR_TSUNAMI, AttrValue, Key, StorageRecord,
};

type Item = HashMap<String, AttributeValue>;

/// DynamoDB store configuration.
#[derive(Debug, Clone)]
pub struct DynamoDbConfig {
    /// Events table name.
    pub table_name: String,
    /// AWS region (optional, uses SDK default if not specified).
    pub region: Option<String>,
    /// Optional endpoint override (e.g. DynamoDB Local).
    pub endpoint: Option<String>,
    /// Timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

/// Event store on a DynamoDB table with the four secondary indexes.
#[derive(Clone)]
pub struct DynamoDbStore {
    client: Client,
    table_name: String,
}

impl std::fmt::Debug for DynamoDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoDbStore")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl DynamoDbStore {
    /// Create a store from shared SDK configuration plus local overrides.
    pub fn new(sdk_config: &aws_config::SdkConfig, config: DynamoDbConfig) -> Self {
        // Inherit HTTP client, retry config and credentials from the SdkConfig
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config);

        if let Some(region) = config.region {
            builder = builder.region(aws_sdk_dynamodb::config::Region::new(region));
        }

        if let Some(endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        if let Some(timeout_ms) = config.timeout_ms {
            let timeout_config = TimeoutConfig::builder()
                .operation_timeout(Duration::from_millis(timeout_ms))
                .build();
            builder = builder.timeout_config(timeout_config);
        }

        Self::from_client(Client::from_conf(builder.build()), config.table_name)
    }

    /// Create from a pre-built client.
    pub fn from_client(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl EventStore for DynamoDbStore {
    fn name(&self) -> &'static str {
        "dynamodb"
    }

    async fn batch_put(&self, records: &[StorageRecord]) -> Result<Vec<StorageRecord>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        if records.len() > MAX_BATCH_SIZE {
            return Err(Error::StoreTransport(format!(
                "batch of {} exceeds the {} item limit",
                records.len(),
                MAX_BATCH_SIZE
            )));
        }

        let requests = records
            .iter()
            .map(|record| {
                let put = PutRequest::builder()
                    .set_item(Some(record_to_item(record)?))
                    .build()
                    .map_err(|e| Error::StoreTransport(format!("invalid put request: {e}")))?;
                Ok(WriteRequest::builder().put_request(put).build())
            })
            .collect::<Result<Vec<_>>>()?;

        let response = self
            .client
            .batch_write_item()
            .request_items(&self.table_name, requests)
            .send()
            .await
            .map_err(|e| {
                Error::StoreTransport(format!(
                    "DynamoDB BatchWriteItem failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let unprocessed_ids: Vec<String> = response
            .unprocessed_items()
            .and_then(|items| items.get(&self.table_name))
            .map(|requests| {
                requests
                    .iter()
                    .filter_map(|r| r.put_request())
                    .filter_map(|p| p.item().get(ATTR_EVENT_ID))
                    .filter_map(|v| v.as_s().ok().cloned())
                    .collect()
            })
            .unwrap_or_default();

        Ok(records
            .iter()
            .filter(|r| unprocessed_ids.contains(&r.event_id))
            .cloned()
            .collect())
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryPage> {
        let expr = query_expression(request);
        let limit = i32::try_from(request.limit.max(1)).unwrap_or(i32::MAX);

        let response = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(request.index.as_str())
            .key_condition_expression(expr.key_condition)
            .set_filter_expression(expr.filter)
            .set_expression_attribute_names(Some(expr.names))
            .set_expression_attribute_values(Some(expr.values))
            .set_exclusive_start_key(request.exclusive_start_key.as_ref().map(key_to_item))
            .scan_index_forward(request.scan_forward)
            .limit(limit)
            .send()
            .await
            .map_err(|e| {
                Error::StoreTransport(format!("DynamoDB Query failed: {}", DisplayErrorContext(&e)))
            })?;

        let items = response
            .items()
            .iter()
            .map(item_to_record)
            .collect::<Result<Vec<_>>>()?;

        let last_evaluated_key = response
            .last_evaluated_key()
            .filter(|key| !key.is_empty())
            .map(item_to_key);

        Ok(QueryPage {
            items,
            last_evaluated_key,
        })
    }

    async fn get(&self, event_id: &str) -> Result<Option<StorageRecord>> {
        // Query rather than GetItem so a table with a `time` sort key works too
        let response = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("#id = :id")
            .expression_attribute_names("#id", ATTR_EVENT_ID)
            .expression_attribute_values(":id", AttributeValue::S(event_id.to_string()))
            .limit(1)
            .send()
            .await
            .map_err(|e| {
                Error::StoreTransport(format!("DynamoDB Query failed: {}", DisplayErrorContext(&e)))
            })?;

        response.items().first().map(item_to_record).transpose()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════════

/// Rendered key-condition and filter expressions of one index query.
struct QueryExpression {
    key_condition: String,
    filter: Option<String>,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

fn query_expression(request: &QueryRequest) -> QueryExpression {
    let index = request.index;
    let mut expr = ExpressionBuilder::default();

    let pk = expr.name(index.partition_attr());
    let pk_value = expr.value(attr_value(&request.key_condition.partition));
    let mut key_condition = format!("{pk} = {pk_value}");

    if let Some(range) = request.key_condition.sort {
        let sk = expr.name(index.sort_attr());
        let lo = expr.value(AttributeValue::N(range.lo.to_string()));
        let hi = expr.value(AttributeValue::N(range.hi.to_string()));
        key_condition.push_str(&format!(" AND {sk} BETWEEN {lo} AND {hi}"));
    }

    let filter = request
        .filters
        .iter()
        .map(|f| expr.filter(f))
        .collect::<Vec<_>>()
        .join(" AND ");

    QueryExpression {
        key_condition,
        filter: (!filter.is_empty()).then_some(filter),
        names: expr.names,
        values: expr.values,
    }
}

/// Allocates `#nN` / `:vN` placeholders. Every attribute name goes through a
/// placeholder because `time`, `location` and `status` are reserved words.
#[derive(Default)]
struct ExpressionBuilder {
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl ExpressionBuilder {
    fn name(&mut self, attr: &str) -> String {
        if let Some((placeholder, _)) = self.names.iter().find(|(_, a)| a.as_str() == attr) {
            return placeholder.clone();
        }
        let placeholder = format!("#n{}", self.names.len());
        self.names.insert(placeholder.clone(), attr.to_string());
        placeholder
    }

    fn value(&mut self, value: AttributeValue) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values.insert(placeholder.clone(), value);
        placeholder
    }

    fn filter(&mut self, condition: &FilterCondition) -> String {
        match condition {
            FilterCondition::Equals { attr, value } => {
                let name = self.name(attr);
                let value = self.value(attr_value(value));
                format!("{name} = {value}")
            }
            FilterCondition::Between { attr, range } => {
                let name = self.name(attr);
                let lo = self.value(AttributeValue::N(range.lo.to_string()));
                let hi = self.value(AttributeValue::N(range.hi.to_string()));
                format!("{name} BETWEEN {lo} AND {hi}")
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Item conversion
// ═══════════════════════════════════════════════════════════════════════════

fn attr_value(value: &AttrValue) -> AttributeValue {
    match value {
        AttrValue::N(n) => AttributeValue::N(n.to_string()),
        AttrValue::S(s) => AttributeValue::S(s.clone()),
    }
}

fn key_to_item(key: &Key) -> Item {
    key.iter()
        .map(|(name, value)| (name.clone(), attr_value(value)))
        .collect()
}

/// Convert a DynamoDB key map; non-scalar or non-integer members are dropped.
fn item_to_key(item: &Item) -> Key {
    item.iter()
        .filter_map(|(name, value)| {
            let scalar = match value {
                AttributeValue::S(s) => AttrValue::S(s.clone()),
                AttributeValue::N(n) => AttrValue::N(n.parse().ok()?),
                _ => return None,
            };
            Some((name.clone(), scalar))
        })
        .collect()
}

fn record_to_item(record: &StorageRecord) -> Result<Item> {
    let mut item = Item::new();
    item.insert(ATTR_EVENT_ID.into(), AttributeValue::S(record.event_id.clone()));
    item.insert(ATTR_TIME.into(), AttributeValue::N(record.time.to_string()));
    item.insert(ATTR_GLOBAL_TIME.into(), AttributeValue::S(record.global_time.clone()));
    item.insert(ATTR_GLOBAL_MAG.into(), AttributeValue::S(record.global_mag.clone()));
    item.insert(ATTR_MAG_SCALED.into(), AttributeValue::N(record.mag_scaled.to_string()));
    item.insert(ATTR_LOCATION.into(), AttributeValue::S(record.location.clone()));
    item.insert(ATTR_STATUS.into(), AttributeValue::S(record.status.clone()));
    item.insert(ATTR_TSUNAMI.into(), AttributeValue::N(record.tsunami.to_string()));
    item.insert(
        ATTR_FEATURE.into(),
        json_to_attr(&serde_json::to_value(&record.feature)?),
    );
    Ok(item)
}

fn item_to_record(item: &Item) -> Result<StorageRecord> {
    let feature_value = item
        .get(ATTR_FEATURE)
        .map(attr_to_json)
        .ok_or_else(|| Error::StoreTransport("stored item has no feature".to_string()))?;
    let feature: Event = serde_json::from_value(feature_value)?;

    Ok(StorageRecord {
        event_id: get_s(item, ATTR_EVENT_ID)?,
        time: get_n(item, ATTR_TIME)?,
        global_time: get_s(item, ATTR_GLOBAL_TIME)?,
        global_mag: get_s(item, ATTR_GLOBAL_MAG)?,
        mag_scaled: get_n(item, ATTR_MAG_SCALED).unwrap_or(0),
        location: get_s(item, ATTR_LOCATION)?,
        status: get_s(item, ATTR_STATUS).unwrap_or_default(),
        tsunami: u8::from(get_n(item, ATTR_TSUNAMI).unwrap_or(0) != 0),
        feature,
    })
}

fn get_s(item: &Item, attr: &str) -> Result<String> {
    item.get(attr)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| Error::StoreTransport(format!("stored item is missing string '{attr}'")))
}

fn get_n(item: &Item, attr: &str) -> Result<i64> {
    item.get(attr)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| Error::StoreTransport(format!("stored item is missing number '{attr}'")))
}

fn json_to_attr(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(json_to_attr).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_attr(v)))
                .collect(),
        ),
    }
}

fn attr_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::N(n) => parse_number(n),
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::L(items) => Value::Array(items.iter().map(attr_to_json).collect()),
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), attr_to_json(v)))
                .collect::<Map<_, _>>(),
        ),
        // Sets and binaries are never written by this store
        _ => Value::Null,
    }
}

fn parse_number(n: &str) -> Value {
    if let Ok(i) = n.parse::<i64>() {
        return Value::Number(i.into());
    }
    n.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::fixtures::event;
    use crate::query::{QueryFilter, plan};
    use crate::record::to_storage_record;
    use crate::store::{IndexName, Range};
    use serde_json::json;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TABLE: &str = "earthquakes";
    const AMZ_JSON: &str = "application/x-amz-json-1.0";

    fn names(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn n(value: i64) -> AttributeValue {
        AttributeValue::N(value.to_string())
    }

    fn store_for(server: &MockServer) -> DynamoDbStore {
        use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};

        let config = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "test"))
            .endpoint_url(server.uri())
            .build();
        DynamoDbStore::from_client(Client::from_conf(config), TABLE.to_string())
    }

    async fn request_bodies(server: &MockServer) -> Vec<Value> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    #[test]
    fn test_record_item_round_trip() {
        let record = to_storage_record(&event("us1", 1761392723124, Some(5.2), "x, Russia", 1));
        let item = record_to_item(&record).unwrap();

        assert_eq!(item[ATTR_TIME], AttributeValue::N("1761392723124".into()));
        assert_eq!(item[ATTR_MAG_SCALED], AttributeValue::N("5200".into()));
        assert!(matches!(item[ATTR_FEATURE], AttributeValue::M(_)));

        assert_eq!(item_to_record(&item).unwrap(), record);
    }

    #[test]
    fn test_item_without_magnitude() {
        let record = to_storage_record(&event("us2", 1, None, "x, Russia", 0));
        let item = record_to_item(&record).unwrap();
        assert_eq!(item[ATTR_MAG_SCALED], AttributeValue::N("0".into()));
        assert_eq!(item_to_record(&item).unwrap(), record);
    }

    #[test]
    fn test_key_conversion_round_trip() {
        let mut key = Key::new();
        key.insert("eventId".into(), AttrValue::from("us1"));
        key.insert("time".into(), AttrValue::N(42));
        assert_eq!(item_to_key(&key_to_item(&key)), key);
    }

    #[test]
    fn test_expression_placeholders_are_reused_for_names() {
        let mut expr = ExpressionBuilder::default();
        let a = expr.name("time");
        let b = expr.name("time");
        assert_eq!(a, b);

        let filter = expr.filter(&FilterCondition::Between {
            attr: "time",
            range: Range::new(1, 2),
        });
        assert_eq!(filter, format!("{a} BETWEEN :v0 AND :v1"));
        assert_eq!(expr.names.len(), 1);
        assert_eq!(expr.values.len(), 2);
    }

    // =========================================================================
    // Query expressions
    // =========================================================================

    #[test]
    fn test_time_index_expression() {
        let request = plan(&QueryFilter {
            start_time: Some(100),
            end_time: Some(200),
            ..Default::default()
        })
        .unwrap();
        let expr = query_expression(&request);

        assert_eq!(expr.key_condition, "#n0 = :v0 AND #n1 BETWEEN :v1 AND :v2");
        assert_eq!(expr.filter, None);
        assert_eq!(expr.names, names(&[("#n0", "globalTime"), ("#n1", "time")]));
        assert_eq!(expr.values[":v0"], AttributeValue::S("GLOBAL#TIME".into()));
        assert_eq!(expr.values[":v1"], n(100));
        assert_eq!(expr.values[":v2"], n(200));
    }

    #[test]
    fn test_tsunami_expression_with_residual_filters() {
        let request = plan(&QueryFilter {
            tsunami: Some(false),
            min_magnitude: Some(4.5),
            max_magnitude: Some(6.0),
            location: Some("Chile".into()),
            ..Default::default()
        })
        .unwrap();
        let expr = query_expression(&request);

        assert_eq!(expr.key_condition, "#n0 = :v0");
        assert_eq!(
            expr.filter.as_deref(),
            Some("#n1 BETWEEN :v1 AND :v2 AND #n2 = :v3")
        );
        assert_eq!(
            expr.names,
            names(&[("#n0", "tsunami"), ("#n1", "magScaled"), ("#n2", "location")])
        );
        assert_eq!(expr.values[":v0"], n(0));
        assert_eq!(expr.values[":v1"], n(4500));
        assert_eq!(expr.values[":v2"], n(6000));
        assert_eq!(expr.values[":v3"], AttributeValue::S("Chile".into()));
    }

    #[test]
    fn test_magnitude_expression_with_time_filter() {
        let request = plan(&QueryFilter {
            min_magnitude: Some(5.0),
            max_magnitude: Some(7.0),
            start_time: Some(10),
            end_time: Some(20),
            ..Default::default()
        })
        .unwrap();
        let expr = query_expression(&request);

        assert_eq!(request.index, IndexName::Magnitude);
        assert_eq!(expr.key_condition, "#n0 = :v0 AND #n1 BETWEEN :v1 AND :v2");
        assert_eq!(expr.filter.as_deref(), Some("#n2 BETWEEN :v3 AND :v4"));
        assert_eq!(
            expr.names,
            names(&[("#n0", "globalMag"), ("#n1", "magScaled"), ("#n2", "time")])
        );
        assert_eq!(expr.values[":v0"], AttributeValue::S("GLOBAL#MAGNITUDE".into()));
        assert_eq!(expr.values[":v3"], n(10));
        assert_eq!(expr.values[":v4"], n(20));
    }

    #[test]
    fn test_location_expression_without_sort_range() {
        let request = plan(&QueryFilter {
            location: Some("Alaska".into()),
            start_time: Some(10),
            end_time: Some(20),
            ..Default::default()
        })
        .unwrap();
        let expr = query_expression(&request);

        assert_eq!(request.index, IndexName::LocationMagnitude);
        assert_eq!(expr.key_condition, "#n0 = :v0");
        assert_eq!(expr.filter.as_deref(), Some("#n1 BETWEEN :v1 AND :v2"));
        assert_eq!(expr.names, names(&[("#n0", "location"), ("#n1", "time")]));
        assert_eq!(expr.values[":v0"], AttributeValue::S("Alaska".into()));
        assert_eq!(expr.values.len(), 3);
    }

    // =========================================================================
    // Client round trips
    // =========================================================================

    #[tokio::test]
    async fn test_batch_put_returns_unprocessed_records() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "DynamoDB_20120810.BatchWriteItem"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                json!({
                    "UnprocessedItems": {
                        "earthquakes": [{ "PutRequest": { "Item": { "eventId": { "S": "b" } } } }]
                    }
                })
                .to_string(),
                AMZ_JSON,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let records: Vec<_> = [
            event("a", 100, Some(4.5), "x, Chile", 0),
            event("b", 200, None, "x, Japan", 1),
            event("c", 300, Some(5.0), "x, Chile", 1),
        ]
        .iter()
        .map(to_storage_record)
        .collect();

        let unprocessed = store_for(&server).batch_put(&records).await.unwrap();
        assert_eq!(unprocessed, vec![records[1].clone()]);

        let bodies = request_bodies(&server).await;
        let puts = bodies[0]["RequestItems"][TABLE].as_array().unwrap();
        assert_eq!(puts.len(), 3);
        assert_eq!(puts[1]["PutRequest"]["Item"]["magScaled"], json!({ "N": "0" }));
        assert_eq!(puts[1]["PutRequest"]["Item"]["location"], json!({ "S": "Japan" }));
    }

    #[tokio::test]
    async fn test_batch_put_without_unprocessed_items() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{}", AMZ_JSON))
            .mount(&server)
            .await;

        let records = vec![to_storage_record(&event("a", 1, Some(1.0), "x, Chile", 0))];
        assert!(store_for(&server).batch_put(&records).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_sends_rendered_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "DynamoDB_20120810.Query"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                json!({
                    "Items": [],
                    "Count": 0,
                    "ScannedCount": 2,
                    "LastEvaluatedKey": {
                        "eventId": { "S": "us2" },
                        "globalTime": { "S": "GLOBAL#TIME" },
                        "time": { "N": "200" }
                    }
                })
                .to_string(),
                AMZ_JSON,
            ))
            .mount(&server)
            .await;

        let mut start = Key::new();
        start.insert("eventId".into(), AttrValue::from("us3"));
        start.insert("globalTime".into(), AttrValue::from("GLOBAL#TIME"));
        start.insert("time".into(), AttrValue::N(300));

        let request = plan(&QueryFilter {
            start_time: Some(100),
            end_time: Some(400),
            limit: Some(5),
            ..Default::default()
        })
        .unwrap()
        .with_start_key(Some(start));

        let page = store_for(&server).query(&request).await.unwrap();
        assert!(page.items.is_empty());
        let key = page.last_evaluated_key.unwrap();
        assert_eq!(key["time"], AttrValue::N(200));
        assert_eq!(key["eventId"], AttrValue::from("us2"));

        let body = &request_bodies(&server).await[0];
        assert_eq!(body["TableName"], TABLE);
        assert_eq!(body["IndexName"], "GSI_Time");
        assert_eq!(
            body["KeyConditionExpression"],
            "#n0 = :v0 AND #n1 BETWEEN :v1 AND :v2"
        );
        assert!(body.get("FilterExpression").is_none());
        assert_eq!(body["ScanIndexForward"], false);
        assert_eq!(body["Limit"], 5);
        assert_eq!(body["ExclusiveStartKey"]["time"], json!({ "N": "300" }));
    }

    #[tokio::test]
    async fn test_service_error_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_raw(
                json!({
                    "__type": "com.amazon.coral.validate#ValidationException",
                    "message": "The provided starting key is invalid"
                })
                .to_string(),
                AMZ_JSON,
            ))
            .mount(&server)
            .await;

        let request = QueryRequest::new(IndexName::Time, "GLOBAL#TIME");
        assert!(matches!(
            store_for(&server).query(&request).await,
            Err(Error::StoreTransport(_))
        ));
    }

    #[test]
    fn test_json_number_conversion() {
        assert_eq!(parse_number("42"), Value::from(42));
        assert_eq!(parse_number("561.686"), Value::from(561.686));
        assert_eq!(parse_number("nan?"), Value::Null);
    }
}
