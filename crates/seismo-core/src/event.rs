//! Raw feed events.
//!
//! The feed delivers GeoJSON features. Only the attributes the engine
//! derives index keys from are typed; everything else is carried through
//! untouched in the `extra` maps so the stored payload round-trips verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single seismic event as delivered by the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Feed-unique event identifier.
    pub id: String,

    pub properties: EventProperties,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Value>,

    /// Pass-through top-level attributes (e.g. `"type": "Feature"`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Typed subset of a feature's `properties`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventProperties {
    /// Origin time in epoch milliseconds.
    pub time: i64,

    #[serde(default)]
    pub mag: Option<f64>,

    #[serde(default)]
    pub place: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    /// 1 when the event carries a tsunami flag, 0 otherwise.
    #[serde(default)]
    pub tsunami: Option<u8>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    /// Origin time in epoch milliseconds.
    pub fn time(&self) -> i64 {
        self.properties.time
    }
}

/// Top-level feed response body.
///
/// `features` is optional at the type level so a body without it can be
/// reported as an upstream error instead of a generic decode failure.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedResponse {
    #[serde(default)]
    pub features: Option<Vec<Event>>,
}

/// Event builders shared by tests across the workspace.
#[cfg(any(test, feature = "test-util"))]
pub mod fixtures {
    use super::*;

    /// Build a minimal event for tests.
    pub fn event(id: &str, time: i64, mag: Option<f64>, place: &str, tsunami: u8) -> Event {
        let json = serde_json::json!({
            "type": "Feature",
            "id": id,
            "properties": {
                "time": time,
                "mag": mag,
                "place": place,
                "status": "reviewed",
                "tsunami": tsunami,
                "net": "us",
            },
            "geometry": {"type": "Point", "coordinates": [131.0017, 43.0788, 561.686]},
        });
        serde_json::from_value(json).expect("fixture event")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEATURE: &str = r#"{
        "type": "Feature",
        "properties": {
            "mag": 5.2,
            "place": "39 km NW of Slavyanka, Russia",
            "time": 1761392723124,
            "updated": 1761396988501,
            "tz": null,
            "status": "reviewed",
            "tsunami": 0,
            "sig": 416,
            "net": "us",
            "magType": "mb",
            "title": "M 5.2 - 39 km NW of Slavyanka, Russia"
        },
        "geometry": {"type": "Point", "coordinates": [131.0017, 43.0788, 561.686]},
        "id": "us6000rjf6"
    }"#;

    #[test]
    fn test_parse_feature() {
        let event: Event = serde_json::from_str(SAMPLE_FEATURE).unwrap();
        assert_eq!(event.id, "us6000rjf6");
        assert_eq!(event.time(), 1761392723124);
        assert_eq!(event.properties.mag, Some(5.2));
        assert_eq!(event.properties.tsunami, Some(0));
        assert_eq!(event.extra.get("type"), Some(&Value::from("Feature")));
        assert_eq!(event.properties.extra.get("sig"), Some(&Value::from(416)));
    }

    #[test]
    fn test_pass_through_attributes_survive() {
        let event: Event = serde_json::from_str(SAMPLE_FEATURE).unwrap();
        let original: Value = serde_json::from_str(SAMPLE_FEATURE).unwrap();
        let reserialized = serde_json::to_value(&event).unwrap();
        assert_eq!(reserialized, original);
    }

    #[test]
    fn test_null_magnitude() {
        let json = r#"{"id":"x","properties":{"time":1,"mag":null}}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.properties.mag, None);
        assert_eq!(event.properties.place, None);
    }

    #[test]
    fn test_feed_response_without_features() {
        let resp: FeedResponse = serde_json::from_str(r#"{"type":"FeatureCollection"}"#).unwrap();
        assert!(resp.features.is_none());
    }
}
