//! USGS FDSN event feed client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat};
use seismo_core::{Error as CoreError, Event, FeedResponse};

use super::EventFeed;
use crate::Result;

/// Default USGS FDSN event query endpoint.
pub const DEFAULT_FEED_URL: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";

/// Configuration for the USGS feed client.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Event query endpoint.
    pub url: String,

    /// Maximum number of events requested per call.
    pub page_limit: usize,

    /// Request timeout.
    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            page_limit: 100,
            timeout: Duration::from_secs(30),
        }
    }
}

impl FeedConfig {
    /// Load feed settings from `USGS_API_URL` and `USGS_PAGE_LIMIT`,
    /// falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let url = std::env::var("USGS_API_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.url);

        let page_limit = match std::env::var("USGS_PAGE_LIMIT") {
            Ok(value) => value.parse().map_err(|_| {
                CoreError::Config(format!("USGS_PAGE_LIMIT must be an integer, got '{value}'"))
            })?,
            Err(_) => defaults.page_limit,
        };

        Ok(Self {
            url,
            page_limit,
            timeout: defaults.timeout,
        })
    }
}

/// Client for the USGS earthquake catalog.
#[derive(Debug, Clone)]
pub struct UsgsFeed {
    http: reqwest::Client,
    config: FeedConfig,
}

impl UsgsFeed {
    pub fn new(config: FeedConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("seismo/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    fn query_params(&self, start_time: Option<i64>) -> Result<Vec<(&'static str, String)>> {
        let mut params = vec![
            ("format", "geojson".to_string()),
            ("limit", self.config.page_limit.to_string()),
            // Oldest first: a full page must not leave gaps behind the watermark
            ("orderby", "time-asc".to_string()),
        ];
        if let Some(start) = start_time {
            params.push(("starttime", format_start_time(start)?));
        }
        Ok(params)
    }
}

/// Render epoch milliseconds as ISO-8601 UTC with millisecond precision.
fn format_start_time(millis: i64) -> Result<String> {
    let ts = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        CoreError::UpstreamFetch(format!("start time {millis} is out of range"))
    })?;
    Ok(ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[async_trait]
impl EventFeed for UsgsFeed {
    fn name(&self) -> &'static str {
        "usgs"
    }

    async fn fetch(&self, start_time: Option<i64>) -> Result<Vec<Event>> {
        let params = self.query_params(start_time)?;
        tracing::debug!(url = %self.config.url, ?start_time, "fetching feed");

        let started = Instant::now();
        let resp = self.http.get(&self.config.url).query(&params).send().await?;
        let status = resp.status();

        if !status.is_success() {
            return Err(CoreError::UpstreamFetch(format!("feed returned HTTP {status}")).into());
        }

        let body: FeedResponse = resp
            .json()
            .await
            .map_err(|e| CoreError::UpstreamFetch(format!("malformed feed response: {e}")))?;
        metrics::histogram!("feed_fetch_duration_seconds").record(started.elapsed().as_secs_f64());

        let features = body.features.ok_or_else(|| {
            CoreError::UpstreamFetch("feed response has no features field".to_string())
        })?;

        tracing::debug!(events = features.len(), "feed fetch complete");
        Ok(features)
    }
}
