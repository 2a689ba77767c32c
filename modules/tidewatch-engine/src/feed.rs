//! Sync with an external early-warning feed (INCOIS-style): per-hazard
//! endpoints, severity mapping, and alert creation through the manager so
//! suppression applies to feed items too.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Duration;
use serde::Deserialize;
use tracing::{info, warn};

use tidewatch_common::types::{AlertSource, GeoPoint, HazardType, Severity};

use crate::alerts::{AlertManager, AlertTrigger};

/// Feed endpoints polled each sync, one per hazard type.
const FEED_ENDPOINTS: &[(HazardType, &str)] = &[
    (HazardType::Tsunami, "/api/tsunami-alerts"),
    (HazardType::StormSurge, "/api/storm-surge-alerts"),
    (HazardType::HighWaves, "/api/wave-alerts"),
    (HazardType::CoastalCurrent, "/api/current-alerts"),
];

/// Default lifetime for feed items that carry no duration.
const DEFAULT_DURATION_HOURS: i64 = 24;

/// A normalized item from the external feed.
#[derive(Debug, Clone)]
pub struct FeedAlertItem {
    pub alert_type: HazardType,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub coordinates: Vec<GeoPoint>,
    pub duration_hours: i64,
}

/// Map the feed's severity vocabulary onto ours. Unrecognized labels land
/// on Medium rather than failing the item.
pub fn map_feed_severity(label: &str) -> Severity {
    match label.to_ascii_lowercase().as_str() {
        "low" => Severity::Low,
        "moderate" => Severity::Medium,
        "high" => Severity::High,
        "severe" | "extreme" => Severity::Critical,
        _ => Severity::Medium,
    }
}

#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Fetch current items across all hazard endpoints. A failing endpoint
    /// is logged and skipped; the call errors only when nothing works.
    async fn fetch(&self) -> Result<Vec<FeedAlertItem>>;
}

#[derive(Deserialize)]
struct FeedResponse {
    #[serde(default)]
    alerts: Vec<FeedEntry>,
}

#[derive(Deserialize)]
struct FeedEntry {
    title: Option<String>,
    #[serde(default)]
    description: String,
    severity: Option<String>,
    #[serde(default)]
    coordinates: Vec<[f64; 2]>,
    duration: Option<i64>,
}

pub struct HttpFeedClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpFeedClient {
    pub fn new(client: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    async fn fetch_endpoint(&self, hazard: HazardType, endpoint: &str) -> Result<Vec<FeedAlertItem>> {
        let mut request = self.client.get(format!("{}{endpoint}", self.base_url));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await.context("Feed request failed")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Feed endpoint {endpoint} returned {status}");
        }

        let parsed: FeedResponse = resp.json().await.context("Invalid feed body")?;
        Ok(parsed
            .alerts
            .into_iter()
            .map(|entry| FeedAlertItem {
                alert_type: hazard,
                title: entry
                    .title
                    .unwrap_or_else(|| format!("{hazard} alert")),
                description: entry.description,
                severity: map_feed_severity(entry.severity.as_deref().unwrap_or("medium")),
                coordinates: entry
                    .coordinates
                    .into_iter()
                    .map(|[lat, lng]| GeoPoint { lat, lng })
                    .collect(),
                duration_hours: entry
                    .duration
                    .filter(|d| *d > 0)
                    .unwrap_or(DEFAULT_DURATION_HOURS),
            })
            .collect())
    }
}

#[async_trait]
impl FeedClient for HttpFeedClient {
    async fn fetch(&self) -> Result<Vec<FeedAlertItem>> {
        let mut items = Vec::new();
        let mut failures = 0;
        for &(hazard, endpoint) in FEED_ENDPOINTS {
            match self.fetch_endpoint(hazard, endpoint).await {
                Ok(batch) => items.extend(batch),
                Err(e) => {
                    warn!(%hazard, endpoint, error = %e, "Feed endpoint failed");
                    failures += 1;
                }
            }
        }
        if failures == FEED_ENDPOINTS.len() {
            anyhow::bail!("All feed endpoints failed");
        }
        Ok(items)
    }
}

/// Counters from one feed sync.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FeedSyncStats {
    pub fetched: u32,
    pub created: u32,
    pub suppressed: u32,
}

pub struct FeedSync {
    client: Arc<dyn FeedClient>,
    manager: Arc<AlertManager>,
}

impl FeedSync {
    pub fn new(client: Arc<dyn FeedClient>, manager: Arc<AlertManager>) -> Self {
        Self { client, manager }
    }

    /// Fetch the feed and raise each item through the alert manager.
    pub async fn run(&self) -> Result<FeedSyncStats> {
        let items = self.client.fetch().await?;
        let mut stats = FeedSyncStats {
            fetched: items.len() as u32,
            ..Default::default()
        };

        for item in items {
            let mut trigger =
                AlertTrigger::new(item.alert_type, item.severity, AlertSource::ExternalFeed);
            trigger.title = Some(item.title);
            if !item.description.is_empty() {
                trigger.message = Some(item.description);
            }
            // Fewer than three points is not an area.
            if item.coordinates.len() >= 3 {
                trigger.affected_area = Some(item.coordinates);
            }
            // A zero or negative lifetime would fail alert creation and
            // abort the whole cycle; fall back to the default instead.
            let hours = if item.duration_hours > 0 {
                item.duration_hours
            } else {
                warn!(
                    alert_type = %trigger.alert_type,
                    duration = item.duration_hours,
                    "Feed item has a non-positive duration, using the default"
                );
                DEFAULT_DURATION_HOURS
            };
            trigger.ttl = Some(Duration::hours(hours));

            if self.manager.create(trigger).await?.was_created() {
                stats.created += 1;
            } else {
                stats.suppressed += 1;
            }
        }

        info!(
            fetched = stats.fetched,
            created = stats.created,
            suppressed = stats.suppressed,
            "Feed sync complete"
        );
        Ok(stats)
    }
}
