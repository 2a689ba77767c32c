use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use tidewatch_common::{
    Alert, AlertSource, AnalyzedSignal, HazardReport, HazardType, Hotspot, Platform, Severity,
    User,
};

// ---------------------------------------------------------------------------
// SignalStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Store a signal unless one with the same (platform, external_id)
    /// already exists. Returns true if stored, false on duplicate. Must be
    /// atomic: concurrent inserts of the same identity store exactly one.
    async fn insert_if_absent(&self, signal: AnalyzedSignal) -> Result<bool>;

    /// Cheap pre-analysis dedup check.
    async fn contains(&self, platform: Platform, external_id: &str) -> Result<bool>;

    /// Signals at or after `since` with probability >= `min_probability`,
    /// ordered by post creation time ascending.
    async fn recent_signals(
        &self,
        since: DateTime<Utc>,
        min_probability: f64,
    ) -> Result<Vec<AnalyzedSignal>>;
}

// ---------------------------------------------------------------------------
// ReportStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn upsert(&self, report: HazardReport) -> Result<()>;

    async fn get(&self, id: Uuid) -> Result<Option<HazardReport>>;

    /// Verified reports created at or after `since` with severity >= `min`.
    async fn verified_since(
        &self,
        since: DateTime<Utc>,
        min_severity: Severity,
    ) -> Result<Vec<HazardReport>>;

    /// Verified reports at or above `min_severity` that have not yet been
    /// fed to alert generation.
    async fn unalerted_verified(&self, min_severity: Severity) -> Result<Vec<HazardReport>>;

    /// Record that a report has been fed to alert generation.
    async fn mark_alerted(&self, id: Uuid) -> Result<()>;
}

// ---------------------------------------------------------------------------
// AlertStore
// ---------------------------------------------------------------------------

/// Everything needed to create an alert row. The store stamps id,
/// created_at, expires_at, and is_active.
#[derive(Debug, Clone)]
pub struct AlertCreate {
    pub alert_type: HazardType,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub source: AlertSource,
    pub affected_area: Option<Vec<tidewatch_common::GeoPoint>>,
    pub ttl: Duration,
}

/// Result of a suppression-checked create.
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Created(Alert),
    /// An active alert of the same (alert_type, source) already existed
    /// within the suppression window; no new row was written.
    Suppressed(Alert),
}

impl CreateOutcome {
    pub fn alert(&self) -> &Alert {
        match self {
            CreateOutcome::Created(a) | CreateOutcome::Suppressed(a) => a,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Create an alert unless an active one of the same (alert_type, source)
    /// was created within `suppression_window`. The check and the insert
    /// must be one atomic operation: two concurrent calls for the same key
    /// yield one Created and one Suppressed.
    async fn create_or_active_within(
        &self,
        create: AlertCreate,
        suppression_window: Duration,
    ) -> Result<CreateOutcome>;

    async fn get(&self, id: Uuid) -> Result<Option<Alert>>;

    /// Active, unexpired alerts.
    async fn active_alerts(&self, now: DateTime<Utc>) -> Result<Vec<Alert>>;

    /// Flip every active alert with expires_at < now to inactive; returns
    /// how many were deactivated. Alerts are never deleted.
    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64>;

    /// Create the per-user read-state row for an alert at fanout time.
    async fn add_user_alert(&self, user_id: Uuid, alert_id: Uuid, now: DateTime<Utc>)
        -> Result<()>;

    /// Mark a user's alert read. Idempotent. Returns false (and creates
    /// nothing) when no UserAlert row exists.
    async fn mark_read(&self, user_id: Uuid, alert_id: Uuid) -> Result<bool>;

    /// Active, unexpired alerts joined through the user's UserAlert rows,
    /// most recent first.
    async fn user_alerts(
        &self,
        user_id: Uuid,
        unread_only: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<Alert>>;
}

// ---------------------------------------------------------------------------
// HotspotStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait HotspotStore: Send + Sync {
    /// Install a fresh hotspot generation, superseding the previous one.
    /// An empty generation supersedes nothing: the previous spots keep
    /// serving until their own TTL runs out.
    async fn replace_generation(&self, generation: Uuid, hotspots: Vec<Hotspot>) -> Result<()>;

    /// Unexpired hotspots of the current generation.
    async fn active_hotspots(&self, now: DateTime<Utc>) -> Result<Vec<Hotspot>>;
}

// ---------------------------------------------------------------------------
// UserStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait UserStore: Send + Sync {
    /// All registered users. Fanout targets everyone; swapping this for a
    /// location-filtered query is the geospatial integration point.
    async fn all_users(&self) -> Result<Vec<User>>;

    async fn get(&self, id: Uuid) -> Result<Option<User>>;
}
