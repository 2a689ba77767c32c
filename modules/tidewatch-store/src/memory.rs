//! In-memory store implementations over `tokio::sync::RwLock` maps. Each
//! conditional operation holds one write lock across its check and its
//! mutation, giving the same atomicity a database conditional insert would.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use tidewatch_common::{
    Alert, AnalyzedSignal, HazardReport, Hotspot, Platform, Severity, User, UserAlert,
};

use crate::traits::{
    AlertCreate, AlertStore, CreateOutcome, HotspotStore, ReportStore, SignalStore, UserStore,
};

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemorySignalStore {
    signals: RwLock<HashMap<(Platform, String), AnalyzedSignal>>,
}

impl MemorySignalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SignalStore for MemorySignalStore {
    async fn insert_if_absent(&self, signal: AnalyzedSignal) -> Result<bool> {
        let key = signal.post.identity();
        let mut signals = self.signals.write().await;
        if signals.contains_key(&key) {
            return Ok(false);
        }
        signals.insert(key, signal);
        Ok(true)
    }

    async fn contains(&self, platform: Platform, external_id: &str) -> Result<bool> {
        let signals = self.signals.read().await;
        Ok(signals.contains_key(&(platform, external_id.to_string())))
    }

    async fn recent_signals(
        &self,
        since: DateTime<Utc>,
        min_probability: f64,
    ) -> Result<Vec<AnalyzedSignal>> {
        let signals = self.signals.read().await;
        let mut matching: Vec<AnalyzedSignal> = signals
            .values()
            .filter(|s| s.post.created_at >= since && s.hazard_probability >= min_probability)
            .cloned()
            .collect();
        matching.sort_by_key(|s| s.post.created_at);
        Ok(matching)
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ReportInner {
    reports: HashMap<Uuid, HazardReport>,
    alerted: HashSet<Uuid>,
}

#[derive(Default)]
pub struct MemoryReportStore {
    inner: RwLock<ReportInner>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn upsert(&self, report: HazardReport) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.reports.insert(report.id, report);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<HazardReport>> {
        let inner = self.inner.read().await;
        Ok(inner.reports.get(&id).cloned())
    }

    async fn verified_since(
        &self,
        since: DateTime<Utc>,
        min_severity: Severity,
    ) -> Result<Vec<HazardReport>> {
        let inner = self.inner.read().await;
        let mut matching: Vec<HazardReport> = inner
            .reports
            .values()
            .filter(|r| r.is_verified && r.created_at >= since && r.severity >= min_severity)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.created_at);
        Ok(matching)
    }

    async fn unalerted_verified(&self, min_severity: Severity) -> Result<Vec<HazardReport>> {
        let inner = self.inner.read().await;
        let mut matching: Vec<HazardReport> = inner
            .reports
            .values()
            .filter(|r| {
                r.is_verified && r.severity >= min_severity && !inner.alerted.contains(&r.id)
            })
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.created_at);
        Ok(matching)
    }

    async fn mark_alerted(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.alerted.insert(id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Default)]
struct AlertInner {
    alerts: HashMap<Uuid, Alert>,
    user_alerts: HashMap<(Uuid, Uuid), UserAlert>,
}

#[derive(Default)]
pub struct MemoryAlertStore {
    inner: RwLock<AlertInner>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn create_or_active_within(
        &self,
        create: AlertCreate,
        suppression_window: Duration,
    ) -> Result<CreateOutcome> {
        if create.ttl <= Duration::zero() {
            anyhow::bail!(
                "alert TTL must be positive, got {} seconds",
                create.ttl.num_seconds()
            );
        }

        let now = Utc::now();
        let cutoff = now - suppression_window;

        // Single write lock across the suppression check and the insert.
        let mut inner = self.inner.write().await;

        let existing = inner
            .alerts
            .values()
            .filter(|a| {
                a.is_active
                    && a.alert_type == create.alert_type
                    && a.source == create.source
                    && a.created_at >= cutoff
            })
            .max_by_key(|a| a.created_at)
            .cloned();

        if let Some(alert) = existing {
            return Ok(CreateOutcome::Suppressed(alert));
        }

        let alert = Alert {
            id: Uuid::new_v4(),
            alert_type: create.alert_type,
            title: create.title,
            message: create.message,
            severity: create.severity,
            source: create.source,
            affected_area: create.affected_area,
            is_active: true,
            created_at: now,
            expires_at: now + create.ttl,
        };
        inner.alerts.insert(alert.id, alert.clone());
        Ok(CreateOutcome::Created(alert))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Alert>> {
        let inner = self.inner.read().await;
        Ok(inner.alerts.get(&id).cloned())
    }

    async fn active_alerts(&self, now: DateTime<Utc>) -> Result<Vec<Alert>> {
        let inner = self.inner.read().await;
        let mut active: Vec<Alert> = inner
            .alerts
            .values()
            .filter(|a| a.is_active && !a.is_expired(now))
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(active)
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let mut deactivated = 0;
        for alert in inner.alerts.values_mut() {
            if alert.is_active && alert.expires_at < now {
                alert.is_active = false;
                deactivated += 1;
            }
        }
        Ok(deactivated)
    }

    async fn add_user_alert(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .user_alerts
            .entry((user_id, alert_id))
            .or_insert(UserAlert {
                user_id,
                alert_id,
                is_read: false,
                created_at: now,
            });
        Ok(())
    }

    async fn mark_read(&self, user_id: Uuid, alert_id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.user_alerts.get_mut(&(user_id, alert_id)) {
            Some(user_alert) => {
                user_alert.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn user_alerts(
        &self,
        user_id: Uuid,
        unread_only: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<Alert>> {
        let inner = self.inner.read().await;
        let mut alerts: Vec<Alert> = inner
            .user_alerts
            .values()
            .filter(|ua| ua.user_id == user_id && (!unread_only || !ua.is_read))
            .filter_map(|ua| inner.alerts.get(&ua.alert_id))
            .filter(|a| a.is_active && !a.is_expired(now))
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }
}

// ---------------------------------------------------------------------------
// Hotspots
// ---------------------------------------------------------------------------

#[derive(Default)]
struct HotspotInner {
    current: Vec<Hotspot>,
    current_generation: Option<Uuid>,
}

#[derive(Default)]
pub struct MemoryHotspotStore {
    inner: RwLock<HotspotInner>,
}

impl MemoryHotspotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HotspotStore for MemoryHotspotStore {
    async fn replace_generation(&self, generation: Uuid, hotspots: Vec<Hotspot>) -> Result<()> {
        let mut inner = self.inner.write().await;
        // An empty run emits nothing; the previous generation keeps serving
        // until its own TTL runs out.
        if hotspots.is_empty() {
            return Ok(());
        }
        inner.current = hotspots;
        inner.current_generation = Some(generation);
        Ok(())
    }

    async fn active_hotspots(&self, now: DateTime<Utc>) -> Result<Vec<Hotspot>> {
        let inner = self.inner.read().await;
        Ok(inner
            .current
            .iter()
            .filter(|h| h.expires_at > now)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn all_users(&self) -> Result<Vec<User>> {
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by_key(|u| u.registered_at);
        Ok(all)
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }
}
