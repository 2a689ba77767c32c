//! Alert lifecycle: templated creation with suppression, user fanout,
//! expiry sweeps and read-state queries.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::json;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tidewatch_common::types::{Alert, AlertSource, GeoPoint, HazardType, Severity, User};
use tidewatch_store::{AlertCreate, AlertStore, CreateOutcome, EventPublisher, ReportStore, UserStore};

use crate::dispatch::NotificationDispatcher;

/// Request to raise an alert. Title and message fall back to the per-hazard
/// template when not supplied.
#[derive(Debug, Clone)]
pub struct AlertTrigger {
    pub alert_type: HazardType,
    pub severity: Severity,
    pub source: AlertSource,
    pub affected_area: Option<Vec<GeoPoint>>,
    /// Appended to the message as "Location: ..." when present.
    pub location_context: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
    /// Overrides the manager's default TTL (external feeds carry their own
    /// durations).
    pub ttl: Option<Duration>,
}

impl AlertTrigger {
    pub fn new(alert_type: HazardType, severity: Severity, source: AlertSource) -> Self {
        Self {
            alert_type,
            severity,
            source,
            affected_area: None,
            location_context: None,
            title: None,
            message: None,
            ttl: None,
        }
    }
}

/// Canned title and message per hazard type.
fn template(hazard: HazardType) -> (String, String) {
    match hazard {
        HazardType::Tsunami => (
            "Tsunami Alert".to_string(),
            "A tsunami alert has been issued for your area. Please move to higher ground immediately.".to_string(),
        ),
        HazardType::StormSurge => (
            "Storm Surge Warning".to_string(),
            "Storm surge conditions are expected. Avoid coastal areas and follow evacuation orders.".to_string(),
        ),
        HazardType::HighWaves => (
            "High Wave Warning".to_string(),
            "Dangerous wave conditions are expected. Stay away from beaches and coastal areas.".to_string(),
        ),
        HazardType::Flooding => (
            "Coastal Flooding Alert".to_string(),
            "Coastal flooding is expected. Avoid low-lying areas and follow local authorities.".to_string(),
        ),
        HazardType::CoastalCurrent => (
            "Coastal Current Alert".to_string(),
            "A coastal current has been reported in your area.".to_string(),
        ),
        HazardType::AbnormalTide => (
            "Abnormal Tide Alert".to_string(),
            "An abnormal tide has been reported in your area.".to_string(),
        ),
    }
}

/// Aggregate view over a set of active alerts.
#[derive(Debug, Serialize)]
pub struct AlertSummary {
    pub total_alerts: usize,
    pub by_severity: HashMap<String, u32>,
    pub by_type: HashMap<String, u32>,
    pub most_common_type: Option<HazardType>,
    pub highest_severity: Option<Severity>,
}

pub struct AlertManager {
    alerts: Arc<dyn AlertStore>,
    reports: Arc<dyn ReportStore>,
    users: Arc<dyn UserStore>,
    dispatcher: Arc<NotificationDispatcher>,
    publisher: Arc<dyn EventPublisher>,
    suppression_window: Duration,
    alert_ttl: Duration,
    dispatch_concurrency: usize,
}

impl AlertManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        alerts: Arc<dyn AlertStore>,
        reports: Arc<dyn ReportStore>,
        users: Arc<dyn UserStore>,
        dispatcher: Arc<NotificationDispatcher>,
        publisher: Arc<dyn EventPublisher>,
        suppression_window: Duration,
        alert_ttl: Duration,
        dispatch_concurrency: usize,
    ) -> Self {
        Self {
            alerts,
            reports,
            users,
            dispatcher,
            publisher,
            suppression_window,
            alert_ttl,
            dispatch_concurrency,
        }
    }

    /// Raise an alert, or return the active alert that suppresses it. On a
    /// fresh create the alert is published and fanned out to users.
    pub async fn create(&self, trigger: AlertTrigger) -> Result<CreateOutcome> {
        let (template_title, template_message) = template(trigger.alert_type);
        let title = trigger.title.unwrap_or(template_title);
        let mut message = trigger.message.unwrap_or(template_message);
        if let Some(context) = &trigger.location_context {
            message = format!("{message} Location: {context}");
        }

        let create = AlertCreate {
            alert_type: trigger.alert_type,
            title,
            message,
            severity: trigger.severity,
            source: trigger.source,
            affected_area: trigger.affected_area,
            ttl: trigger.ttl.unwrap_or(self.alert_ttl),
        };

        let outcome = self
            .alerts
            .create_or_active_within(create, self.suppression_window)
            .await?;

        match &outcome {
            CreateOutcome::Created(alert) => {
                info!(
                    alert_id = %alert.id,
                    alert_type = %alert.alert_type,
                    severity = %alert.severity,
                    source = ?alert.source,
                    "Alert created"
                );
                self.publisher
                    .publish_best_effort(
                        "new_alert",
                        json!({
                            "id": alert.id,
                            "alert_type": alert.alert_type,
                            "title": alert.title,
                            "message": alert.message,
                            "severity": alert.severity,
                            "source": alert.source,
                            "created_at": alert.created_at,
                            "expires_at": alert.expires_at,
                        }),
                    )
                    .await;
                if let Err(e) = self.fanout(alert).await {
                    warn!(alert_id = %alert.id, error = %e, "Alert fanout failed");
                }
            }
            CreateOutcome::Suppressed(alert) => {
                debug!(
                    alert_id = %alert.id,
                    alert_type = %alert.alert_type,
                    "Alert suppressed by active alert"
                );
            }
        }

        Ok(outcome)
    }

    /// Users an alert should reach. Currently everyone; narrowing by
    /// `affected_area` plugs in here once user locations are tracked.
    async fn target_users(&self, _alert: &Alert) -> Result<Vec<User>> {
        self.users.all_users().await
    }

    /// Create read-state rows and dispatch notifications, bounded by the
    /// concurrency limit. Returns the number of channel deliveries.
    async fn fanout(&self, alert: &Alert) -> Result<u32> {
        let users = self.target_users(alert).await?;
        let now = Utc::now();
        let semaphore = Arc::new(Semaphore::new(self.dispatch_concurrency));

        let mut handles = Vec::with_capacity(users.len());
        for user in users {
            self.alerts.add_user_alert(user.id, alert.id, now).await?;

            let permit = semaphore.clone().acquire_owned().await?;
            let dispatcher = self.dispatcher.clone();
            let alert = alert.clone();
            handles.push(tokio::spawn(async move {
                let report = dispatcher.dispatch(&alert, &user).await;
                drop(permit);
                report
            }));
        }

        let mut delivered = 0;
        for handle in handles {
            match handle.await {
                Ok(report) => delivered += report.sent_count() as u32,
                Err(e) => warn!(alert_id = %alert.id, error = %e, "Dispatch task panicked"),
            }
        }
        info!(alert_id = %alert.id, delivered, "Alert fanout complete");
        Ok(delivered)
    }

    /// Scan verified high/critical reports that have not yet produced an
    /// alert and raise one per report. Returns how many alerts were created.
    pub async fn process_report_alerts(&self) -> Result<u32> {
        let pending = self.reports.unalerted_verified(Severity::High).await?;
        let mut created = 0;
        for report in pending {
            let mut trigger =
                AlertTrigger::new(report.hazard_type, report.severity, AlertSource::Crowdsourced);
            trigger.location_context = Some(report.title.clone());
            if self.create(trigger).await?.was_created() {
                created += 1;
            }
            self.reports.mark_alerted(report.id).await?;
        }
        Ok(created)
    }

    /// Deactivate every alert past its expiry. One-way; returns the count.
    pub async fn sweep_expired(&self) -> Result<u64> {
        let deactivated = self.alerts.deactivate_expired(Utc::now()).await?;
        if deactivated > 0 {
            info!(deactivated, "Deactivated expired alerts");
        }
        Ok(deactivated)
    }

    pub async fn mark_read(&self, user_id: Uuid, alert_id: Uuid) -> Result<bool> {
        self.alerts.mark_read(user_id, alert_id).await
    }

    pub async fn user_alerts(&self, user_id: Uuid, unread_only: bool) -> Result<Vec<Alert>> {
        self.alerts.user_alerts(user_id, unread_only, Utc::now()).await
    }

    pub async fn active_alerts(&self) -> Result<Vec<Alert>> {
        self.alerts.active_alerts(Utc::now()).await
    }
}

/// Summarize a slice of alerts by severity and type.
pub fn alert_summary(alerts: &[Alert]) -> AlertSummary {
    let mut by_severity: HashMap<String, u32> = HashMap::new();
    let mut by_type: HashMap<String, u32> = HashMap::new();
    let mut type_counts: HashMap<HazardType, u32> = HashMap::new();

    for alert in alerts {
        *by_severity.entry(alert.severity.to_string()).or_default() += 1;
        *by_type.entry(alert.alert_type.to_string()).or_default() += 1;
        *type_counts.entry(alert.alert_type).or_default() += 1;
    }

    let most_common_type = type_counts
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(hazard, _)| *hazard);
    let highest_severity = alerts.iter().map(|a| a.severity).max();

    AlertSummary {
        total_alerts: alerts.len(),
        by_severity,
        by_type,
        most_common_type,
        highest_severity,
    }
}
