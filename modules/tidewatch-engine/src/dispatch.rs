//! Per-user notification dispatch across the email, SMS and push channels.

use std::sync::Arc;

use tracing::warn;

use tidewatch_common::types::{Alert, User};

use crate::channels::{EmailSender, PushSender, SmsSender};

/// Outcome of one channel attempt. Channels a user has no address for are
/// skipped, not failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    Sent,
    Skipped,
    Failed(String),
}

impl ChannelOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, ChannelOutcome::Sent)
    }
}

/// What happened when one alert was dispatched to one user.
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub user_id: uuid::Uuid,
    pub email: ChannelOutcome,
    pub sms: ChannelOutcome,
    pub push: ChannelOutcome,
}

impl DeliveryReport {
    pub fn sent_count(&self) -> usize {
        [&self.email, &self.sms, &self.push]
            .into_iter()
            .filter(|o| o.is_sent())
            .count()
    }
}

pub struct NotificationDispatcher {
    email: Arc<dyn EmailSender>,
    sms: Arc<dyn SmsSender>,
    push: Arc<dyn PushSender>,
}

impl NotificationDispatcher {
    pub fn new(
        email: Arc<dyn EmailSender>,
        sms: Arc<dyn SmsSender>,
        push: Arc<dyn PushSender>,
    ) -> Self {
        Self { email, sms, push }
    }

    /// Attempt all three channels concurrently. A failed channel is
    /// recorded in the report and logged; dispatch itself never errors.
    pub async fn dispatch(&self, alert: &Alert, user: &User) -> DeliveryReport {
        let subject = format!("Alert: {}", alert.title);
        let sms_body = format!("ALERT: {} - {}", alert.title, alert.message);

        let email_fut = async {
            match &user.email {
                Some(address) => match self.email.send_email(address, &subject, &alert.message).await
                {
                    Ok(()) => ChannelOutcome::Sent,
                    Err(e) => ChannelOutcome::Failed(e.to_string()),
                },
                None => ChannelOutcome::Skipped,
            }
        };
        let sms_fut = async {
            match &user.phone {
                Some(number) => match self.sms.send_sms(number, &sms_body).await {
                    Ok(()) => ChannelOutcome::Sent,
                    Err(e) => ChannelOutcome::Failed(e.to_string()),
                },
                None => ChannelOutcome::Skipped,
            }
        };
        let push_fut = async {
            match self
                .push
                .send_push(user.id, &alert.title, &alert.message)
                .await
            {
                Ok(()) => ChannelOutcome::Sent,
                Err(e) => ChannelOutcome::Failed(e.to_string()),
            }
        };

        let (email, sms, push) = tokio::join!(email_fut, sms_fut, push_fut);

        for (channel, outcome) in [("email", &email), ("sms", &sms), ("push", &push)] {
            if let ChannelOutcome::Failed(error) = outcome {
                warn!(user_id = %user.id, alert_id = %alert.id, channel, error, "Notification channel failed");
            }
        }

        DeliveryReport {
            user_id: user.id,
            email,
            sms,
            push,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::sync::Mutex;
    use uuid::Uuid;

    use tidewatch_common::types::{AlertSource, HazardType, Severity};

    use crate::channels::{LogPushSender, LogSmsSender};

    struct FailingEmail;

    #[async_trait]
    impl EmailSender for FailingEmail {
        async fn send_email(&self, _to: &str, _subject: &str, _body: &str) -> Result<()> {
            anyhow::bail!("smtp unreachable")
        }
    }

    struct RecordingSms(Mutex<Vec<String>>);

    #[async_trait]
    impl SmsSender for RecordingSms {
        async fn send_sms(&self, to: &str, _body: &str) -> Result<()> {
            self.0.lock().unwrap().push(to.to_string());
            Ok(())
        }
    }

    fn make_alert() -> Alert {
        let now = Utc::now();
        Alert {
            id: Uuid::new_v4(),
            alert_type: HazardType::Tsunami,
            title: "Tsunami Alert".to_string(),
            message: "Move to higher ground immediately.".to_string(),
            severity: Severity::Critical,
            source: AlertSource::System,
            affected_area: None,
            is_active: true,
            created_at: now,
            expires_at: now + Duration::hours(24),
        }
    }

    fn make_user(email: Option<&str>, phone: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            registered_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn failed_email_does_not_block_other_channels() {
        let sms = Arc::new(RecordingSms(Mutex::new(Vec::new())));
        let dispatcher = NotificationDispatcher::new(
            Arc::new(FailingEmail),
            sms.clone(),
            Arc::new(LogPushSender),
        );

        let report = dispatcher
            .dispatch(&make_alert(), &make_user(Some("a@example.org"), Some("+911234567890")))
            .await;

        assert!(matches!(report.email, ChannelOutcome::Failed(_)));
        assert_eq!(report.sms, ChannelOutcome::Sent);
        assert_eq!(report.push, ChannelOutcome::Sent);
        assert_eq!(report.sent_count(), 2);
        assert_eq!(sms.0.lock().unwrap().as_slice(), ["+911234567890"]);
    }

    #[tokio::test]
    async fn missing_addresses_skip_channels() {
        let dispatcher = NotificationDispatcher::new(
            Arc::new(FailingEmail),
            Arc::new(LogSmsSender),
            Arc::new(LogPushSender),
        );

        let report = dispatcher.dispatch(&make_alert(), &make_user(None, None)).await;

        assert_eq!(report.email, ChannelOutcome::Skipped);
        assert_eq!(report.sms, ChannelOutcome::Skipped);
        assert_eq!(report.push, ChannelOutcome::Sent);
    }
}
