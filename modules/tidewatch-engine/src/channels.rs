//! Notification channel boundaries. Each channel is a small async trait
//! with a logging default implementation; real providers plug in behind
//! the same seam.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send_sms(&self, to: &str, body: &str) -> Result<()>;
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send_push(&self, user_id: Uuid, title: &str, body: &str) -> Result<()>;
}

/// Default email backend: logs the delivery instead of sending it.
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send_email(&self, to: &str, subject: &str, _body: &str) -> Result<()> {
        info!(to, subject, "Email notification (log backend)");
        Ok(())
    }
}

/// Default SMS backend: logs the delivery instead of sending it.
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send_sms(&self, to: &str, body: &str) -> Result<()> {
        info!(to, chars = body.len(), "SMS notification (log backend)");
        Ok(())
    }
}

/// Default push backend: logs the delivery instead of sending it.
pub struct LogPushSender;

#[async_trait]
impl PushSender for LogPushSender {
    async fn send_push(&self, user_id: Uuid, title: &str, _body: &str) -> Result<()> {
        info!(%user_id, title, "Push notification (log backend)");
        Ok(())
    }
}

/// SMS delivery through the Twilio Messages API.
pub struct TwilioSmsSender {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from: String,
}

impl TwilioSmsSender {
    pub fn new(
        client: reqwest::Client,
        account_sid: String,
        auth_token: String,
        from: String,
    ) -> Self {
        Self {
            client,
            account_sid,
            auth_token,
            from,
        }
    }
}

#[async_trait]
impl SmsSender for TwilioSmsSender {
    async fn send_sms(&self, to: &str, body: &str) -> Result<()> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        );
        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", &self.from), ("Body", body)])
            .send()
            .await
            .context("Twilio request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Twilio returned {status}: {body}");
        }
        Ok(())
    }
}
