use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Fire-and-forget real-time publish boundary (dashboards, websockets).
/// At-most-once from the pipeline's perspective; a failed publish never
/// fails the operation that triggered it.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<()>;

    /// Publish and swallow failures with a warning. This is the call sites'
    /// entry point — publishing is always best-effort.
    async fn publish_best_effort(&self, topic: &str, payload: serde_json::Value) {
        if let Err(e) = self.publish(topic, payload).await {
            warn!(topic, error = %e, "Failed to publish event");
        }
    }
}

/// Publisher that logs events instead of delivering them. Default backend
/// when no pub/sub system is configured.
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<()> {
        debug!(topic, %payload, "Event published");
        Ok(())
    }
}

/// Publisher that drops everything.
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, _topic: &str, _payload: serde_json::Value) -> Result<()> {
        Ok(())
    }
}
