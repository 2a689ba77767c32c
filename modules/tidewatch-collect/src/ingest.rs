//! Ingest cycle: fan out to collectors, analyze each post, and persist the
//! signals that clear the storage threshold.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use tidewatch_analyzer::HazardAnalyzer;
use tidewatch_common::types::AnalyzedSignal;
use tidewatch_store::{EventPublisher, SignalStore};

use crate::collectors::SocialCollector;

/// Posts below this probability are analyzed but not persisted.
pub const STORAGE_THRESHOLD: f64 = 0.2;

/// Counters from one ingest cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestStats {
    pub collected: u32,
    pub duplicates: u32,
    pub below_threshold: u32,
    pub stored: u32,
    pub source_errors: u32,
}

impl std::fmt::Display for IngestStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "collected={} duplicates={} below_threshold={} stored={} source_errors={}",
            self.collected, self.duplicates, self.below_threshold, self.stored, self.source_errors
        )
    }
}

pub struct Ingestor {
    analyzer: Arc<HazardAnalyzer>,
    signals: Arc<dyn SignalStore>,
    publisher: Arc<dyn EventPublisher>,
    /// Budget for one collector's whole batch. A slow platform must not
    /// stall the cycle for the others.
    source_timeout: Duration,
}

impl Ingestor {
    pub fn new(
        analyzer: Arc<HazardAnalyzer>,
        signals: Arc<dyn SignalStore>,
        publisher: Arc<dyn EventPublisher>,
        source_timeout: Duration,
    ) -> Self {
        Self {
            analyzer,
            signals,
            publisher,
            source_timeout,
        }
    }

    /// Run one collection cycle across all sources. Collector failures and
    /// timeouts count against `source_errors`; they never abort the cycle.
    pub async fn run_cycle(&self, collectors: &[Arc<dyn SocialCollector>]) -> IngestStats {
        let mut stats = IngestStats::default();

        let mut handles = Vec::with_capacity(collectors.len());
        for collector in collectors {
            let collector = collector.clone();
            let timeout = self.source_timeout;
            handles.push(tokio::spawn(async move {
                let platform = collector.platform();
                let result = tokio::time::timeout(timeout, collector.collect()).await;
                (platform, result)
            }));
        }

        for handle in handles {
            let (platform, result) = match handle.await {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "Collector task panicked");
                    stats.source_errors += 1;
                    continue;
                }
            };

            let posts = match result {
                Ok(Ok(posts)) => posts,
                Ok(Err(e)) => {
                    warn!(%platform, error = %e, "Collector failed");
                    stats.source_errors += 1;
                    continue;
                }
                Err(_) => {
                    warn!(%platform, timeout_secs = self.source_timeout.as_secs(), "Collector timed out");
                    stats.source_errors += 1;
                    continue;
                }
            };

            stats.collected += posts.len() as u32;
            for post in posts {
                if let Err(e) = self.ingest_post(post, &mut stats).await {
                    warn!(%platform, error = %e, "Failed to ingest post");
                    stats.source_errors += 1;
                }
            }
        }

        info!(%stats, "Ingest cycle complete");
        stats
    }

    async fn ingest_post(
        &self,
        post: tidewatch_common::types::Post,
        stats: &mut IngestStats,
    ) -> Result<()> {
        // Cheap pre-analysis check; the insert below is the authoritative
        // dedup gate under concurrency.
        if self
            .signals
            .contains(post.platform, &post.external_id)
            .await?
        {
            stats.duplicates += 1;
            return Ok(());
        }

        let analysis = self.analyzer.analyze(&post.content);
        if analysis.hazard_probability < STORAGE_THRESHOLD {
            stats.below_threshold += 1;
            return Ok(());
        }

        let signal = AnalyzedSignal {
            id: Uuid::new_v4(),
            post,
            hazard_keywords: analysis.hazard_keywords,
            sentiment_score: analysis.sentiment_score,
            hazard_probability: analysis.hazard_probability,
            processed_at: Utc::now(),
        };

        let payload = json!({
            "id": signal.id,
            "platform": signal.post.platform,
            "hazard_probability": signal.hazard_probability,
            "sentiment_score": signal.sentiment_score,
        });

        if self.signals.insert_if_absent(signal).await? {
            stats.stored += 1;
            self.publisher.publish_best_effort("new_signal", payload).await;
        } else {
            stats.duplicates += 1;
        }
        Ok(())
    }
}
