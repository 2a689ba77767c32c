use std::sync::Arc;

use anyhow::Result;
use chrono::Duration as ChronoDuration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tidewatch_analyzer::HazardAnalyzer;
use tidewatch_collect::{
    FacebookCollector, Ingestor, MockCollector, SocialCollector, TwitterCollector,
    YoutubeCollector,
};
use tidewatch_common::Config;
use tidewatch_engine::{
    AlertManager, FeedSync, HotspotAggregator, HttpFeedClient, JobRunner, LogEmailSender,
    LogPushSender, LogSmsSender, NotificationDispatcher, SingleFlight, SmsSender,
    TwilioSmsSender,
};
use tidewatch_store::{
    LogPublisher, MemoryAlertStore, MemoryHotspotStore, MemoryReportStore, MemorySignalStore,
    MemoryUserStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tidewatch=info".parse()?))
        .init();

    info!("Tidewatch starting...");

    let config = Config::from_env();
    let http = reqwest::Client::builder()
        .timeout(config.source_timeout)
        .build()?;

    // Stores and publish boundary. In-memory backends serve the
    // single-process deployment; swap in database-backed implementations
    // behind the same traits.
    let signals = Arc::new(MemorySignalStore::new());
    let reports = Arc::new(MemoryReportStore::new());
    let alerts = Arc::new(MemoryAlertStore::new());
    let hotspots = Arc::new(MemoryHotspotStore::new());
    let users = Arc::new(MemoryUserStore::new());
    let publisher = Arc::new(LogPublisher);

    // Collection and analysis.
    let analyzer = Arc::new(HazardAnalyzer::new());
    let mut collectors: Vec<Arc<dyn SocialCollector>> = vec![
        Arc::new(TwitterCollector::new(
            http.clone(),
            config.twitter_bearer_token.clone(),
        )),
        Arc::new(FacebookCollector::new(
            http.clone(),
            config.facebook_access_token.clone(),
        )),
        Arc::new(YoutubeCollector::new(
            http.clone(),
            config.youtube_api_key.clone(),
        )),
    ];
    if config.twitter_bearer_token.is_none()
        && config.facebook_access_token.is_none()
        && config.youtube_api_key.is_none()
    {
        info!("No social APIs configured, using mock collector");
        collectors.push(Arc::new(MockCollector));
    }
    let ingestor = Arc::new(Ingestor::new(
        analyzer,
        signals.clone(),
        publisher.clone(),
        config.source_timeout,
    ));

    // Alerting. SMS goes through Twilio when credentials are present,
    // otherwise through the log backend like the other channels.
    let sms: Arc<dyn SmsSender> = match (
        config.twilio_account_sid.clone(),
        config.twilio_auth_token.clone(),
        config.twilio_from.clone(),
    ) {
        (Some(sid), Some(token), Some(from)) => {
            info!("Twilio SMS configured");
            Arc::new(TwilioSmsSender::new(http.clone(), sid, token, from))
        }
        _ => Arc::new(LogSmsSender),
    };
    let dispatcher = Arc::new(NotificationDispatcher::new(
        Arc::new(LogEmailSender),
        sms,
        Arc::new(LogPushSender),
    ));
    let manager = Arc::new(AlertManager::new(
        alerts,
        reports.clone(),
        users,
        dispatcher,
        publisher,
        ChronoDuration::minutes(config.suppression_window_minutes),
        ChronoDuration::hours(config.alert_ttl_hours),
        config.dispatch_concurrency,
    ));
    let aggregator = Arc::new(HotspotAggregator::new(
        reports,
        signals,
        hotspots,
        config.hotspot_radius_km,
        ChronoDuration::hours(config.signal_window_hours),
        ChronoDuration::hours(config.hotspot_ttl_hours),
    ));
    let feed_sync = Arc::new(FeedSync::new(
        Arc::new(HttpFeedClient::new(
            http,
            config.feed_base_url.clone(),
            config.feed_api_key.clone(),
        )),
        manager.clone(),
    ));

    let mut jobs = JobRunner::new();
    let backoff = config.job_error_backoff;

    {
        let ingestor = ingestor.clone();
        jobs.spawn("ingest", config.ingest_interval, backoff, move || {
            let ingestor = ingestor.clone();
            let collectors = collectors.clone();
            async move {
                ingestor.run_cycle(&collectors).await;
                Ok(())
            }
        });
    }
    {
        let manager = manager.clone();
        jobs.spawn("alert_sweep", config.cleanup_interval, backoff, move || {
            let manager = manager.clone();
            async move {
                manager.sweep_expired().await?;
                Ok(())
            }
        });
    }
    {
        let manager = manager.clone();
        let aggregator = aggregator.clone();
        jobs.spawn("report_scan", config.report_scan_interval, backoff, move || {
            let manager = manager.clone();
            let aggregator = aggregator.clone();
            async move {
                manager.process_report_alerts().await?;
                aggregator.run().await?;
                Ok(())
            }
        });
    }
    {
        let feed_sync = feed_sync.clone();
        let guard = Arc::new(SingleFlight::new());
        jobs.spawn("feed_sync", config.feed_sync_interval, backoff, move || {
            let feed_sync = feed_sync.clone();
            let guard = guard.clone();
            async move {
                guard.run("feed_sync", feed_sync.run()).await?;
                Ok(())
            }
        });
    }

    info!("Tidewatch running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    jobs.shutdown();
    Ok(())
}
