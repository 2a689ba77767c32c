use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables.
/// Collector and feed credentials are optional — an unconfigured source
/// simply yields nothing.
#[derive(Debug, Clone)]
pub struct Config {
    // Social collectors
    pub twitter_bearer_token: Option<String>,
    pub facebook_access_token: Option<String>,
    pub youtube_api_key: Option<String>,

    // External early-warning feed
    pub feed_base_url: String,
    pub feed_api_key: Option<String>,

    // SMS delivery (log backend when unset)
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_from: Option<String>,

    // Pipeline tuning
    pub source_timeout: Duration,
    pub signal_window_hours: i64,
    pub hotspot_radius_km: f64,
    pub hotspot_ttl_hours: i64,
    pub alert_ttl_hours: i64,
    pub suppression_window_minutes: i64,
    pub dispatch_concurrency: usize,

    // Job cadences
    pub ingest_interval: Duration,
    pub cleanup_interval: Duration,
    pub feed_sync_interval: Duration,
    pub report_scan_interval: Duration,
    pub job_error_backoff: Duration,
}

impl Config {
    /// Load configuration from environment variables with defaults matching
    /// the production deployment.
    pub fn from_env() -> Self {
        Self {
            twitter_bearer_token: env::var("TWITTER_BEARER_TOKEN").ok(),
            facebook_access_token: env::var("FACEBOOK_ACCESS_TOKEN").ok(),
            youtube_api_key: env::var("YOUTUBE_API_KEY").ok(),
            feed_base_url: env::var("FEED_BASE_URL")
                .unwrap_or_else(|_| "https://www.incois.gov.in".to_string()),
            feed_api_key: env::var("FEED_API_KEY").ok(),
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID").ok(),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").ok(),
            twilio_from: env::var("TWILIO_FROM").ok(),
            source_timeout: Duration::from_secs(env_u64("SOURCE_TIMEOUT_SECS", 30)),
            signal_window_hours: env_u64("SIGNAL_WINDOW_HOURS", 24) as i64,
            hotspot_radius_km: env::var("HOTSPOT_RADIUS_KM")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5.0),
            hotspot_ttl_hours: env_u64("HOTSPOT_TTL_HOURS", 6) as i64,
            alert_ttl_hours: env_u64("ALERT_TTL_HOURS", 24) as i64,
            suppression_window_minutes: env_u64("SUPPRESSION_WINDOW_MINUTES", 60) as i64,
            dispatch_concurrency: env_u64("DISPATCH_CONCURRENCY", 16) as usize,
            ingest_interval: Duration::from_secs(env_u64("INGEST_INTERVAL_SECS", 900)),
            cleanup_interval: Duration::from_secs(env_u64("CLEANUP_INTERVAL_SECS", 3600)),
            feed_sync_interval: Duration::from_secs(env_u64("FEED_SYNC_INTERVAL_SECS", 900)),
            report_scan_interval: Duration::from_secs(env_u64("REPORT_SCAN_INTERVAL_SECS", 3600)),
            job_error_backoff: Duration::from_secs(env_u64("JOB_ERROR_BACKOFF_SECS", 300)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
