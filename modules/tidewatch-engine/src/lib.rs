//! Pipeline engine: hotspot aggregation, the alert lifecycle, external
//! early-warning feed sync, notification dispatch, and periodic jobs.

pub mod alerts;
pub mod channels;
pub mod dispatch;
pub mod feed;
pub mod hotspot;
pub mod jobs;

pub use alerts::{alert_summary, AlertManager, AlertSummary, AlertTrigger};
pub use channels::{
    EmailSender, LogEmailSender, LogPushSender, LogSmsSender, PushSender, SmsSender,
    TwilioSmsSender,
};
pub use dispatch::{ChannelOutcome, DeliveryReport, NotificationDispatcher};
pub use feed::{
    map_feed_severity, FeedAlertItem, FeedClient, FeedSync, FeedSyncStats, HttpFeedClient,
};
pub use hotspot::HotspotAggregator;
pub use jobs::{JobRunner, SingleFlight};
