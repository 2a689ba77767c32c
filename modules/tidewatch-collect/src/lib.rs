//! Social-media collection and the ingest pipeline that turns raw posts
//! into stored, analyzed signals.

pub mod collectors;
pub mod ingest;

pub use collectors::{
    FacebookCollector, MockCollector, SocialCollector, TwitterCollector, YoutubeCollector,
};
pub use ingest::{IngestStats, Ingestor};
