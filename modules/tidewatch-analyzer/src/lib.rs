//! Pure text analysis: preprocessing, hazard keyword extraction, sentiment,
//! and the additive hazard-probability model. No state, no I/O — analyzing
//! the same text twice always yields the same output.

pub mod analyzer;
pub mod keywords;
pub mod preprocess;
pub mod sentiment;
pub mod trends;

pub use analyzer::{HazardAnalyzer, TextAnalysis};
pub use trends::{risk_score, sentiment_trends, trending_keywords, SentimentTrends, TrendingKeyword};
