//! Aggregate views over stored signals: trending keywords, sentiment
//! distribution, and the combined risk score.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use tidewatch_common::{AnalyzedSignal, HazardReport, Severity};

/// Sentiment band half-width: scores within ±0.1 of zero are neutral.
const NEUTRAL_BAND: f64 = 0.1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingKeyword {
    pub keyword: String,
    pub count: u64,
    /// count / number of signals in the window.
    pub frequency: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentimentTrends {
    pub average_sentiment: f64,
    pub total_posts: u64,
    pub positive_posts: u64,
    pub negative_posts: u64,
    pub neutral_posts: u64,
    /// Fractions over total_posts; all zero when there are no signals.
    pub positive_fraction: f64,
    pub negative_fraction: f64,
    pub neutral_fraction: f64,
}

/// Rank hazard keyword tags by how often they appear across signals.
pub fn trending_keywords(signals: &[AnalyzedSignal], limit: usize) -> Vec<TrendingKeyword> {
    if signals.is_empty() {
        return Vec::new();
    }

    let mut counts: HashMap<&str, u64> = HashMap::new();
    for signal in signals {
        for keyword in &signal.hazard_keywords {
            *counts.entry(keyword.as_str()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(&str, u64)> = counts.into_iter().collect();
    // Count descending, keyword ascending for a stable order.
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let total = signals.len() as f64;
    ranked
        .into_iter()
        .take(limit)
        .map(|(keyword, count)| TrendingKeyword {
            keyword: keyword.to_string(),
            count,
            frequency: count as f64 / total,
        })
        .collect()
}

/// Average sentiment and the positive/negative/neutral split using the
/// ±0.1 band.
pub fn sentiment_trends(signals: &[AnalyzedSignal]) -> SentimentTrends {
    if signals.is_empty() {
        return SentimentTrends::default();
    }

    let total = signals.len() as u64;
    let sum: f64 = signals.iter().map(|s| s.sentiment_score).sum();
    let positive = signals
        .iter()
        .filter(|s| s.sentiment_score > NEUTRAL_BAND)
        .count() as u64;
    let negative = signals
        .iter()
        .filter(|s| s.sentiment_score < -NEUTRAL_BAND)
        .count() as u64;
    let neutral = total - positive - negative;

    SentimentTrends {
        average_sentiment: sum / total as f64,
        total_posts: total,
        positive_posts: positive,
        negative_posts: negative,
        neutral_posts: neutral,
        positive_fraction: positive as f64 / total as f64,
        negative_fraction: negative as f64 / total as f64,
        neutral_fraction: neutral as f64 / total as f64,
    }
}

/// Combined risk score over recent signals and reports, capped at 1.0:
/// up to 0.5 from high-probability posts (0.1 each), 0.3 per critical
/// verified report, 0.2 per high verified report.
pub fn risk_score(signals: &[AnalyzedSignal], reports: &[HazardReport]) -> f64 {
    let mut score = 0.0;

    let high_probability = signals
        .iter()
        .filter(|s| s.hazard_probability > 0.7)
        .count();
    score += (high_probability as f64 * 0.1).min(0.5);

    for report in reports.iter().filter(|r| r.is_verified) {
        match report.severity {
            Severity::Critical => score += 0.3,
            Severity::High => score += 0.2,
            _ => {}
        }
    }

    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use chrono::Utc;
    use uuid::Uuid;

    use tidewatch_common::{GeoPoint, HazardType, Platform, Post};

    fn signal(keywords: &[&str], sentiment: f64, probability: f64) -> AnalyzedSignal {
        AnalyzedSignal {
            id: Uuid::new_v4(),
            post: Post {
                platform: Platform::Mock,
                external_id: Uuid::new_v4().to_string(),
                content: String::new(),
                author: None,
                location: None,
                engagement: Default::default(),
                created_at: Utc::now(),
            },
            hazard_keywords: keywords.iter().map(|k| k.to_string()).collect::<BTreeSet<_>>(),
            sentiment_score: sentiment,
            hazard_probability: probability,
            processed_at: Utc::now(),
        }
    }

    fn verified_report(severity: Severity) -> HazardReport {
        let now = Utc::now();
        HazardReport {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "report".to_string(),
            description: String::new(),
            hazard_type: HazardType::Flooding,
            severity,
            location: GeoPoint { lat: 13.0, lng: 80.0 },
            media_urls: vec![],
            is_verified: true,
            verified_by: Some(Uuid::new_v4()),
            verified_at: Some(now),
            created_at: now,
        }
    }

    #[test]
    fn trending_keywords_ranked_by_count() {
        let signals = vec![
            signal(&["tsunami", "general_hazard"], -0.5, 0.8),
            signal(&["tsunami"], -0.3, 0.6),
            signal(&["flooding"], -0.2, 0.4),
        ];
        let trending = trending_keywords(&signals, 10);
        assert_eq!(trending[0].keyword, "tsunami");
        assert_eq!(trending[0].count, 2);
        assert!((trending[0].frequency - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(trending.len(), 3);

        let top_one = trending_keywords(&signals, 1);
        assert_eq!(top_one.len(), 1);
    }

    #[test]
    fn trending_keywords_empty_input() {
        assert!(trending_keywords(&[], 10).is_empty());
    }

    #[test]
    fn sentiment_distribution_uses_neutral_band() {
        let signals = vec![
            signal(&[], 0.5, 0.3),   // positive
            signal(&[], 0.05, 0.3),  // neutral (inside band)
            signal(&[], -0.05, 0.3), // neutral
            signal(&[], -0.6, 0.3),  // negative
        ];
        let trends = sentiment_trends(&signals);
        assert_eq!(trends.total_posts, 4);
        assert_eq!(trends.positive_posts, 1);
        assert_eq!(trends.negative_posts, 1);
        assert_eq!(trends.neutral_posts, 2);
        assert!((trends.neutral_fraction - 0.5).abs() < 1e-9);
        assert!((trends.average_sentiment - (0.5 + 0.05 - 0.05 - 0.6) / 4.0).abs() < 1e-9);
    }

    #[test]
    fn sentiment_trends_empty_input() {
        let trends = sentiment_trends(&[]);
        assert_eq!(trends.total_posts, 0);
        assert_eq!(trends.average_sentiment, 0.0);
    }

    #[test]
    fn risk_score_combines_posts_and_reports() {
        let signals: Vec<AnalyzedSignal> =
            (0..8).map(|_| signal(&["tsunami"], -0.5, 0.9)).collect();
        let reports = vec![
            verified_report(Severity::Critical),
            verified_report(Severity::High),
        ];
        // Posts contribute min(8 * 0.1, 0.5) = 0.5; reports 0.3 + 0.2.
        let score = risk_score(&signals, &reports);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unverified_reports_do_not_count() {
        let mut report = verified_report(Severity::Critical);
        report.is_verified = false;
        assert_eq!(risk_score(&[], &[report]), 0.0);
    }
}
