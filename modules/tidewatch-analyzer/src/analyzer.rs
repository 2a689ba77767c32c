use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::keywords::PatternTable;
use crate::{preprocess, sentiment};

/// Urgency markers counted as substrings of the cleaned text, so
/// "immediately" counts for "immediate".
const URGENCY_KEYWORDS: [&str; 5] = ["urgent", "immediate", "emergency", "critical", "warning"];

/// Classification threshold for the single-item analysis surface. Storage
/// uses a lower bar (0.2) so weak signal survives for trend aggregation.
pub const HAZARD_RELATED_THRESHOLD: f64 = 0.5;

/// Output of analyzing one piece of text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextAnalysis {
    pub processed_text: String,
    pub hazard_keywords: BTreeSet<String>,
    pub sentiment_score: f64,
    pub hazard_probability: f64,
    pub is_hazard_related: bool,
}

/// The text-analysis engine. Construction compiles the hazard pattern
/// tables once; `analyze` is pure and side-effect-free after that.
pub struct HazardAnalyzer {
    patterns: PatternTable,
}

impl HazardAnalyzer {
    pub fn new() -> Self {
        Self {
            patterns: PatternTable::new(),
        }
    }

    pub fn analyze(&self, text: &str) -> TextAnalysis {
        let processed_text = preprocess::clean(text);
        let hazard_keywords = self.patterns.extract_tags(&processed_text);
        let sentiment_score = sentiment::compound_score(&processed_text);
        let hazard_probability = self.probability(&processed_text, &hazard_keywords, sentiment_score);

        TextAnalysis {
            processed_text,
            hazard_keywords,
            sentiment_score,
            hazard_probability,
            is_hazard_related: hazard_probability > HAZARD_RELATED_THRESHOLD,
        }
    }

    /// Additive probability model, clamped to [0, 1]:
    /// +0.3 for any keyword tag, +0.2 if any hazard pattern matches (once),
    /// +0.1 per urgency keyword capped at +0.3, +0.2 for negative sentiment.
    fn probability(
        &self,
        cleaned: &str,
        keywords: &BTreeSet<String>,
        sentiment_score: f64,
    ) -> f64 {
        if cleaned.is_empty() {
            return 0.0;
        }

        let mut probability = 0.0;

        if !keywords.is_empty() {
            probability += 0.3;
        }

        if self.patterns.any_pattern_match(cleaned) {
            probability += 0.2;
        }

        let urgency_count = URGENCY_KEYWORDS
            .iter()
            .filter(|kw| cleaned.contains(*kw))
            .count();
        probability += (urgency_count as f64 * 0.1).min(0.3);

        if sentiment_score < -0.1 {
            probability += 0.2;
        }

        probability.clamp(0.0, 1.0)
    }
}

impl Default for HazardAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tsunami_warning_is_hazard_related() {
        let analyzer = HazardAnalyzer::new();
        let result =
            analyzer.analyze("Tsunami warning issued for coastal areas. Evacuate immediately!");

        assert!(result.hazard_keywords.contains("tsunami"));
        assert!(
            result.hazard_probability > 0.5,
            "probability {} should exceed 0.5",
            result.hazard_probability
        );
        assert!(result.is_hazard_related);
    }

    #[test]
    fn beach_day_is_not_hazard_related() {
        let analyzer = HazardAnalyzer::new();
        let result = analyzer.analyze("Beautiful sunny day at the beach. Perfect for swimming.");

        assert!(result.hazard_keywords.is_empty());
        assert!(
            result.hazard_probability <= 0.3,
            "probability {} should be at most 0.3",
            result.hazard_probability
        );
        assert!(!result.is_hazard_related);
    }

    #[test]
    fn outputs_stay_in_range() {
        let analyzer = HazardAnalyzer::new();
        let inputs = [
            "",
            "!!!",
            "URGENT EMERGENCY CRITICAL WARNING tsunami flood storm surge disaster!!!!",
            "la marée est haute",
            "@user #flood http://x.co/y water level rising, submerged streets, evacuate",
        ];
        for input in inputs {
            let result = analyzer.analyze(input);
            assert!(
                (0.0..=1.0).contains(&result.hazard_probability),
                "probability out of range for {input:?}"
            );
            assert!(
                (-1.0..=1.0).contains(&result.sentiment_score),
                "sentiment out of range for {input:?}"
            );
        }
    }

    #[test]
    fn analysis_is_deterministic() {
        let analyzer = HazardAnalyzer::new();
        let text = "Storm surge warning issued for coastal areas. Residents advised to stay away.";
        let a = analyzer.analyze(text);
        let b = analyzer.analyze(text);
        assert_eq!(a.processed_text, b.processed_text);
        assert_eq!(a.hazard_keywords, b.hazard_keywords);
        assert_eq!(a.sentiment_score, b.sentiment_score);
        assert_eq!(a.hazard_probability, b.hazard_probability);
    }

    #[test]
    fn urgency_contribution_is_capped() {
        let analyzer = HazardAnalyzer::new();
        // All five urgency words, no hazard-type pattern: 0.3 (general tag)
        // + 0.3 (urgency capped, would be 0.5 uncapped) + 0.2 (negative
        // sentiment) = 0.8.
        let result = analyzer.analyze("urgent immediate emergency critical warning");
        assert!((result.hazard_probability - 0.8).abs() < 1e-9);
    }

    #[test]
    fn empty_text_scores_zero() {
        let analyzer = HazardAnalyzer::new();
        let result = analyzer.analyze("");
        assert_eq!(result.hazard_probability, 0.0);
        assert_eq!(result.sentiment_score, 0.0);
        assert!(result.hazard_keywords.is_empty());
        assert!(!result.is_hazard_related);
    }
}
