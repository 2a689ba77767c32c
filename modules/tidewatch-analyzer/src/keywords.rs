use std::collections::BTreeSet;

use regex::Regex;

use tidewatch_common::HazardType;

/// Tag emitted when the general-hazard lexicon matches but no specific
/// hazard pattern does.
pub const GENERAL_HAZARD_TAG: &str = "general_hazard";

/// Words that mark generally hazard-adjacent chatter.
pub const GENERAL_HAZARD_LEXICON: [&str; 6] =
    ["hazard", "danger", "warning", "alert", "emergency", "disaster"];

/// Compiled per-hazard regex pattern groups. One instance is compiled at
/// analyzer construction and reused for every post.
pub struct PatternTable {
    groups: Vec<(HazardType, Vec<Regex>)>,
}

impl PatternTable {
    pub fn new() -> Self {
        let compile = |patterns: &[&str]| -> Vec<Regex> {
            patterns
                .iter()
                .map(|p| Regex::new(p).expect("valid hazard pattern"))
                .collect()
        };

        // Patterns run against cleaned (lowercased) text.
        let groups = vec![
            (
                HazardType::Tsunami,
                compile(&[
                    r"\b(tsunami|tidal wave|seismic wave)\b",
                    r"\b(wave height|wave size)\b.*\b(high|large|big|massive)\b",
                    r"\b(earthquake|seismic)\b.*\b(ocean|sea|coastal)\b",
                ]),
            ),
            (
                HazardType::StormSurge,
                compile(&[
                    r"\b(storm surge|storm tide)\b",
                    r"\b(coastal flooding|shore flooding)\b",
                    r"\b(water level|sea level)\b.*\b(rising|increasing|high)\b",
                ]),
            ),
            (
                HazardType::HighWaves,
                compile(&[
                    r"\b(high waves|big waves|rough seas)\b",
                    r"\b(wave height|wave size)\b.*\b(high|large|big)\b",
                    r"\b(dangerous|hazardous)\b.*\b(waves|seas)\b",
                ]),
            ),
            (
                HazardType::Flooding,
                compile(&[
                    r"\b(flood|flooding|inundation)\b",
                    r"\b(water level|water rising)\b",
                    r"\b(submerged|underwater|waterlogged)\b",
                ]),
            ),
            (
                HazardType::CoastalCurrent,
                compile(&[
                    r"\b(rip current|undertow)\b",
                    r"\b(strong current|dangerous current)\b",
                    r"\b(swimming|drowning)\b.*\b(current|undertow)\b",
                ]),
            ),
            (
                HazardType::AbnormalTide,
                compile(&[
                    r"\b(high tide|low tide|tide level)\b.*\b(abnormal|unusual|rising|higher)\b",
                    r"\babnormal\b.*\b(tide|tidal)\b",
                ]),
            ),
        ];

        Self { groups }
    }

    /// Extract the set of hazard tags matched by `cleaned` text. A post may
    /// match multiple hazard types; the general lexicon contributes a
    /// `general_hazard` tag.
    pub fn extract_tags(&self, cleaned: &str) -> BTreeSet<String> {
        let mut tags = BTreeSet::new();

        for (hazard_type, patterns) in &self.groups {
            if patterns.iter().any(|p| p.is_match(cleaned)) {
                tags.insert(hazard_type.to_string());
            }
        }

        if GENERAL_HAZARD_LEXICON.iter().any(|kw| cleaned.contains(kw)) {
            tags.insert(GENERAL_HAZARD_TAG.to_string());
        }

        tags
    }

    /// Whether any hazard-type pattern (not the general lexicon) matches.
    pub fn any_pattern_match(&self, cleaned: &str) -> bool {
        self.groups
            .iter()
            .any(|(_, patterns)| patterns.iter().any(|p| p.is_match(cleaned)))
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tsunami_text_tags_tsunami() {
        let table = PatternTable::new();
        let tags = table.extract_tags("tsunami warning issued for coastal areas");
        assert!(tags.contains("tsunami"));
        assert!(tags.contains(GENERAL_HAZARD_TAG)); // "warning"
    }

    #[test]
    fn post_may_match_multiple_hazard_types() {
        let table = PatternTable::new();
        let tags = table.extract_tags("storm surge and coastal flooding, water level rising fast");
        assert!(tags.contains("storm_surge"));
        assert!(tags.contains("flooding"));
    }

    #[test]
    fn benign_text_matches_nothing() {
        let table = PatternTable::new();
        let tags = table.extract_tags("beautiful sunny day at the beach. perfect for swimming.");
        assert!(tags.is_empty());
        assert!(!table.any_pattern_match(
            "beautiful sunny day at the beach. perfect for swimming."
        ));
    }

    #[test]
    fn general_lexicon_alone_yields_general_tag_only() {
        let table = PatternTable::new();
        let tags = table.extract_tags("stay alert near the pier today");
        assert_eq!(tags.len(), 1);
        assert!(tags.contains(GENERAL_HAZARD_TAG));
    }
}
