use std::sync::OnceLock;

use regex::Regex;

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"http\S+|www\S+").expect("valid regex"))
}

fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Strip the @/# marker but keep the word itself.
    RE.get_or_init(|| Regex::new(r"[@#](\w+)").expect("valid regex"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Clean raw social-media text for analysis: lowercase, strip URLs, strip
/// mention/hashtag markers (keeping the underlying word), collapse
/// whitespace, and drop punctuation other than `. , ! ?`.
pub fn clean(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = text.to_lowercase();
    let text = url_re().replace_all(&text, "");
    let text = marker_re().replace_all(&text, "$1");

    let text: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '.' | ',' | '!' | '?'))
        .collect();

    whitespace_re().replace_all(text.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_collapses_whitespace() {
        assert_eq!(clean("High   WAVES  today"), "high waves today");
    }

    #[test]
    fn strips_urls() {
        assert_eq!(
            clean("flooding reported http://example.com/a?b=1 near shore"),
            "flooding reported near shore"
        );
        assert_eq!(clean("see www.incois.gov.in now"), "see now");
    }

    #[test]
    fn keeps_words_behind_mention_and_hashtag_markers() {
        // Underscores fall to the punctuation filter along with the marker.
        assert_eq!(
            clean("@coastal_observer high waves #OceanHazard #Chennai"),
            "coastalobserver high waves oceanhazard chennai"
        );
    }

    #[test]
    fn keeps_basic_punctuation_only() {
        assert_eq!(
            clean("Danger!! Waves ~3m (huge); evacuate?"),
            "danger!! waves 3m huge evacuate?"
        );
    }

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(clean(""), "");
    }
}
