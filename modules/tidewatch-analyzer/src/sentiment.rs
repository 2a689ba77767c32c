//! Lexicon/rule sentiment scoring in the VADER manner: word valences,
//! negation flips, booster words, and exclamation emphasis, folded into a
//! normalized compound score. Not ML-trained, fully deterministic.

/// Valence lexicon tuned for hazard chatter. Values roughly follow the
/// VADER scale (-4..4).
const LEXICON: &[(&str, f64)] = &[
    // Positive
    ("good", 1.9),
    ("great", 3.1),
    ("beautiful", 2.9),
    ("perfect", 2.7),
    ("safe", 1.9),
    ("safely", 1.9),
    ("calm", 1.3),
    ("clear", 1.1),
    ("peaceful", 2.2),
    ("normal", 1.2),
    ("fine", 1.2),
    ("help", 1.7),
    ("helped", 1.7),
    ("rescued", 2.0),
    ("relief", 1.6),
    ("recovered", 1.4),
    // Negative
    ("danger", -2.4),
    ("dangerous", -2.7),
    ("hazard", -1.9),
    ("hazardous", -2.6),
    ("risky", -1.6),
    ("risk", -1.1),
    ("threat", -2.1),
    ("threatening", -2.4),
    ("alarming", -2.0),
    ("warning", -1.4),
    ("emergency", -2.3),
    ("urgent", -1.0),
    ("critical", -1.7),
    ("disaster", -3.1),
    ("damage", -2.2),
    ("damaged", -2.2),
    ("destroyed", -3.1),
    ("evacuate", -1.4),
    ("evacuation", -1.4),
    ("fear", -2.2),
    ("afraid", -2.2),
    ("scared", -2.2),
    ("scary", -2.2),
    ("panic", -2.6),
    ("death", -3.3),
    ("dead", -3.3),
    ("died", -3.1),
    ("drowning", -3.0),
    ("drowned", -3.1),
    ("injured", -2.4),
    ("trapped", -2.3),
    ("stranded", -2.0),
    ("terrible", -3.0),
    ("horrible", -3.0),
    ("bad", -2.5),
    ("worst", -3.1),
    ("worse", -2.1),
    ("rough", -1.1),
    ("severe", -2.0),
    ("extreme", -1.3),
    ("massive", -0.6),
    ("rising", -0.6),
    ("flooded", -1.8),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "neither", "nor", "cannot", "cant", "dont", "doesnt", "didnt",
    "isnt", "wasnt", "wont",
];

const BOOSTERS: &[(&str, f64)] = &[
    ("very", 0.293),
    ("extremely", 0.293),
    ("really", 0.293),
    ("absolutely", 0.293),
    ("incredibly", 0.293),
    ("so", 0.293),
    ("slightly", -0.293),
    ("somewhat", -0.293),
    ("barely", -0.293),
];

/// Negation within this many preceding words flips a valence.
const NEGATION_SCOPE: usize = 3;
/// Dampening applied to a flipped valence, per VADER.
const NEGATION_FACTOR: f64 = -0.74;
/// Per-exclamation emphasis added in the direction of the running score.
const EXCLAMATION_BOOST: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
/// Normalization constant: compound = sum / sqrt(sum^2 + ALPHA).
const ALPHA: f64 = 15.0;

fn lexicon_valence(word: &str) -> Option<f64> {
    LEXICON.iter().find(|(w, _)| *w == word).map(|(_, v)| *v)
}

fn booster_weight(word: &str) -> Option<f64> {
    BOOSTERS.iter().find(|(w, _)| *w == word).map(|(_, v)| *v)
}

/// Compound polarity score in [-1, 1] for cleaned text. Empty text is 0.0.
pub fn compound_score(cleaned: &str) -> f64 {
    if cleaned.trim().is_empty() {
        return 0.0;
    }

    let words: Vec<&str> = cleaned
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .collect();

    let mut sum = 0.0;
    for (i, word) in words.iter().enumerate() {
        let Some(mut valence) = lexicon_valence(word) else {
            continue;
        };

        // Look back for boosters and negations. Boosters closer to the word
        // count more, per the VADER distance discount.
        let start = i.saturating_sub(NEGATION_SCOPE);
        let mut negated = false;
        for (dist, prior) in words[start..i].iter().rev().enumerate() {
            if NEGATIONS.contains(prior) {
                negated = true;
            }
            if let Some(boost) = booster_weight(prior) {
                let discount = match dist {
                    0 => 1.0,
                    1 => 0.95,
                    _ => 0.9,
                };
                valence += valence.signum() * boost * discount;
            }
        }
        if negated {
            valence *= NEGATION_FACTOR;
        }

        sum += valence;
    }

    // Exclamation emphasis pushes the score further in its own direction.
    let exclamations = cleaned.matches('!').count().min(MAX_EXCLAMATIONS);
    if sum != 0.0 && exclamations > 0 {
        sum += sum.signum() * exclamations as f64 * EXCLAMATION_BOOST;
    }

    (sum / (sum * sum + ALPHA).sqrt()).clamp(-1.0, 1.0)
}
