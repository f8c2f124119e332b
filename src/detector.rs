use crate::guidelines::SubcategoryRule;

// ---------------------------------------------------------------------------
// Matching parameters
// ---------------------------------------------------------------------------

/// Indicator words this short (in characters) are particles, not content.
const INDICATOR_NOISE_MAX_CHARS: usize = 2;
/// Share of an indicator's core words that must appear in the text.
const INDICATOR_MATCH_RATIO: f64 = 0.3;

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detection {
    pub matched_keywords: Vec<String>,
    pub matched_indicators: Vec<String>,
}

impl Detection {
    pub fn is_violation(&self) -> bool {
        !self.matched_keywords.is_empty() || !self.matched_indicators.is_empty()
    }
}

/// Check one subcategory rule against a post's text.
pub fn detect(text: &str, rule: &SubcategoryRule) -> Detection {
    let text_lower = text.to_lowercase();
    detect_lowered(&text_lower, rule)
}

/// Same as [`detect`] for text that is already lower-cased, so a post only
/// pays for lowering once across the whole catalog.
pub(crate) fn detect_lowered(text_lower: &str, rule: &SubcategoryRule) -> Detection {
    let matched_keywords = rule
        .keywords
        .iter()
        .filter(|k| !k.is_empty() && text_lower.contains(&k.to_lowercase()))
        .cloned()
        .collect();

    let matched_indicators = rule
        .indicators
        .iter()
        .filter(|i| indicator_matches(text_lower, i))
        .cloned()
        .collect();

    Detection {
        matched_keywords,
        matched_indicators,
    }
}

fn indicator_matches(text_lower: &str, indicator: &str) -> bool {
    let core_words: Vec<String> = indicator
        .split_whitespace()
        .filter(|w| w.chars().count() > INDICATOR_NOISE_MAX_CHARS)
        .map(str::to_lowercase)
        .collect();
    if core_words.is_empty() {
        return false;
    }
    let hits = core_words
        .iter()
        .filter(|w| text_lower.contains(w.as_str()))
        .count();
    hits as f64 / core_words.len() as f64 >= INDICATOR_MATCH_RATIO
}
