use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const INFORMATIVE_PREFIX: &str = "[정보 공유] ";
const INFORMATIVE_SUFFIX: &str = "\n\n※ 개별 상황에 따라 다를 수 있으니 공식 기준을 확인해 주세요.";
const EXPERIENCE_PREFIX: &str = "제 경험을 공유하자면, ";
const EXPERIENCE_SUFFIX: &str = "\n\n물론 케이스마다 다르니 참고만 해주세요.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteStyle {
    KeywordReplacement,
    Informative,
    Experience,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteSuggestion {
    pub style: RewriteStyle,
    pub text: String,
}

/// Safer phrasings of `text`. Nothing is suggested unless some keyword
/// matched.
pub fn suggest_rewrites(
    text: &str,
    matched_keywords: &[String],
    replacements: &BTreeMap<String, String>,
) -> Vec<RewriteSuggestion> {
    if matched_keywords.is_empty() {
        return vec![];
    }

    let targeted: Vec<(&str, &str)> = matched_keywords
        .iter()
        .filter_map(|k| replacements.get_key_value(k))
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let everything: Vec<(&str, &str)> = replacements
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let softened = replace_all(text, everything).trim().to_string();
    vec![
        RewriteSuggestion {
            style: RewriteStyle::KeywordReplacement,
            text: replace_all(text, targeted),
        },
        RewriteSuggestion {
            style: RewriteStyle::Informative,
            text: format!("{INFORMATIVE_PREFIX}{softened}{INFORMATIVE_SUFFIX}"),
        },
        RewriteSuggestion {
            style: RewriteStyle::Experience,
            text: format!("{EXPERIENCE_PREFIX}{softened}{EXPERIENCE_SUFFIX}"),
        },
    ]
}

/// Replace phrases longest first, in a single left-to-right pass, so a
/// replacement is never itself rewritten and "인증 가자" wins over "가자".
fn replace_all(text: &str, mut pairs: Vec<(&str, &str)>) -> String {
    pairs.retain(|(phrase, _)| !phrase.is_empty());
    pairs.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    'scan: while let Some(c) = rest.chars().next() {
        for (phrase, replacement) in &pairs {
            if let Some(tail) = rest.strip_prefix(phrase) {
                out.push_str(replacement);
                rest = tail;
                continue 'scan;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}
