use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Compiled patterns
// ---------------------------------------------------------------------------

static HASHTAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#(\w+)").unwrap());

static MENTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@(\w+)").unwrap());

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).unwrap());


static SHORTENER_DOMAINS: &[&str] = &[
    "bit.ly",
    "tinyurl.com",
    "goo.gl",
    "t.co",
    "ow.ly",
    "is.gd",
    "buff.ly",
    "adf.ly",
    "bl.ink",
    "lnkd.in",
    "shorte.st",
];

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Surface statistics of a post. Informational only; nothing here feeds
/// the risk score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStats {
    pub char_count: usize,
    pub word_count: usize,
    pub line_count: usize,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub urls: Vec<String>,
    pub short_url_count: usize,
}

impl TextStats {
    pub fn from_text(text: &str) -> Self {
        let urls: Vec<String> = URL_RE
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect();
        let short_url_count = urls.iter().filter(|u| is_short_url(u)).count();
        Self {
            char_count: text.chars().count(),
            word_count: text.split_whitespace().count(),
            line_count: text.split('\n').count(),
            hashtags: captures(&HASHTAG_RE, text),
            mentions: captures(&MENTION_RE, text),
            urls,
            short_url_count,
        }
    }
}

fn captures(re: &Regex, text: &str) -> Vec<String> {
    re.captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Link shorteners hide the destination and are a common spam signal.
pub fn is_short_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    let host = lower
        .split("://")
        .nth(1)
        .unwrap_or(&lower)
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("");
    SHORTENER_DOMAINS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_extracts() {
        let text = "법인 설립 팁 #세무 #법인\n@just_followtax 참고\nhttps://bit.ly/abc 그리고 https://threads.net/@x/post/1";
        let stats = TextStats::from_text(text);
        assert_eq!(stats.line_count, 3);
        assert_eq!(stats.hashtags, vec!["세무", "법인"]);
        assert!(stats.mentions.contains(&"just_followtax".to_string()));
        assert_eq!(stats.urls.len(), 2);
        assert_eq!(stats.short_url_count, 1);
        assert_eq!(stats.word_count, 10);
    }

    #[test]
    fn char_count_is_unicode_aware() {
        assert_eq!(TextStats::from_text("안녕하세요").char_count, 5);
        assert_eq!(TextStats::from_text("").line_count, 1);
    }

    #[test]
    fn shortener_detection_checks_the_host() {
        assert!(is_short_url("https://bit.ly/3xyz"));
        assert!(is_short_url("http://T.CO/abc"));
        assert!(!is_short_url("https://threads.net/t.co"));
        assert!(!is_short_url("https://microsoft.com/x"));
    }
}
