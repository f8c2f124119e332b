//! Community-guideline risk analysis for short social posts.
//!
//! Posts are matched against a [`GuidelineSet`] of keyword and indicator
//! rules, scored 0-100, bucketed into a [`RiskLevel`], and cross-checked
//! against the rest of the batch for near-duplicate reposting.

pub mod analyzer;
pub mod detector;
pub mod error;
pub mod guidelines;
pub mod post;
pub mod recommend;
pub mod rewrite;
pub mod scorer;
pub mod similarity;
pub mod summary;
pub mod text_stats;

pub use analyzer::{AnalysisResult, GuidelineAnalyzer};
pub use detector::{detect, Detection};
pub use error::{GuidelineError, GuidelineResult};
pub use guidelines::{
    Category, CombinationBonus, CombinationRule, DuplicatePolicy, GuidelineSet, RuleCatalog,
    SeverityTable, SubcategoryRule, DEFAULT_BASE_SCORE,
};
pub use post::Post;
pub use recommend::recommend;
pub use rewrite::{suggest_rewrites, RewriteStyle, RewriteSuggestion};
pub use scorer::{score, RiskLevel, RiskThresholds, ScoreBreakdown, ViolationRecord};
pub use similarity::{find_duplicates, ratio, DuplicateMatch, DEFAULT_DUPLICATE_THRESHOLD};
pub use summary::{Report, Summary, ViolationFrequency};
pub use text_stats::TextStats;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Analyze a batch against the built-in Threads guidelines.
pub fn analyze_all(posts: &[Post]) -> Vec<AnalysisResult> {
    GuidelineAnalyzer::default().analyze_all(posts)
}

/// Analyze a batch and summarize it in one go.
pub fn report(analyzer: &GuidelineAnalyzer, posts: &[Post]) -> Report {
    Report::new(analyzer.analyze_all(posts))
}
