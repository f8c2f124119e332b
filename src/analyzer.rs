use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::detector::detect_lowered;
use crate::error::GuidelineResult;
use crate::guidelines::{duplicate_subcategory_names, GuidelineSet};
use crate::post::Post;
use crate::recommend::recommend;
use crate::rewrite::{suggest_rewrites, RewriteSuggestion};
use crate::scorer::{self, clamp_score, RiskLevel, ViolationRecord};
use crate::similarity::{find_duplicates, DuplicateMatch};
use crate::text_stats::TextStats;

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(flatten)]
    pub post: Post,
    pub violations: Vec<ViolationRecord>,
    /// One human-readable line per violation, in violation order.
    pub violation_details: Vec<String>,
    pub official_policy_refs: Vec<String>,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<String>,
    pub is_duplicate: bool,
    pub duplicate_count: usize,
    pub duplicates: Vec<DuplicateMatch>,
    pub stats: TextStats,
    pub rewrites: Vec<RewriteSuggestion>,
}

impl AnalysisResult {
    /// Every matched keyword across all violations, first occurrence only.
    pub fn matched_keywords(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for k in self.violations.iter().flat_map(|v| &v.matched_keywords) {
            if !out.contains(k) {
                out.push(k.clone());
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Runs one guideline set over posts. Holds no state between calls, so the
/// same batch always produces the same results.
#[derive(Debug, Clone, Default)]
pub struct GuidelineAnalyzer {
    guidelines: GuidelineSet,
}

impl GuidelineAnalyzer {
    pub fn new(guidelines: GuidelineSet) -> Self {
        let shared = duplicate_subcategory_names(&guidelines.catalog);
        if !shared.is_empty() {
            warn!(
                subcategories = ?shared,
                "subcategory names repeat across categories; combination bonuses and remediations will be shared"
            );
        }
        Self { guidelines }
    }

    /// Like [`GuidelineAnalyzer::new`], but rejects a set that fails
    /// [`GuidelineSet::validate`].
    pub fn try_new(guidelines: GuidelineSet) -> GuidelineResult<Self> {
        guidelines.validate()?;
        Ok(Self::new(guidelines))
    }

    pub fn guidelines(&self) -> &GuidelineSet {
        &self.guidelines
    }

    /// Rule-based analysis of a single post, without looking at the rest of
    /// the batch.
    pub fn analyze_post(&self, post: &Post) -> AnalysisResult {
        let g = &self.guidelines;
        let text_lower = post.text.to_lowercase();

        let violations: Vec<ViolationRecord> = g
            .catalog
            .rules()
            .filter_map(|(category, rule)| {
                let detection = detect_lowered(&text_lower, rule);
                detection.is_violation().then(|| ViolationRecord {
                    category: category.to_string(),
                    subcategory: rule.name.clone(),
                    matched_keywords: detection.matched_keywords,
                    matched_indicators: detection.matched_indicators,
                    base_score: g.severity.base_score(category, &rule.name),
                })
            })
            .collect();

        let risk_score = scorer::score(&violations, &g.combinations);
        let recommendations = recommend(&violations, &g.remediations);

        let mut result = AnalysisResult {
            post: post.clone(),
            violation_details: violations.iter().map(ViolationRecord::detail).collect(),
            official_policy_refs: violations.iter().map(ViolationRecord::policy_ref).collect(),
            violations,
            risk_score,
            risk_level: g.thresholds.level(risk_score),
            recommendations,
            is_duplicate: false,
            duplicate_count: 0,
            duplicates: vec![],
            stats: TextStats::from_text(&post.text),
            rewrites: vec![],
        };
        result.rewrites = suggest_rewrites(&post.text, &result.matched_keywords(), &g.rewrites);
        result
    }

    /// Analyze a batch in order. Each post is also compared against every
    /// other post in the batch for near-duplicates.
    pub fn analyze_all(&self, posts: &[Post]) -> Vec<AnalysisResult> {
        let threshold = self.guidelines.duplicates.threshold;
        let results: Vec<AnalysisResult> = posts
            .iter()
            .enumerate()
            .map(|(i, post)| {
                let mut result = self.analyze_post(post);
                let duplicates = find_duplicates(&post.text, posts, i, threshold);
                self.escalate_duplicates(&mut result, duplicates);
                debug!(
                    index = i,
                    score = result.risk_score,
                    level = ?result.risk_level,
                    violations = result.violations.len(),
                    duplicates = result.duplicate_count,
                    "analyzed post"
                );
                result
            })
            .collect();

        info!(
            posts = results.len(),
            flagged = results.iter().filter(|r| r.risk_level != RiskLevel::Safe).count(),
            duplicates = results.iter().filter(|r| r.is_duplicate).count(),
            "batch analysis complete"
        );
        results
    }

    /// Repeated content is layered on top of the rule score: one synthetic
    /// violation plus a flat escalation, never a full rescore.
    fn escalate_duplicates(&self, result: &mut AnalysisResult, duplicates: Vec<DuplicateMatch>) {
        result.is_duplicate = !duplicates.is_empty();
        result.duplicate_count = duplicates.len();
        result.duplicates = duplicates;
        if !result.is_duplicate {
            return;
        }

        let g = &self.guidelines;
        let policy = &g.duplicates;
        result.violations.push(ViolationRecord {
            category: policy.category.clone(),
            subcategory: policy.subcategory.clone(),
            matched_keywords: vec![],
            matched_indicators: vec![format!("{}개의 유사 게시물 발견", result.duplicate_count)],
            base_score: policy.base_score,
        });
        result.violation_details.push(format!(
            "[{}/{}] {}개의 유사 게시물 발견 (유사도 {:.0}% 이상)",
            policy.category,
            policy.subcategory,
            result.duplicate_count,
            policy.threshold * 100.0
        ));
        result.official_policy_refs.push(policy.policy_ref.clone());
        result.risk_score = clamp_score(i32::from(result.risk_score) + i32::from(policy.escalation));
        result.risk_level = g.thresholds.level(result.risk_score);
        result.recommendations = recommend(&result.violations, &g.remediations);
    }
}
