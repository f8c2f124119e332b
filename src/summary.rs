use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analyzer::AnalysisResult;
use crate::scorer::RiskLevel;

pub const DEFAULT_TOP_VIOLATIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationFrequency {
    /// `category/subcategory`
    pub violation: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_posts: usize,
    pub very_high_count: usize,
    pub high_risk_count: usize,
    pub medium_risk_count: usize,
    pub low_risk_count: usize,
    pub safe_count: usize,
    pub duplicate_count: usize,
    pub average_risk_score: f64,
    pub top_violations: Vec<ViolationFrequency>,
}

impl Summary {
    pub fn from_results(results: &[AnalysisResult]) -> Self {
        Self::with_top(results, DEFAULT_TOP_VIOLATIONS)
    }

    /// Fold a batch into counts. `top_n` limits the violation frequency
    /// list; ties keep first-seen order.
    pub fn with_top(results: &[AnalysisResult], top_n: usize) -> Self {
        if results.is_empty() {
            return Self::default();
        }

        let count_level = |level: RiskLevel| results.iter().filter(|r| r.risk_level == level).count();
        let score_sum: u64 = results.iter().map(|r| u64::from(r.risk_score)).sum();
        let average = score_sum as f64 / results.len() as f64;

        Self {
            total_posts: results.len(),
            very_high_count: count_level(RiskLevel::VeryHigh),
            high_risk_count: count_level(RiskLevel::High),
            medium_risk_count: count_level(RiskLevel::Medium),
            low_risk_count: count_level(RiskLevel::Low),
            safe_count: count_level(RiskLevel::Safe),
            duplicate_count: results.iter().filter(|r| r.is_duplicate).count(),
            average_risk_score: (average * 10.0).round_ties_even() / 10.0,
            top_violations: top_violations(results, top_n),
        }
    }
}

fn top_violations(results: &[AnalysisResult], top_n: usize) -> Vec<ViolationFrequency> {
    let mut order: Vec<ViolationFrequency> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for v in results.iter().flat_map(|r| &r.violations) {
        let label = v.label();
        match index.get(&label) {
            Some(&i) => order[i].count += 1,
            None => {
                index.insert(label.clone(), order.len());
                order.push(ViolationFrequency {
                    violation: label,
                    count: 1,
                });
            }
        }
    }
    // stable, so equal counts stay in first-seen order
    order.sort_by(|a, b| b.count.cmp(&a.count));
    order.truncate(top_n);
    order
}

/// Per-post results plus their summary, as handed to report writers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub results: Vec<AnalysisResult>,
    pub summary: Summary,
}

impl Report {
    pub fn new(results: Vec<AnalysisResult>) -> Self {
        let summary = Summary::from_results(&results);
        Self { results, summary }
    }
}
