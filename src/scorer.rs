use serde::{Deserialize, Serialize};

use crate::error::{GuidelineError, GuidelineResult};
use crate::guidelines::CombinationBonus;

// ---------------------------------------------------------------------------
// Violation record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub category: String,
    pub subcategory: String,
    pub matched_keywords: Vec<String>,
    pub matched_indicators: Vec<String>,
    pub base_score: u8,
}

impl ViolationRecord {
    /// `category/subcategory`, the key used for frequency counts.
    pub fn label(&self) -> String {
        format!("{}/{}", self.category, self.subcategory)
    }

    /// `[category/subcategory] ` followed by the first two matched
    /// indicators, or the first two keywords when no indicator matched.
    pub fn detail(&self) -> String {
        let evidence = if self.matched_indicators.is_empty() {
            &self.matched_keywords
        } else {
            &self.matched_indicators
        };
        let shown: Vec<&str> = evidence.iter().take(2).map(String::as_str).collect();
        format!("[{}] {}", self.label(), shown.join(", "))
    }

    /// Where in the community guidelines this violation is described.
    pub fn policy_ref(&self) -> String {
        format!(
            "{POLICY_REF_ROOT} > {} > {}",
            self.category.replace('_', " "),
            self.subcategory.replace('_', " ")
        )
    }
}

pub const POLICY_REF_ROOT: &str = "커뮤니티 규정";

// ---------------------------------------------------------------------------
// Risk levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryHigh,
    High,
    Medium,
    Low,
    Safe,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::VeryHigh => "🔴 매우 높음 (삭제 가능성 높음)",
            RiskLevel::High => "🟠 높음 (경고/제한 가능성)",
            RiskLevel::Medium => "🟡 중간 (주의 필요)",
            RiskLevel::Low => "🟢 낮음",
            RiskLevel::Safe => "✅ 안전",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Lower bounds of each tier, checked highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub very_high: u8,
    pub high: u8,
    pub medium: u8,
    pub low: u8,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            very_high: 80,
            high: 60,
            medium: 40,
            low: 20,
        }
    }
}

impl RiskThresholds {
    pub fn level(&self, score: u8) -> RiskLevel {
        if score >= self.very_high {
            RiskLevel::VeryHigh
        } else if score >= self.high {
            RiskLevel::High
        } else if score >= self.medium {
            RiskLevel::Medium
        } else if score >= self.low {
            RiskLevel::Low
        } else {
            RiskLevel::Safe
        }
    }

    pub fn validate(&self) -> GuidelineResult<()> {
        let ordered = self.very_high <= MAX_SCORE
            && self.very_high > self.high
            && self.high > self.medium
            && self.medium > self.low
            && self.low >= 1;
        if ordered {
            Ok(())
        } else {
            Err(GuidelineError::InvalidThreshold(format!(
                "risk tiers must strictly descend within 1..=100, got {}/{}/{}/{}",
                self.very_high, self.high, self.medium, self.low
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

pub const MAX_SCORE: u8 = 100;
const EXTRA_VIOLATION_STEP: i32 = 10;
const EXTRA_VIOLATION_CAP: usize = 3;

/// Breakdown of a rule-based score before clamping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub base: i32,
    pub additional: i32,
    pub combination: i32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u8 {
        clamp_score(
            self.base
                .saturating_add(self.additional)
                .saturating_add(self.combination),
        )
    }
}

pub fn breakdown(violations: &[ViolationRecord], combinations: &CombinationBonus) -> ScoreBreakdown {
    let Some(base) = violations.iter().map(|v| i32::from(v.base_score)).max() else {
        return ScoreBreakdown::default();
    };

    let extra = (violations.len() - 1).min(EXTRA_VIOLATION_CAP) as i32;
    let additional = extra * EXTRA_VIOLATION_STEP;

    let mut combination = 0;
    for (i, a) in violations.iter().enumerate() {
        for b in &violations[i + 1..] {
            if a.category == b.category && a.subcategory == b.subcategory {
                continue;
            }
            combination = combinations
                .bonus(&a.subcategory, &b.subcategory)
                .saturating_add(combination);
        }
    }

    ScoreBreakdown {
        base,
        additional,
        combination,
    }
}

/// Worst violation, plus 10 per extra violation (up to 30), plus any
/// combination bonuses, clamped to `0..=100`.
pub fn score(violations: &[ViolationRecord], combinations: &CombinationBonus) -> u8 {
    breakdown(violations, combinations).total()
}

pub fn clamp_score(raw: i32) -> u8 {
    raw.clamp(0, i32::from(MAX_SCORE)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(category: &str, subcategory: &str, base_score: u8) -> ViolationRecord {
        ViolationRecord {
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            matched_keywords: vec![],
            matched_indicators: vec![],
            base_score,
        }
    }

    #[test]
    fn no_violations_scores_zero() {
        assert_eq!(score(&[], &CombinationBonus::default()), 0);
    }

    #[test]
    fn single_violation_scores_its_base() {
        let v = [violation("spam", "repeat", 55)];
        assert_eq!(score(&v, &CombinationBonus::default()), 55);
    }

    #[test]
    fn extra_violations_add_ten_each_up_to_thirty() {
        let none = CombinationBonus::default();
        let two = [violation("a", "x", 40), violation("a", "y", 20)];
        assert_eq!(score(&two, &none), 50);

        let five = [
            violation("a", "p", 30),
            violation("a", "q", 20),
            violation("a", "r", 20),
            violation("a", "s", 20),
            violation("a", "t", 20),
        ];
        assert_eq!(score(&five, &none), 60);
    }

    #[test]
    fn combination_bonus_applies_in_either_order() {
        let mut combos = CombinationBonus::default();
        combos.insert("job", "fake_cert", 15);
        let v = [violation("fraud", "fake_cert", 60), violation("fraud", "job", 50)];
        let b = breakdown(&v, &combos);
        assert_eq!(b, ScoreBreakdown { base: 60, additional: 10, combination: 15 });
        assert_eq!(b.total(), 85);
    }

    #[test]
    fn total_is_capped_at_one_hundred() {
        let mut combos = CombinationBonus::default();
        combos.insert("job", "fake_cert", 40);
        let v = [violation("fraud", "job", 90), violation("fraud", "fake_cert", 85)];
        assert_eq!(breakdown(&v, &combos).base + 10 + 40, 140);
        assert_eq!(score(&v, &combos), 100);
    }

    #[test]
    fn negative_bonus_cannot_go_below_zero() {
        let mut combos = CombinationBonus::default();
        combos.insert("a", "b", -500);
        let v = [violation("c", "a", 10), violation("c", "b", 10)];
        assert_eq!(score(&v, &combos), 0);
    }

    #[test]
    fn levels_follow_default_tiers() {
        let t = RiskThresholds::default();
        assert_eq!(t.level(100), RiskLevel::VeryHigh);
        assert_eq!(t.level(80), RiskLevel::VeryHigh);
        assert_eq!(t.level(79), RiskLevel::High);
        assert_eq!(t.level(60), RiskLevel::High);
        assert_eq!(t.level(40), RiskLevel::Medium);
        assert_eq!(t.level(20), RiskLevel::Low);
        assert_eq!(t.level(19), RiskLevel::Safe);
        assert_eq!(t.level(0), RiskLevel::Safe);
    }

    #[test]
    fn alternate_tiers_run_side_by_side() {
        let strict = RiskThresholds { very_high: 50, high: 30, medium: 15, low: 5 };
        strict.validate().unwrap();
        assert_eq!(strict.level(50), RiskLevel::VeryHigh);
        assert_eq!(RiskThresholds::default().level(50), RiskLevel::Medium);
    }

    #[test]
    fn unordered_tiers_are_rejected() {
        let bad = RiskThresholds { very_high: 40, high: 60, medium: 20, low: 10 };
        assert!(bad.validate().is_err());
        let too_high = RiskThresholds { very_high: 120, ..RiskThresholds::default() };
        assert!(too_high.validate().is_err());
    }

    #[test]
    fn zero_low_tier_is_rejected() {
        let no_safe = RiskThresholds { low: 0, ..RiskThresholds::default() };
        assert!(no_safe.validate().is_err());
        let lowest = RiskThresholds { low: 1, ..RiskThresholds::default() };
        lowest.validate().unwrap();
        assert_eq!(lowest.level(0), RiskLevel::Safe);
    }

    #[test]
    fn huge_bonuses_saturate_instead_of_overflowing() {
        let mut combos = CombinationBonus::default();
        combos.insert("a", "b", i32::MAX);
        combos.insert("a", "c", i32::MAX);
        combos.insert("b", "c", i32::MAX);
        let v = [violation("x", "a", 90), violation("x", "b", 90), violation("x", "c", 90)];
        assert_eq!(breakdown(&v, &combos).combination, i32::MAX);
        assert_eq!(score(&v, &combos), 100);

        let mut combos = CombinationBonus::default();
        combos.insert("a", "b", i32::MIN);
        combos.insert("a", "c", i32::MIN);
        assert_eq!(score(&v, &combos), 0);
    }

    #[test]
    fn detail_prefers_indicators_and_shows_two() {
        let mut v = violation("사기_및_기만", "직업_사기", 85);
        v.matched_keywords = vec!["쉽게".to_string()];
        assert_eq!(v.detail(), "[사기_및_기만/직업_사기] 쉽게");

        v.matched_indicators = vec!["first".to_string(), "second".to_string(), "third".to_string()];
        assert_eq!(v.detail(), "[사기_및_기만/직업_사기] first, second");
        assert_eq!(v.policy_ref(), "커뮤니티 규정 > 사기 및 기만 > 직업 사기");
    }

    #[test]
    fn risk_level_serializes_as_snake_case() {
        assert_eq!(serde_json::to_string(&RiskLevel::VeryHigh).unwrap(), "\"very_high\"");
        assert_eq!(RiskLevel::Safe.to_string(), "✅ 안전");
    }
}
