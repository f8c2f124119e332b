use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GuidelineError, GuidelineResult};
use crate::scorer::{RiskThresholds, MAX_SCORE};
use crate::similarity::DEFAULT_DUPLICATE_THRESHOLD;

// ---------------------------------------------------------------------------
// Rule catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubcategoryRule {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Free-text phrases matched loosely by core-word overlap.
    #[serde(default)]
    pub indicators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub subcategories: Vec<SubcategoryRule>,
}

/// Ordered categories and their subcategory rules. Evaluation order, and so
/// the order of violations and recommendations, follows this list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleCatalog {
    pub categories: Vec<Category>,
}

impl RuleCatalog {
    pub fn rules(&self) -> impl Iterator<Item = (&str, &SubcategoryRule)> {
        self.categories.iter().flat_map(|c| {
            c.subcategories
                .iter()
                .map(move |rule| (c.name.as_str(), rule))
        })
    }

    pub fn contains(&self, category: &str, subcategory: &str) -> bool {
        self.rules()
            .any(|(cat, rule)| cat == category && rule.name == subcategory)
    }

    pub fn contains_subcategory(&self, subcategory: &str) -> bool {
        self.rules().any(|(_, rule)| rule.name == subcategory)
    }
}

// ---------------------------------------------------------------------------
// Severity and combination tables
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_SCORE: u8 = 50;

/// Base score per subcategory, plus the score used for subcategories the
/// table does not list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityTable {
    #[serde(default = "default_base_score")]
    pub default_score: u8,
    /// `category -> subcategory -> base score`.
    #[serde(default)]
    pub scores: BTreeMap<String, BTreeMap<String, u8>>,
}

impl Default for SeverityTable {
    fn default() -> Self {
        Self {
            default_score: DEFAULT_BASE_SCORE,
            scores: BTreeMap::new(),
        }
    }
}

impl SeverityTable {
    pub fn base_score(&self, category: &str, subcategory: &str) -> u8 {
        self.scores
            .get(category)
            .and_then(|subs| subs.get(subcategory))
            .copied()
            .unwrap_or(self.default_score)
    }

    pub fn insert(&mut self, category: &str, subcategory: &str, score: u8) {
        self.scores
            .entry(category.to_string())
            .or_default()
            .insert(subcategory.to_string(), score);
    }
}

fn default_base_score() -> u8 {
    DEFAULT_BASE_SCORE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationRule {
    pub pair: [String; 2],
    pub bonus: i32,
}

/// Bonuses for subcategory pairs that are worse together than apart.
/// Pairs are unordered; each bonus must lie in `-100..=100`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinationBonus(pub Vec<CombinationRule>);

const MAX_BONUS: i32 = MAX_SCORE as i32;

impl CombinationBonus {
    pub fn bonus(&self, a: &str, b: &str) -> i32 {
        self.0
            .iter()
            .find(|r| (r.pair[0] == a && r.pair[1] == b) || (r.pair[0] == b && r.pair[1] == a))
            .map(|r| r.bonus)
            .unwrap_or(0)
    }

    pub fn insert(&mut self, a: &str, b: &str, bonus: i32) {
        self.0.push(CombinationRule {
            pair: [a.to_string(), b.to_string()],
            bonus,
        });
    }
}

// ---------------------------------------------------------------------------
// Duplicate policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicatePolicy {
    /// Similarity ratio in `0.0..=1.0` at or above which two posts count as
    /// near-duplicates.
    pub threshold: f64,
    pub category: String,
    pub subcategory: String,
    pub base_score: u8,
    /// Flat amount added on top of the rule-based score.
    pub escalation: u8,
    pub policy_ref: String,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DUPLICATE_THRESHOLD,
            category: "스팸".to_string(),
            subcategory: "반복_게시".to_string(),
            base_score: 80,
            escalation: 30,
            policy_ref: "커뮤니티 규정 > 스팸 > '매우 빈번한 빈도로 콘텐츠를 게시' / '반복적인 콘텐츠 게시'"
                .to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Guideline set
// ---------------------------------------------------------------------------

/// Everything the analyzer needs to know about one version of the
/// community guidelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidelineSet {
    pub catalog: RuleCatalog,
    #[serde(default)]
    pub severity: SeverityTable,
    #[serde(default)]
    pub combinations: CombinationBonus,
    #[serde(default)]
    pub thresholds: RiskThresholds,
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
    /// `subcategory -> remediation text`.
    #[serde(default = "default_remediations")]
    pub remediations: BTreeMap<String, String>,
    /// `risky phrase -> safer phrasing`, used for rewrite suggestions.
    #[serde(default = "default_rewrites")]
    pub rewrites: BTreeMap<String, String>,
}

impl GuidelineSet {
    /// A set with only a catalog; every table empty and all policies at
    /// their defaults.
    pub fn with_catalog(catalog: RuleCatalog) -> Self {
        Self {
            catalog,
            severity: SeverityTable::default(),
            combinations: CombinationBonus::default(),
            thresholds: RiskThresholds::default(),
            duplicates: DuplicatePolicy::default(),
            remediations: BTreeMap::new(),
            rewrites: BTreeMap::new(),
        }
    }

    pub fn from_json(json: &str) -> GuidelineResult<Self> {
        let set: Self = serde_json::from_str(json)?;
        set.validate()?;
        Ok(set)
    }

    pub fn from_path(path: impl AsRef<Path>) -> GuidelineResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> GuidelineResult<()> {
        if self.severity.default_score > MAX_SCORE {
            return Err(GuidelineError::InvalidScore {
                subcategory: "default_score".to_string(),
                score: i32::from(self.severity.default_score),
            });
        }
        for (category, subs) in &self.severity.scores {
            for (subcategory, &score) in subs {
                if !self.catalog.contains(category, subcategory) {
                    return Err(GuidelineError::UnknownSubcategory {
                        table: "severity",
                        subcategory: format!("{category}/{subcategory}"),
                    });
                }
                if score > MAX_SCORE {
                    return Err(GuidelineError::InvalidScore {
                        subcategory: subcategory.clone(),
                        score: i32::from(score),
                    });
                }
            }
        }

        for rule in &self.combinations.0 {
            for name in &rule.pair {
                if !self.catalog.contains_subcategory(name) {
                    return Err(GuidelineError::UnknownSubcategory {
                        table: "combinations",
                        subcategory: name.clone(),
                    });
                }
            }
            if !(-MAX_BONUS..=MAX_BONUS).contains(&rule.bonus) {
                return Err(GuidelineError::InvalidScore {
                    subcategory: rule.pair.join("+"),
                    score: rule.bonus,
                });
            }
        }

        if self.duplicates.base_score > MAX_SCORE {
            return Err(GuidelineError::InvalidScore {
                subcategory: self.duplicates.subcategory.clone(),
                score: i32::from(self.duplicates.base_score),
            });
        }
        if !(0.0..=1.0).contains(&self.duplicates.threshold) {
            return Err(GuidelineError::InvalidThreshold(format!(
                "duplicate similarity {} is outside 0.0..=1.0",
                self.duplicates.threshold
            )));
        }
        self.thresholds.validate()
    }
}

impl Default for GuidelineSet {
    fn default() -> Self {
        let catalog = RuleCatalog {
            categories: DEFAULT_CATALOG
                .iter()
                .map(|(name, subs)| Category {
                    name: name.to_string(),
                    subcategories: subs
                        .iter()
                        .map(|(sub, keywords, indicators)| SubcategoryRule {
                            name: sub.to_string(),
                            keywords: to_strings(keywords),
                            indicators: to_strings(indicators),
                        })
                        .collect(),
                })
                .collect(),
        };

        let mut severity = SeverityTable::default();
        for (category, subcategory, score) in DEFAULT_SEVERITY {
            severity.insert(category, subcategory, *score);
        }

        let mut combinations = CombinationBonus::default();
        for (a, b, bonus) in DEFAULT_COMBINATIONS {
            combinations.insert(a, b, *bonus);
        }

        Self {
            catalog,
            severity,
            combinations,
            thresholds: RiskThresholds::default(),
            duplicates: DuplicatePolicy::default(),
            remediations: default_remediations(),
            rewrites: default_rewrites(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_remediations() -> BTreeMap<String, String> {
    DEFAULT_REMEDIATIONS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn default_rewrites() -> BTreeMap<String, String> {
    DEFAULT_REWRITES
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Names used more than once across categories make severity lookups by
/// subcategory alone ambiguous; callers that care can check with this.
pub fn duplicate_subcategory_names(catalog: &RuleCatalog) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dupes = Vec::new();
    for (_, rule) in catalog.rules() {
        if !seen.insert(rule.name.as_str()) && !dupes.contains(&rule.name) {
            dupes.push(rule.name.clone());
        }
    }
    dupes
}

// ---------------------------------------------------------------------------
// Built-in Threads community guideline data
// ---------------------------------------------------------------------------

type RuleRow = (&'static str, &'static [&'static str], &'static [&'static str]);

static DEFAULT_CATALOG: &[(&str, &[RuleRow])] = &[
    (
        "스팸",
        &[
            (
                "반복_게시",
                &["기억해", "가자", "오늘만", "선착순", "마감 임박"],
                &[
                    "동일한 문구를 반복적으로 여러번 게시하는 행위",
                    "매우 빈번한 빈도로 콘텐츠를 반복해서 게시함",
                ],
            ),
            (
                "참여_유도",
                &[
                    "DM 주세요",
                    "댓글 달면",
                    "좋아요 누르면",
                    "팔로우하면",
                    "공유하면",
                    "링크 클릭",
                    "프로필 링크",
                ],
                &[
                    "좋아요나 댓글을 남기면 혜택을 드린다는 약속",
                    "팔로우를 조건으로 자료를 무료로 제공한다는 안내",
                ],
            ),
        ],
    ),
    (
        "사기_및_기만",
        &[
            (
                "직업_사기",
                &["업종만 괜찮으면", "조건만 맞으면", "누구나 가능", "쉽게", "바로 가능"],
                &[
                    "자격 요건과 상관없이 누구나 간편하게 승인된다는 주장",
                    "간단한 조건만으로 확실한 결과를 약속하는 문구",
                ],
            ),
            (
                "가짜_문서_사기",
                &["인증 가자", "인증 대행", "서류 대행", "스팩업", "서류 만들어"],
                &[
                    "정부 인증서를 대신해서 받아준다는 대행업체 제안",
                    "심사용 서류를 대신해서 작성해 준다는 업체의 제안",
                ],
            ),
            (
                "투자_금전_사기",
                &["수익 보장", "원금 보장", "무위험", "고수익", "월 천만원", "투자금"],
                &[
                    "원금손실 없이 확정된 수익률을 약속하는 투자상품 권유",
                    "단기간에 큰돈을 손쉽게 벌어준다는 재테크 홍보",
                ],
            ),
            (
                "기만적_오해_유발",
                &["보장", "100%", "무조건", "확실", "대박", "절대"],
                &["결과를 무조건 보장하는 과장된 광고 문구"],
            ),
        ],
    ),
    (
        "규제_서비스",
        &[(
            "대행_브로커",
            &["대행", "브로커", "수수료만", "알선", "빠르게 처리", "대신 해드"],
            &[
                "정부 지원금을 대신해서 받아주는 중개 서비스 홍보",
                "수수료를 받고 행정 절차를 대신해서 처리해주는 업체",
            ],
        )],
    ),
];

static DEFAULT_SEVERITY: &[(&str, &str, u8)] = &[
    ("스팸", "반복_게시", 70),
    ("스팸", "참여_유도", 50),
    ("사기_및_기만", "직업_사기", 85),
    ("사기_및_기만", "가짜_문서_사기", 85),
    ("사기_및_기만", "투자_금전_사기", 90),
    ("사기_및_기만", "기만적_오해_유발", 60),
    ("규제_서비스", "대행_브로커", 65),
];

static DEFAULT_COMBINATIONS: &[(&str, &str, i32)] = &[
    ("직업_사기", "가짜_문서_사기", 15),
    ("기만적_오해_유발", "투자_금전_사기", 10),
    ("반복_게시", "참여_유도", 10),
    ("가짜_문서_사기", "대행_브로커", 10),
];

static DEFAULT_REMEDIATIONS: &[(&str, &str)] = &[
    (
        "직업_사기",
        "⚠️ [직업 사기 오인 가능] '업종만 괜찮으면', '쉽게', '보장' 같은 표현 제거 → '요건 충족 시 검토 가능', '케이스별 상이' 등으로 변경",
    ),
    (
        "가짜_문서_사기",
        "⚠️ [가짜 문서 사기 오인 가능] '인증 가자', '대행' 표현 제거 → '인증 요건 안내', '공식 절차 확인 필요' 등으로 변경",
    ),
    (
        "반복_게시",
        "⚠️ [스팸 탐지] 동일/유사 문구 반복 게시 금지 → 같은 주제라도 문장 구조/표현을 다르게 작성",
    ),
    (
        "참여_유도",
        "⚠️ [참여 유도 스팸] 'DM 주세요', '좋아요 누르면' 등 과도한 CTA 최소화",
    ),
    (
        "기만적_오해_유발",
        "⚠️ [과장/기만 오인 가능] '100%', '무조건', '보장' 표현 제거 → '가능성', '검토 필요', '케이스별 상이' 등으로 완화",
    ),
    (
        "투자_금전_사기",
        "⚠️ [투자 사기 오인 가능] 수익 보장, 무위험 투자 표현 절대 금지",
    ),
    (
        "대행_브로커",
        "⚠️ [대행/브로커 오인 가능] '대행', '알선', '수수료만' 표현 제거 → '관련 정보 안내', '절차 정리' 등 정보 공유형으로 변경",
    ),
];

static DEFAULT_REWRITES: &[(&str, &str)] = &[
    ("기억해", "참고해 보세요"),
    ("가자", "검토해 볼 수 있어요"),
    ("무조건", "일정 요건 충족 시"),
    ("보장", "가능성이 있어요"),
    ("100%", "대부분의 경우"),
    ("바로 가능", "절차를 거치면 가능"),
    ("쉽게", "준비하면"),
    ("DM 주세요", "문의 사항이 있으시면"),
    ("댓글 달면", "궁금하신 점은"),
    ("업종만 괜찮으면", "업종 요건을 충족하면"),
    ("조건만 맞으면", "요건을 충족하는 경우"),
    ("누구나 가능", "요건에 해당하면 검토 가능"),
    ("대박", "좋은 결과를 기대할 수 있어요"),
    ("확실", "가능성이 높아요"),
    ("대행", "관련 정보 안내"),
    ("스팩업", "법인 준비 사항"),
    ("인증 가자", "인증 요건 정리"),
    ("빠르게 처리", "효율적으로 준비"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_is_valid() {
        let set = GuidelineSet::default();
        set.validate().unwrap();
        assert!(duplicate_subcategory_names(&set.catalog).is_empty());
        assert_eq!(set.catalog.rules().count(), 7);
    }

    #[test]
    fn unknown_severity_defaults_to_fifty() {
        let set = GuidelineSet::default();
        assert_eq!(set.severity.base_score("스팸", "없는_항목"), 50);
        assert_eq!(set.severity.base_score("사기_및_기만", "투자_금전_사기"), 90);
    }

    #[test]
    fn combination_lookup_ignores_order() {
        let set = GuidelineSet::default();
        assert_eq!(set.combinations.bonus("직업_사기", "가짜_문서_사기"), 15);
        assert_eq!(set.combinations.bonus("가짜_문서_사기", "직업_사기"), 15);
        assert_eq!(set.combinations.bonus("직업_사기", "반복_게시"), 0);
    }

    #[test]
    fn keyword_only_json_loads_with_defaults() {
        let json = r#"{
            "catalog": [
                { "name": "spam", "subcategories": [
                    { "name": "repeat", "keywords": ["remember"] }
                ] }
            ]
        }"#;
        let set = GuidelineSet::from_json(json).unwrap();
        assert_eq!(set.catalog.categories[0].subcategories[0].indicators.len(), 0);
        assert_eq!(set.duplicates.threshold, DEFAULT_DUPLICATE_THRESHOLD);
        assert_eq!(set.thresholds, RiskThresholds::default());
        assert!(set.severity.scores.is_empty());
        assert_eq!(set.severity.default_score, DEFAULT_BASE_SCORE);
    }

    #[test]
    fn severity_for_missing_subcategory_is_rejected() {
        let json = r#"{
            "catalog": [{ "name": "spam", "subcategories": [{ "name": "repeat" }] }],
            "severity": { "scores": { "spam": { "ghost": 70 } } }
        }"#;
        let err = GuidelineSet::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            GuidelineError::UnknownSubcategory { table: "severity", .. }
        ));
    }

    #[test]
    fn combination_for_missing_subcategory_is_rejected() {
        let json = r#"{
            "catalog": [{ "name": "spam", "subcategories": [{ "name": "repeat" }] }],
            "combinations": [{ "pair": ["repeat", "ghost"], "bonus": 5 }]
        }"#;
        let err = GuidelineSet::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            GuidelineError::UnknownSubcategory { table: "combinations", .. }
        ));
    }

    #[test]
    fn out_of_range_scores_are_rejected() {
        let json = r#"{
            "catalog": [{ "name": "spam", "subcategories": [{ "name": "repeat" }] }],
            "severity": { "scores": { "spam": { "repeat": 140 } } }
        }"#;
        assert!(matches!(
            GuidelineSet::from_json(json),
            Err(GuidelineError::InvalidScore { score: 140, .. })
        ));

        let json = r#"{
            "catalog": [],
            "duplicates": { "threshold": 1.5 }
        }"#;
        assert!(matches!(
            GuidelineSet::from_json(json),
            Err(GuidelineError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn oversized_combination_bonus_is_rejected() {
        let json = r#"{
            "catalog": [{ "name": "spam", "subcategories": [{ "name": "a" }, { "name": "b" }] }],
            "combinations": [{ "pair": ["a", "b"], "bonus": 2147483647 }]
        }"#;
        assert!(matches!(
            GuidelineSet::from_json(json),
            Err(GuidelineError::InvalidScore { score: 2147483647, .. })
        ));

        let json = r#"{
            "catalog": [{ "name": "spam", "subcategories": [{ "name": "a" }, { "name": "b" }] }],
            "combinations": [{ "pair": ["a", "b"], "bonus": -100 }]
        }"#;
        assert!(GuidelineSet::from_json(json).is_ok());
    }

    #[test]
    fn default_score_is_configurable_per_set() {
        let json = r#"{
            "catalog": [{ "name": "spam", "subcategories": [{ "name": "a" }] }],
            "severity": { "default_score": 35 }
        }"#;
        let lenient = GuidelineSet::from_json(json).unwrap();
        let stock = GuidelineSet::with_catalog(lenient.catalog.clone());
        assert_eq!(lenient.severity.base_score("spam", "a"), 35);
        assert_eq!(stock.severity.base_score("spam", "a"), 50);

        let json = r#"{
            "catalog": [],
            "severity": { "default_score": 101 }
        }"#;
        assert!(matches!(
            GuidelineSet::from_json(json),
            Err(GuidelineError::InvalidScore { score: 101, .. })
        ));
    }

    #[test]
    fn default_set_round_trips_through_json() {
        let set = GuidelineSet::default();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(GuidelineSet::from_json(&json).unwrap(), set);
    }
}
