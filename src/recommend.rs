use std::collections::{BTreeMap, HashSet};

use crate::scorer::ViolationRecord;

/// One remediation per distinct subcategory, in the order the subcategories
/// were first detected. Subcategories without an entry are skipped.
pub fn recommend(violations: &[ViolationRecord], remediations: &BTreeMap<String, String>) -> Vec<String> {
    let mut seen = HashSet::new();
    violations
        .iter()
        .filter(|v| seen.insert(v.subcategory.as_str()))
        .filter_map(|v| remediations.get(&v.subcategory).cloned())
        .collect()
}
