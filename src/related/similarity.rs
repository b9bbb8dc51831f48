//! Set similarity over label sets

use std::collections::BTreeSet;

/// Jaccard similarity `|A ∩ B| / |A ∪ B|`
///
/// Returns 0.0 when either set is empty.
///
/// # Examples
///
/// ```
/// use seo_frontier::related::calculate_jaccard_similarity;
/// use std::collections::BTreeSet;
///
/// let a: BTreeSet<String> = ["shoes", "running"].iter().map(|s| s.to_string()).collect();
/// let b: BTreeSet<String> = ["shoes", "trail"].iter().map(|s| s.to_string()).collect();
/// assert!((calculate_jaccard_similarity(&a, &b) - 1.0 / 3.0).abs() < 1e-12);
/// ```
pub fn calculate_jaccard_similarity(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Trims and lowercases labels, dropping blanks
pub fn normalize_labels<I, S>(labels: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    labels
        .into_iter()
        .map(|label| label.as_ref().trim().to_lowercase())
        .filter(|label| !label.is_empty())
        .collect()
}

/// Partition of `A ∪ B` into shared, left-only and right-only labels
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelOverlap {
    pub overlapping: BTreeSet<String>,
    pub unique_to_source: BTreeSet<String>,
    pub unique_to_match: BTreeSet<String>,
}

impl LabelOverlap {
    pub fn between(source: &BTreeSet<String>, target: &BTreeSet<String>) -> Self {
        Self {
            overlapping: source.intersection(target).cloned().collect(),
            unique_to_source: source.difference(target).cloned().collect(),
            unique_to_match: target.difference(source).cloned().collect(),
        }
    }
}
