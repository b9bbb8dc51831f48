//! Related collection matching and clustering

use crate::related::similarity::{calculate_jaccard_similarity, normalize_labels, LabelOverlap};
use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.1;
pub const DEFAULT_MAX_RESULTS: usize = 10;
pub const DEFAULT_CLUSTER_THRESHOLD: f64 = 0.5;

/// A labelled group of pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub page_count: u64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Collection {
    pub fn new<I, S>(id: impl Into<String>, name: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            labels: labels.into_iter().map(Into::into).collect(),
            page_count: 0,
            category: None,
            project_id: None,
            metadata: serde_json::Map::new(),
        }
    }
}

/// A candidate collection scored against the source labels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedCollectionMatch {
    pub collection: Collection,
    pub similarity_score: f64,
    pub overlapping_labels: BTreeSet<String>,
    pub unique_to_source: BTreeSet<String>,
    pub unique_to_match: BTreeSet<String>,
}

/// Parameters of a related-collections query
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedQuery {
    /// Minimum similarity score kept, inclusive
    pub threshold: f64,
    pub max_results: usize,
    /// Collection IDs never returned
    pub exclude_ids: HashSet<String>,
}

impl Default for RelatedQuery {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_results: DEFAULT_MAX_RESULTS,
            exclude_ids: HashSet::new(),
        }
    }
}

/// Outcome of [`RelatedCollectionsService::find_related`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedCollectionsResult {
    pub success: bool,
    pub matches: Vec<RelatedCollectionMatch>,
    /// Candidates considered, before any filtering
    pub total_candidates: usize,
    /// Candidates skipped for empty labels or an excluded ID
    pub filtered_count: usize,
    pub error: Option<String>,
}

/// Finds collections whose labels overlap a source label set
#[derive(Debug, Clone, Default)]
pub struct RelatedCollectionsService;

impl RelatedCollectionsService {
    pub fn new() -> Self {
        Self
    }

    /// Scores candidates by Jaccard similarity to `source_labels`
    ///
    /// Labels on both sides are trimmed and lowercased first. Matches at or
    /// above the threshold are sorted by score, highest first, with ties kept
    /// in candidate order.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::OutOfRange` if the threshold is outside
    /// `[0.0, 1.0]`. Empty source labels are not an error; they produce an
    /// unsuccessful result.
    pub fn find_related<S: AsRef<str>>(
        &self,
        source_labels: &[S],
        candidates: &[Collection],
        query: &RelatedQuery,
    ) -> Result<RelatedCollectionsResult, ValidationError> {
        validate_threshold("threshold", query.threshold)?;

        let source = normalize_labels(source_labels);
        if source.is_empty() {
            return Ok(RelatedCollectionsResult {
                success: false,
                matches: Vec::new(),
                total_candidates: candidates.len(),
                filtered_count: 0,
                error: Some("Source labels cannot be empty".to_string()),
            });
        }

        let mut filtered_count = 0;
        let mut matches = Vec::new();

        for candidate in candidates {
            let labels = normalize_labels(&candidate.labels);
            if labels.is_empty() || query.exclude_ids.contains(&candidate.id) {
                filtered_count += 1;
                continue;
            }

            let score = calculate_jaccard_similarity(&source, &labels);
            if score < query.threshold {
                continue;
            }

            let overlap = LabelOverlap::between(&source, &labels);
            matches.push(RelatedCollectionMatch {
                collection: candidate.clone(),
                similarity_score: score,
                overlapping_labels: overlap.overlapping,
                unique_to_source: overlap.unique_to_source,
                unique_to_match: overlap.unique_to_match,
            });
        }

        matches.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
        matches.truncate(query.max_results);

        tracing::debug!(
            candidates = candidates.len(),
            filtered = filtered_count,
            matched = matches.len(),
            "Found related collections"
        );

        Ok(RelatedCollectionsResult {
            success: true,
            matches,
            total_candidates: candidates.len(),
            filtered_count,
            error: None,
        })
    }

    /// Groups collections by greedy seed clustering
    ///
    /// Each unassigned collection in input order seeds a cluster and absorbs
    /// every later unassigned collection whose similarity to the seed is at
    /// least `threshold`. Every input appears in exactly one cluster.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::OutOfRange` if the threshold is outside
    /// `[0.0, 1.0]`.
    pub fn find_clusters<'a>(
        &self,
        collections: &'a [Collection],
        threshold: f64,
    ) -> Result<Vec<Vec<&'a Collection>>, ValidationError> {
        validate_threshold("cluster_threshold", threshold)?;

        let labels: Vec<BTreeSet<String>> = collections
            .iter()
            .map(|c| normalize_labels(&c.labels))
            .collect();
        let mut assigned = vec![false; collections.len()];
        let mut clusters = Vec::new();

        for seed in 0..collections.len() {
            if assigned[seed] {
                continue;
            }
            assigned[seed] = true;
            let mut cluster = vec![&collections[seed]];

            for other in (seed + 1)..collections.len() {
                if !assigned[other]
                    && calculate_jaccard_similarity(&labels[seed], &labels[other]) >= threshold
                {
                    assigned[other] = true;
                    cluster.push(&collections[other]);
                }
            }

            clusters.push(cluster);
        }

        Ok(clusters)
    }
}

fn validate_threshold(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: 1.0,
        })
    }
}
