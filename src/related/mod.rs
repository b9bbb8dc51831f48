//! Related collection matching
//!
//! Collections are compared by the Jaccard similarity of their label sets,
//! either against a source label set or against each other for clustering.

mod service;
mod similarity;

pub use service::{
    Collection, RelatedCollectionMatch, RelatedCollectionsResult, RelatedCollectionsService,
    RelatedQuery, DEFAULT_CLUSTER_THRESHOLD, DEFAULT_MAX_RESULTS, DEFAULT_SIMILARITY_THRESHOLD,
};
pub use similarity::{calculate_jaccard_similarity, normalize_labels, LabelOverlap};
