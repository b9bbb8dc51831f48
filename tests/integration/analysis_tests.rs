//! Content analysis tests: fingerprints, change detection, related
//! collections and content quality

use seo_frontier::changes::{ChangeDetector, ContentHasher, HashFields, PageSnapshot};
use seo_frontier::quality::{ContentInput, ContentQualityService};
use seo_frontier::related::{
    calculate_jaccard_similarity, Collection, RelatedCollectionsService, RelatedQuery,
};
use std::collections::{BTreeSet, HashSet};

fn labels(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_jaccard_properties() {
    let sets = [
        labels(&[]),
        labels(&["shoes"]),
        labels(&["shoes", "trail"]),
        labels(&["boots", "leather", "trail"]),
    ];

    for a in &sets {
        for b in &sets {
            let ab = calculate_jaccard_similarity(a, b);
            assert!((0.0..=1.0).contains(&ab));
            assert_eq!(ab, calculate_jaccard_similarity(b, a));
        }
        if !a.is_empty() {
            assert_eq!(calculate_jaccard_similarity(a, a), 1.0);
        }
    }
    assert_eq!(calculate_jaccard_similarity(&sets[0], &sets[0]), 0.0);
}

#[test]
fn test_hash_truncation_and_case_folding() {
    let hasher = ContentHasher::default();
    let long = "x".repeat(6000);
    let cut = "x".repeat(5000);

    assert_eq!(
        hasher.compute_hash(&HashFields {
            title: Some("A"),
            body_text: Some(&long),
            ..Default::default()
        }),
        hasher.compute_hash(&HashFields {
            title: Some("A"),
            body_text: Some(&cut),
            ..Default::default()
        })
    );
    assert_eq!(
        hasher.compute_hash(&HashFields {
            title: Some("Title"),
            ..Default::default()
        }),
        hasher.compute_hash(&HashFields {
            title: Some("title"),
            ..Default::default()
        })
    );
}

#[test]
fn test_unchanged_compare_scenario() {
    let previous = vec![PageSnapshot::new("u1", Some("h1"))];
    let current = vec![PageSnapshot::new("u1", Some("h1"))];

    let summary = ChangeDetector::default().compare(&previous, &current);
    assert_eq!(summary.unchanged_pages, 1);
    assert!(!summary.is_significant);
}

#[test]
fn test_change_partition_covers_union() {
    let previous = vec![
        PageSnapshot::new("a", Some("1")),
        PageSnapshot::new("b", Some("2")),
        PageSnapshot::new("c", Some("3")),
        PageSnapshot::new("d", None),
    ];
    let current = vec![
        PageSnapshot::new("b", Some("2")),
        PageSnapshot::new("c", Some("changed")),
        PageSnapshot::new("e", Some("5")),
        PageSnapshot::new("d", None),
    ];

    let detector = ChangeDetector::default();
    let changes = detector.classify(&previous, &current);
    let union: HashSet<&str> = previous
        .iter()
        .chain(&current)
        .map(|s| s.url.as_str())
        .collect();
    let classified: HashSet<&str> = changes.iter().map(|c| c.url.as_str()).collect();
    assert_eq!(changes.len(), union.len());
    assert_eq!(classified, union);

    let summary = detector.compare(&previous, &current);
    assert_eq!(
        summary.new_pages + summary.removed_pages + summary.changed_pages + summary.unchanged_pages,
        union.len()
    );
    assert_eq!(summary.new_urls, vec!["e"]);
    assert_eq!(summary.removed_urls, vec!["a"]);
    assert_eq!(summary.changed_urls, vec!["c"]);
}

fn catalogue() -> Vec<Collection> {
    vec![
        Collection::new("trail", "Trail Shoes", ["Shoes", "trail", "running"]),
        Collection::new("road", "Road Shoes", ["shoes", "road", "running"]),
        Collection::new("boots", "Leather Boots", ["boots", "leather"]),
        Collection::new("hiking", "Hiking Boots", ["boots", "leather", "trail"]),
        Collection::new("empty", "Unlabelled", Vec::<String>::new()),
    ]
}

#[test]
fn test_find_related_ranks_and_filters() {
    let service = RelatedCollectionsService::new();
    let collections = catalogue();
    let query = RelatedQuery {
        exclude_ids: ["trail".to_string()].into_iter().collect(),
        ..RelatedQuery::default()
    };

    let result = service
        .find_related(&["shoes", "trail", "running"], &collections, &query)
        .unwrap();

    assert!(result.success);
    assert_eq!(result.total_candidates, 5);
    assert_eq!(result.filtered_count, 2);
    let ids: Vec<&str> = result.matches.iter().map(|m| m.collection.id.as_str()).collect();
    assert_eq!(ids, vec!["road", "hiking"]);
    assert_eq!(result.matches[0].similarity_score, 0.5);
    assert_eq!(result.matches[0].overlapping_labels, labels(&["running", "shoes"]));
    assert_eq!(result.matches[0].unique_to_source, labels(&["trail"]));
    assert_eq!(result.matches[0].unique_to_match, labels(&["road"]));
}

#[test]
fn test_find_related_empty_source() {
    let result = RelatedCollectionsService::new()
        .find_related::<&str>(&[], &catalogue(), &RelatedQuery::default())
        .unwrap();
    assert!(!result.success);
    assert!(result.matches.is_empty());
    assert!(result.error.is_some());
}

#[test]
fn test_clusters_partition_input() {
    let collections = catalogue();
    let clusters = RelatedCollectionsService::new()
        .find_clusters(&collections, 0.4)
        .unwrap();

    let mut ids: Vec<&str> = clusters
        .iter()
        .flatten()
        .map(|c| c.id.as_str())
        .collect();
    ids.sort_unstable();
    let mut expected: Vec<&str> = collections.iter().map(|c| c.id.as_str()).collect();
    expected.sort_unstable();
    assert_eq!(ids, expected);
}

#[test]
fn test_quality_score_boundary() {
    let service = ContentQualityService::with_defaults().unwrap();

    let one = service
        .check_content_quality(&ContentInput {
            h1: Some("Trail boots".to_string()),
            title_tag: Some("Trail boots | Shop".to_string()),
            meta_description: None,
            top_description: None,
            bottom_description: "<p>Our fitters delve into sizing with you.</p>".to_string(),
        })
        .unwrap();
    assert_eq!(one.score, 80.0);
    assert!(one.passed_qa);

    let two = service
        .check_content_quality(&ContentInput::from_body(
            "Our fitters delve into sizing and harness feedback from customers.",
        ))
        .unwrap();
    assert_eq!(two.score, 60.0);
    assert!(!two.passed_qa);
}

#[test]
fn test_quality_batch_reports_each_item() {
    let service = ContentQualityService::with_defaults().unwrap();
    let batch = service.check_batch(&[
        ContentInput::from_body("Hand-stitched boots with a rubber sole."),
        ContentInput::from_body("   "),
        ContentInput::from_body("Bold. Simple. Effective. Look no further."),
    ]);

    assert_eq!(batch.passed, 1);
    assert_eq!(batch.errored, 1);
    assert_eq!(batch.failed, 1);

    let tropes = &batch.results[2].result.as_ref().unwrap().tropes;
    assert_eq!(tropes.triplet_patterns.len(), 1);
    assert_eq!(tropes.banned_phrases[0].phrase, "look no further");
    assert_eq!(tropes.overall_score, 75.0);
}
