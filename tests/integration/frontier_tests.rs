//! Frontier and pattern filtering tests

use seo_frontier::crawler::{Priority, UrlPriorityQueue};
use seo_frontier::url::PatternMatcher;
use std::collections::HashSet;

#[test]
fn test_include_pattern_scenario() {
    let mut queue =
        UrlPriorityQueue::new("https://ex.com/", vec!["/products/*".to_string()], vec![])
            .unwrap();

    assert!(queue.add("https://ex.com/products/a", None, 1));
    assert!(!queue.add("https://ex.com/blog/a", None, 1));
    assert_eq!(queue.len(), 2);

    let start = queue.pop().unwrap();
    assert_eq!(start.depth, 0);
    assert_eq!(start.priority, Priority::Include);

    let product = queue.pop().unwrap();
    assert_eq!(product.url, "https://ex.com/products/a");
    assert_eq!(product.priority, Priority::Include);
    assert!(queue.pop().is_none());
}

#[test]
fn test_dedup_and_pop_once() {
    let mut queue = UrlPriorityQueue::new("https://ex.com/", vec![], vec![]).unwrap();

    assert!(queue.add("https://ex.com/a", Some("https://ex.com/"), 1));
    assert!(!queue.add("https://EX.com/a/#frag", Some("https://ex.com/"), 1));
    assert!(queue.add("https://ex.com/b", None, 2));

    let mut popped = HashSet::new();
    while let Some(next) = queue.pop() {
        assert!(popped.insert(next.normalized_url.clone()));
        // Popped URLs are never accepted again
        assert!(!queue.add(&next.url, None, 1));
    }
    assert_eq!(popped.len(), 3);
    assert_eq!(queue.total_popped(), 3);
    assert_eq!(queue.total_added(), 3);
}

#[test]
fn test_exclude_wins_over_include() {
    let matcher = PatternMatcher::new(
        vec!["/admin/special".to_string()],
        vec!["/admin/*".to_string()],
    )
    .unwrap();

    let decision = matcher.should_crawl("https://ex.com/admin/special");
    assert!(!decision.is_allowed());
    assert_eq!(decision.to_string(), "excluded by pattern: /admin/*");
}

#[test]
fn test_seeds_pop_after_include_tier() {
    let mut queue =
        UrlPriorityQueue::new("https://ex.com/", vec!["/products/*".to_string()], vec![])
            .unwrap();
    assert!(queue.add_seed("https://ex.com/landing"));
    assert!(queue.add("https://ex.com/products/a", None, 1));

    let order: Vec<Priority> = std::iter::from_fn(|| queue.pop())
        .map(|q| q.priority)
        .collect();
    assert_eq!(order, vec![Priority::Include, Priority::Include, Priority::Normal]);
}
