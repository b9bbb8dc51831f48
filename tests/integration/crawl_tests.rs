//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl cycle end-to-end into an in-memory SQLite store.

use seo_frontier::changes::{ChangeDetector, ContentHasher};
use seo_frontier::config::{HttpConfig, UserAgentConfig};
use seo_frontier::crawler::{CrawlJob, CrawlService, CrawlStatus, HttpCrawlClient};
use seo_frontier::storage::{PageStore, SqliteStorage};
use seo_frontier::url::normalize_url_string;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_service() -> CrawlService<HttpCrawlClient, SqliteStorage> {
    let http = HttpConfig {
        timeout_secs: 5,
        connect_timeout_secs: 2,
        max_retries: 0,
        retry_base_delay_ms: 1,
    };
    let user_agent = UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    };

    CrawlService::new(
        HttpCrawlClient::new(&user_agent, &http).expect("Failed to build client"),
        SqliteStorage::new_in_memory().expect("Failed to open storage"),
        ContentHasher::default(),
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html")
}

async fn mount_page(server: &MockServer, route: &str, title: &str, body: &str, links: &[&str]) {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{href}">{href}</a>"#))
        .collect();
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(format!(
            "<html><head><title>{title}</title></head><body><h1>{title}</h1><p>{body}</p>{anchors}</body></html>"
        )))
        .mount(server)
        .await;
}

async fn mount_missing(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

const HOME_LINKS: &[&str] = &["/products/a", "/products/b", "/about", "/products/c"];

#[tokio::test]
async fn test_full_crawl_single_site() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", "Welcome", HOME_LINKS).await;
    mount_page(&server, "/products/a", "Boot A", "Leather boot", &["/"]).await;
    mount_page(&server, "/products/b", "Boot B", "Rain boot", &[]).await;
    mount_page(&server, "/about", "About", "Family shop", &["https://elsewhere.test/"]).await;
    mount_missing(&server, "/products/c").await;

    let mut service = test_service();
    let start = format!("{}/", server.uri());
    let progress = service
        .run_crawl(&CrawlJob::new(1, start.clone()), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(progress.status, CrawlStatus::Completed);
    assert_eq!(progress.pages_crawled, 4);
    assert_eq!(progress.pages_failed, 1);
    assert_eq!(progress.errors[0].error, "HTTP 404");

    let storage = service.storage();
    assert_eq!(storage.count_pages(1).unwrap(), 4);

    let normalized = normalize_url_string(&format!("{}/products/a", server.uri())).unwrap();
    let page = storage
        .find_page_by_normalized_url(1, &normalized)
        .unwrap()
        .expect("page should be stored");
    assert_eq!(page.title.as_deref(), Some("Boot A"));
    assert_eq!(page.h1.as_deref(), Some("Boot A"));
    assert_eq!(page.status_code, Some(200));
    assert_eq!(page.content_hash.len(), 32);

    let record = storage.get_crawl(progress.crawl_id).unwrap();
    assert_eq!(record.status, CrawlStatus::Completed);
    assert_eq!(record.progress.unwrap()["pages_crawled"], 4);
}

#[tokio::test]
async fn test_include_patterns_order_requests() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", "Welcome", &["/about", "/products/b", "/products/a"]).await;
    mount_page(&server, "/products/a", "Boot A", "Leather boot", &[]).await;
    mount_page(&server, "/products/b", "Boot B", "Rain boot", &[]).await;
    mount_page(&server, "/about", "About", "Family shop", &[]).await;

    let mut service = test_service();
    let mut job = CrawlJob::new(1, format!("{}/", server.uri()));
    job.include_patterns = vec!["/products/*".to_string()];

    service
        .run_crawl(&job, &CancellationToken::new())
        .await
        .unwrap();

    let paths: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| request.url.path().to_string())
        .collect();
    assert_eq!(paths, vec!["/", "/products/b", "/products/a"]);
}

#[tokio::test]
async fn test_unchanged_recrawl_is_not_significant() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", "Welcome", &["/products/a"]).await;
    mount_page(&server, "/products/a", "Boot A", "Leather boot", &[]).await;

    let mut service = test_service();
    let job = CrawlJob::new(1, format!("{}/", server.uri()));
    let first = service.run_crawl(&job, &CancellationToken::new()).await.unwrap();
    let second = service.run_crawl(&job, &CancellationToken::new()).await.unwrap();

    let storage = service.storage();
    let summary = ChangeDetector::default().compare(
        &storage.load_snapshots(first.crawl_id).unwrap(),
        &storage.load_snapshots(second.crawl_id).unwrap(),
    );

    assert_eq!(summary.unchanged_pages, 2);
    assert_eq!(summary.new_pages + summary.removed_pages + summary.changed_pages, 0);
    assert!(!summary.is_significant);
}

#[tokio::test]
async fn test_change_detection_across_crawls() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", "Welcome", HOME_LINKS).await;
    mount_page(&server, "/products/a", "Boot A", "Leather boot", &[]).await;
    mount_page(&server, "/products/b", "Boot B", "Rain boot", &[]).await;
    mount_page(&server, "/about", "About", "Family shop", &[]).await;
    mount_missing(&server, "/products/c").await;

    let mut service = test_service();
    let job = CrawlJob::new(1, format!("{}/", server.uri()));
    let first = service.run_crawl(&job, &CancellationToken::new()).await.unwrap();
    assert_eq!(first.pages_crawled, 4);

    server.reset().await;
    mount_page(&server, "/", "Home", "Welcome", HOME_LINKS).await;
    mount_page(&server, "/products/a", "Boot A", "Leather boot, now resoled", &[]).await;
    mount_page(&server, "/products/b", "Boot B", "Rain boot", &[]).await;
    mount_missing(&server, "/about").await;
    mount_page(&server, "/products/c", "Boot C", "Winter boot", &[]).await;

    let second = service.run_crawl(&job, &CancellationToken::new()).await.unwrap();
    assert_eq!(second.pages_crawled, 4);

    let url = |route: &str| normalize_url_string(&format!("{}{}", server.uri(), route)).unwrap();
    let detector = ChangeDetector::new(5, 0.10).unwrap();
    let summary = {
        let storage = service.storage();
        detector.compare(
            &storage.load_snapshots(first.crawl_id).unwrap(),
            &storage.load_snapshots(second.crawl_id).unwrap(),
        )
    };

    assert_eq!(summary.new_urls, vec![url("/products/c")]);
    assert_eq!(summary.removed_urls, vec![url("/about")]);
    assert_eq!(summary.changed_urls, vec![url("/products/a")]);
    assert_eq!(summary.unchanged_pages, 2);
    assert_eq!(summary.total_previous, 4);
    assert_eq!(summary.total_current, 4);
    assert!((summary.change_percentage - 1.0 / 3.0).abs() < 1e-9);
    assert!(summary.is_significant);

    let storage = service.storage_mut();
    let summary_id = storage
        .save_change_summary(1, first.crawl_id, second.crawl_id, &summary)
        .unwrap();
    assert!(summary_id > 0);
    // Pages from both crawls remain stored
    assert_eq!(storage.count_pages(1).unwrap(), 5);
}
