//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use sumi_harvest::config::parse_config;
use sumi_harvest::crawler::{crawl, CrawlOptions};
use sumi_harvest::output::{ChannelObserver, ProgressEvent, ProgressObserver};
use tokio::sync::mpsc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UA: &str = "TestBot/1.0";

/// Creates test options with robots.txt disabled and fast retries
fn test_options(max_depth: u32) -> CrawlOptions {
    CrawlOptions {
        max_depth,
        user_agent: UA.to_string(),
        respect_robots_txt: false,
        concurrency_limit: 5,
        retry_limit: 0,
        backoff_base_ms: 10,
        request_timeout: Duration::from_secs(5),
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, route: &str, body: &str, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .expect(expected_hits)
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_scenario_single_host_depth_one() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        &format!(
            r#"<a href="/a">A</a><a href="{}/b">B</a><a href="{}/elsewhere">Out</a>"#,
            base,
            other.uri()
        ),
        1,
    )
    .await;
    mount_page(&server, "/a", "<p>A</p>", 1).await;
    mount_page(&server, "/b", "<p>B</p>", 1).await;
    mount_page(&other, "/elsewhere", "<p>Out</p>", 0).await;

    let result = crawl(&base, test_options(1), None).await;

    assert_eq!(result.html_contents().len(), 3);
    assert!(result.html_contents().contains_key(&format!("{}/", base)));
    assert!(result.html_contents().contains_key(&format!("{}/a", base)));
    assert!(result.html_contents().contains_key(&format!("{}/b", base)));
    assert!(result.errors().is_empty());
    assert!(result.end_time() >= result.start_time());

    let expected_bytes: usize = result.html_contents().values().map(String::len).sum();
    assert_eq!(result.total_bytes(), expected_bytes as u64);
}

#[tokio::test]
async fn test_scenario_malformed_root() {
    let result = crawl("example.com/docs", CrawlOptions::default(), None).await;

    assert!(result.html_contents().is_empty());
    assert_eq!(result.errors().len(), 1);
    assert!(result.errors().contains_key("example.com/docs"));
    assert!(result.elapsed_ms() >= 0);
}

#[tokio::test]
async fn test_unsupported_scheme_root() {
    let result = crawl("ftp://example.com/", CrawlOptions::default(), None).await;
    assert!(result.html_contents().is_empty());
    assert!(result.errors().contains_key("ftp://example.com/"));
}

#[tokio::test]
async fn test_max_depth_zero_fetches_root_only() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/child">Child</a>"#, 1).await;
    mount_page(&server, "/child", "<p>child</p>", 0).await;

    let result = crawl(&server.uri(), test_options(0), None).await;

    assert_eq!(result.html_contents().len(), 1);
    assert!(result.errors().is_empty());
}

#[tokio::test]
async fn test_cycle_fetched_once_per_url() {
    let server = MockServer::start().await;
    mount_page(&server, "/a", r#"<a href="/b">B</a><a href="/a#self">Self</a>"#, 1).await;
    mount_page(&server, "/b", r#"<a href="/a">A</a><a href="/b">B</a>"#, 1).await;

    let root = format!("{}/a", server.uri());
    let result = crawl(&root, test_options(5), None).await;

    assert_eq!(result.html_contents().len(), 2);
    assert!(result.errors().is_empty());
}

#[tokio::test]
async fn test_root_fragment_is_stripped() {
    let server = MockServer::start().await;
    mount_page(&server, "/guide", "<p>guide</p>", 1).await;

    let result = crawl(&format!("{}/guide#intro", server.uri()), test_options(0), None).await;

    let key = format!("{}/guide", server.uri());
    assert!(result.html_contents().contains_key(&key));
}

#[tokio::test]
async fn test_transient_failures_retried_then_stored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_page(&server, "/flaky", "<p>finally</p>", 1).await;

    let options = CrawlOptions {
        retry_limit: 3,
        backoff_base_ms: 20,
        ..test_options(0)
    };

    let started = Instant::now();
    let result = crawl(&format!("{}/flaky", server.uri()), options, None).await;
    let elapsed = started.elapsed();

    assert_eq!(result.html_contents().len(), 1);
    assert!(result.errors().is_empty());
    // 20ms then 40ms of backoff
    assert!(elapsed >= Duration::from_millis(60));
}

#[tokio::test]
async fn test_retries_exhausted_recorded_as_error() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/down">Down</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let options = CrawlOptions {
        retry_limit: 2,
        backoff_base_ms: 1,
        ..test_options(1)
    };
    let result = crawl(&server.uri(), options, None).await;

    let message = &result.errors()[&format!("{}/down", server.uri())];
    assert!(message.starts_with("HTTP Error: 500 - "));
    assert!(message.contains("after 3 attempts"));
}

#[tokio::test]
async fn test_denied_extension_never_dispatched() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<img src="/logo.png"><a href="/logo.png">Logo</a><a href="/page">Page</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/page", "<p>page</p>", 1).await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![0x89, b'P', b'N', b'G'], "image/png"),
        )
        .expect(0)
        .mount(&server)
        .await;

    let result = crawl(&server.uri(), test_options(1), None).await;

    let key = format!("{}/logo.png", server.uri());
    assert_eq!(
        result.errors()[&key],
        "Skipped due to file extension: /logo.png"
    );
    assert!(!result.html_contents().contains_key(&key));
    assert_eq!(result.html_contents().len(), 2);
}

#[tokio::test]
async fn test_robots_disallowed_link_skipped() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /private/").await;
    mount_page(
        &server,
        "/",
        r#"<a href="/private/keys">Keys</a><a href="/public">Public</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/public", "<p>public</p>", 1).await;
    mount_page(&server, "/private/keys", "<p>secret</p>", 0).await;

    let options = CrawlOptions {
        respect_robots_txt: true,
        ..test_options(1)
    };
    let result = crawl(&server.uri(), options, None).await;

    let key = format!("{}/private/keys", server.uri());
    assert_eq!(
        result.errors()[&key],
        "Skipped by robots.txt (discovered link)"
    );
    assert!(!result.html_contents().contains_key(&key));
    assert_eq!(result.html_contents().len(), 2);
}

#[tokio::test]
async fn test_robots_disallowed_root_not_fetched() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: TestBot\nDisallow: /").await;
    mount_page(&server, "/", "<p>root</p>", 0).await;

    let options = CrawlOptions {
        respect_robots_txt: true,
        ..test_options(1)
    };
    let root = format!("{}/", server.uri());
    let result = crawl(&root, options, None).await;

    assert!(result.html_contents().is_empty());
    assert_eq!(result.errors()[&root], "Skipped by robots.txt");
}

#[tokio::test]
async fn test_robots_ignored_when_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .expect(0)
        .mount(&server)
        .await;
    mount_page(&server, "/", r#"<a href="/private/keys">Keys</a>"#, 1).await;
    mount_page(&server, "/private/keys", "<p>secret</p>", 1).await;

    let result = crawl(&server.uri(), test_options(1), None).await;
    assert_eq!(result.html_contents().len(), 2);
}

#[tokio::test]
async fn test_missing_robots_allows_everything() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", "<p>root</p>", 1).await;

    let options = CrawlOptions {
        respect_robots_txt: true,
        ..test_options(0)
    };
    let result = crawl(&server.uri(), options, None).await;
    assert_eq!(result.html_contents().len(), 1);
}

#[tokio::test]
async fn test_non_html_content_type_skipped() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/feed">Feed</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"items":[]}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = crawl(&server.uri(), test_options(1), None).await;

    let key = format!("{}/feed", server.uri());
    assert_eq!(
        result.errors()[&key],
        "Skipped: Not HTML (Content-Type: application/json)"
    );
    assert_eq!(result.html_contents().len(), 1);
}

#[tokio::test]
async fn test_page_and_error_keys_disjoint() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /admin").await;
    mount_page(
        &server,
        "/",
        r#"
            <a href="/ok">OK</a>
            <a href="/gone">Gone</a>
            <a href="/admin">Admin</a>
            <a href="/style.css">CSS</a>
            <a href="/ok#again">OK again</a>
        "#,
        1,
    )
    .await;
    mount_page(&server, "/ok", r#"<a href="/">Home</a><a href="/gone">Gone</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .expect(1)
        .mount(&server)
        .await;

    let options = CrawlOptions {
        respect_robots_txt: true,
        ..test_options(3)
    };
    let result = crawl(&server.uri(), options, None).await;

    let pages: HashSet<_> = result.html_contents().keys().collect();
    let errors: HashSet<_> = result.errors().keys().collect();
    assert!(pages.is_disjoint(&errors));
    assert_eq!(pages.len(), 2);
    assert_eq!(errors.len(), 3);
}

#[tokio::test]
async fn test_user_agent_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", UA))
        .respond_with(html("<p>hi</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let result = crawl(&server.uri(), test_options(0), None).await;
    assert_eq!(result.html_contents().len(), 1);
}

#[tokio::test]
async fn test_observer_receives_events() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;
    mount_page(&server, "/", r#"<a href="/next">Next</a><a href="/missing">Missing</a>"#, 1).await;
    mount_page(&server, "/next", "<p>next</p>", 1).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let observer: Arc<dyn ProgressObserver> = Arc::new(ChannelObserver::new(tx));
    let options = CrawlOptions {
        respect_robots_txt: true,
        ..test_options(1)
    };
    let result = crawl(&server.uri(), options, Some(observer)).await;

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert!(events.iter().any(|e| matches!(
        e,
        ProgressEvent::Info { message, .. } if message.starts_with("Successfully parsed robots.txt")
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        ProgressEvent::Info { message, .. } if message == "Fetching at depth 0"
    )));

    let progress: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Progress(p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(progress.len(), result.html_contents().len());
    assert_eq!(
        progress.iter().map(|p| p.fetched_count).max(),
        Some(result.html_contents().len())
    );
    assert!(progress.iter().all(|p| p.status == 200 && p.bytes > 0));

    let missing = format!("{}/missing", server.uri());
    assert!(events.iter().any(|e| matches!(
        e,
        ProgressEvent::Error { url, status: Some(404), .. } if *url == missing
    )));
}

#[tokio::test]
async fn test_options_from_config_file() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/a">A</a>"#, 1).await;
    mount_page(&server, "/a", "<p>a</p>", 0).await;

    let config = parse_config(
        r#"
        [crawler]
        max-depth = 0
        respect-robots-txt = false

        [user-agent]
        crawler-name = "ConfigBot"
        crawler-version = "2.0"
        "#,
    )
    .expect("config should parse");

    let options = CrawlOptions::from(&config);
    assert_eq!(options.user_agent, "ConfigBot/2.0");

    let result = crawl(&server.uri(), options, None).await;
    assert_eq!(result.html_contents().len(), 1);
}
