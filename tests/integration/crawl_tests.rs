//! Integration tests for the crawler
//!
//! These tests use wiremock to serve following pages and drive the real HTTP
//! page source through the full crawl loop, reading the resulting CSV
//! collections back from disk.

use follow_ripple::config::{Config, CrawlerConfig, DataConfig, HttpConfig};
use follow_ripple::crawler::{crawl, HttpPageSource, PageSource};
use follow_ripple::store::{load_existing, load_seed_list, load_stats};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server and a temp dir
fn create_test_config(base_url: &str, dir: &TempDir) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_page: 256,
            concurrency: 1,
            max_attempts: 3,
            retry_base_delay_ms: 1,
            retry_max_delay_ms: 5,
            selector: ".name".to_string(),
        },
        http: HttpConfig {
            base_url: base_url.to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            timeout_secs: 5,
        },
        data: DataConfig {
            users_path: dir.path().join("users.csv").display().to_string(),
            followers_path: dir
                .path()
                .join("data")
                .join("user_followers.csv")
                .display()
                .to_string(),
        },
    }
}

/// Renders a following page listing the given identifiers
fn following_page(ids: &[&str]) -> String {
    let rows: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<tr><td class="table-person"><a class="avatar" href="{id}"><img></a>
                <h3 class="title-3"><a class="name" href="{id}">{id}</a></h3></td></tr>"#
            )
        })
        .collect();
    format!(
        r#"<html><head><title>Following</title></head><body>
        <table class="person-table">{rows}</table></body></html>"#
    )
}

/// In-memory log sink for asserting on emitted warnings
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn lines_containing(&self, needle: &str) -> usize {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter(|line| line.contains(needle))
            .count()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

async fn mount_page(server: &MockServer, route: &str, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(following_page(ids))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_crawl_until_empty_page() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);
    fs::write(&config.data.users_path, "user_id\n/alice/\n").unwrap();

    mount_page(&mock_server, "/alice/following/page/1/", &["/bob/", "/carol/"]).await;
    mount_page(&mock_server, "/alice/following/page/2/", &[]).await;

    Mock::given(method("GET"))
        .and(path("/alice/following/page/3/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let report = crawl(&config).await.expect("Crawl failed");

    assert_eq!(report.users, 1);
    assert_eq!(report.exhausted, 1);
    assert_eq!(report.discovered, 2);
    assert_eq!(
        load_seed_list(Path::new(&config.data.followers_path)).unwrap(),
        vec!["/bob/", "/carol/"]
    );
    assert_eq!(
        fs::read_to_string(&config.data.followers_path).unwrap(),
        "user_id\n/bob/\n/carol/\n"
    );
}

#[tokio::test]
async fn test_failed_fetch_is_retried() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);
    fs::write(&config.data.users_path, "user_id\n/alice/\n").unwrap();

    // First request for page 1 fails, the retry succeeds
    Mock::given(method("GET"))
        .and(path("/alice/following/page/1/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/alice/following/page/1/", &["/dave/"]).await;
    mount_page(&mock_server, "/alice/following/page/2/", &[]).await;

    // The test runtime is single-threaded, so a thread-local subscriber sees
    // every event of the crawl
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let report = crawl(&config).await.expect("Crawl failed");

    assert_eq!(logs.lines_containing("Fetch failed for"), 1);
    assert_eq!(logs.lines_containing("/alice/following/page/1/: HTTP 503"), 1);
    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.discovered, 1);
    assert_eq!(
        load_seed_list(Path::new(&config.data.followers_path)).unwrap(),
        vec!["/dave/"]
    );
}

#[tokio::test]
async fn test_unreachable_user_is_skipped() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);
    fs::write(&config.data.users_path, "user_id\n/gone/\n/alice/\n").unwrap();

    Mock::given(method("GET"))
        .and(path("/gone/following/page/1/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/alice/following/page/1/", &["/erin/"]).await;
    mount_page(&mock_server, "/alice/following/page/2/", &[]).await;

    let report = crawl(&config).await.expect("Crawl failed");

    assert_eq!(report.failed, vec!["/gone/"]);
    assert_eq!(report.exhausted, 1);
    assert_eq!(report.fetch_failures, 3);
    assert_eq!(
        load_seed_list(Path::new(&config.data.followers_path)).unwrap(),
        vec!["/erin/"]
    );
}

#[tokio::test]
async fn test_known_identifiers_are_not_rewritten() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);
    fs::write(&config.data.users_path, "user_id\n/alice/\n/frank/\n").unwrap();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(&config.data.followers_path, "user_id\n/bob/\n").unwrap();

    // /frank/ is a primary user, /bob/ was discovered by an earlier run
    mount_page(
        &mock_server,
        "/alice/following/page/1/",
        &["/bob/", "/frank/", "/gina/"],
    )
    .await;
    mount_page(&mock_server, "/alice/following/page/2/", &[]).await;
    mount_page(&mock_server, "/frank/following/page/1/", &["/gina/", "/alice/"]).await;
    mount_page(&mock_server, "/frank/following/page/2/", &[]).await;

    let report = crawl(&config).await.expect("Crawl failed");

    assert_eq!(report.discovered, 1);
    assert_eq!(
        fs::read_to_string(&config.data.followers_path).unwrap(),
        "user_id\n/bob/\n/gina/\n"
    );
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);
    fs::write(&config.data.users_path, "user_id\n/alice/\n").unwrap();

    mount_page(&mock_server, "/alice/following/page/1/", &["/bob/", "/carol/"]).await;
    mount_page(&mock_server, "/alice/following/page/2/", &["/dave/"]).await;
    mount_page(&mock_server, "/alice/following/page/3/", &[]).await;

    let first = crawl(&config).await.expect("First crawl failed");
    let second = crawl(&config).await.expect("Second crawl failed");

    assert_eq!(first.discovered, 3);
    assert_eq!(second.discovered, 0);
    assert_eq!(second.pages_processed, 2);

    let stats = load_stats(&config.data).unwrap();
    assert_eq!(stats.users, 1);
    assert_eq!(stats.discovered, 3);
    assert_eq!(stats.known, 4);
    assert_eq!(
        fs::read_to_string(&config.data.followers_path)
            .unwrap()
            .lines()
            .count(),
        4
    );
}

#[tokio::test]
async fn test_page_ceiling_stops_pagination() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), &dir);
    config.crawler.max_page = 3;
    fs::write(&config.data.users_path, "user_id\n/alice/\n").unwrap();

    mount_page(&mock_server, "/alice/following/page/1/", &["/p1/"]).await;
    mount_page(&mock_server, "/alice/following/page/2/", &["/p2/"]).await;
    mount_page(&mock_server, "/alice/following/page/3/", &["/p3/"]).await;
    Mock::given(method("GET"))
        .and(path("/alice/following/page/4/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(following_page(&["/p4/"])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let report = crawl(&config).await.expect("Crawl failed");

    assert_eq!(report.max_reached, 1);
    assert_eq!(report.pages_processed, 3);
    let discovered = load_existing(Path::new(&config.data.followers_path)).unwrap();
    assert_eq!(discovered.len(), 3);
    assert!(!discovered.contains("/p4/"));
}

#[tokio::test]
async fn test_request_identity_headers() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);

    Mock::given(method("GET"))
        .and(path("/alice/following/page/1/"))
        .and(header("user-agent", "Mozilla/5.0"))
        .and(header_exists("accept-language"))
        .respond_with(ResponseTemplate::new(200).set_body_string(following_page(&["/bob/"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let source = HttpPageSource::new(&config.http).unwrap();
    let body = source
        .fetch_page("/alice/", 1)
        .await
        .into_body()
        .expect("Page should be fetched");
    assert!(body.contains("/bob/"));
}

#[tokio::test]
async fn test_redirects_are_followed() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);

    Mock::given(method("GET"))
        .and(path("/old-name/following/page/1/"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", "/new-name/following/page/1/"),
        )
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/new-name/following/page/1/", &["/hal/"]).await;

    let source = HttpPageSource::new(&config.http).unwrap();
    let body = source
        .fetch_page("/old-name/", 1)
        .await
        .into_body()
        .expect("Redirect should be followed");
    assert!(body.contains("/hal/"));
}

#[tokio::test]
async fn test_users_without_user_id_are_skipped() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);
    fs::write(
        &config.data.users_path,
        "name,user_id\nAlice,/alice/\nBob\n",
    )
    .unwrap();

    mount_page(&mock_server, "/alice/following/page/1/", &["/ivy/"]).await;
    mount_page(&mock_server, "/alice/following/page/2/", &[]).await;

    let report = crawl(&config).await.expect("Crawl failed");

    assert_eq!(report.users, 1);
    assert_eq!(report.exhausted, 1);
    assert_eq!(
        load_seed_list(Path::new(&config.data.followers_path)).unwrap(),
        vec!["/ivy/"]
    );
}

#[tokio::test]
async fn test_unreadable_users_collection_is_fatal() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);
    fs::write(&config.data.users_path, b"user_id\n/alice/\n/b\xffb/\n").unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    assert!(crawl(&config).await.is_err());
}
