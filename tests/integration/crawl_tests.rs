//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the photo site and run the full
//! search -> detail -> image -> checkpoint cycle end-to-end.

use plane_harvest::config::Config;
use plane_harvest::crawler::{Coordinator, CrawlOutcome};
use plane_harvest::state::{load_state, save_state, CrawlState, StateError};
use plane_harvest::storage::{url_digest, ImageStore, StorageError, StorageResult};
use plane_harvest::HarvestError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, queries: &[&str], dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.search.base_url = base_url.to_string();
    config.search.url_template = format!("{}/search?keywords={{query}}&page={{page}}", base_url);
    config.search.queries = queries.iter().map(|q| q.to_string()).collect();
    config.search.max_pages_per_query = 1;
    config.crawler.page_delay_ms = 0;
    config.crawler.max_concurrent_details = 2;
    config.crawler.request_timeout_secs = 5;
    config.retry.initial_delay_ms = 1;
    config.retry.search_attempts = 2;
    config.retry.detail_attempts = 3;
    config.output.save_dir = dir.path().join("planes").display().to_string();
    config.output.state_path = dir.path().join("state.json").display().to_string();
    config
}

fn search_page(photo_paths: &[&str]) -> String {
    let cards: String = photo_paths
        .iter()
        .map(|p| format!(r#"<div class="resultPreview"><a href="{}">photo</a></div>"#, p))
        .collect();
    format!("<html><body>{}</body></html>", cards)
}

fn detail_page(plane_type: &str, image_path: &str) -> String {
    format!(
        r#"<html><body>
        <div class="pib-section-content-left">
            <a href="/airline/x">Some Airline</a>
            <a href="/type/y">{}</a>
        </div>
        <div class="pdp-image-wrapper"><img src="{}"></div>
        </body></html>"#,
        plane_type, image_path
    )
}

async fn mount_search(server: &MockServer, query: &str, page: u32, photo_paths: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("keywords", query))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(photo_paths)))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, photo_path: &str, plane_type: &str, image_path: &str) {
    Mock::given(method("GET"))
        .and(path(photo_path))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(detail_page(plane_type, image_path)),
        )
        .mount(server)
        .await;
}

async fn mount_image(server: &MockServer, image_path: &str, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(image_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image_path.as_bytes().to_vec()))
        .expect(expected_hits)
        .mount(server)
        .await;
}

fn expected_file(config: &Config, image_url: &str, class: &str, subclass: Option<&str>) -> PathBuf {
    let mut dir = Path::new(&config.output.save_dir).join(class);
    if let Some(subclass) = subclass {
        dir.push(subclass);
    }
    dir.join(format!("{}_{}.jpg", class, url_digest(image_url)))
}

#[tokio::test]
async fn test_full_crawl_saves_class_tree() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, &["q1"], &dir);

    mount_search(&server, "q1", 1, &["/photo/1", "/photo/2", "/photo/3"]).await;
    mount_detail(&server, "/photo/1", "Airbus A320-214", "/img/1.jpg").await;
    mount_detail(&server, "/photo/2", "Boeing 737-7H4", "/img/2.jpg").await;
    mount_detail(&server, "/photo/3", "Cessna 172 Skyhawk", "/img/3.jpg").await;
    mount_image(&server, "/img/1.jpg", 1).await;
    mount_image(&server, "/img/2.jpg", 1).await;
    // Unclassified entries are never downloaded
    mount_image(&server, "/img/3.jpg", 0).await;

    let mut coordinator = Coordinator::new(config.clone(), true)
        .unwrap()
        .with_progress_output(false);
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.outcome, CrawlOutcome::QueriesExhausted);
    assert_eq!(report.pages_processed, 1);
    assert_eq!(report.images_saved, 2);

    let a320 = expected_file(&config, &format!("{}/img/1.jpg", base_url), "A320", None);
    let ng = expected_file(
        &config,
        &format!("{}/img/2.jpg", base_url),
        "B737 NG",
        Some("737-7"),
    );
    assert_eq!(std::fs::read(&a320).unwrap(), b"/img/1.jpg");
    assert!(ng.exists(), "missing {}", ng.display());

    let state = load_state(Path::new(&config.output.state_path)).unwrap();
    assert_eq!((state.query_index, state.page), (1, 1));
    assert_eq!(state.class_count("A320"), 1);
    assert_eq!(state.class_count("B737 NG"), 1);
    assert_eq!(state.subclass_count("B737 NG:737-7"), 1);
    assert_eq!(state.downloaded.len(), 2);
    assert!(state.updated_at.is_some());
}

#[tokio::test]
async fn test_resume_skips_downloaded_images() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, &["q1"], &dir);

    let mut previous = CrawlState::new();
    previous.record_class_save(&format!("{}/img/1.jpg", base_url), "A320");
    save_state(Path::new(&config.output.state_path), &previous).unwrap();

    mount_search(&server, "q1", 1, &["/photo/1", "/photo/2"]).await;
    mount_detail(&server, "/photo/1", "Airbus A320-214", "/img/1.jpg").await;
    mount_detail(&server, "/photo/2", "Airbus A321-211", "/img/2.jpg").await;
    mount_image(&server, "/img/1.jpg", 0).await;
    mount_image(&server, "/img/2.jpg", 1).await;

    let mut coordinator = Coordinator::new(config.clone(), false)
        .unwrap()
        .with_progress_output(false);
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.images_saved, 1);
    let state = coordinator.state();
    assert_eq!(state.class_count("A320"), 1);
    assert_eq!(state.class_count("A321"), 1);
    assert_eq!(state.downloaded.len(), 2);
}

#[tokio::test]
async fn test_satisfied_quotas_make_no_requests() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, &["a", "b", "c", "d", "e"], &dir);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut previous = CrawlState::new();
    previous.query_index = 3;
    previous.progress.insert("A320".to_string(), 500);
    save_state(Path::new(&config.output.state_path), &previous).unwrap();

    let mut coordinator = Coordinator::new(config, false)
        .unwrap()
        .with_progress_output(false);
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.outcome, CrawlOutcome::QuotasSatisfied);
    assert_eq!(report.pages_processed, 0);
    assert_eq!(coordinator.state().query_index, 3);
}

#[tokio::test]
async fn test_full_subclass_discards_without_download() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&base_url, &["q1"], &dir);
    // Four NG subclasses share a limit of 4, one image each
    config.quota.limit_per_class = 4;

    mount_search(&server, "q1", 1, &["/photo/a", "/photo/b", "/photo/c", "/photo/d"]).await;
    mount_detail(&server, "/photo/a", "Boeing 737-7H4", "/img/a.jpg").await;
    mount_detail(&server, "/photo/b", "Boeing 737-76N", "/img/b.jpg").await;
    mount_detail(&server, "/photo/c", "Boeing 737-7BD", "/img/c.jpg").await;
    mount_detail(&server, "/photo/d", "Boeing 737-8AS", "/img/d.jpg").await;
    mount_image(&server, "/img/a.jpg", 1).await;
    mount_image(&server, "/img/b.jpg", 0).await;
    mount_image(&server, "/img/c.jpg", 0).await;
    mount_image(&server, "/img/d.jpg", 1).await;

    let mut coordinator = Coordinator::new(config, true)
        .unwrap()
        .with_progress_output(false);
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.images_saved, 2);
    let state = coordinator.state();
    assert_eq!(state.subclass_count("B737 NG:737-7"), 1);
    assert_eq!(state.subclass_count("B737 NG:737-8"), 1);
    assert_eq!(state.class_count("B737 NG"), 2);
}

#[tokio::test]
async fn test_failed_search_page_is_skipped() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&base_url, &["q1"], &dir);
    config.search.max_pages_per_query = 2;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;
    mount_search(&server, "q1", 2, &["/photo/1"]).await;
    mount_detail(&server, "/photo/1", "Boeing 777-300ER", "/img/1.jpg").await;
    mount_image(&server, "/img/1.jpg", 1).await;

    let mut coordinator = Coordinator::new(config.clone(), true)
        .unwrap()
        .with_progress_output(false);
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.outcome, CrawlOutcome::QueriesExhausted);
    assert_eq!(report.pages_processed, 2);
    assert_eq!(report.images_saved, 1);

    let state = load_state(Path::new(&config.output.state_path)).unwrap();
    assert_eq!((state.query_index, state.page), (1, 1));
    assert_eq!(state.class_count("B777"), 1);
}

#[tokio::test]
async fn test_detail_retry_after_unavailable() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, &["q1"], &dir);

    mount_search(&server, "q1", 1, &["/photo/1"]).await;
    Mock::given(method("GET"))
        .and(path("/photo/1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_detail(&server, "/photo/1", "Boeing 787-9 Dreamliner", "/img/1.jpg").await;

    Mock::given(method("GET"))
        .and(path("/img/1.jpg"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_image(&server, "/img/1.jpg", 1).await;

    let mut coordinator = Coordinator::new(config.clone(), true)
        .unwrap()
        .with_progress_output(false);
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.images_saved, 1);
    let saved = expected_file(&config, &format!("{}/img/1.jpg", base_url), "B787", None);
    assert!(saved.exists(), "missing {}", saved.display());
}

#[tokio::test]
async fn test_detail_gives_up_after_attempts() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, &["q1"], &dir);

    mount_search(&server, "q1", 1, &["/photo/1"]).await;
    Mock::given(method("GET"))
        .and(path("/photo/1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&server)
        .await;

    let mut coordinator = Coordinator::new(config, true)
        .unwrap()
        .with_progress_output(false);
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.pages_processed, 1);
    assert_eq!(report.images_saved, 0);
    assert_eq!(coordinator.state().query_index, 1);
}

#[tokio::test]
async fn test_config_hash_is_checkpointed() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, &["q1"], &dir);

    mount_search(&server, "q1", 1, &[]).await;

    let mut coordinator = Coordinator::new(config.clone(), true)
        .unwrap()
        .with_config_hash("abc123".to_string())
        .with_progress_output(false);
    coordinator.run().await.unwrap();

    let state = load_state(Path::new(&config.output.state_path)).unwrap();
    assert_eq!(state.config_hash.as_deref(), Some("abc123"));
}

/// Store that rejects every write
struct ReadOnlyStore;

impl ImageStore for ReadOnlyStore {
    fn save(
        &self,
        _bytes: &[u8],
        _image_url: &str,
        class_label: &str,
        _subclass: Option<&str>,
    ) -> StorageResult<PathBuf> {
        Err(StorageError::Write {
            path: PathBuf::from(class_label),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

#[tokio::test]
async fn test_same_image_twice_on_one_page_saved_once() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, &["q1"], &dir);

    mount_search(&server, "q1", 1, &["/photo/1", "/photo/2"]).await;
    mount_detail(&server, "/photo/1", "Airbus A320-214", "/img/same.jpg").await;
    mount_detail(&server, "/photo/2", "Airbus A320-232", "/img/same.jpg").await;
    mount_image(&server, "/img/same.jpg", 1).await;

    let mut coordinator = Coordinator::new(config, true)
        .unwrap()
        .with_progress_output(false);
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.images_saved, 1);
    assert_eq!(coordinator.state().class_count("A320"), 1);
    assert_eq!(coordinator.state().downloaded.len(), 1);
}

#[tokio::test]
async fn test_checkpoint_write_failure_ends_run() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&base_url, &["q1", "q2"], &dir);

    // A non-empty directory where the checkpoint file should go
    let blocked = dir.path().join("state.json");
    std::fs::create_dir_all(blocked.join("occupied")).unwrap();
    config.output.state_path = blocked.display().to_string();

    mount_search(&server, "q1", 1, &[]).await;
    Mock::given(method("GET"))
        .and(query_param("keywords", "q2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut coordinator = Coordinator::new(config, true)
        .unwrap()
        .with_progress_output(false);
    let result = coordinator.run().await;

    assert!(matches!(
        result,
        Err(HarvestError::State(StateError::Io { .. }))
    ));
}

#[tokio::test]
async fn test_failed_write_does_not_record_image() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, &["q1"], &dir);

    mount_search(&server, "q1", 1, &["/photo/1"]).await;
    mount_detail(&server, "/photo/1", "Boeing 747-400", "/img/1.jpg").await;
    mount_image(&server, "/img/1.jpg", 1).await;

    let mut coordinator = Coordinator::new(config.clone(), true)
        .unwrap()
        .with_store(Box::new(ReadOnlyStore))
        .with_progress_output(false);
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.images_saved, 0);
    let state = load_state(Path::new(&config.output.state_path)).unwrap();
    assert!(state.downloaded.is_empty());
    assert_eq!(state.class_count("B747"), 0);
    assert_eq!(state.query_index, 1);
}
