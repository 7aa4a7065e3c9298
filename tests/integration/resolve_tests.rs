//! Integration tests for query resolution
//!
//! These tests drive `Finder` end-to-end over an in-memory directory, a
//! scripted external API and a manual clock. The last tests use wiremock
//! to exercise the HTTP adapter through the whole flow.

use async_trait::async_trait;
use chanfind::clock::{Clock, ManualClock};
use chanfind::config::{parse_config, Config};
use chanfind::links::{ApiError, ExternalApi, HttpApi, RateBudget};
use chanfind::output::{Report, ReportCategory, ReportError, Reporter, DOWNLOAD_LABEL};
use chanfind::storage::{SharedStorage, SqliteStorage, Storage};
use chanfind::{Finder, QueryOutcome};
use chrono::Utc;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type Script = Mutex<HashMap<String, VecDeque<Result<String, ApiError>>>>;

/// External API with per-resource scripted responses
///
/// Unscripted resources get `https://t.me/+{id}` as a link and their
/// `with_title` entry as a title.
#[derive(Default)]
struct FakeApi {
    scripts: Script,
    title_scripts: Script,
    titles: HashMap<String, String>,
    issued: Mutex<Vec<String>>,
    title_fetches: AtomicUsize,
}

impl FakeApi {
    fn script(self, id: &str, responses: Vec<Result<String, ApiError>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(id.to_string(), responses.into());
        self
    }

    fn script_title(self, id: &str, responses: Vec<Result<String, ApiError>>) -> Self {
        self.title_scripts
            .lock()
            .unwrap()
            .insert(id.to_string(), responses.into());
        self
    }

    fn with_title(mut self, id: &str, title: &str) -> Self {
        self.titles.insert(id.to_string(), title.to_string());
        self
    }

    fn issued(&self) -> Vec<String> {
        self.issued.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExternalApi for FakeApi {
    async fn issue_link(&self, resource_id: &str) -> Result<String, ApiError> {
        self.issued.lock().unwrap().push(resource_id.to_string());
        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(resource_id)
            .and_then(|queue| queue.pop_front());
        scripted.unwrap_or_else(|| Ok(format!("https://t.me/+{}", resource_id)))
    }

    async fn fetch_title(&self, resource_id: &str) -> Result<String, ApiError> {
        self.title_fetches.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .title_scripts
            .lock()
            .unwrap()
            .get_mut(resource_id)
            .and_then(|queue| queue.pop_front());
        if let Some(response) = scripted {
            return response;
        }
        self.titles
            .get(resource_id)
            .cloned()
            .ok_or(ApiError::InvalidResource)
    }
}

#[derive(Default)]
struct RecordingReporter {
    reports: Mutex<Vec<Report>>,
}

impl RecordingReporter {
    fn categories(&self) -> Vec<ReportCategory> {
        self.reports.lock().unwrap().iter().map(|r| r.category).collect()
    }
}

#[async_trait]
impl Reporter for RecordingReporter {
    async fn report(&self, report: &Report) -> Result<(), ReportError> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }
}

struct Harness {
    finder: Finder,
    storage: SharedStorage,
    api: Arc<FakeApi>,
    clock: Arc<ManualClock>,
    reporter: Arc<RecordingReporter>,
}

/// Creates a test configuration; `extra` is appended verbatim
fn create_test_config(extra: &str) -> Config {
    let toml = format!(
        r#"
[directory]
database-path = "unused.db"

[api]
base-url = "https://api.example.com/v1"

{}
"#,
        extra
    );
    parse_config(&toml).expect("test config should be valid")
}

fn directory(titles: &[(&str, &str)]) -> SharedStorage {
    let mut storage = SqliteStorage::open_in_memory().unwrap();
    for (id, title) in titles {
        storage.upsert_resource(id, title).unwrap();
    }
    Arc::new(Mutex::new(storage))
}

fn harness(extra_config: &str, titles: &[(&str, &str)], api: FakeApi) -> Harness {
    let config = create_test_config(extra_config);
    let storage = directory(titles);
    let api = Arc::new(api);
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let reporter = Arc::new(RecordingReporter::default());

    let finder = Finder::from_config(
        &config,
        storage.clone(),
        api.clone(),
        reporter.clone(),
        clock.clone(),
        RateBudget::new(config.links.rate_budget_capacity as usize),
    );

    Harness {
        finder,
        storage,
        api,
        clock,
        reporter,
    }
}

fn expect_match(outcome: QueryOutcome) -> chanfind::ResolvedMatch {
    match outcome {
        QueryOutcome::Match(found) => found,
        other => panic!("expected a match, got {:?}", other),
    }
}

#[tokio::test]
async fn test_exact_query_resolves_with_full_score() {
    let h = harness("", &[("r1", "Night City News")], FakeApi::default());

    let found = expect_match(h.finder.handle_query("night city news").await);

    assert_eq!(found.resource_id, "r1");
    assert_eq!(found.title, "Night City News");
    assert_eq!(found.link, "https://t.me/+r1");
    assert!((found.score - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_reordered_truncated_query_resolves() {
    let h = harness("", &[("r1", "Night City News")], FakeApi::default());

    let found = expect_match(h.finder.handle_query("nihgt city").await);

    assert_eq!(found.resource_id, "r1");
    assert!(found.score > 60.0);
}

#[tokio::test]
async fn test_unrelated_query_is_no_match() {
    let h = harness(
        "",
        &[("r1", "Night City News"), ("r2", "Ocean Drive")],
        FakeApi::default(),
    );

    let outcome = h.finder.handle_query("xyz").await;

    assert_eq!(outcome, QueryOutcome::NoMatch);
    assert!(h.api.issued().is_empty());
}

#[tokio::test]
async fn test_invalid_resource_is_pruned_and_scan_continues() {
    let api = FakeApi::default().script("r1", vec![Err(ApiError::InvalidResource)]);
    let h = harness(
        "",
        &[("r1", "Night City News"), ("r2", "Night City Newz")],
        api,
    );

    let found = expect_match(h.finder.handle_query("night city news").await);

    assert_eq!(found.resource_id, "r2");
    assert!(h.storage.lock().unwrap().find_by_id("r1").unwrap().is_none());
    assert_eq!(h.reporter.categories(), vec![ReportCategory::ResourceInvalid]);
}

#[tokio::test]
async fn test_throttled_issue_waits_and_succeeds() {
    let api = FakeApi::default().script(
        "r1",
        vec![
            Err(ApiError::Throttled {
                wait: Duration::from_secs(10),
            }),
            Ok("https://t.me/+after-wait".to_string()),
        ],
    );
    let h = harness("", &[("r1", "Night City News")], api);

    let found = expect_match(h.finder.handle_query("night city news").await);

    assert_eq!(found.link, "https://t.me/+after-wait");
    assert_eq!(h.api.issued(), vec!["r1", "r1"]);
    assert!(h.clock.total_slept() >= Duration::from_secs(10));
    assert!(h.reporter.categories().is_empty());
}

#[tokio::test]
async fn test_fresh_cached_link_skips_api() {
    let h = harness("", &[("r1", "Night City News")], FakeApi::default());
    h.storage
        .lock()
        .unwrap()
        .store_link("r1", "https://t.me/+cached", h.clock.now())
        .unwrap();

    let found = expect_match(h.finder.handle_query("night city news").await);

    assert_eq!(found.link, "https://t.me/+cached");
    assert!(h.api.issued().is_empty());
}

#[tokio::test]
async fn test_stale_cached_link_is_reissued() {
    let h = harness(
        "[links]\ncache-ttl-secs = 60\n",
        &[("r1", "Night City News")],
        FakeApi::default(),
    );
    h.storage
        .lock()
        .unwrap()
        .store_link("r1", "https://t.me/+cached", h.clock.now())
        .unwrap();
    h.clock.advance(Duration::from_secs(61));

    let found = expect_match(h.finder.handle_query("night city news").await);

    assert_eq!(found.link, "https://t.me/+r1");
    assert_eq!(h.api.issued(), vec!["r1"]);
    let cached = h.storage.lock().unwrap().get_cached_link("r1").unwrap().unwrap();
    assert_eq!(cached.issued_at, h.clock.now());
}

#[tokio::test]
async fn test_equal_scores_prefer_directory_order() {
    let h = harness(
        "",
        &[("first", "Night City News"), ("second", "Night City News")],
        FakeApi::default(),
    );

    // Scores below the early-exit threshold, so both candidates are considered
    let found = expect_match(h.finder.handle_query("nihgt city").await);

    assert_eq!(found.resource_id, "first");
    assert_eq!(h.api.issued(), vec!["first", "second"]);
}

#[tokio::test]
async fn test_early_exit_skips_later_batches() {
    let h = harness(
        "[resolver]\nbatch-size = 2\n",
        &[
            ("a", "Night City News"),
            ("b", "Ocean Drive"),
            ("c", "Night City News"),
        ],
        FakeApi::default(),
    );

    let found = expect_match(h.finder.handle_query("night city news").await);

    assert_eq!(found.resource_id, "a");
    assert_eq!(h.api.issued(), vec!["a"]);
    assert!(h.clock.sleeps().is_empty(), "no pause before an unscanned batch");
}

#[tokio::test]
async fn test_pause_between_batches() {
    let h = harness(
        "[resolver]\nbatch-size = 1\nbatch-pause-ms = 250\n",
        &[("a", "Alpha"), ("b", "Beta"), ("c", "Gamma")],
        FakeApi::default(),
    );

    assert_eq!(h.finder.handle_query("xyz").await, QueryOutcome::NoMatch);
    assert_eq!(
        h.clock.sleeps(),
        vec![Duration::from_millis(250), Duration::from_millis(250)]
    );
}

#[tokio::test]
async fn test_permission_denied_keeps_resource() {
    let api = FakeApi::default().script("r1", vec![Err(ApiError::PermissionDenied)]);
    let h = harness("", &[("r1", "Night City News")], api);

    assert_eq!(h.finder.handle_query("night city news").await, QueryOutcome::NoMatch);
    assert!(h.storage.lock().unwrap().find_by_id("r1").unwrap().is_some());
    assert_eq!(h.reporter.categories(), vec![ReportCategory::PermissionDenied]);
}

#[tokio::test]
async fn test_missing_title_is_fetched_and_synced() {
    let api = FakeApi::default().with_title("r1", "Night City News");
    let h = harness("", &[("r1", "")], api);

    let found = expect_match(h.finder.handle_query("night city news").await);

    assert_eq!(found.title, "Night City News");
    assert_eq!(h.api.title_fetches.load(Ordering::SeqCst), 1);
    let record = h.storage.lock().unwrap().find_by_id("r1").unwrap().unwrap();
    assert_eq!(record.title, "Night City News");
}

#[tokio::test]
async fn test_throttled_title_fetch_waits_and_keeps_candidate() {
    let api = FakeApi::default()
        .script_title(
            "r1",
            vec![Err(ApiError::Throttled {
                wait: Duration::from_secs(5),
            })],
        )
        .with_title("r1", "Night City News");
    let h = harness("[spell-check]\nenabled = false\n", &[("r1", "")], api);

    let found = expect_match(h.finder.handle_query("night city news").await);

    assert_eq!(found.resource_id, "r1");
    assert_eq!(h.api.title_fetches.load(Ordering::SeqCst), 2);
    // Default throttle margin is one second
    assert_eq!(h.clock.sleeps(), vec![Duration::from_secs(6)]);
    assert!(h.storage.lock().unwrap().find_by_id("r1").unwrap().is_some());
    assert!(h.reporter.categories().is_empty());
}

#[tokio::test]
async fn test_misspelled_query_matches_after_correction() {
    let h = harness(
        "",
        &[("r1", "Cabin Dance"), ("r2", "Ocean Drive")],
        FakeApi::default(),
    );

    // Too far from any title for the first pass, close enough to correct
    let found = expect_match(h.finder.handle_query("eabin danse").await);

    assert_eq!(found.resource_id, "r1");
    assert_eq!(found.title, "Cabin Dance");
    assert!((found.score - 100.0).abs() < 1e-9);
    assert_eq!(h.api.issued(), vec!["r1"]);
}

#[tokio::test]
async fn test_correction_to_same_query_is_not_retried() {
    let api = FakeApi::default().script("r1", vec![Err(ApiError::PermissionDenied)]);
    let h = harness("", &[("r1", "Cabin Dance")], api);

    // The corrector returns the query itself, so no second pass runs
    assert_eq!(h.finder.handle_query("cabin dance").await, QueryOutcome::NoMatch);
    assert_eq!(h.api.issued(), vec!["r1"]);
    assert_eq!(h.reporter.categories(), vec![ReportCategory::PermissionDenied]);
}

#[tokio::test]
async fn test_generic_and_short_queries() {
    let h = harness(
        "[resolver]\nnoise-phrases = [\"please send\"]\ngeneric-tokens = [\"channel\"]\n",
        &[("r1", "Night City News")],
        FakeApi::default(),
    );

    assert_eq!(h.finder.handle_query("Please send").await, QueryOutcome::Ignored);
    assert_eq!(h.finder.handle_query("  CHANNEL ").await, QueryOutcome::Ignored);
    assert_eq!(h.finder.handle_query("ab").await, QueryOutcome::NoMatch);
    assert!(h.api.issued().is_empty());
}

#[tokio::test]
async fn test_noise_phrases_are_stripped_before_matching() {
    let h = harness(
        "[resolver]\nnoise-phrases = [\"please send\"]\n",
        &[("r1", "Night City News")],
        FakeApi::default(),
    );

    let found = expect_match(h.finder.handle_query("Please send Night City News").await);
    assert_eq!(found.resource_id, "r1");
}

#[tokio::test]
async fn test_directory_failure_is_temporary_issue() {
    let h = harness("", &[("r1", "Night City News")], FakeApi::default());

    // Poison the directory lock
    let poisoned = h.storage.clone();
    let _ = std::thread::spawn(move || {
        let _guard = poisoned.lock().unwrap();
        panic!("poisoning the directory lock");
    })
    .join();

    assert_eq!(
        h.finder.handle_query("night city news").await,
        QueryOutcome::TemporaryIssue
    );
    assert_eq!(h.reporter.categories(), vec![ReportCategory::SearchError]);
}

#[tokio::test]
async fn test_http_api_end_to_end_with_web_link() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/resources/-1001/links"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"link": "https://t.me/finder_bot?start=abc123"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = parse_config(&format!(
        r#"
[directory]
database-path = "unused.db"

[api]
base-url = "{}/v1"

[links]
website-url = "https://example.org/go"
"#,
        mock_server.uri()
    ))
    .unwrap();

    let storage = directory(&[("-1001", "Night City News")]);
    let api = Arc::new(HttpApi::new(&config.api).unwrap());
    let reporter = Arc::new(RecordingReporter::default());
    let finder = Finder::from_config(
        &config,
        storage,
        api,
        reporter,
        Arc::new(ManualClock::default()),
        RateBudget::new(3),
    );

    let outcome = finder.handle_query("Night City News").await;
    let reply = finder.reply(&outcome).expect("a match produces a reply");
    let button = reply.button.expect("a match carries a button");

    assert_eq!(button.label, DOWNLOAD_LABEL);
    assert_eq!(button.url, "https://example.org/go?link=abc123");

    // Second query is served from the cache; the mock expects one call
    let again = expect_match(finder.handle_query("night city news").await);
    assert_eq!(again.link, "https://t.me/finder_bot?start=abc123");
}

#[tokio::test]
async fn test_http_api_private_resource_is_pruned() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/resources/r1/links"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"code": "RESOURCE_PRIVATE"})))
        .mount(&mock_server)
        .await;

    let config = parse_config(&format!(
        "[directory]\ndatabase-path = \"unused.db\"\n\n[api]\nbase-url = \"{}/v1\"\n",
        mock_server.uri()
    ))
    .unwrap();

    let storage = directory(&[("r1", "Night City News")]);
    let reporter = Arc::new(RecordingReporter::default());
    let finder = Finder::from_config(
        &config,
        storage.clone(),
        Arc::new(HttpApi::new(&config.api).unwrap()),
        reporter.clone(),
        Arc::new(ManualClock::default()),
        RateBudget::new(1),
    );

    assert_eq!(finder.handle_query("night city news").await, QueryOutcome::NoMatch);
    assert_eq!(storage.lock().unwrap().count_resources().unwrap(), 0);
    assert_eq!(reporter.categories(), vec![ReportCategory::ResourcePrivate]);
}
