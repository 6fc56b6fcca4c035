use std::sync::Arc;
use std::time::Duration;

use aquiss_usage::alerts::{AlertSystem, NotificationState, ThresholdTracker};
use aquiss_usage::api::{UsageApiClient, UsageError};
use aquiss_usage::commands::{AppContext, handle_status_command};
use aquiss_usage::config::{ApiConfig, Config};
use aquiss_usage::storage::SettingsStore;
use aquiss_usage::storage::settings_store::KEY_HASH_CODE;
use aquiss_usage::usage::{UsageChecker, UsageEvent};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Integration tests against a mocked usage API

const PERIOD_START: i64 = 1790812800; // 2026-10-01T00:00:00Z
const PERIOD_END: i64 = 1793404800; // 2026-10-31T00:00:00Z

fn usage_xml(response: &str, peak: f64) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<usage>
  <version>1.0</version>
  <response>{response}</response>
  <key>good-hash</key>
  <usage_start_date>01/10/2026</usage_start_date>
  <usage_end_date>31/10/2026</usage_end_date>
  <usage_start_date_string>{PERIOD_START}</usage_start_date_string>
  <usage_end_date_string>{PERIOD_END}</usage_end_date_string>
  <usage_peak>{peak}</usage_peak>
  <usage_off_peak>3.5</usage_off_peak>
  <usage_total>{total}</usage_total>
</usage>"#,
        total = peak + 3.5
    )
}

fn client_for(server: &MockServer) -> UsageApiClient {
    UsageApiClient::new(&ApiConfig {
        base_url: server.uri(),
        timeout_secs: 5,
    })
    .unwrap()
}

fn create_store(allowance: Option<f64>) -> (Arc<SettingsStore>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = SettingsStore::open(&temp_dir.path().join("settings.toml")).unwrap();
    store.set(KEY_HASH_CODE, "good-hash").unwrap();
    if let Some(allowance) = allowance {
        store.set_allowance(allowance).unwrap();
    }
    (Arc::new(store), temp_dir)
}

fn create_checker(server: &MockServer, store: &Arc<SettingsStore>) -> Arc<UsageChecker> {
    Arc::new(UsageChecker::new(
        client_for(server),
        "good-hash".to_string(),
        Arc::clone(store),
        Arc::new(AlertSystem::new(ThresholdTracker::default(), false)),
        Duration::from_secs(3600),
    ))
}

async fn mount_usage(server: &MockServer, response: &str, peak: f64, times: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(path("/usage-xml.php"))
        .and(query_param("hashkey", "good-hash"))
        .respond_with(ResponseTemplate::new(200).set_body_string(usage_xml(response, peak)));

    match times {
        Some(n) => mock.up_to_n_times(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

#[tokio::test]
async fn test_client_fetches_usage_with_hash_key() {
    let server = MockServer::start().await;
    mount_usage(&server, "Valid", 42.25, None).await;

    let response = client_for(&server).fetch_usage("good-hash").await.unwrap();

    assert!(response.is_valid());
    assert_eq!(response.usage_peak, 42.25);
    assert_eq!(response.usage_off_peak, 3.5);
    assert_eq!(response.usage_start_timestamp, PERIOD_START);
    assert_eq!(response.usage_end_timestamp, PERIOD_END);
}

#[tokio::test]
async fn test_validate_hash_code() {
    let server = MockServer::start().await;
    mount_usage(&server, "Valid", 1.0, None).await;
    Mock::given(method("GET"))
        .and(path("/usage-xml.php"))
        .and(query_param("hashkey", "bad-hash"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<usage><response>Invalid Hash Key</response></usage>",
        ))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.validate_hash_code("good-hash").await);
    assert!(!client.validate_hash_code("bad-hash").await);
}

#[tokio::test]
async fn test_server_error_maps_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/usage-xml.php"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch_usage("good-hash").await.unwrap_err();
    assert!(matches!(err, UsageError::Status(status) if status.as_u16() == 503));
    assert!(!client.validate_hash_code("good-hash").await);
}

#[tokio::test]
async fn test_checker_caches_snapshot_and_records_check() {
    let server = MockServer::start().await;
    mount_usage(&server, "Valid", 10.0, None).await;
    let (store, _temp_dir) = create_store(Some(60.0));
    let checker = create_checker(&server, &store);

    assert!(checker.current_usage().is_none());
    let snapshot = checker.update_usage_information().await.unwrap();

    assert_eq!(snapshot.peak_gib, 10.0);
    assert_eq!(snapshot.period_start.timestamp(), PERIOD_START);
    assert_eq!(checker.current_usage(), Some(snapshot));
    assert!(store.last_checked().unwrap().is_some());
}

#[tokio::test]
async fn test_rejected_hash_code_clears_cache() {
    let server = MockServer::start().await;
    mount_usage(&server, "Valid", 10.0, Some(1)).await;
    mount_usage(&server, "Invalid Hash Key", 0.0, None).await;
    let (store, _temp_dir) = create_store(Some(60.0));
    let checker = create_checker(&server, &store);
    let mut events = checker.subscribe();

    checker.update_usage_information().await.unwrap();
    assert!(checker.current_usage().is_some());

    let err = checker.update_usage_information().await.unwrap_err();
    assert!(matches!(err, UsageError::InvalidHashCode));
    assert!(checker.current_usage().is_none());

    assert!(matches!(events.recv().await.unwrap(), UsageEvent::Updated(_)));
    assert_eq!(
        events.recv().await.unwrap(),
        UsageEvent::FetchFailed("Could not get usage information: Invalid Hash Code".to_string())
    );
}

#[tokio::test]
async fn test_transient_failure_keeps_cached_snapshot() {
    let server = MockServer::start().await;
    mount_usage(&server, "Valid", 10.0, Some(1)).await;
    Mock::given(method("GET"))
        .and(path("/usage-xml.php"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let (store, _temp_dir) = create_store(Some(60.0));
    let checker = create_checker(&server, &store);

    checker.update_usage_information().await.unwrap();
    assert!(checker.update_usage_information().await.is_err());
    assert_eq!(checker.current_usage().map(|s| s.peak_gib), Some(10.0));
}

#[tokio::test]
async fn test_threshold_state_persists_across_fetches() {
    let server = MockServer::start().await;
    // 50%, then 80%, then 85%, then 96% of a 50 GB allowance
    mount_usage(&server, "Valid", 25.0, Some(1)).await;
    mount_usage(&server, "Valid", 40.0, Some(1)).await;
    mount_usage(&server, "Valid", 42.5, Some(1)).await;
    mount_usage(&server, "Valid", 48.0, None).await;
    let (store, _temp_dir) = create_store(Some(50.0));
    let checker = create_checker(&server, &store);

    checker.update_usage_information().await.unwrap();
    assert_eq!(
        store.notification_state().unwrap(),
        NotificationState { last_threshold: 0, period_start: PERIOD_START }
    );

    checker.update_usage_information().await.unwrap();
    assert_eq!(
        store.notification_state().unwrap(),
        NotificationState { last_threshold: 75, period_start: PERIOD_START }
    );

    checker.update_usage_information().await.unwrap();
    assert_eq!(store.notification_state().unwrap().last_threshold, 75);

    checker.update_usage_information().await.unwrap();
    assert_eq!(store.notification_state().unwrap().last_threshold, 95);

    // A fresh store handle sees the same state after a restart
    let reopened = SettingsStore::open(store.path()).unwrap();
    assert_eq!(reopened.notification_state().unwrap().last_threshold, 95);
}

#[tokio::test]
async fn test_no_threshold_check_without_allowance() {
    let server = MockServer::start().await;
    mount_usage(&server, "Valid", 500.0, None).await;
    let (store, _temp_dir) = create_store(None);
    let checker = create_checker(&server, &store);

    checker.update_usage_information().await.unwrap();
    assert_eq!(store.notification_state().unwrap(), NotificationState::default());
}

#[tokio::test]
async fn test_background_polling_and_manual_refresh() {
    let server = MockServer::start().await;
    mount_usage(&server, "Valid", 5.0, Some(1)).await;
    mount_usage(&server, "Valid", 6.0, None).await;
    let (store, _temp_dir) = create_store(Some(60.0));
    let checker = create_checker(&server, &store);
    let mut events = checker.subscribe();

    let handle = checker.start();
    assert!(handle.is_running());

    let first = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("initial fetch should happen immediately")
        .unwrap();
    assert!(matches!(first, UsageEvent::Updated(ref s) if s.peak_gib == 5.0));

    handle.refresh();
    let second = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("refresh should trigger a fetch")
        .unwrap();
    assert!(matches!(second, UsageEvent::Updated(ref s) if s.peak_gib == 6.0));

    handle.stop();
}

fn context_for(server: &MockServer, temp_dir: &TempDir) -> AppContext {
    let config_path = temp_dir.path().join("config.toml");
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.alerts.notifications_enabled = false;
    config.save_to(&config_path).unwrap();

    let ctx = AppContext::load(Some(&config_path)).unwrap();
    ctx.store.set(KEY_HASH_CODE, "good-hash").unwrap();
    ctx
}

#[tokio::test]
async fn test_status_reports_rejected_hash_code() {
    let server = MockServer::start().await;
    mount_usage(&server, "Invalid Hash Key", 0.0, None).await;
    let temp_dir = TempDir::new().unwrap();
    let ctx = context_for(&server, &temp_dir);

    let err = handle_status_command(&ctx, true, false).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Could not get usage information: Invalid Hash Code"
    );
}

#[tokio::test]
async fn test_status_succeeds_and_records_thresholds() {
    let server = MockServer::start().await;
    mount_usage(&server, "Valid", 48.0, None).await;
    let temp_dir = TempDir::new().unwrap();
    let ctx = context_for(&server, &temp_dir);
    ctx.store.set_allowance(60.0).unwrap();

    handle_status_command(&ctx, true, false).await.unwrap();

    assert_eq!(ctx.store.notification_state().unwrap().last_threshold, 75);
    assert!(ctx.store.last_checked().unwrap().is_some());
}
