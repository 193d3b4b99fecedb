use mockito::Matcher;
use reqwest::Client;
use rpki_watch::collector::{run_collection_loop, run_cycle};
use rpki_watch::config::Config;
use rpki_watch::metrics::RpkiMetrics;
use std::sync::Arc;
use std::time::Duration;

const VALID_RESPONSE: &str = r#"{
  "validated_route": {
    "route": { "origin_asn": "AS65001", "prefix": "192.0.2.0/24" },
    "validity": {
      "state": "valid",
      "VRPs": {
        "matched": [
          { "asn": "AS65001", "prefix": "192.0.2.0/24", "max_length": "24" }
        ],
        "unmatched_as": [],
        "unmatched_length": []
      }
    }
  }
}"#;

/// モックサーバへ向けた1ターゲット構成を作る
fn config_for(base: &str) -> Config {
    let yaml = format!(
        "validator_url: {base}/validity\ntargets:\n  - as: 65001\n    prefixes:\n      - 192.0.2.0/24\n"
    );
    Config::from_yaml(&yaml).unwrap_or_else(|e| panic!("config: {e}"))
}

fn new_metrics() -> Arc<RpkiMetrics> {
    Arc::new(RpkiMetrics::new(false).unwrap_or_else(|e| panic!("metrics: {e}")))
}

fn status_sample(text: &str) -> Option<&str> {
    text.lines().find(|line| line.starts_with("rpki_status{"))
}

#[tokio::test]
async fn cycle_records_a_valid_state() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/validity")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(VALID_RESPONSE)
        .create_async()
        .await;

    let metrics = new_metrics();
    run_cycle(&Client::new(), &config_for(&server.url()), &metrics).await;

    assert_eq!(metrics.success_count(), 1);
    assert_eq!(metrics.failure_count(), 0);

    let text = metrics.gather_text().unwrap_or_else(|e| panic!("gather: {e}"));
    let sample = status_sample(&text).unwrap_or_else(|| panic!("no gauge sample in: {text}"));
    // ラベルは応答の値をそのまま使う
    assert!(sample.contains(r#"prefix="192.0.2.0/24""#), "got: {sample}");
    assert!(sample.contains(r#"asn="AS65001""#), "got: {sample}");
    assert!(sample.ends_with(" 1"), "got: {sample}");
}

#[tokio::test]
async fn http_503_increments_only_the_failure_counter() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/validity")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("try later")
        .create_async()
        .await;

    let metrics = new_metrics();
    run_cycle(&Client::new(), &config_for(&server.url()), &metrics).await;

    assert_eq!(metrics.success_count(), 0);
    assert_eq!(metrics.failure_count(), 1);

    let text = metrics.gather_text().unwrap_or_else(|e| panic!("gather: {e}"));
    assert!(status_sample(&text).is_none(), "exposition was: {text}");
}

#[tokio::test]
async fn malformed_body_is_a_recoverable_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/validity")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("this is not json")
        .create_async()
        .await;

    let metrics = new_metrics();
    run_cycle(&Client::new(), &config_for(&server.url()), &metrics).await;

    assert_eq!(metrics.success_count(), 0);
    assert_eq!(metrics.failure_count(), 1);
}

#[tokio::test]
async fn unknown_state_is_a_recoverable_failure() {
    let body = r#"{
      "validated_route": {
        "route": { "origin_asn": "AS65001", "prefix": "192.0.2.0/24" },
        "validity": { "state": "quarantined" }
      }
    }"#;
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/validity")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let metrics = new_metrics();
    run_cycle(&Client::new(), &config_for(&server.url()), &metrics).await;

    assert_eq!(metrics.success_count(), 0);
    assert_eq!(metrics.failure_count(), 1);
}

#[tokio::test]
async fn failed_lookup_keeps_the_previous_gauge_value() {
    // 1周目は正常応答
    let mut good = mockito::Server::new_async().await;
    let _good_mock = good
        .mock("GET", "/validity")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(VALID_RESPONSE)
        .create_async()
        .await;

    let client = Client::new();
    let metrics = new_metrics();
    run_cycle(&client, &config_for(&good.url()), &metrics).await;

    // 2周目は同じメトリクスのまま落ちているバリデータへ
    let mut bad = mockito::Server::new_async().await;
    let _bad_mock = bad
        .mock("GET", "/validity")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;
    run_cycle(&client, &config_for(&bad.url()), &metrics).await;

    assert_eq!(metrics.success_count(), 1);
    assert_eq!(metrics.failure_count(), 1);

    // ゲージは最後に成功した値のまま
    let text = metrics.gather_text().unwrap_or_else(|e| panic!("gather: {e}"));
    let sample = status_sample(&text).unwrap_or_else(|| panic!("no gauge sample in: {text}"));
    assert!(sample.ends_with(" 1"), "got: {sample}");
}

#[tokio::test]
async fn cycle_queries_every_prefix_of_every_target() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/validity")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(VALID_RESPONSE)
        .expect(3)
        .create_async()
        .await;

    let yaml = format!(
        "validator_url: {}/validity\ntargets:\n  - as: 65001\n    prefixes:\n      - 192.0.2.0/24\n      - 198.51.100.0/24\n  - as: 64500\n    prefixes:\n      - 2001:db8::/32\n",
        server.url()
    );
    let config = Config::from_yaml(&yaml).unwrap_or_else(|e| panic!("config: {e}"));

    let metrics = new_metrics();
    run_cycle(&Client::new(), &config, &metrics).await;

    assert_eq!(metrics.success_count(), 3);
    mock.assert_async().await;
}

#[tokio::test]
async fn collection_loop_fires_without_waiting_a_full_interval() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/validity")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(VALID_RESPONSE)
        .create_async()
        .await;

    // intervalは1時間。初回tickが即時でなければこのテストは刺さる。
    let config = Arc::new(config_for(&server.url()));
    let metrics = new_metrics();
    let handle = tokio::spawn(run_collection_loop(
        Client::new(),
        Arc::clone(&config),
        Arc::clone(&metrics),
    ));

    let mut waited = 0;
    while metrics.success_count() == 0 && waited < 100 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        waited += 1;
    }
    handle.abort();

    assert_eq!(metrics.success_count(), 1);
}
