use crate::config::Config;
use crate::fetch;
use crate::metrics::RpkiMetrics;
use crate::validity;
use futures::future::join_all;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// 収集サイクルを回し続けるバックグラウンドループ。
/// タイマーは起動直後に1回発火し、以後はrefresh_interval間隔で発火する。
/// 各サイクルの完了は待たないため、遅いlookupが次のサイクルを遅らせることはない。
pub async fn run_collection_loop(client: Client, config: Arc<Config>, metrics: Arc<RpkiMetrics>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(config.refresh_interval()));

    loop {
        ticker.tick().await;
        debug!(
            "dispatching validation cycle for {} prefixes",
            config.prefix_count()
        );
        spawn_cycle(&client, &config, &metrics);
    }
}

/// 1サイクル分のタスクを(ターゲット, プレフィックス)ごとに起動する。
/// 前回の結果に関係なく毎回すべてのペアを問い合わせる。
/// 返したハンドルを待てばサイクル完了を確定的に観測できる。
pub fn spawn_cycle(
    client: &Client,
    config: &Config,
    metrics: &Arc<RpkiMetrics>,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::with_capacity(config.prefix_count());

    for target in &config.targets {
        for prefix in &target.prefixes {
            let client_clone = client.clone();
            let metrics_clone = Arc::clone(metrics);
            let base_url = config.validator_url().to_string();
            let asn = target.asn;
            let prefix_clone = prefix.clone();

            handles.push(tokio::spawn(async move {
                update_prefix_status(&client_clone, &base_url, asn, &prefix_clone, &metrics_clone)
                    .await;
            }));
        }
    }

    handles
}

/// 1サイクルを起動して全lookupの完了まで待つ
pub async fn run_cycle(client: &Client, config: &Config, metrics: &Arc<RpkiMetrics>) {
    let handles = spawn_cycle(client, config, metrics);
    for res in join_all(handles).await {
        if let Err(e) = res {
            warn!("lookup task failed to complete: {e}");
        }
    }
}

/// 1つの(AS, プレフィックス)を問い合わせてメトリクスへ反映する。
/// 失敗はこのユニット内で完結させ、失敗カウンタを進めるだけにする。
async fn update_prefix_status(
    client: &Client,
    base_url: &str,
    asn: u32,
    prefix: &str,
    metrics: &RpkiMetrics,
) {
    let body = match fetch::lookup(client, base_url, asn, prefix).await {
        Ok(body) => body,
        Err(e) => {
            metrics.record_failure();
            warn!("lookup for {prefix} (AS{asn}) failed: {e}");
            return;
        }
    };

    // ネットワーク失敗と区別できるよう、デコード失敗は別メッセージで残す
    let record = match validity::decode(&body) {
        Ok(record) => record,
        Err(e) => {
            metrics.record_failure();
            warn!("decoding response for {prefix} (AS{asn}) failed: {e}");
            return;
        }
    };

    debug!("{prefix} (AS{asn}) validated as {}", record.state.as_str());
    metrics.record(&record);
}
