use clap::Parser;
use reqwest::Client;
use rpki_watch::cli::Cli;
use rpki_watch::config::Config;
use rpki_watch::error::AppError;
use rpki_watch::metrics::RpkiMetrics;
use rpki_watch::{collector, server};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let args = Cli::parse();
    init_logging(args.debug);

    // 起動時のエラー（設定・bind）はここで打ち切る
    if let Err(e) = run(args).await {
        error!("{e}");
        std::process::exit(1);
    }
}

/// RUST_LOG優先、未設定なら--debugに応じたレベルで初期化する
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// アプリケーションのメインロジック
async fn run(args: Cli) -> Result<(), AppError> {
    // 設定の検証失敗は最初のサイクルに入る前に致命エラーとする
    let config = Arc::new(Config::load(&args.config_file).await?);
    let metrics = Arc::new(RpkiMetrics::new(config.vrp_labels)?);
    let client = Client::new();

    let listener = TcpListener::bind(args.listen_address).await?;
    info!(
        "listening on {} (metrics at {})",
        args.listen_address, args.metrics_path
    );
    info!(
        "collecting {} prefixes from {} every {} seconds",
        config.prefix_count(),
        config.validator_url(),
        config.refresh_interval()
    );

    tokio::spawn(collector::run_collection_loop(
        client,
        Arc::clone(&config),
        Arc::clone(&metrics),
    ));

    server::serve(listener, args.metrics_path, metrics).await
}
