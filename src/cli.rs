use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// CLIの定義
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Prometheus exporter for the RPKI validation state of configured AS number and prefix pairs."
)]
pub struct Cli {
    #[arg(
        short = 'l',
        long = "listen-address",
        default_value = "0.0.0.0:9959",
        help = "The address to listen on for HTTP requests.\nExample: 127.0.0.1:9959"
    )]
    pub listen_address: SocketAddr,

    #[arg(
        short = 'm',
        long = "metrics-path",
        default_value = "/metrics",
        help = "HTTP path under which metrics are exposed."
    )]
    pub metrics_path: String,

    #[arg(
        short = 'c',
        long = "config",
        default_value = "config.yaml",
        help = "Configuration file location."
    )]
    pub config_file: PathBuf,

    #[arg(
        short = 'd',
        long = "debug",
        help = "Enable debug logging.\nRUST_LOG takes precedence when set."
    )]
    pub debug: bool,
}
