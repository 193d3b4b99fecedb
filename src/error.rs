use std::{io, string::FromUtf8Error};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // IOまわりのエラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ネットワーク関係のエラー (reqwest 等)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    // 設定ファイルのYAMLパースエラー
    #[error("Config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // バリデータ応答のJSONデコードエラー
    #[error("Response decode error: {0}")]
    Json(#[from] serde_json::Error),

    // メトリクスの登録・エンコードのエラー
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    // UTF-8パースなどの文字列変換エラー
    #[error("String conversion error: {0}")]
    Utf8(#[from] FromUtf8Error),

    // 200以外のHTTPステータス
    #[error("{url} status returned: {code}")]
    Status { url: String, code: u16 },

    // 特定の入力が不正だった場合など
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
