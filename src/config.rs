use crate::constants::{DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_VALIDATOR_URL};
use crate::error::AppError;
use ipnet::IpNet;
use serde::Deserialize;
use std::path::Path;

/// 監視対象のAS番号と、そのASがオリジンとなるプレフィックス群
#[derive(Debug, Deserialize)]
pub struct Target {
    #[serde(rename = "as")]
    pub asn: u32,
    #[serde(default)]
    pub prefixes: Vec<String>,
}

/// 起動時に一度だけ読み込む設定ファイル。以降の変更は反映しない。
#[derive(Debug, Deserialize)]
pub struct Config {
    // 0以下はデフォルト値扱いにするため符号付きで受ける
    #[serde(default)]
    refresh_interval: i64,
    #[serde(default)]
    validator_url: Option<String>,
    #[serde(default)]
    pub vrp_labels: bool,
    #[serde(default)]
    pub targets: Vec<Target>,
}

impl Config {
    /// 設定ファイルを読み込み、パースと検証まで済ませて返す
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::InvalidInput(format!(
                "failed to read configuration file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_yaml(&text)
    }

    /// YAML文字列からパースし、検証も行う
    pub fn from_yaml(text: &str) -> Result<Self, AppError> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// ターゲット定義の検証。失敗は起動時の致命エラーとして扱う。
    pub fn validate(&self) -> Result<(), AppError> {
        if self.targets.is_empty() {
            return Err(AppError::InvalidInput(
                "no targets defined in the configuration file".into(),
            ));
        }

        for target in &self.targets {
            // u32なので上限は型が保証する。0のみ弾く。
            if target.asn == 0 {
                return Err(AppError::InvalidInput(
                    "AS number must be between 1 and 4294967295".into(),
                ));
            }

            if target.prefixes.is_empty() {
                return Err(AppError::InvalidInput(format!(
                    "no prefixes defined for AS{}",
                    target.asn
                )));
            }

            for prefix in &target.prefixes {
                validate_prefix(prefix, target.asn)?;
            }
        }

        Ok(())
    }

    /// 収集間隔（秒）。未指定・0以下のときは既定値を返す。
    pub fn refresh_interval(&self) -> u64 {
        if self.refresh_interval <= 0 {
            DEFAULT_REFRESH_INTERVAL_SECS
        } else {
            self.refresh_interval as u64
        }
    }

    /// 問い合わせ先バリデータのベースURL
    pub fn validator_url(&self) -> &str {
        self.validator_url.as_deref().unwrap_or(DEFAULT_VALIDATOR_URL)
    }

    /// 全ターゲット合計のプレフィックス数
    pub fn prefix_count(&self) -> usize {
        self.targets.iter().map(|t| t.prefixes.len()).sum()
    }
}

/// プレフィックスがCIDRとして正しく、かつ正規形（マスク済み）で書かれているか検証する
fn validate_prefix(prefix: &str, asn: u32) -> Result<(), AppError> {
    let net: IpNet = prefix.parse().map_err(|e| {
        AppError::InvalidInput(format!("prefix {prefix} for AS{asn} is not valid: {e}"))
    })?;

    // ホストビットが立っている表記は設定ミスとして拒否する
    let canonical = net.trunc();
    if canonical.to_string() != prefix {
        return Err(AppError::InvalidInput(format!(
            "prefix {prefix} for AS{asn} is not in canonical form (expected {canonical})"
        )));
    }

    Ok(())
}
