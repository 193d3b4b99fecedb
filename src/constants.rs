/// 定数の共通化

/// RIPEのRPKIバリデータ (validityエンドポイント)
pub const DEFAULT_VALIDATOR_URL: &str = "https://rpki-validator.ripe.net/validity";

/// refresh_intervalが未指定・0以下のときに適用する既定値（秒）
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 3600;
