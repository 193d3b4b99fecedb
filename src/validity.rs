use crate::error::AppError;
use serde::Deserialize;
use std::str::FromStr;

/// matchedなVRPが1つもないときにmax_lengthラベルへ入れる値
pub const MAX_LENGTH_NOT_FOUND: &str = "NOT FOUND";

/// バリデータJSONのうち利用するフィールドだけ定義
#[derive(Debug, Deserialize)]
struct ValidityResponse {
    validated_route: ValidatedRoute,
}

#[derive(Debug, Deserialize)]
struct ValidatedRoute {
    route: Route,
    validity: Validity,
}

#[derive(Debug, Deserialize)]
struct Route {
    origin_asn: String,
    prefix: String,
}

#[derive(Debug, Deserialize)]
struct Validity {
    state: String,
    // VRPsオブジェクト自体が省略される応答もある
    #[serde(rename = "VRPs", default)]
    vrps: Vrps,
}

#[derive(Debug, Default, Deserialize)]
struct Vrps {
    #[serde(default)]
    matched: Vec<MatchedVrp>,
    // 中身は使わないので存在数だけ見る
    #[serde(default)]
    unmatched_length: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct MatchedVrp {
    max_length: String,
}

/// 検証状態の固定列挙。ゲージ値との対応もここで持つ。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpkiState {
    Valid,
    Invalid,
    NotFound,
}

impl RpkiState {
    /// ゲージ値 (0 - invalid, 1 - valid, 2 - not found)
    pub fn code(self) -> f64 {
        match self {
            RpkiState::Invalid => 0.0,
            RpkiState::Valid => 1.0,
            RpkiState::NotFound => 2.0,
        }
    }

    /// ログやラベルで使う表記
    pub fn as_str(self) -> &'static str {
        match self {
            RpkiState::Valid => "valid",
            RpkiState::Invalid => "invalid",
            RpkiState::NotFound => "not-found",
        }
    }
}

impl FromStr for RpkiState {
    type Err = AppError;

    // 表外の値を黙って数値化しないため、未知のstateはエラーにする
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "valid" => Ok(RpkiState::Valid),
            "invalid" => Ok(RpkiState::Invalid),
            "not-found" => Ok(RpkiState::NotFound),
            _ => Err(AppError::InvalidInput(format!(
                "unknown validation state: {s}"
            ))),
        }
    }
}

/// 1回の検証結果。メトリクス更新にそのまま渡して使い捨てる。
#[derive(Debug, Clone)]
pub struct ValidationRecord {
    pub prefix: String,
    pub origin_asn: String,
    pub state: RpkiState,
    pub max_length: String,
    pub unmatched_length: bool,
}

/// バリデータのレスポンスボディをValidationRecordへ変換する
pub fn decode(body: &str) -> Result<ValidationRecord, AppError> {
    let parsed: ValidityResponse = serde_json::from_str(body)?;
    let data = parsed.validated_route;

    let state = data.validity.state.parse::<RpkiState>()?;

    // 先頭のmatched VRPからmax_lengthを拾う。なければ目印の文字列。
    let max_length = data
        .validity
        .vrps
        .matched
        .first()
        .map(|vrp| vrp.max_length.clone())
        .unwrap_or_else(|| MAX_LENGTH_NOT_FOUND.to_string());

    Ok(ValidationRecord {
        prefix: data.route.prefix,
        origin_asn: data.route.origin_asn,
        state,
        max_length,
        unmatched_length: !data.validity.vrps.unmatched_length.is_empty(),
    })
}
