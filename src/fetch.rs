use crate::error::AppError;
use reqwest::Client;

/// バリデータへのHTTP GETを1回だけ実行する。リトライはしない。
/// 成功時はレスポンスボディを文字列として返す。
/// 200以外のステータスはURLとコードを持つエラーになる。
pub async fn lookup(
    client: &Client,
    base_url: &str,
    asn: u32,
    prefix: &str,
) -> Result<String, AppError> {
    // ASは整数、prefixは設定検証済みのCIDRなので単純な埋め込みで足りる
    let url = format!("{base_url}?asn={asn}&prefix={prefix}");

    let resp = client.get(&url).send().await?;
    let code = resp.status().as_u16();
    if code != 200 {
        return Err(AppError::Status { url, code });
    }

    let text = resp.text().await?;
    Ok(text)
}
