use crate::error::AppError;
use crate::metrics::RpkiMetrics;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode, header};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, warn};

/// メトリクス公開用のHTTPサーバ。接続ごとにHTTP/1で応答する。
/// bind失敗を起動時の致命エラーにできるよう、listenerは呼び出し側で用意する。
pub async fn serve(
    listener: TcpListener,
    metrics_path: String,
    metrics: Arc<RpkiMetrics>,
) -> Result<(), AppError> {
    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = Arc::clone(&metrics);
        let metrics_path = metrics_path.clone();

        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                handle_request(req, metrics_path.clone(), Arc::clone(&metrics))
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, svc).await {
                debug!("connection error: {e}");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics_path: String,
    metrics: Arc<RpkiMetrics>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, path) if path == metrics_path => match metrics.gather_text() {
            Ok(body) => text_response(StatusCode::OK, "text/plain; version=0.0.4", body),
            Err(e) => {
                warn!("failed to encode metrics: {e}");
                text_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "text/plain; charset=utf-8",
                    format!("failed to encode metrics: {e}\n"),
                )
            }
        },
        (&Method::GET, "/") => text_response(
            StatusCode::OK,
            "text/html; charset=utf-8",
            landing_page(&metrics_path),
        ),
        _ => text_response(
            StatusCode::NOT_FOUND,
            "text/plain; charset=utf-8",
            "not found\n".to_string(),
        ),
    };

    Ok(response)
}

fn text_response(
    status: StatusCode,
    content_type: &'static str,
    body: String,
) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

/// ルートパスに置く簡易ランディングページ
fn landing_page(metrics_path: &str) -> String {
    format!(
        "<html>\n<head><title>RPKI Watch</title></head>\n<body>\n<h1>RPKI Watch</h1>\n<p><a href='{metrics_path}'>Metrics</a></p>\n</body>\n</html>\n"
    )
}
