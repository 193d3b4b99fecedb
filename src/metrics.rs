use crate::error::AppError;
use crate::validity::ValidationRecord;
use prometheus::{Encoder, GaugeVec, IntCounter, Opts, Registry, TextEncoder};

/// エクスポートするメトリクス一式を持つレジストリ。
/// グローバルにはせず、Arcで収集ループと公開サーバへ配る。
pub struct RpkiMetrics {
    registry: Registry,
    status: GaugeVec,
    queries_success: IntCounter,
    queries_failed: IntCounter,
    vrp_labels: bool,
}

impl RpkiMetrics {
    /// レジストリを組み立てて各メトリクスを登録する。
    /// vrp_labelsが真のときはmax_length/unmatched_lengthラベルも付ける。
    pub fn new(vrp_labels: bool) -> Result<Self, AppError> {
        let registry = Registry::new();

        let label_names: &[&str] = if vrp_labels {
            &["prefix", "asn", "max_length", "unmatched_length"]
        } else {
            &["prefix", "asn"]
        };

        let status = GaugeVec::new(
            Opts::new(
                "rpki_status",
                "RPKI Status of the prefix (0 - invalid, 1 - valid, 2 - not found)",
            ),
            label_names,
        )?;
        registry.register(Box::new(status.clone()))?;

        let queries_success = IntCounter::new(
            "rpki_queries_success_total",
            "Number of successful queries",
        )?;
        registry.register(Box::new(queries_success.clone()))?;

        let queries_failed =
            IntCounter::new("rpki_queries_failed_total", "Number of failed queries")?;
        registry.register(Box::new(queries_failed.clone()))?;

        Ok(Self {
            registry,
            status,
            queries_success,
            queries_failed,
            vrp_labels,
        })
    }

    /// 検証結果をゲージへ反映し、成功カウンタを1回だけ進める。
    /// ラベル値はレスポンス由来の文字列をそのまま使う。
    pub fn record(&self, record: &ValidationRecord) {
        let gauge = if self.vrp_labels {
            let unmatched = if record.unmatched_length { "true" } else { "false" };
            self.status.with_label_values(&[
                record.prefix.as_str(),
                record.origin_asn.as_str(),
                record.max_length.as_str(),
                unmatched,
            ])
        } else {
            self.status
                .with_label_values(&[record.prefix.as_str(), record.origin_asn.as_str()])
        };

        gauge.set(record.state.code());
        self.queries_success.inc();
    }

    /// メトリクスまで到達しなかった問い合わせの失敗を数える
    pub fn record_failure(&self) {
        self.queries_failed.inc();
    }

    pub fn success_count(&self) -> u64 {
        self.queries_success.get()
    }

    pub fn failure_count(&self) -> u64 {
        self.queries_failed.get()
    }

    /// 現在のスナップショットをPrometheusテキスト形式で返す
    pub fn gather_text(&self) -> Result<String, AppError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
