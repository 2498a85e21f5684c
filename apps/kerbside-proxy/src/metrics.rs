// [apps/kerbside-proxy/src/metrics.rs]
/*!
 * =================================================================
 * APARATO: PUENTE DE MÉTRICAS (ESTRATO L1-APP)
 * RESPONSABILIDAD: AGREGACIÓN PROMETHEUS ALIMENTADA POR CANAL `mpsc`
 *
 * Las tareas de trabajo nunca tocan un `IntCounterVec` directamente:
 * emiten `MetricEvent`s a través de un canal `mpsc` y el supervisor
 * los drena en su ciclo de mantenimiento. Esto evita cualquier
 * necesidad de bloqueo entre tareas más allá del propio canal.
 * =================================================================
 */

use prometheus::{CounterVec, Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::warn;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("[METRICS_REGISTER_FAULT] failed to register collector: {0}")]
    Register(#[from] prometheus::Error),
    #[error("[METRICS_ENCODE_FAULT] failed to encode text exposition: {0}")]
    Encode(std::io::Error),
}

/// A unit of observed proxy activity, emitted by a session task and
/// consumed by the supervisor's maintenance tick.
#[derive(Debug, Clone)]
pub enum MetricEvent {
    BytesProxied { channel_type: String, session_id: String, bytes: u64 },
    ProxyTime { channel_type: String, session_id: String, seconds: f64 },
}

pub struct ProxyMetrics {
    registry: Registry,
    workers: IntGauge,
    bytes_proxied: IntCounterVec,
    proxy_time: CounterVec,
}

impl ProxyMetrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let workers = IntGauge::new("kerbside_workers", "Number of active proxy worker tasks")?;
        registry.register(Box::new(workers.clone()))?;

        let bytes_proxied = IntCounterVec::new(
            Opts::new("kerbside_bytes_proxied", "Total bytes forwarded per channel"),
            &["type", "session_id"],
        )?;
        registry.register(Box::new(bytes_proxied.clone()))?;

        let proxy_time = CounterVec::new(
            Opts::new("kerbside_proxy_time", "Total seconds a channel has spent proxying"),
            &["type", "session_id"],
        )?;
        registry.register(Box::new(proxy_time.clone()))?;

        Ok(Self {
            registry,
            workers,
            bytes_proxied,
            proxy_time,
        })
    }

    pub fn set_worker_count(&self, count: i64) {
        self.workers.set(count);
    }

    pub fn apply(&self, event: MetricEvent) {
        match event {
            MetricEvent::BytesProxied { channel_type, session_id, bytes } => {
                self.bytes_proxied
                    .with_label_values(&[&channel_type, &session_id])
                    .inc_by(bytes);
            }
            MetricEvent::ProxyTime { channel_type, session_id, seconds } => {
                self.proxy_time
                    .with_label_values(&[&channel_type, &session_id])
                    .inc_by(seconds);
            }
        }
    }

    /// Non-blocking drain of every event currently buffered in the channel.
    pub fn drain(&self, rx: &mut UnboundedReceiver<MetricEvent>) {
        while let Ok(event) = rx.try_recv() {
            self.apply(event);
        }
    }

    pub fn render(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(MetricsError::Encode)?;
        String::from_utf8(buffer).map_err(|e| {
            warn!("[METRICS_UTF8_FAULT]: exposition buffer was not valid UTF-8: {e}");
            MetricsError::Encode(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_registered_metric_families() {
        let metrics = ProxyMetrics::new().expect("metrics construct");
        metrics.set_worker_count(3);
        metrics.apply(MetricEvent::BytesProxied {
            channel_type: "main".into(),
            session_id: "sess-1".into(),
            bytes: 1024,
        });
        let rendered = metrics.render().expect("render");
        assert!(rendered.contains("kerbside_workers 3"));
        assert!(rendered.contains("kerbside_bytes_proxied"));
    }

    #[tokio::test]
    async fn drain_applies_every_buffered_event() {
        let metrics = ProxyMetrics::new().expect("metrics construct");
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tx.send(MetricEvent::ProxyTime {
            channel_type: "display".into(),
            session_id: "sess-2".into(),
            seconds: 1.5,
        })
        .unwrap();
        tx.send(MetricEvent::ProxyTime {
            channel_type: "display".into(),
            session_id: "sess-2".into(),
            seconds: 2.5,
        })
        .unwrap();
        metrics.drain(&mut rx);
        let rendered = metrics.render().unwrap();
        assert!(rendered.contains("kerbside_proxy_time"));
    }
}
