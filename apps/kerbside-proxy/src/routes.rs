// [apps/kerbside-proxy/src/routes.rs]
/*!
 * =================================================================
 * APARATO: ENRUTADOR DE OBSERVABILIDAD (ESTRATO L1-APP)
 * RESPONSABILIDAD: SUPERFICIE HTTP AUXILIAR JUNTO AL SOCKET SPICE
 *
 * Todo lo que el proxy expone por HTTP: el conteo de bytes/canales
 * para Prometheus y una sonda de vida para el orquestador. El tráfico
 * SPICE propiamente dicho nunca pasa por este router.
 * =================================================================
 */

use crate::metrics::ProxyMetrics;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tracing::warn;

pub fn build_router(metrics: Arc<ProxyMetrics>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<Arc<ProxyMetrics>>) -> impl IntoResponse {
    match metrics.render() {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to render metrics exposition");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable").into_response()
        }
    }
}
