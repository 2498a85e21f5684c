// [apps/kerbside-proxy/src/services/reaper.rs]
/*!
 * =================================================================
 * APARATO: CICLO DE MANTENIMIENTO (ESTRATO L4)
 * RESPONSABILIDAD: DRENAJE DE MÉTRICAS, RECONCILIACIÓN DE TAREAS Y PURGA
 *
 * Corre cada segundo en una sola tarea de fondo durante toda la vida
 * del proceso, con su propio `DbClient` — no uno por tick. Es el único
 * lugar que borra filas de `proxychannels` por tareas ya terminadas y
 * el único que mata tareas huérfanas sin fila correspondiente.
 * =================================================================
 */

use crate::metrics::ProxyMetrics;
use crate::state::AppState;
use kerbside_infra_db::repositories::{ChannelRepository, TokenRepository};
use kerbside_infra_db::DbClient;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info, warn};

use crate::metrics::MetricEvent;

const MAINTENANCE_TICK: Duration = Duration::from_secs(1);
const STRAY_GRACE_PERIOD: Duration = Duration::from_secs(5);
const TOKEN_REAP_EVERY_N_TICKS: u32 = 60;

/// Spawns the supervisor's single maintenance loop. Never returns on its
/// own; the task is meant to live for the whole process lifetime.
pub fn spawn_reaper(state: AppState, metrics: Arc<ProxyMetrics>, mut metrics_rx: UnboundedReceiver<MetricEvent>) {
    tokio::spawn(async move {
        let db = match DbClient::connect(&state.config.sql_url, state.config.sql_access_token.clone()).await {
            Ok(db) => db,
            Err(e) => {
                error!(error = %e, "reaper could not open its database connection, maintenance is disabled");
                return;
            }
        };
        let channel_repo = ChannelRepository::new(db.clone());
        let token_repo = TokenRepository::new(db);

        let mut ticker = tokio::time::interval(MAINTENANCE_TICK);
        let mut tick_count: u32 = 0;

        loop {
            ticker.tick().await;
            tick_count = tick_count.wrapping_add(1);

            metrics.drain(&mut metrics_rx);
            metrics.set_worker_count(state.worker_count() as i64);

            for pid in state.drain_finished_tasks() {
                if let Err(e) = channel_repo.remove_proxy_channel(&state.config.node_name, pid).await {
                    warn!(pid, error = %e, "failed to remove proxychannels row for a finished task");
                } else {
                    info!(pid, "worker task exited, channel row reclaimed");
                }
            }

            if let Err(e) = reap_strays(&state, &channel_repo).await {
                warn!(error = %e, "stray-task reap pass failed, will retry next tick");
            }

            if tick_count % TOKEN_REAP_EVERY_N_TICKS == 0 {
                match token_repo.reap_expired_tokens().await {
                    Ok(reaped) if reaped > 0 => info!(reaped, "expired console tokens purged"),
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "token reap pass failed"),
                }
            }
        }
    });
}

/// A running task older than `STRAY_GRACE_PERIOD` with no matching
/// `proxychannels` row on this node never got a chance to write one, or
/// outlived its own row some other way — either way it is aborted.
async fn reap_strays(state: &AppState, channel_repo: &ChannelRepository) -> Result<(), kerbside_infra_db::DbError> {
    let running = state.running_tasks_older_than(STRAY_GRACE_PERIOD);
    if running.is_empty() {
        return Ok(());
    }
    let live_pids: HashSet<i64> = channel_repo
        .get_node_channels(&state.config.node_name)
        .await?
        .into_iter()
        .map(|row| row.pid)
        .collect();

    for pid in running {
        if !live_pids.contains(&pid) {
            warn!(pid, "aborting stray worker task with no matching channel row");
            state.abort_task(pid);
        }
    }
    Ok(())
}
