// [apps/kerbside-proxy/src/worker/mod.rs]
/*!
 * =================================================================
 * APARATO: TAREA DE CONEXIÓN (ESTRATO L1-APP)
 * RESPONSABILIDAD: UNA TAREA POR CANAL, DESDE ACEPTACIÓN HASTA CIERRE
 *
 * `handle_connection` es lo que el núcleo de aceptación `spawn`ea por
 * cada socket entrante. Sustituye al proceso hijo por-conexión del
 * original: misma forma de vida (nace, enlaza, reenvía, muere), pero
 * como tarea de Tokio con su propio `DbClient` en vez de su propia PID.
 * =================================================================
 */

pub mod errors;
pub mod link;
pub mod session;
pub mod stream;

use crate::state::AppState;
use errors::WorkerError;
use std::net::SocketAddr;
use stream::ClientStream;
use tracing::{instrument, warn};

#[instrument(skip(stream, state), fields(%client_addr, secure = is_secure_port, pid))]
pub async fn handle_connection(
    stream: ClientStream,
    is_secure_port: bool,
    client_addr: SocketAddr,
    state: AppState,
    pid: i64,
) -> Result<(), WorkerError> {
    let (client, linked) = link::negotiate(stream, is_secure_port, client_addr, &state, pid).await?;

    session::run(client, linked.hypervisor.stream, linked.channel_type, linked.session_id, &state)
        .await
        .inspect_err(|e| {
            if !e.is_ordinary_termination() {
                warn!(error = %e, "session runtime ended abnormally");
            }
        })
}
