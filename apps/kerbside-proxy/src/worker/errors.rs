// [apps/kerbside-proxy/src/worker/errors.rs]
/*!
 * =================================================================
 * APARATO: ERRORES DEL WORKER DE SESIÓN (ESTRATO L1-APP)
 * RESPONSABILIDAD: CLASIFICACIÓN DE TERMINACIÓN DE CONEXIÓN
 *
 * Las variantes de cierre normal (redirección, rechazo de hipervisor,
 * token desconocido) son tan "terminales" como un fallo de E/S: ambas
 * cierran ambos sockets y salen, solo difiere la severidad del log.
 * =================================================================
 */

use kerbside_infra_db::DbError;
use kerbside_infra_spice_client::errors::HypervisorLinkError;
use kerbside_infra_wire::auth::AuthError;
use kerbside_infra_wire::error::WireError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("[WORKER_IO_FAULT] {0}")]
    Io(#[from] std::io::Error),

    #[error("[WORKER_WIRE_FAULT] {0}")]
    Wire(#[from] WireError),

    #[error("[WORKER_AUTH_FAULT] {0}")]
    Auth(#[from] AuthError),

    #[error("[WORKER_DB_FAULT] {0}")]
    Db(#[from] DbError),

    #[error("[WORKER_HYPERVISOR_FAULT] {0}")]
    Hypervisor(#[from] HypervisorLinkError),

    #[error("[WORKER_BAD_AUTH_MECHANISM] client offered unsupported auth mechanism {0}, only AuthSpice(1) is accepted")]
    UnsupportedAuthMechanism(u32),

    /// The client's ticket was absent, expired, or otherwise rejected.
    /// Carries the link-reply error code already sent to the client.
    #[error("[WORKER_CONNECTION_DECLINED] client declined with code {0}")]
    ConnectionDeclined(u32),

    /// Plaintext-port shortcut: client told to retry on the secured port.
    #[error("[WORKER_CONNECTION_REDIRECTED] plaintext client redirected to the secured port")]
    ConnectionRedirected,

    /// The hypervisor-side connect or TLS upgrade failed after the client
    /// had already been told `ok`.
    #[error("[WORKER_CONNECTION_REFUSED] hypervisor refused the proxied connection")]
    ConnectionRefused,
}

impl WorkerError {
    /// Whether this outcome is an ordinary, expected termination (redirect,
    /// decline, refusal) rather than a genuine fault worth an error-level log.
    pub fn is_ordinary_termination(&self) -> bool {
        matches!(
            self,
            WorkerError::ConnectionRedirected | WorkerError::ConnectionDeclined(_) | WorkerError::ConnectionRefused
        )
    }
}
