// [libs/infra/spice-client/src/errors.rs]
/*!
 * =================================================================
 * APARATO: HYPERVISOR LINK ERRORS (ESTRATO L3)
 * =================================================================
 */

use kerbside_infra_wire::auth::AuthError;
use kerbside_infra_wire::error::WireError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HypervisorLinkError {
    #[error("[SPICE_HV_IO_FAULT] {0}")]
    Io(#[from] std::io::Error),

    #[error("[SPICE_HV_TLS_FAULT] {0}")]
    Tls(String),

    #[error("[SPICE_HV_NO_TLS_PORT] hypervisor demanded a secured channel but no secure_port is configured")]
    NoTlsPort,

    #[error("[SPICE_HV_HOST_SUBJECT_FAULT] hypervisor certificate subject {actual:?} did not match configured {expected:?}")]
    HostSubjectInvalid { expected: String, actual: String },

    #[error("[SPICE_HV_WIRE_FAULT] {0}")]
    Wire(#[from] WireError),

    #[error("[SPICE_HV_AUTH_FAULT] {0}")]
    Auth(#[from] AuthError),

    #[error("[SPICE_HV_LINK_REJECTED] hypervisor link reply carried error code {0}")]
    LinkRejected(u32),

    #[error("[SPICE_HV_AUTH_REJECTED] hypervisor rejected the re-encrypted ticket, code {0}")]
    AuthRejected(u32),

    #[error("[SPICE_HV_TIMEOUT] hypervisor handshake exceeded its deadline")]
    Timeout,

    #[error("[SPICE_HV_CLOSED] hypervisor closed the connection mid-handshake")]
    ConnectionClosed,
}
