// [libs/infra/spice-client/src/lib.rs]
/*!
 * =================================================================
 * APARATO: HYPERVISOR SPICE CLIENT LIBRARY BARREL (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICIÓN PÚBLICA DEL ENLACE SALIENTE AL HIPERVISOR
 * =================================================================
 */

pub mod client;
pub mod errors;
pub mod stream;
pub mod subject;
pub mod verifier;

pub use client::{connect, HypervisorEndpoint, HypervisorLink};
pub use errors::HypervisorLinkError;
pub use stream::HypervisorStream;
pub use verifier::AcceptAnyChainVerifier;
