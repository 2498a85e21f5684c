// [apps/kerbside-proxy/src/lib.rs]
/*!
 * =================================================================
 * APARATO: RAÍZ DE LA LIBRERÍA DEL PROXY (ESTRATO L1-APP)
 * RESPONSABILIDAD: ÁRBOL DE MÓDULOS DEL SUPERVISOR SPICE
 * =================================================================
 */

pub mod kernel;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod worker;

pub mod services;

pub mod prelude {
    pub use crate::kernel::ProxyKernel;
    pub use crate::state::AppState;
}
