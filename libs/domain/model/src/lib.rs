// [libs/domain/model/src/lib.rs]
/*!
 * =================================================================
 * APARATO: KERBSIDE DOMAIN MODEL (V1.0 - SINGLE SOURCE OF TRUTH)
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L2)
 * RESPONSABILIDAD: DEFINICIÓN DE ENTIDADES Y CONTRATOS DEL DOMINIO
 *
 * Entidades: Source, Console, ConsoleToken, ProxyChannel, AuditEvent.
 * Ninguna de ellas conoce el motor de persistencia que las aloja;
 * ese acoplamiento vive en `kerbside-infra-db`.
 * =================================================================
 */

pub mod audit;
pub mod channel;
pub mod console;
pub mod discovery;
pub mod source;
pub mod token;

pub use audit::AuditEvent;
pub use channel::ProxyChannel;
pub use console::Console;
pub use discovery::ConsoleDiscoverySource;
pub use source::{Source, SourceKind};
pub use token::ConsoleToken;
