// [libs/infra/db/src/repositories/mod.rs]
/*!
 * =================================================================
 * APARATO: REPOSITORY ACCESS MATRIX (ESTRATO L3)
 * RESPONSABILIDAD: ORQUESTACIÓN DE SUBSISTEMAS DE PERSISTENCIA
 * =================================================================
 */

pub mod audit_repository;
pub mod channel_repository;
pub mod console_repository;
pub mod source_repository;
pub mod token_repository;

pub use audit_repository::AuditRepository;
pub use channel_repository::ChannelRepository;
pub use console_repository::ConsoleRepository;
pub use source_repository::SourceRepository;
pub use token_repository::TokenRepository;
