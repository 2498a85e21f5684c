// [libs/infra/db/src/errors.rs]
/*!
 * =================================================================
 * APARATO: DATABASE ERROR CATALOG (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Error de enlace físico o de red con el cluster libSQL.
    #[error("[L3_DB_NET_FAULT]: DATABASE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    /// Fallo en la configuración del entorno (variables vacías o malformadas).
    #[error("[L3_DB_CONFIG_FAULT]: STRATEGIC_ENV_VOID -> {0}")]
    ConfigurationError(String),

    /// Error de sintaxis o ejecución devuelto por el motor libSQL.
    #[error("[L3_DB_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    QueryError(#[from] libsql::Error),

    /// Fallo en la transformación de tipos entre SQLite y el dominio Rust.
    #[error("[L3_DB_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    MappingError(String),

    /// `add_token` collided with an existing primary key; caller retries
    /// with fresh randomness up to five times before giving up.
    #[error("[L3_TOKEN_FAULT]: REUSED_TOKEN -> {0}")]
    ReusedToken(String),

    /// Five consecutive `ReusedToken` collisions; the caller should treat
    /// this as a session-terminating failure, not retry again.
    #[error("[L3_TOKEN_FAULT]: TOKEN_GENERATION_EXHAUSTED after {0} attempts")]
    TokenFailure(u32),

    /// The requested source does not exist (or is soft-deleted).
    #[error("[L3_SOURCE_FAULT]: SOURCE_NOT_FOUND -> {0}")]
    SourceNotFound(String),

    /// The requested console does not exist.
    #[error("[L3_CONSOLE_FAULT]: CONSOLE_NOT_FOUND -> {0}")]
    ConsoleNotFound(String),
}
