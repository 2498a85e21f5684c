// [libs/domain/model/src/audit.rs]
//! Append-only audit trail.

use serde::{Deserialize, Serialize};

/// An append-only log row. Primary key `(source, uuid, timestamp)`, where
/// `timestamp` carries microsecond resolution so that two events for the
/// same console in the same millisecond remain distinguishable. Never
/// updated; retained across console/source soft-deletes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub source: String,
    pub uuid: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub session_id: Option<String>,
    pub channel: Option<String>,
    pub node: Option<String>,
    pub pid: Option<i64>,
    pub message: String,
}
