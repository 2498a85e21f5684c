// [libs/domain/model/src/channel.rs]
//! A live worker registration — one row per running proxy task.

use serde::{Deserialize, Serialize};

/// A live worker registration. Primary key `(node, pid)`. Rows exist for
/// the lifetime of a worker; absence of a row for a live child means
/// "stray — terminate" (see the supervisor's maintenance tick).
///
/// `pid` is a literal OS process id in the original; here it is the
/// monotonic worker-task identifier the supervisor assigns at spawn time,
/// kept as `i64` to preserve the `(node, pid)` primary-key shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyChannel {
    pub node: String,
    pub pid: i64,
    pub client_ip: String,
    pub client_port: u16,
    pub connection_id: u32,
    pub channel_type: String,
    pub channel_id: u8,
    pub session_id: Option<String>,
    pub created: chrono::DateTime<chrono::Utc>,
}
