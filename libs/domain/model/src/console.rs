// [libs/domain/model/src/console.rs]
//! A discovered VM console, owned by exactly one `Source`.

use serde::{Deserialize, Serialize};

/// A discovered VM console. `uuid` is the primary key; `(source, uuid)`
/// uniquely identifies it within the schema's composite indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Console {
    pub uuid: String,
    pub source: String,
    pub hypervisor_hostname: String,
    pub hypervisor_ip: String,
    pub insecure_port: u16,
    pub secure_port: Option<u16>,
    pub name: String,
    pub host_subject: Option<String>,
    /// The hypervisor-side one-time SPICE password. Rotated on every new
    /// proxy session that requires one (oVirt); never sent to clients.
    pub ticket: Option<String>,
    pub discovered: chrono::DateTime<chrono::Utc>,
}
