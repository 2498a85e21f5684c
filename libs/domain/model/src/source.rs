// [libs/domain/model/src/source.rs]
//! A configured back-end cloud the proxy proxies consoles for.

use serde::{Deserialize, Serialize};

/// The kind of virtualization platform a `Source` talks to.
///
/// Persisted as plain text (no SQL `CHECK` constraint), matching the
/// original schema's looseness around this column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Openstack,
    Ovirt,
    Shakenfist,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Openstack => "openstack",
            SourceKind::Ovirt => "ovirt",
            SourceKind::Shakenfist => "shakenfist",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "openstack" => Some(SourceKind::Openstack),
            "ovirt" => Some(SourceKind::Ovirt),
            "shakenfist" => Some(SourceKind::Shakenfist),
            _ => None,
        }
    }
}

/// A configured back-end cloud. `name` is the primary key.
///
/// Soft-deleted (`deleted`) rather than removed, so historical
/// `AuditEvent` rows stay resolvable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub kind: SourceKind,
    pub connection_url: String,
    pub credentials: String,
    pub ca_cert: Option<String>,
    pub errored: bool,
    pub deleted: bool,
    pub last_seen: Option<chrono::DateTime<chrono::Utc>>,
    pub seen_by: Option<String>,
}
