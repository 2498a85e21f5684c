// [libs/domain/model/src/discovery.rs]
//! Interface boundary for console discovery drivers.
//!
//! Discovery (OpenStack/oVirt/Shaken Fist clients that populate `Source`
//! and `Console` rows) is out of scope for this crate — it is consumed
//! only via this trait. No concrete driver ships here.
//!
//! OpenStack discovery is documented, not implemented: a real driver would
//! enumerate `ACTIVE` instances behind a SPICE-direct console type and a
//! flavor filter, but is never required to actually call out to an
//! OpenStack client during discovery for this crate's purposes.

use crate::console::Console;
use crate::source::Source;
use async_trait::async_trait;

/// A periodically-refreshed source of `(Source, Console)` coordinates.
///
/// Implementations own their own polling cadence and write directly to
/// the shared store; the proxy only ever reads what they have written.
#[async_trait]
pub trait ConsoleDiscoverySource: Send + Sync {
    /// The `Source` row this driver refreshes.
    fn source(&self) -> &Source;

    /// Poll the back-end once and return the consoles currently visible.
    /// oVirt implementations are expected to acquire a fresh one-time
    /// ticket per console as part of this call when the proxy is about to
    /// need one; OpenStack/Shaken Fist implementations reuse the ticket
    /// recorded at discovery time.
    async fn discover(&self) -> Result<Vec<Console>, DiscoveryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("source unreachable: {0}")]
    Unreachable(String),
    #[error("source credentials rejected: {0}")]
    AuthFailed(String),
}
