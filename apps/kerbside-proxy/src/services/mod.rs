// [apps/kerbside-proxy/src/services/mod.rs]
pub mod reaper;

pub use reaper::spawn_reaper;
