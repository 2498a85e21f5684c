// [apps/kerbside-proxy/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: ESTADO COMPARTIDO DEL SUPERVISOR (ESTRATO L1-APP)
 * RESPONSABILIDAD: REGISTRO DE TAREAS EN VUELO Y PUENTE DE MÉTRICAS
 *
 * Deliberadamente NO carga un `DbClient` compartido: cada tarea de
 * conexión reinicializa su propio enlace a la base de datos, tal como
 * cada worker lo hacía en el modelo de proceso-por-conexión original.
 * =================================================================
 */

use crate::metrics::MetricEvent;
use kerbside_shared_config::KerbsideConfig;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// One in-flight connection task, tracked so the maintenance tick can
/// reconcile it against `proxychannels` rows and reap strays.
pub struct TaskEntry {
    pub handle: JoinHandle<()>,
    pub spawned_at: Instant,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<KerbsideConfig>,
    pub ca_cert_pem: Arc<Option<String>>,
    pub metrics_tx: UnboundedSender<MetricEvent>,
    tasks: Arc<Mutex<HashMap<i64, TaskEntry>>>,
    next_pid: Arc<AtomicI64>,
}

impl AppState {
    pub fn new(
        config: Arc<KerbsideConfig>,
        ca_cert_pem: Option<String>,
        metrics_tx: UnboundedSender<MetricEvent>,
    ) -> Self {
        Self {
            config,
            ca_cert_pem: Arc::new(ca_cert_pem),
            metrics_tx,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            next_pid: Arc::new(AtomicI64::new(1)),
        }
    }

    /// Mints the `(node, pid)` identity's `pid` half — a monotonically
    /// increasing task ordinal standing in for the original per-process PID.
    pub fn next_pid(&self) -> i64 {
        self.next_pid.fetch_add(1, Ordering::Relaxed)
    }

    pub fn register_task(&self, pid: i64, handle: JoinHandle<()>) {
        self.tasks.lock().expect("task registry lock poisoned").insert(
            pid,
            TaskEntry {
                handle,
                spawned_at: Instant::now(),
            },
        );
    }

    pub fn worker_count(&self) -> usize {
        self.tasks.lock().expect("task registry lock poisoned").len()
    }

    /// Removes and returns the registered pids whose `JoinHandle` has
    /// already finished, for the maintenance tick to reconcile against the DB.
    pub fn drain_finished_tasks(&self) -> Vec<i64> {
        let mut guard = self.tasks.lock().expect("task registry lock poisoned");
        let finished: Vec<i64> = guard
            .iter()
            .filter(|(_, entry)| entry.handle.is_finished())
            .map(|(pid, _)| *pid)
            .collect();
        for pid in &finished {
            guard.remove(pid);
        }
        finished
    }

    /// Returns the pids of every still-running task older than `min_age`,
    /// for the caller to cross-reference against live `proxychannels` rows.
    pub fn running_tasks_older_than(&self, min_age: std::time::Duration) -> Vec<i64> {
        self.tasks
            .lock()
            .expect("task registry lock poisoned")
            .iter()
            .filter(|(_, entry)| !entry.handle.is_finished() && entry.spawned_at.elapsed() >= min_age)
            .map(|(pid, _)| *pid)
            .collect()
    }

    /// Aborts and drops a stray task's `JoinHandle` — the task-model
    /// equivalent of `SIGKILL`ing a stray worker process.
    pub fn abort_task(&self, pid: i64) {
        if let Some(entry) = self.tasks.lock().expect("task registry lock poisoned").remove(&pid) {
            entry.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn test_config() -> Arc<KerbsideConfig> {
        Arc::new(KerbsideConfig::parse_from([
            "kerbside-proxy",
            "--node-name",
            "node-a",
            "--proxy-host-cert-path",
            "/tmp/a.pem",
            "--proxy-host-cert-key-path",
            "/tmp/a.key",
            "--sql-url",
            "file::memory:",
        ]))
    }

    #[tokio::test]
    async fn pid_allocation_is_monotonic_and_unique() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let state = AppState::new(test_config(), None, tx);
        let a = state.next_pid();
        let b = state.next_pid();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[tokio::test]
    async fn finished_tasks_drain_out_of_the_registry() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let state = AppState::new(test_config(), None, tx);
        let pid = state.next_pid();
        let handle = tokio::spawn(async {});
        state.register_task(pid, handle);
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(state.drain_finished_tasks(), vec![pid]);
        assert_eq!(state.worker_count(), 0);
    }
}
