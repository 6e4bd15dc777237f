use std::{sync::Arc, time::Duration};

use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
pub struct WorkerPoolConfig {
    pub worker_count: usize,
    pub tick: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 2,
            tick: Duration::from_secs(1),
        }
    }
}

/// Background workers whose liveness is the system's running state.
#[derive(Clone)]
pub struct WorkerPool {
    config: WorkerPoolConfig,
    workers: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl WorkerPool {
    pub fn new(config: WorkerPoolConfig) -> Self {
        Self {
            config,
            workers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Running means at least one worker exists and none has exited.
    pub async fn is_running(&self) -> bool {
        let workers = self.workers.lock().await;
        all_alive(&workers)
    }

    /// Returns false when every worker was already alive.
    pub async fn start(&self) -> bool {
        let mut workers = self.workers.lock().await;
        if all_alive(&workers) {
            return false;
        }

        for stale in workers.drain(..) {
            stale.abort();
        }
        for worker_id in 0..self.config.worker_count {
            workers.push(spawn_worker(worker_id, self.config.tick));
        }
        info!(workers = workers.len(), "system workers started");
        true
    }

    /// Returns false when there was nothing to stop.
    pub async fn stop(&self) -> bool {
        let drained: Vec<JoinHandle<()>> = {
            let mut workers = self.workers.lock().await;
            workers.drain(..).collect()
        };
        if drained.is_empty() {
            return false;
        }

        for worker in &drained {
            worker.abort();
        }
        for worker in drained {
            let _ = worker.await;
        }
        info!("system workers stopped");
        true
    }
}

fn all_alive(workers: &[JoinHandle<()>]) -> bool {
    !workers.is_empty() && workers.iter().all(|w| !w.is_finished())
}

fn spawn_worker(worker_id: usize, tick: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        loop {
            interval.tick().await;
            debug!(worker_id, "worker tick");
        }
    })
}

#[cfg(test)]
#[path = "tests/workers_tests.rs"]
mod tests;
