//! Bounded worker pool
//!
//! Tasks are spawned immediately and queue on a semaphore, so at most
//! `workers` of them make progress at once. `drain` is the barrier.

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::error;

pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
            handles: Vec::new(),
        }
    }

    /// Submit a task; it starts once a worker slot is free.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let semaphore = self.semaphore.clone();
        self.handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            task.await;
        }));
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every submitted task. Returns how many of them panicked.
    pub async fn drain(self) -> usize {
        let mut panicked = 0;
        for joined in join_all(self.handles).await {
            if let Err(e) = joined {
                error!("worker task failed: {}", e);
                panicked += 1;
            }
        }
        panicked
    }
}
