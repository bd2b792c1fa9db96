//! Fixed-size worker pools
//!
//! Downloads and link extraction run on two independent pools so that
//! CPU-bound parsing and network-bound fetching neither starve each other
//! and can be sized independently. A pool is a set of worker tasks draining
//! a shared job channel; a job is any boxed future, which lets a download
//! job enqueue an extraction job on the other pool.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A unit of work executed by a pool worker
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Handle used to submit jobs to a pool, cloneable across tasks
pub type JobSender = mpsc::UnboundedSender<Job>;

/// Bounded pool of worker tasks executing submitted jobs
///
/// Workers are spawned at construction and live until [`WorkerPool::shutdown`];
/// the pool is reused across crawl invocations. Must be created inside a
/// tokio runtime.
pub struct WorkerPool {
    name: &'static str,
    tx: JobSender,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawns `size` workers draining a shared job queue
    pub fn new(name: &'static str, size: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let workers = (0..size)
            .map(|id| {
                let rx = Arc::clone(&rx);
                tokio::spawn(async move {
                    loop {
                        // Hold the receiver lock only while waiting for a
                        // job, never while running one.
                        let job = rx.lock().await.recv().await;
                        match job {
                            Some(job) => job.await,
                            None => break,
                        }
                    }
                    tracing::trace!(pool = name, worker = id, "worker exiting");
                })
            })
            .collect();

        Self {
            name,
            tx,
            workers: Mutex::new(workers),
        }
    }

    /// Submits a job for execution
    ///
    /// Jobs submitted after shutdown are silently discarded, matching the
    /// cancellation contract: queued work is dropped, not completed.
    pub fn submit(&self, job: Job) {
        if self.tx.send(job).is_err() {
            tracing::debug!(pool = self.name, "job discarded: pool is shut down");
        }
    }

    /// Returns a cloneable handle for submitting jobs from worker tasks
    pub fn sender(&self) -> JobSender {
        self.tx.clone()
    }

    /// Aborts all workers and waits up to `grace` for each to exit
    ///
    /// Queued and in-flight jobs are discarded. A worker that fails to stop
    /// within the grace period is logged and abandoned; shutdown never
    /// blocks the caller past the grace period.
    pub async fn shutdown(&self, grace: Duration) {
        let workers = {
            let mut guard = self.workers.lock().unwrap();
            std::mem::take(&mut *guard)
        };
        if workers.is_empty() {
            return;
        }

        tracing::debug!(pool = self.name, workers = workers.len(), "shutting down");
        for handle in &workers {
            handle.abort();
        }
        for handle in workers {
            match tokio::time::timeout(grace, handle).await {
                Ok(_) => {}
                Err(_) => {
                    tracing::warn!(pool = self.name, "worker did not stop within grace period");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_executes_submitted_jobs() {
        let pool = WorkerPool::new("test", 2);
        let counter = Arc::new(AtomicUsize::new(0));
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();

        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            let done_tx = done_tx.clone();
            pool.submit(Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = done_tx.send(());
            }));
        }
        for _ in 0..10 {
            done_rx.recv().await.unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        pool.shutdown(Duration::from_millis(100)).await;
    }

    #[tokio::test]
    async fn test_concurrency_bounded_by_size() {
        let pool = WorkerPool::new("bounded", 3);
        let live = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();

        for _ in 0..20 {
            let live = Arc::clone(&live);
            let peak = Arc::clone(&peak);
            let done_tx = done_tx.clone();
            pool.submit(Box::pin(async move {
                let now = live.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                live.fetch_sub(1, Ordering::SeqCst);
                let _ = done_tx.send(());
            }));
        }
        for _ in 0..20 {
            done_rx.recv().await.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 3);
        pool.shutdown(Duration::from_millis(100)).await;
    }

    #[tokio::test]
    async fn test_shutdown_discards_inflight_jobs() {
        let pool = WorkerPool::new("stuck", 1);
        pool.submit(Box::pin(async {
            std::future::pending::<()>().await;
        }));
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Must return promptly even though the job never finishes.
        tokio::time::timeout(Duration::from_secs(1), pool.shutdown(Duration::from_millis(100)))
            .await
            .expect("shutdown blocked past the grace period");
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_discarded() {
        let pool = WorkerPool::new("closed", 1);
        pool.shutdown(Duration::from_millis(100)).await;
        // Does not panic or block.
        pool.submit(Box::pin(async {}));
    }

    #[tokio::test]
    async fn test_shutdown_twice_is_harmless() {
        let pool = WorkerPool::new("twice", 2);
        pool.shutdown(Duration::from_millis(100)).await;
        pool.shutdown(Duration::from_millis(100)).await;
    }
}
