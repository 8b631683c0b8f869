//! Fixed-concurrency worker pool.

use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::errors::{DiagnosticError, DiagnosticKind, DumpError};

/// Runs jobs as tokio tasks, at most `worker_count` at a time.
///
/// [`WorkerPool::join`] is the barrier: it drains every submitted job and
/// stops at the first failure, aborting whatever is still queued or running.
/// Dropping the pool aborts outstanding jobs as well.
pub(crate) struct WorkerPool {
    permits: Arc<Semaphore>,
    running: FuturesUnordered<JoinHandle<Result<(), DumpError>>>,
}

impl WorkerPool {
    pub(crate) fn new(worker_count: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(worker_count)),
            running: FuturesUnordered::new(),
        }
    }

    /// Queues a job.
    pub(crate) fn submit<F>(&mut self, job: F)
    where
        F: Future<Output = Result<(), DumpError>> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        self.running.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await.map_err(|e| {
                DiagnosticError::new(DiagnosticKind::Unknown, "worker pool was shut down")
                    .with_source(e)
            })?;
            job.await
        }));
    }

    /// Returns the number of jobs not yet joined.
    pub(crate) fn pending(&self) -> usize {
        self.running.len()
    }

    /// Waits for every submitted job.
    ///
    /// Returns the first failure; diagnostic failures pass through as they
    /// are, anything else becomes an [`DiagnosticKind::Unknown`] diagnostic.
    pub(crate) async fn join(&mut self) -> Result<(), DumpError> {
        while let Some(joined) = self.running.next().await {
            let result = match joined {
                Ok(result) => result.map_err(into_diagnostic),
                Err(join_error) => Err(DiagnosticError::new(
                    DiagnosticKind::Unknown,
                    format!("worker terminated abnormally: {join_error}"),
                )
                .with_source(join_error)
                .into()),
            };
            if let Err(e) = result {
                self.shutdown_now();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Aborts every job that has not completed yet.
    pub(crate) fn shutdown_now(&mut self) {
        if self.running.is_empty() {
            return;
        }
        debug!(pending = self.running.len(), "Aborting outstanding workers");
        self.permits.close();
        for handle in self.running.iter() {
            handle.abort();
        }
        self.running.clear();
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown_now();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("available_permits", &self.permits.available_permits())
            .field("pending", &self.running.len())
            .finish()
    }
}

fn into_diagnostic(error: DumpError) -> DumpError {
    match error {
        DumpError::Diagnostic(_) => error,
        other => DiagnosticError::new(DiagnosticKind::Unknown, other.to_string())
            .with_source(other)
            .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_bounded_concurrency() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(2);

        for _ in 0..8 {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            pool.submit(async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            });
        }
        pool.join().await.unwrap();

        assert_eq!(pool.pending(), 0);
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_diagnostic_passes_through() {
        let mut pool = WorkerPool::new(1);
        pool.submit(async {
            Err(DiagnosticError::new(DiagnosticKind::TableNotFound, "missing").into())
        });
        let err = pool.join().await.unwrap_err();
        assert_eq!(err.diagnostic_kind(), Some(DiagnosticKind::TableNotFound));
    }

    #[tokio::test]
    async fn test_other_failures_become_unknown() {
        let mut pool = WorkerPool::new(1);
        pool.submit(async { Err(DumpError::invalid_state("not running")) });
        let err = pool.join().await.unwrap_err();
        assert_eq!(err.diagnostic_kind(), Some(DiagnosticKind::Unknown));
        assert!(err.to_string().contains("not running"));
    }

    async fn explode() -> Result<(), DumpError> {
        panic!("worker exploded")
    }

    #[tokio::test]
    async fn test_panic_becomes_unknown() {
        let mut pool = WorkerPool::new(1);
        pool.submit(explode());
        let err = pool.join().await.unwrap_err();
        assert_eq!(err.diagnostic_kind(), Some(DiagnosticKind::Unknown));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failure_aborts_outstanding_jobs() {
        let finished = Arc::new(AtomicBool::new(false));
        let mut pool = WorkerPool::new(2);

        let slow = Arc::clone(&finished);
        pool.submit(async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            slow.store(true, Ordering::SeqCst);
            Ok(())
        });
        pool.submit(async { Err(DumpError::unsupported("boom")) });

        let result = tokio::time::timeout(Duration::from_secs(5), pool.join()).await;
        assert!(result.expect("join must not wait for aborted jobs").is_err());
        assert_eq!(pool.pending(), 0);
        assert!(!finished.load(Ordering::SeqCst));
    }
}
