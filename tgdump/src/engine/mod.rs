//! The dump engine.
//!
//! [`DumpEngine`] drives a [`DumpSession`] through one run:
//!
//! 1. register every target in parallel, then wait for all of them
//! 2. begin the transaction
//! 3. execute every target in parallel, then wait for all of them
//! 4. commit
//!
//! The first failure aborts the run. The engine never closes the session;
//! that stays with the caller, who owns it.

mod pool;


use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::DumpEngineConfig;
use crate::core::DumpTarget;
use crate::errors::DumpError;
use crate::monitor::DumpMonitor;
use crate::observability::SpanTimer;
use crate::session::DumpSession;
use pool::WorkerPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Register,
    Execute,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register => write!(f, "register"),
            Self::Execute => write!(f, "execute"),
        }
    }
}

/// Runs dump targets through a session on a fixed-size worker pool.
#[derive(Debug, Clone)]
pub struct DumpEngine {
    config: DumpEngineConfig,
}

impl DumpEngine {
    /// Creates a new engine.
    pub fn new(config: DumpEngineConfig) -> Result<Self, DumpError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Creates an engine with the given number of workers.
    pub fn with_worker_count(worker_count: usize) -> Result<Self, DumpError> {
        Self::new(DumpEngineConfig::new().with_worker_count(worker_count))
    }

    /// Returns the number of workers.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.config.worker_count
    }

    /// Dumps every target under the session's single transaction.
    ///
    /// No target is executed before every target has registered and the
    /// transaction has started. On failure the session is left as is and the
    /// caller is expected to close it.
    pub async fn execute(
        &self,
        monitor: Arc<dyn DumpMonitor>,
        session: Arc<dyn DumpSession>,
        targets: &[DumpTarget],
    ) -> Result<(), DumpError> {
        validate_targets(targets)?;
        let timer = SpanTimer::start("dump");
        let mut pool = WorkerPool::new(self.config.worker_count);

        monitor.verbose(&format!("registering {} dump targets", targets.len()));
        Self::run_phase(&mut pool, Phase::Register, &monitor, &session, targets)
            .await?;

        session.begin(monitor.as_ref()).await?;

        monitor.verbose(&format!("executing {} dump targets", targets.len()));
        Self::run_phase(&mut pool, Phase::Execute, &monitor, &session, targets)
            .await?;

        session.commit(monitor.as_ref()).await?;
        info!(
            targets = targets.len(),
            workers = self.config.worker_count,
            duration_ms = timer.elapsed_ms(),
            "Dump completed"
        );
        Ok(())
    }

    async fn run_phase(
        pool: &mut WorkerPool,
        phase: Phase,
        monitor: &Arc<dyn DumpMonitor>,
        session: &Arc<dyn DumpSession>,
        targets: &[DumpTarget],
    ) -> Result<(), DumpError> {
        debug!(%phase, targets = targets.len(), "Entering phase");
        let timer = SpanTimer::start(phase.to_string());

        for target in targets {
            let monitor = Arc::clone(monitor);
            let session = Arc::clone(session);
            let target = target.clone();
            pool.submit(async move {
                match phase {
                    Phase::Register => session.register(monitor.as_ref(), &target).await,
                    Phase::Execute => session.execute(monitor.as_ref(), &target).await,
                }
            });
        }

        match pool.join().await {
            Ok(()) => {
                debug!(
                    %phase,
                    duration_ms = timer.elapsed_ms(),
                    "Leaving phase"
                );
                Ok(())
            }
            Err(e) => {
                warn!(%phase, error = %e, "Phase failed");
                Err(e)
            }
        }
    }
}

fn validate_targets(targets: &[DumpTarget]) -> Result<(), DumpError> {
    let mut seen = HashSet::with_capacity(targets.len());
    for target in targets {
        if target.label().is_empty() {
            return Err(DumpError::invalid_argument(format!(
                "target without a label: {}",
                target.destination().display()
            )));
        }
        if target.target().is_empty() {
            return Err(DumpError::invalid_argument(format!(
                "target without a {} to dump: {}",
                target.target_type(),
                target.label()
            )));
        }
        if !seen.insert(target.destination()) {
            return Err(DumpError::invalid_argument(format!(
                "duplicate destination: {}",
                target.destination().display()
            )));
        }
    }
    Ok(())
}
