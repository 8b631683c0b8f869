//! Scripted session.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::core::DumpTarget;
use crate::errors::DumpError;
use crate::monitor::DumpMonitor;
use crate::session::DumpSession;

type Failure = Box<dyn Fn() -> DumpError + Send + Sync>;

/// A call received by [`ScriptedDumpSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    /// `register` for the given label.
    Register(String),
    /// `begin`.
    Begin,
    /// `execute` for the given label.
    Execute(String),
    /// `commit`.
    Commit,
    /// `close`.
    Close,
}

/// A session that succeeds unless scripted to fail, recording every call.
///
/// Failures are keyed by target label for `register` and `execute`.
#[derive(Default)]
pub struct ScriptedDumpSession {
    register_failures: HashMap<String, Failure>,
    execute_failures: HashMap<String, Failure>,
    begin_failure: Option<Failure>,
    commit_failure: Option<Failure>,
    calls: Mutex<Vec<SessionCall>>,
}

impl ScriptedDumpSession {
    /// Creates a session that accepts every call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `register` fail for a label.
    #[must_use]
    pub fn fail_register(
        mut self,
        label: impl Into<String>,
        failure: impl Fn() -> DumpError + Send + Sync + 'static,
    ) -> Self {
        self.register_failures.insert(label.into(), Box::new(failure));
        self
    }

    /// Makes `execute` fail for a label.
    #[must_use]
    pub fn fail_execute(
        mut self,
        label: impl Into<String>,
        failure: impl Fn() -> DumpError + Send + Sync + 'static,
    ) -> Self {
        self.execute_failures.insert(label.into(), Box::new(failure));
        self
    }

    /// Makes `begin` fail.
    #[must_use]
    pub fn fail_begin(mut self, failure: impl Fn() -> DumpError + Send + Sync + 'static) -> Self {
        self.begin_failure = Some(Box::new(failure));
        self
    }

    /// Makes `commit` fail.
    #[must_use]
    pub fn fail_commit(mut self, failure: impl Fn() -> DumpError + Send + Sync + 'static) -> Self {
        self.commit_failure = Some(Box::new(failure));
        self
    }

    /// Returns every call, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<SessionCall> {
        self.calls.lock().clone()
    }

    /// Counts calls matching a predicate.
    pub fn count(&self, predicate: impl Fn(&SessionCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: SessionCall) {
        self.calls.lock().push(call);
    }
}

impl std::fmt::Debug for ScriptedDumpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedDumpSession")
            .field("register_failures", &self.register_failures.keys().collect::<Vec<_>>())
            .field("execute_failures", &self.execute_failures.keys().collect::<Vec<_>>())
            .field("fails_begin", &self.begin_failure.is_some())
            .field("fails_commit", &self.commit_failure.is_some())
            .field("calls", &self.calls.lock().len())
            .finish()
    }
}

#[async_trait]
impl DumpSession for ScriptedDumpSession {
    async fn register(&self, _monitor: &dyn DumpMonitor, target: &DumpTarget) -> Result<(), DumpError> {
        self.record(SessionCall::Register(target.label().to_string()));
        self.register_failures.get(target.label()).map_or(Ok(()), |f| Err(f()))
    }

    async fn begin(&self, _monitor: &dyn DumpMonitor) -> Result<(), DumpError> {
        self.record(SessionCall::Begin);
        self.begin_failure.as_ref().map_or(Ok(()), |f| Err(f()))
    }

    async fn execute(&self, _monitor: &dyn DumpMonitor, target: &DumpTarget) -> Result<(), DumpError> {
        self.record(SessionCall::Execute(target.label().to_string()));
        self.execute_failures.get(target.label()).map_or(Ok(()), |f| Err(f()))
    }

    async fn commit(&self, _monitor: &dyn DumpMonitor) -> Result<(), DumpError> {
        self.record(SessionCall::Commit);
        self.commit_failure.as_ref().map_or(Ok(()), |f| Err(f()))
    }

    async fn close(&self) -> Result<(), DumpError> {
        self.record(SessionCall::Close);
        Ok(())
    }
}
