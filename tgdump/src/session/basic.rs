//! Basic session implementation.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::DumpSession;
use crate::client::{SqlClient, Transaction};
use crate::config::TransactionSettings;
use crate::core::{DumpTarget, SessionState};
use crate::errors::{DiagnosticError, DiagnosticKind, DumpError};
use crate::monitor::DumpMonitor;
use crate::operation::DumpOperationDispatch;

/// A session binding one client and one transaction to a dump run.
///
/// State transitions other than `close` are compare-and-set operations on the
/// current state; a transition from the wrong state fails with
/// [`DumpError::InvalidState`]. The transaction handle is created in `begin`
/// and released in `close`.
pub struct BasicDumpSession {
    id: Uuid,
    client: Arc<dyn SqlClient>,
    settings: TransactionSettings,
    dispatch: DumpOperationDispatch,
    state: AtomicU8,
    transaction: Mutex<Option<Arc<dyn Transaction>>>,
}

impl BasicDumpSession {
    /// Creates a new session in the `PREPARING` state.
    #[must_use]
    pub fn new(
        client: Arc<dyn SqlClient>,
        settings: TransactionSettings,
        dispatch: DumpOperationDispatch,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            client,
            settings,
            dispatch,
            state: AtomicU8::new(SessionState::Preparing.as_u8()),
            transaction: Mutex::new(None),
        }
    }

    /// Returns the session identifier used in logs.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Returns the operation dispatch.
    #[must_use]
    pub fn dispatch(&self) -> &DumpOperationDispatch {
        &self.dispatch
    }

    fn check_state(&self, expected: SessionState, operation: &str) -> Result<(), DumpError> {
        let actual = self.state();
        if actual == expected {
            Ok(())
        } else {
            Err(DumpError::invalid_state(format!(
                "cannot {operation}: session must be {expected} but is {actual}"
            )))
        }
    }

    fn transition(&self, from: SessionState, to: SessionState) -> Result<(), DumpError> {
        match self.state.compare_exchange(
            from.as_u8(),
            to.as_u8(),
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => {
                debug!(session_id = %self.id, %from, %to, "Session state changed");
                Ok(())
            }
            Err(actual) => Err(DumpError::invalid_state(format!(
                "cannot change session state from {from} to {to}: session is {}",
                SessionState::from_u8(actual)
            ))),
        }
    }

    fn fail(&self, from: SessionState) {
        // a concurrent close wins over the failure
        if self.transition(from, SessionState::Failed).is_err() {
            debug!(session_id = %self.id, state = %self.state(), "Session left before failing");
        }
    }

    fn current_transaction(&self) -> Option<Arc<dyn Transaction>> {
        self.transaction.lock().clone()
    }
}

impl std::fmt::Debug for BasicDumpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicDumpSession")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("settings", &self.settings)
            .field("dispatch", &self.dispatch)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DumpSession for BasicDumpSession {
    async fn register(&self, monitor: &dyn DumpMonitor, target: &DumpTarget) -> Result<(), DumpError> {
        self.check_state(SessionState::Preparing, "register a target")?;
        debug!(session_id = %self.id, label = target.label(), "Registering target");
        self.dispatch
            .register(self.client.as_ref(), monitor, target)
            .await
    }

    async fn begin(&self, monitor: &dyn DumpMonitor) -> Result<(), DumpError> {
        self.check_state(SessionState::Preparing, "begin")?;
        if self.dispatch.is_empty() {
            return Err(DumpError::invalid_state(
                "cannot begin: no dump targets are registered",
            ));
        }
        self.transition(SessionState::Preparing, SessionState::Starting)?;

        let option = self.settings.to_option(&self.dispatch.target_tables());
        monitor.verbose(&format!(
            "starting {} transaction (label={:?}, read areas={:?})",
            option.kind, option.label, option.inclusive_read_areas
        ));

        let transaction = match self.client.create_transaction(&option).await {
            Ok(transaction) => transaction,
            Err(e) => {
                self.fail(SessionState::Starting);
                let err = e.classify(DiagnosticKind::BeginFailure, "failed to start transaction");
                warn!(session_id = %self.id, error = %err, "Transaction did not start");
                return Err(err.into());
            }
        };
        *self.transaction.lock() = Some(transaction);

        if let Err(e) = self.transition(SessionState::Starting, SessionState::Running) {
            // closed while starting; whoever takes the handle out of the slot releases it
            let abandoned = self.transaction.lock().take();
            if let Some(abandoned) = abandoned {
                if let Err(close_error) = abandoned.close().await {
                    warn!(session_id = %self.id, error = %close_error, "Failed to close abandoned transaction");
                }
            }
            return Err(e);
        }
        info!(session_id = %self.id, kind = %option.kind, "Transaction started");
        Ok(())
    }

    async fn execute(&self, monitor: &dyn DumpMonitor, target: &DumpTarget) -> Result<(), DumpError> {
        self.check_state(SessionState::Running, "execute a target")?;
        let transaction = self
            .current_transaction()
            .ok_or_else(|| DumpError::invalid_state("cannot execute: transaction is not available"))?;
        debug!(session_id = %self.id, label = target.label(), "Executing target");
        self.dispatch
            .execute(self.client.as_ref(), transaction.as_ref(), monitor, target)
            .await
    }

    async fn commit(&self, monitor: &dyn DumpMonitor) -> Result<(), DumpError> {
        self.transition(SessionState::Running, SessionState::Committing)?;
        let Some(transaction) = self.current_transaction() else {
            self.fail(SessionState::Committing);
            return Err(DumpError::invalid_state(
                "cannot commit: transaction is not available",
            ));
        };

        monitor.verbose(&format!(
            "committing transaction (status={:?})",
            self.settings.commit_status
        ));
        if let Err(e) = transaction.commit(self.settings.commit_status).await {
            self.fail(SessionState::Committing);
            let err = e.classify(DiagnosticKind::CommitFailure, "failed to commit transaction");
            warn!(session_id = %self.id, error = %err, "Transaction was not committed");
            return Err(err.into());
        }

        self.transition(SessionState::Committing, SessionState::Committed)?;
        info!(session_id = %self.id, "Transaction committed");
        Ok(())
    }

    async fn close(&self) -> Result<(), DumpError> {
        let previous = SessionState::from_u8(
            self.state
                .swap(SessionState::Closed.as_u8(), Ordering::SeqCst),
        );
        if previous == SessionState::Closed {
            return Ok(());
        }
        debug!(session_id = %self.id, %previous, "Closing session");

        let mut failure: Option<DiagnosticError> = None;
        let transaction = self.transaction.lock().take();
        if let Some(transaction) = transaction {
            if let Err(e) = transaction.close().await {
                failure = Some(e.classify(DiagnosticKind::ServerError, "failed to close transaction"));
            }
        }
        if let Err(e) = self.client.close().await {
            let err = e.classify(DiagnosticKind::ServerError, "failed to close client");
            match failure {
                Some(ref mut first) => first.add_suppressed(err),
                None => failure = Some(err),
            }
        }

        match failure {
            Some(err) => {
                warn!(session_id = %self.id, error = %err, "Session closed with errors");
                Err(err.into())
            }
            None => Ok(()),
        }
    }
}

impl Drop for BasicDumpSession {
    fn drop(&mut self) {
        if self.state() != SessionState::Closed {
            warn!(session_id = %self.id, state = %self.state(), "Session dropped without being closed");
        }
    }
}
