//! Per-target-type dump operations.
//!
//! Each [`DumpOperation`] knows how to validate (register) and dump (execute)
//! one kind of target. [`DumpOperationDispatch`] routes calls to the
//! operation matching a target's type.

mod dispatch;
mod query;
mod table;

pub use dispatch::DumpOperationDispatch;
pub use query::QueryDumpOperation;
pub use table::{quote_identifier, TableDumpOperation};

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::Path;

use crate::client::{PreparedStatement, SqlClient, Transaction};
use crate::config::DumpProfile;
use crate::core::{DumpTarget, TargetType};
use crate::errors::{DiagnosticError, DiagnosticKind, DumpError};
use crate::monitor::DumpMonitor;

/// Registration and execution logic for one target type.
#[async_trait]
pub trait DumpOperation: Send + Sync {
    /// Returns the target type this operation handles.
    fn target_type(&self) -> TargetType;

    /// Returns true if no target has been registered.
    fn is_empty(&self) -> bool;

    /// Returns the tables read by the registered targets.
    fn target_tables(&self) -> BTreeSet<String>;

    /// Validates a target against the database.
    ///
    /// Registering a target whose key is already registered is a no-op.
    async fn register(
        &self,
        client: &dyn SqlClient,
        monitor: &dyn DumpMonitor,
        target: &DumpTarget,
    ) -> Result<(), DumpError>;

    /// Dumps a registered target inside `transaction`.
    async fn execute(
        &self,
        client: &dyn SqlClient,
        transaction: &dyn Transaction,
        monitor: &dyn DumpMonitor,
        target: &DumpTarget,
    ) -> Result<(), DumpError>;
}

/// Rejects targets of a type other than `expected`.
pub(crate) fn check_target_type(expected: TargetType, target: &DumpTarget) -> Result<(), DumpError> {
    if target.target_type() == expected {
        Ok(())
    } else {
        Err(DumpError::unsupported(format!(
            "{expected} operation cannot handle {} target: {}",
            target.target_type(),
            target.label()
        )))
    }
}

/// Output options shared by the execute step of every operation.
#[derive(Debug, Clone, Default)]
pub(crate) struct DumpOutput {
    pub(crate) profile: DumpProfile,
    pub(crate) create_directory: bool,
}

impl DumpOutput {
    /// Prepares `statement`, dumps its result into the target destination and
    /// reports progress to `monitor`.
    pub(crate) async fn dump_statement(
        &self,
        client: &dyn SqlClient,
        transaction: &dyn Transaction,
        monitor: &dyn DumpMonitor,
        target: &DumpTarget,
        statement: &str,
    ) -> Result<(), DumpError> {
        let prepared = client.prepare(statement, &[]).await.map_err(|e| {
            e.classify(
                DiagnosticKind::PrepareFailure,
                format!("failed to prepare dump statement for '{}'", target.label()),
            )
        })?;

        let result = self
            .dump_prepared(transaction, monitor, target, prepared.as_ref())
            .await;

        if let Err(e) = prepared.close().await {
            tracing::warn!(label = target.label(), error = %e, "Failed to close prepared statement");
        }
        result
    }

    async fn dump_prepared(
        &self,
        transaction: &dyn Transaction,
        monitor: &dyn DumpMonitor,
        target: &DumpTarget,
        prepared: &dyn PreparedStatement,
    ) -> Result<(), DumpError> {
        let label = target.label();
        let destination = target.destination();
        monitor.on_dump_start(label, destination);

        if self.create_directory {
            tokio::fs::create_dir_all(destination).await.map_err(|e| {
                DiagnosticError::new(
                    DiagnosticKind::IoError,
                    format!(
                        "failed to create destination directory: {}",
                        destination.display()
                    ),
                )
                .with_source(e)
            })?;
        }

        let operation_failure = |e: crate::errors::ClientError| {
            e.classify(
                DiagnosticKind::OperationFailure,
                format!("failed to dump '{label}'"),
            )
        };

        let mut rows = transaction
            .execute_dump(prepared, &[], destination, &self.profile)
            .await
            .map_err(operation_failure)?;

        let mut file_count = 0_usize;
        loop {
            match rows.next_path().await {
                Ok(Some(path)) => {
                    file_count += 1;
                    monitor.on_dump_file(label, Path::new(&path));
                }
                Ok(None) => break,
                Err(e) => {
                    if let Err(close_error) = rows.close().await {
                        tracing::warn!(label, error = %close_error, "Failed to close dump result");
                    }
                    return Err(operation_failure(e).into());
                }
            }
        }
        rows.close().await.map_err(operation_failure)?;

        tracing::debug!(label, file_count, "Dump finished");
        monitor.on_dump_finish(label, destination);
        Ok(())
    }
}
