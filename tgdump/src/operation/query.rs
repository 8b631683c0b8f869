//! Dump operation for ad-hoc queries.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::BTreeSet;

use super::{check_target_type, DumpOperation, DumpOutput};
use crate::client::{SqlClient, Transaction};
use crate::config::DumpProfile;
use crate::core::{DumpTarget, TargetType};
use crate::errors::{ClientError, DiagnosticError, DiagnosticKind, DumpError};
use crate::monitor::{DumpInfo, DumpMonitor};

/// Dumps the result of arbitrary SQL queries.
///
/// Registration compiles each distinct statement once to validate it; the
/// statement is compiled again inside the transaction when executed.
pub struct QueryDumpOperation {
    output: DumpOutput,
    // statement text -> label of the first registration
    registered: DashMap<String, String>,
}

impl QueryDumpOperation {
    /// Creates a new query operation.
    #[must_use]
    pub fn new(profile: DumpProfile, create_directory: bool) -> Self {
        Self {
            output: DumpOutput {
                profile,
                create_directory,
            },
            registered: DashMap::new(),
        }
    }

    /// Returns the number of distinct registered statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registered.len()
    }
}

impl std::fmt::Debug for QueryDumpOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryDumpOperation")
            .field("output", &self.output)
            .field("registered", &self.registered.len())
            .finish()
    }
}

fn statement_key(target: &DumpTarget) -> &str {
    target.target().trim()
}

fn classify_prepare_error(label: &str, error: ClientError) -> DiagnosticError {
    let kind = match error {
        ClientError::Compile(_) => DiagnosticKind::PrepareFailure,
        ClientError::Io(_) => DiagnosticKind::IoError,
        ClientError::NotFound(_) | ClientError::Server(_) => DiagnosticKind::ServerError,
    };
    DiagnosticError::new(kind, format!("failed to prepare query '{label}'")).with_source(error)
}

#[async_trait]
impl DumpOperation for QueryDumpOperation {
    fn target_type(&self) -> TargetType {
        TargetType::Query
    }

    fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    fn target_tables(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    async fn register(
        &self,
        client: &dyn SqlClient,
        monitor: &dyn DumpMonitor,
        target: &DumpTarget,
    ) -> Result<(), DumpError> {
        check_target_type(TargetType::Query, target)?;
        let statement = statement_key(target);
        if self.registered.contains_key(statement) {
            tracing::debug!(label = target.label(), "Query already registered");
            return Ok(());
        }

        let prepared = client
            .prepare(statement, &[])
            .await
            .map_err(|e| classify_prepare_error(target.label(), e))?;
        if let Err(e) = prepared.close().await {
            tracing::warn!(label = target.label(), error = %e, "Failed to close prepared statement");
        }

        let inserted = match self.registered.entry(statement.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(target.label().to_string());
                true
            }
            Entry::Occupied(_) => false,
        };
        if inserted {
            tracing::debug!(label = target.label(), "Registered query");
            let info = DumpInfo::Query {
                statement: statement.to_string(),
            };
            monitor.on_dump_info(target.label(), &info, target.destination());
        }
        Ok(())
    }

    async fn execute(
        &self,
        client: &dyn SqlClient,
        transaction: &dyn Transaction,
        monitor: &dyn DumpMonitor,
        target: &DumpTarget,
    ) -> Result<(), DumpError> {
        check_target_type(TargetType::Query, target)?;
        let statement = statement_key(target);
        if !self.registered.contains_key(statement) {
            return Err(DumpError::invalid_argument(format!(
                "query is not registered: {}",
                target.label()
            )));
        }
        self.output
            .dump_statement(client, transaction, monitor, target, statement)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockSqlClient, MonitorEvent, RecordingDumpMonitor};
    use std::path::Path;

    #[tokio::test]
    async fn test_register_same_statement_once() {
        let client = MockSqlClient::new();
        let monitor = RecordingDumpMonitor::new();
        let operation = QueryDumpOperation::new(DumpProfile::default(), false);

        operation
            .register(&client, &monitor, &DumpTarget::query("a", "SELECT 1", "p/a"))
            .await
            .unwrap();
        operation
            .register(&client, &monitor, &DumpTarget::query("b", " SELECT 1 ", "p/b"))
            .await
            .unwrap();

        assert_eq!(operation.len(), 1);
        assert_eq!(monitor.count(|e| matches!(e, MonitorEvent::Info { .. })), 1);
        assert!(operation.target_tables().is_empty());
        assert_eq!(client.open_prepared_statements(), 0);
    }

    #[tokio::test]
    async fn test_register_compile_error() {
        let client = MockSqlClient::new().with_invalid_statement("SELECT nope");
        let operation = QueryDumpOperation::new(DumpProfile::default(), false);
        let err = operation
            .register(
                &client,
                &RecordingDumpMonitor::new(),
                &DumpTarget::query("q", "SELECT nope", "p/q"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.diagnostic_kind(), Some(DiagnosticKind::PrepareFailure));
        assert!(operation.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_table_target() {
        let client = MockSqlClient::new().with_table("T1");
        let transaction = client.transaction();
        let operation = QueryDumpOperation::new(DumpProfile::default(), false);
        let err = operation
            .execute(
                &client,
                transaction.as_ref(),
                &RecordingDumpMonitor::new(),
                &DumpTarget::table("T1", "p/t1"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_execute_uses_statement_text() {
        let client = MockSqlClient::new();
        let transaction = client.transaction();
        let monitor = RecordingDumpMonitor::new();
        let operation = QueryDumpOperation::new(DumpProfile::default(), false);
        let target = DumpTarget::query("q", "SELECT * FROM t WHERE k = 1", "p/q");

        operation.register(&client, &monitor, &target).await.unwrap();
        operation
            .execute(&client, transaction.as_ref(), &monitor, &target)
            .await
            .unwrap();

        assert_eq!(
            client.prepared_statements(),
            vec![
                "SELECT * FROM t WHERE k = 1".to_string(),
                "SELECT * FROM t WHERE k = 1".to_string(),
            ]
        );
        assert_eq!(monitor.files("q"), vec![Path::new("p/q").join("1")]);
    }

    #[tokio::test]
    async fn test_execute_unregistered() {
        let client = MockSqlClient::new();
        let transaction = client.transaction();
        let operation = QueryDumpOperation::new(DumpProfile::default(), false);
        let err = operation
            .execute(
                &client,
                transaction.as_ref(),
                &RecordingDumpMonitor::new(),
                &DumpTarget::query("q", "SELECT 1", "p/q"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::InvalidArgument(_)));
    }
}
