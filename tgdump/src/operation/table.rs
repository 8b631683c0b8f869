//! Dump operation for tables.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::BTreeSet;

use super::{check_target_type, DumpOperation, DumpOutput};
use crate::client::{SqlClient, TableMetadata, Transaction};
use crate::config::DumpProfile;
use crate::core::{DumpTarget, TargetType};
use crate::errors::{ClientError, DiagnosticError, DiagnosticKind, DumpError};
use crate::monitor::{DumpInfo, DumpMonitor};

/// Dumps whole tables with `SELECT * FROM <table>`.
pub struct TableDumpOperation {
    output: DumpOutput,
    registered: DashMap<String, TableMetadata>,
}

impl TableDumpOperation {
    /// Creates a new table operation.
    ///
    /// When `create_directory` is set, each destination directory is created
    /// before its dump starts.
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

    /// Returns the metadata recorded for a registered table.
    #[must_use]
    pub fn metadata(&self, table_name: &str) -> Option<TableMetadata> {
        self.registered.get(table_name).map(|entry| entry.value().clone())
    }
}

impl std::fmt::Debug for TableDumpOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableDumpOperation")
            .field("output", &self.output)
            .field("registered", &self.registered.len())
            .finish()
    }
}

fn classify_metadata_error(table_name: &str, error: ClientError) -> DiagnosticError {
    let (kind, message) = match error {
        ClientError::NotFound(_) => (
            DiagnosticKind::TableNotFound,
            format!("table is not found: {table_name}"),
        ),
        ClientError::Io(_) => (
            DiagnosticKind::IoError,
            format!("I/O error while resolving table: {table_name}"),
        ),
        ClientError::Compile(_) | ClientError::Server(_) => (
            DiagnosticKind::ServerError,
            format!("server error while resolving table: {table_name}"),
        ),
    };
    DiagnosticError::new(kind, message).with_source(error)
}

/// Renders a table name as an SQL identifier.
///
/// Plain identifiers are kept as is; anything else is delimited with double
/// quotes, doubling embedded quotes.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

#[async_trait]
impl DumpOperation for TableDumpOperation {
    fn target_type(&self) -> TargetType {
        TargetType::Table
    }

    fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    fn target_tables(&self) -> BTreeSet<String> {
        self.registered.iter().map(|entry| entry.key().clone()).collect()
    }

    async fn register(
        &self,
        client: &dyn SqlClient,
        monitor: &dyn DumpMonitor,
        target: &DumpTarget,
    ) -> Result<(), DumpError> {
        check_target_type(TargetType::Table, target)?;
        let table_name = target.target();
        if self.registered.contains_key(table_name) {
            tracing::debug!(table = table_name, "Table already registered");
            return Ok(());
        }

        let metadata = client
            .get_table_metadata(table_name)
            .await
            .map_err(|e| classify_metadata_error(table_name, e))?;

        let inserted = match self.registered.entry(table_name.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(metadata.clone());
                true
            }
            Entry::Occupied(_) => false,
        };
        if inserted {
            tracing::debug!(table = table_name, columns = metadata.columns.len(), "Registered table");
            monitor.on_dump_info(target.label(), &DumpInfo::Table(metadata), target.destination());
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
        check_target_type(TargetType::Table, target)?;
        let table_name = target.target();
        if !self.registered.contains_key(table_name) {
            return Err(DumpError::invalid_argument(format!(
                "table is not registered: {table_name}"
            )));
        }
        let statement = format!("SELECT * FROM {}", quote_identifier(table_name));
        self.output
            .dump_statement(client, transaction, monitor, target, &statement)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockSqlClient, MonitorEvent, RecordingDumpMonitor};
    use std::path::Path;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("orders"), "orders");
        assert_eq!(quote_identifier("_t1"), "_t1");
        assert_eq!(quote_identifier("1t"), "\"1t\"");
        assert_eq!(quote_identifier("my table"), "\"my table\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_identifier(""), "\"\"");
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let client = MockSqlClient::new().with_table("T1");
        let monitor = RecordingDumpMonitor::new();
        let operation = TableDumpOperation::new(DumpProfile::default(), false);
        let target = DumpTarget::table("T1", "p/t1");

        operation.register(&client, &monitor, &target).await.unwrap();
        operation.register(&client, &monitor, &target).await.unwrap();

        assert_eq!(monitor.count(|e| matches!(e, MonitorEvent::Info { .. })), 1);
        assert_eq!(client.metadata_calls(), 1);
        assert!(!operation.is_empty());
        assert_eq!(operation.target_tables().into_iter().collect::<Vec<_>>(), vec!["T1"]);
        assert!(operation.metadata("T1").is_some());
    }

    #[tokio::test]
    async fn test_register_missing_table() {
        let client = MockSqlClient::new();
        let operation = TableDumpOperation::new(DumpProfile::default(), false);
        let err = operation
            .register(&client, &RecordingDumpMonitor::new(), &DumpTarget::table("X", "p/x"))
            .await
            .unwrap_err();
        assert_eq!(err.diagnostic_kind(), Some(DiagnosticKind::TableNotFound));
        assert!(operation.is_empty());
    }

    #[tokio::test]
    async fn test_register_io_failure() {
        let client = MockSqlClient::new().with_table("T1").fail_metadata_io();
        let operation = TableDumpOperation::new(DumpProfile::default(), false);
        let err = operation
            .register(&client, &RecordingDumpMonitor::new(), &DumpTarget::table("T1", "p/t1"))
            .await
            .unwrap_err();
        assert_eq!(err.diagnostic_kind(), Some(DiagnosticKind::IoError));
    }

    #[tokio::test]
    async fn test_rejects_query_target() {
        let client = MockSqlClient::new();
        let operation = TableDumpOperation::new(DumpProfile::default(), false);
        let err = operation
            .register(&client, &RecordingDumpMonitor::new(), &DumpTarget::query("q", "SELECT 1", "p/q"))
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_execute_requires_registration() {
        let client = MockSqlClient::new().with_table("T1");
        let transaction = client.transaction();
        let operation = TableDumpOperation::new(DumpProfile::default(), false);
        let err = operation
            .execute(&client, transaction.as_ref(), &RecordingDumpMonitor::new(), &DumpTarget::table("T1", "p/t1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_execute_reports_files() {
        let client = MockSqlClient::new().with_table("my table");
        let transaction = client.transaction();
        let monitor = RecordingDumpMonitor::new();
        let operation = TableDumpOperation::new(DumpProfile::default(), false);
        let target = DumpTarget::table("my table", "p/my_table");

        operation.register(&client, &monitor, &target).await.unwrap();
        operation
            .execute(&client, transaction.as_ref(), &monitor, &target)
            .await
            .unwrap();

        assert_eq!(client.prepared_statements(), vec!["SELECT * FROM \"my table\"".to_string()]);
        assert_eq!(
            monitor.files("my table"),
            vec![Path::new("p/my_table").join("1")]
        );
        assert_eq!(monitor.count(|e| matches!(e, MonitorEvent::Finish { .. })), 1);
        assert_eq!(client.open_prepared_statements(), 0);
    }

    #[tokio::test]
    async fn test_execute_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("nested").join("t1");
        let client = MockSqlClient::new().with_table("T1");
        let transaction = client.transaction();
        let monitor = RecordingDumpMonitor::new();
        let operation = TableDumpOperation::new(DumpProfile::default(), true);
        let target = DumpTarget::table("T1", &destination);

        operation.register(&client, &monitor, &target).await.unwrap();
        operation
            .execute(&client, transaction.as_ref(), &monitor, &target)
            .await
            .unwrap();

        assert!(destination.is_dir());
    }

    #[tokio::test]
    async fn test_execute_dump_rejected() {
        let client = MockSqlClient::new().with_table("T1").fail_dump_server();
        let transaction = client.transaction();
        let monitor = RecordingDumpMonitor::new();
        let operation = TableDumpOperation::new(DumpProfile::default(), false);
        let target = DumpTarget::table("T1", "p/t1");

        operation.register(&client, &monitor, &target).await.unwrap();
        let err = operation
            .execute(&client, transaction.as_ref(), &monitor, &target)
            .await
            .unwrap_err();

        assert_eq!(err.diagnostic_kind(), Some(DiagnosticKind::OperationFailure));
        assert_eq!(monitor.count(|e| matches!(e, MonitorEvent::Finish { .. })), 0);
        assert_eq!(client.open_prepared_statements(), 0);
    }
}
