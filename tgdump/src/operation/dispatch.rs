//! Routing of targets to their operation.

use std::collections::{BTreeMap, BTreeSet};

use super::{DumpOperation, QueryDumpOperation, TableDumpOperation};
use crate::client::{SqlClient, Transaction};
use crate::config::DumpProfile;
use crate::core::{DumpTarget, TargetType};
use crate::errors::DumpError;
use crate::monitor::DumpMonitor;

/// Holds one operation per target type and routes calls by target type.
#[derive(Default)]
pub struct DumpOperationDispatch {
    operations: BTreeMap<TargetType, Box<dyn DumpOperation>>,
}

impl DumpOperationDispatch {
    /// Creates a dispatch without operations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatch handling both tables and queries.
    #[must_use]
    pub fn standard(profile: &DumpProfile, create_directory: bool) -> Self {
        Self::new()
            .with_operation(TableDumpOperation::new(profile.clone(), create_directory))
            .with_operation(QueryDumpOperation::new(profile.clone(), create_directory))
    }

    /// Adds an operation, replacing any operation for the same target type.
    #[must_use]
    pub fn with_operation(mut self, operation: impl DumpOperation + 'static) -> Self {
        self.operations
            .insert(operation.target_type(), Box::new(operation));
        self
    }

    /// Returns the target types this dispatch can handle.
    #[must_use]
    pub fn target_types(&self) -> Vec<TargetType> {
        self.operations.keys().copied().collect()
    }

    /// Looks up the operation for a target's type.
    ///
    /// The map is keyed by each operation's own target type, so a lookup hit
    /// always matches; operations still reject foreign targets themselves
    /// when called directly.
    fn operation(&self, target: &DumpTarget) -> Result<&dyn DumpOperation, DumpError> {
        let operation = self
            .operations
            .get(&target.target_type())
            .ok_or_else(|| {
                DumpError::unsupported(format!(
                    "no operation is registered for {} targets: {}",
                    target.target_type(),
                    target.label()
                ))
            })?;
        Ok(operation.as_ref())
    }

    /// Returns true if no operation has a registered target.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.values().all(|operation| operation.is_empty())
    }

    /// Returns the tables read by every registered target.
    #[must_use]
    pub fn target_tables(&self) -> BTreeSet<String> {
        self.operations
            .values()
            .flat_map(|operation| operation.target_tables())
            .collect()
    }

    /// Registers a target with its operation.
    pub async fn register(
        &self,
        client: &dyn SqlClient,
        monitor: &dyn DumpMonitor,
        target: &DumpTarget,
    ) -> Result<(), DumpError> {
        self.operation(target)?.register(client, monitor, target).await
    }

    /// Executes a target with its operation.
    pub async fn execute(
        &self,
        client: &dyn SqlClient,
        transaction: &dyn Transaction,
        monitor: &dyn DumpMonitor,
        target: &DumpTarget,
    ) -> Result<(), DumpError> {
        self.operation(target)?
            .execute(client, transaction, monitor, target)
            .await
    }
}

impl std::fmt::Debug for DumpOperationDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DumpOperationDispatch")
            .field("target_types", &self.target_types())
            .field("empty", &self.is_empty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockSqlClient, RecordingDumpMonitor};

    #[tokio::test]
    async fn test_routes_by_target_type() {
        let client = MockSqlClient::new().with_table("T1").with_table("T2");
        let monitor = RecordingDumpMonitor::new();
        let dispatch = DumpOperationDispatch::standard(&DumpProfile::default(), false);
        assert!(dispatch.is_empty());

        dispatch
            .register(&client, &monitor, &DumpTarget::table("T2", "p/t2"))
            .await
            .unwrap();
        dispatch
            .register(&client, &monitor, &DumpTarget::table("T1", "p/t1"))
            .await
            .unwrap();
        dispatch
            .register(&client, &monitor, &DumpTarget::query("q", "SELECT 1", "p/q"))
            .await
            .unwrap();

        assert!(!dispatch.is_empty());
        assert_eq!(
            dispatch.target_tables().into_iter().collect::<Vec<_>>(),
            vec!["T1", "T2"]
        );
    }

    #[tokio::test]
    async fn test_missing_operation_is_unsupported() {
        let client = MockSqlClient::new();
        let dispatch = DumpOperationDispatch::new()
            .with_operation(TableDumpOperation::new(DumpProfile::default(), false));
        assert_eq!(dispatch.target_types(), vec![TargetType::Table]);

        let err = dispatch
            .register(
                &client,
                &RecordingDumpMonitor::new(),
                &DumpTarget::query("q", "SELECT 1", "p/q"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::Unsupported(_)));
    }
}
