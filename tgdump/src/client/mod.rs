//! Contract of the external database client.
//!
//! The orchestrator never talks to the database directly. Everything it needs
//! (table metadata, statement preparation, transactions and the dump call
//! itself) goes through the traits in this module, which a concrete client
//! library implements.

mod metadata;
mod option;

pub use metadata::{Column, TableMetadata};
pub use option::TransactionOption;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::config::{CommitStatus, DumpProfile};
use crate::errors::ClientError;

/// A named placeholder declared when preparing a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    /// The placeholder name, without the leading colon.
    pub name: String,
    /// The SQL type of the bound value.
    pub sql_type: String,
}

/// A value bound to a placeholder when executing a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// The placeholder name.
    pub name: String,
    /// The bound value.
    pub value: serde_json::Value,
}

/// Client-side connection to the database.
#[async_trait]
pub trait SqlClient: Send + Sync {
    /// Resolves the metadata of a table.
    async fn get_table_metadata(&self, table_name: &str) -> Result<TableMetadata, ClientError>;

    /// Compiles a statement.
    async fn prepare(
        &self,
        statement: &str,
        placeholders: &[Placeholder],
    ) -> Result<Box<dyn PreparedStatement>, ClientError>;

    /// Starts a new transaction.
    async fn create_transaction(
        &self,
        option: &TransactionOption,
    ) -> Result<Arc<dyn Transaction>, ClientError>;

    /// Releases the connection.
    async fn close(&self) -> Result<(), ClientError>;
}

/// A compiled statement handle.
#[async_trait]
pub trait PreparedStatement: Send + Sync {
    /// Returns the statement text this handle was compiled from.
    fn statement(&self) -> &str;

    /// Releases the server-side statement.
    async fn close(&self) -> Result<(), ClientError>;
}

/// An active transaction.
///
/// A single transaction is shared by every execute-phase worker, so
/// implementations must tolerate concurrent calls.
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Executes a dump of the statement's result into `destination`.
    ///
    /// The returned rows carry the path of each generated file.
    async fn execute_dump(
        &self,
        prepared: &dyn PreparedStatement,
        parameters: &[Parameter],
        destination: &Path,
        profile: &DumpProfile,
    ) -> Result<Box<dyn DumpResultSet>, ClientError>;

    /// Commits the transaction.
    async fn commit(&self, status: CommitStatus) -> Result<(), ClientError>;

    /// Releases the transaction, rolling it back if it was not committed.
    async fn close(&self) -> Result<(), ClientError>;
}

/// Rows produced by a dump execution.
#[async_trait]
pub trait DumpResultSet: Send {
    /// Fetches the first column of the next row: a generated file path.
    async fn next_path(&mut self) -> Result<Option<String>, ClientError>;

    /// Releases the result set.
    async fn close(&mut self) -> Result<(), ClientError>;
}
