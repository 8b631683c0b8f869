//! In-memory database client.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::client::{
    DumpResultSet, Parameter, Placeholder, PreparedStatement, SqlClient, TableMetadata,
    Transaction, TransactionOption,
};
use crate::config::{CommitStatus, DumpProfile};
use crate::errors::ClientError;

fn io_error(message: &str) -> ClientError {
    ClientError::Io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, message.to_string()))
}

#[derive(Debug, Clone, Copy, Default)]
struct Faults {
    metadata_io: bool,
    begin_io: bool,
    begin_server: bool,
    dump_server: bool,
    commit_server: bool,
    transaction_close: bool,
    client_close: bool,
}

#[derive(Debug, Default)]
struct Counters {
    metadata_calls: AtomicUsize,
    open_prepared: AtomicUsize,
    transactions: AtomicUsize,
    transaction_closes: AtomicUsize,
    client_closes: AtomicUsize,
    commits: AtomicUsize,
    dumps: AtomicUsize,
    dumps_in_flight: AtomicUsize,
    max_dumps_in_flight: AtomicUsize,
    prepared: Mutex<Vec<String>>,
    options: Mutex<Vec<TransactionOption>>,
}

/// A database client backed by an in-memory table catalog.
///
/// Every dump yields a single file named `1` under its destination. Faults
/// are configured up front with the `fail_*` builders.
#[derive(Debug, Default)]
pub struct MockSqlClient {
    tables: BTreeMap<String, TableMetadata>,
    invalid_statements: BTreeSet<String>,
    failing_dumps: BTreeSet<String>,
    dump_delay: Option<Duration>,
    begin_delay: Option<Duration>,
    faults: Faults,
    counters: Arc<Counters>,
}

impl MockSqlClient {
    /// Creates a client with an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table with a single `id` column.
    #[must_use]
    pub fn with_table(self, name: impl Into<String>) -> Self {
        let metadata = TableMetadata::new(name).with_column("id", "INT");
        self.with_table_metadata(metadata)
    }

    /// Adds a table with explicit metadata.
    #[must_use]
    pub fn with_table_metadata(mut self, metadata: TableMetadata) -> Self {
        self.tables.insert(metadata.table_name.clone(), metadata);
        self
    }

    /// Makes `prepare` reject the given statement with a compile error.
    #[must_use]
    pub fn with_invalid_statement(mut self, statement: impl Into<String>) -> Self {
        self.invalid_statements.insert(statement.into());
        self
    }

    /// Delays every successful dump.
    #[must_use]
    pub fn with_dump_delay(mut self, delay: Duration) -> Self {
        self.dump_delay = Some(delay);
        self
    }

    /// Delays every transaction creation.
    #[must_use]
    pub fn with_begin_delay(mut self, delay: Duration) -> Self {
        self.begin_delay = Some(delay);
        self
    }

    /// Makes metadata lookups fail with an I/O error.
    #[must_use]
    pub fn fail_metadata_io(mut self) -> Self {
        self.faults.metadata_io = true;
        self
    }

    /// Makes transaction creation fail with an I/O error.
    #[must_use]
    pub fn fail_begin_io(mut self) -> Self {
        self.faults.begin_io = true;
        self
    }

    /// Makes transaction creation fail with a server error.
    #[must_use]
    pub fn fail_begin_server(mut self) -> Self {
        self.faults.begin_server = true;
        self
    }

    /// Makes every dump fail with a server error.
    #[must_use]
    pub fn fail_dump_server(mut self) -> Self {
        self.faults.dump_server = true;
        self
    }

    /// Makes the dump of one statement fail with a server error.
    #[must_use]
    pub fn fail_dump_of(mut self, statement: impl Into<String>) -> Self {
        self.failing_dumps.insert(statement.into());
        self
    }

    /// Makes commits fail with a server error.
    #[must_use]
    pub fn fail_commit_server(mut self) -> Self {
        self.faults.commit_server = true;
        self
    }

    /// Makes transaction close fail with an I/O error.
    #[must_use]
    pub fn fail_transaction_close(mut self) -> Self {
        self.faults.transaction_close = true;
        self
    }

    /// Makes client close fail with a server error.
    #[must_use]
    pub fn fail_client_close(mut self) -> Self {
        self.faults.client_close = true;
        self
    }

    /// Creates a transaction directly, bypassing `create_transaction`.
    #[must_use]
    pub fn transaction(&self) -> Arc<MockTransaction> {
        Arc::new(MockTransaction {
            failing_dumps: self.failing_dumps.clone(),
            dump_delay: self.dump_delay,
            faults: self.faults,
            counters: Arc::clone(&self.counters),
        })
    }

    /// Returns the number of metadata lookups.
    #[must_use]
    pub fn metadata_calls(&self) -> usize {
        self.counters.metadata_calls.load(Ordering::SeqCst)
    }

    /// Returns every statement passed to `prepare`, in call order.
    #[must_use]
    pub fn prepared_statements(&self) -> Vec<String> {
        self.counters.prepared.lock().clone()
    }

    /// Returns the number of prepared statements not yet closed.
    #[must_use]
    pub fn open_prepared_statements(&self) -> usize {
        self.counters.open_prepared.load(Ordering::SeqCst)
    }

    /// Returns the number of transactions created through the client.
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.counters.transactions.load(Ordering::SeqCst)
    }

    /// Returns the options passed to `create_transaction`.
    #[must_use]
    pub fn transaction_options(&self) -> Vec<TransactionOption> {
        self.counters.options.lock().clone()
    }

    /// Returns the number of transaction close calls.
    #[must_use]
    pub fn transaction_close_count(&self) -> usize {
        self.counters.transaction_closes.load(Ordering::SeqCst)
    }

    /// Returns the number of client close calls.
    #[must_use]
    pub fn client_close_count(&self) -> usize {
        self.counters.client_closes.load(Ordering::SeqCst)
    }

    /// Returns the number of successful commits.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.counters.commits.load(Ordering::SeqCst)
    }

    /// Returns the number of successful dumps.
    #[must_use]
    pub fn dump_count(&self) -> usize {
        self.counters.dumps.load(Ordering::SeqCst)
    }

    /// Returns the highest number of dumps observed running at once.
    #[must_use]
    pub fn max_concurrent_dumps(&self) -> usize {
        self.counters.max_dumps_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SqlClient for MockSqlClient {
    async fn get_table_metadata(&self, table_name: &str) -> Result<TableMetadata, ClientError> {
        self.counters.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if self.faults.metadata_io {
            return Err(io_error("connection lost"));
        }
        self.tables
            .get(table_name)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("table {table_name}")))
    }

    async fn prepare(
        &self,
        statement: &str,
        _placeholders: &[Placeholder],
    ) -> Result<Box<dyn PreparedStatement>, ClientError> {
        self.counters.prepared.lock().push(statement.to_string());
        if self.invalid_statements.contains(statement) {
            return Err(ClientError::Compile(format!("cannot compile: {statement}")));
        }
        self.counters.open_prepared.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockPreparedStatement {
            statement: statement.to_string(),
            counters: Arc::clone(&self.counters),
        }))
    }

    async fn create_transaction(
        &self,
        option: &TransactionOption,
    ) -> Result<Arc<dyn Transaction>, ClientError> {
        self.counters.options.lock().push(option.clone());
        if self.faults.begin_io {
            return Err(io_error("connection lost"));
        }
        if self.faults.begin_server {
            return Err(ClientError::Server("transaction rejected".to_string()));
        }
        if let Some(delay) = self.begin_delay {
            tokio::time::sleep(delay).await;
        }
        self.counters.transactions.fetch_add(1, Ordering::SeqCst);
        Ok(self.transaction())
    }

    async fn close(&self) -> Result<(), ClientError> {
        self.counters.client_closes.fetch_add(1, Ordering::SeqCst);
        if self.faults.client_close {
            return Err(ClientError::Server("session already expired".to_string()));
        }
        Ok(())
    }
}

/// A prepared statement of [`MockSqlClient`].
#[derive(Debug)]
pub struct MockPreparedStatement {
    statement: String,
    counters: Arc<Counters>,
}

#[async_trait]
impl PreparedStatement for MockPreparedStatement {
    fn statement(&self) -> &str {
        &self.statement
    }

    async fn close(&self) -> Result<(), ClientError> {
        self.counters.open_prepared.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A transaction of [`MockSqlClient`].
#[derive(Debug)]
pub struct MockTransaction {
    failing_dumps: BTreeSet<String>,
    dump_delay: Option<Duration>,
    faults: Faults,
    counters: Arc<Counters>,
}

#[async_trait]
impl Transaction for MockTransaction {
    async fn execute_dump(
        &self,
        prepared: &dyn PreparedStatement,
        _parameters: &[Parameter],
        destination: &Path,
        _profile: &DumpProfile,
    ) -> Result<Box<dyn DumpResultSet>, ClientError> {
        if self.faults.dump_server || self.failing_dumps.contains(prepared.statement()) {
            return Err(ClientError::Server(format!(
                "dump rejected: {}",
                prepared.statement()
            )));
        }

        let in_flight = self.counters.dumps_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters
            .max_dumps_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);
        if let Some(delay) = self.dump_delay {
            tokio::time::sleep(delay).await;
        }
        self.counters.dumps_in_flight.fetch_sub(1, Ordering::SeqCst);
        self.counters.dumps.fetch_add(1, Ordering::SeqCst);

        let file = destination.join("1").to_string_lossy().into_owned();
        Ok(Box::new(MockResultSet {
            paths: VecDeque::from([file]),
        }))
    }

    async fn commit(&self, _status: CommitStatus) -> Result<(), ClientError> {
        if self.faults.commit_server {
            return Err(ClientError::Server("serialization failure".to_string()));
        }
        self.counters.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), ClientError> {
        self.counters.transaction_closes.fetch_add(1, Ordering::SeqCst);
        if self.faults.transaction_close {
            return Err(io_error("connection reset"));
        }
        Ok(())
    }
}

/// Rows of a [`MockTransaction`] dump.
#[derive(Debug)]
pub struct MockResultSet {
    paths: VecDeque<String>,
}

#[async_trait]
impl DumpResultSet for MockResultSet {
    async fn next_path(&mut self) -> Result<Option<String>, ClientError> {
        Ok(self.paths.pop_front())
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        self.paths.clear();
        Ok(())
    }
}
