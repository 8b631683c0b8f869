//! Dump sessions.
//!
//! A session owns the single transaction of a dump run and exposes its
//! lifecycle as an explicit state machine:
//!
//! ```text
//! PREPARING --register()--> PREPARING
//! PREPARING --begin()-----> STARTING --> RUNNING | FAILED
//! RUNNING   --execute()---> RUNNING
//! RUNNING   --commit()----> COMMITTING --> COMMITTED | FAILED
//! (any)     --close()-----> CLOSED
//! ```

mod basic;

pub use basic::BasicDumpSession;

use async_trait::async_trait;

use crate::core::DumpTarget;
use crate::errors::DumpError;
use crate::monitor::DumpMonitor;

/// The transaction lifecycle of one dump run.
#[async_trait]
pub trait DumpSession: Send + Sync {
    /// Validates a target before the transaction starts.
    async fn register(&self, monitor: &dyn DumpMonitor, target: &DumpTarget) -> Result<(), DumpError>;

    /// Starts the transaction.
    async fn begin(&self, monitor: &dyn DumpMonitor) -> Result<(), DumpError>;

    /// Dumps a registered target inside the transaction.
    async fn execute(&self, monitor: &dyn DumpMonitor, target: &DumpTarget) -> Result<(), DumpError>;

    /// Commits the transaction.
    async fn commit(&self, monitor: &dyn DumpMonitor) -> Result<(), DumpError>;

    /// Releases the transaction and the client. Safe to call repeatedly.
    async fn close(&self) -> Result<(), DumpError>;
}
