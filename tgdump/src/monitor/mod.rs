//! Progress notification sinks.
//!
//! A [`DumpMonitor`] receives push notifications while a dump runs. Workers
//! call it concurrently, so every implementation must be `Send + Sync` and
//! internally synchronized.

mod sink;

pub use sink::{LoggingDumpMonitor, NoOpDumpMonitor};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::client::TableMetadata;

/// Information about a target that passed registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DumpInfo {
    /// A registered table.
    Table(TableMetadata),
    /// A registered query.
    Query {
        /// The statement text.
        statement: String,
    },
}

/// Sink for dump progress events.
pub trait DumpMonitor: Send + Sync {
    /// Reports a verbose message.
    fn verbose(&self, message: &str);

    /// Reports that a target passed registration.
    fn on_dump_info(&self, label: &str, info: &DumpInfo, destination: &Path);

    /// Reports that a target started dumping.
    fn on_dump_start(&self, label: &str, destination: &Path);

    /// Reports a generated dump file.
    fn on_dump_file(&self, label: &str, file: &Path);

    /// Reports that a target finished dumping.
    fn on_dump_finish(&self, label: &str, destination: &Path);
}
