//! Dump profile passed through to the database.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output file format of a dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DumpFormat {
    /// Apache Parquet files.
    Parquet,
    /// Apache Arrow IPC files.
    Arrow,
}

impl Default for DumpFormat {
    fn default() -> Self {
        Self::Parquet
    }
}

/// Dump format and output options.
///
/// The orchestrator never interprets these values; they are handed to the
/// dump execution call unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpProfile {
    /// The profile title, for reporting.
    #[serde(default)]
    pub title: Option<String>,
    /// The output file format.
    #[serde(default)]
    pub format: DumpFormat,
    /// Maximum number of records written to a single file.
    #[serde(default)]
    pub max_record_count_per_file: Option<u64>,
    /// Format-specific options.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl DumpProfile {
    /// Creates a profile with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: DumpFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the per-file record limit.
    #[must_use]
    pub fn with_max_record_count_per_file(mut self, count: u64) -> Self {
        self.max_record_count_per_file = Some(count);
        self
    }

    /// Adds a format-specific option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}
