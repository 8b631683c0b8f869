//! Configuration types for dump runs.
//!
//! Every struct here deserializes with `serde` and fills absent fields with
//! defaults, so partial JSON documents are valid configurations.

mod profile;
mod settings;

pub use profile::{DumpFormat, DumpProfile};
pub use settings::{CommitStatus, TransactionKind, TransactionSettings};

use serde::{Deserialize, Serialize};

use crate::errors::DumpError;
use crate::naming::NameNormalizer;

/// Configuration for the dump engine worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpEngineConfig {
    /// Number of concurrent workers.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
}

fn default_worker_count() -> usize {
    1
}

impl Default for DumpEngineConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
        }
    }
}

impl DumpEngineConfig {
    /// Creates a new engine configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of workers.
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), DumpError> {
        if self.worker_count == 0 {
            return Err(DumpError::invalid_argument(
                "worker count must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Configuration for target selection and destination naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Maximum length of a normalized destination name.
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    /// Characters replaced in destination names, besides control and whitespace.
    #[serde(default = "default_escape_characters")]
    pub escape_characters: String,
    /// Replacement for escaped characters.
    #[serde(default = "default_replacement")]
    pub replacement: char,
    /// Delimiter placed between a name and its conflict sequence number.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Label prefix for queries without an explicit label.
    #[serde(default = "default_query_label_prefix")]
    pub query_label_prefix: String,
}

fn default_max_name_length() -> usize {
    100
}

fn default_escape_characters() -> String {
    "\"*/:<>?\\|".to_string()
}

fn default_replacement() -> char {
    '_'
}

fn default_delimiter() -> char {
    '-'
}

fn default_query_label_prefix() -> String {
    "sql".to_string()
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            max_name_length: default_max_name_length(),
            escape_characters: default_escape_characters(),
            replacement: default_replacement(),
            delimiter: default_delimiter(),
            query_label_prefix: default_query_label_prefix(),
        }
    }
}

impl SelectorConfig {
    /// Creates a new selector configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum normalized name length.
    #[must_use]
    pub fn with_max_name_length(mut self, max_name_length: usize) -> Self {
        self.max_name_length = max_name_length;
        self
    }

    /// Sets the label prefix for unlabeled queries.
    #[must_use]
    pub fn with_query_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.query_label_prefix = prefix.into();
        self
    }

    /// Builds the name normalizer described by this configuration.
    pub fn normalizer(&self) -> Result<NameNormalizer, DumpError> {
        NameNormalizer::new(
            self.max_name_length,
            &self.escape_characters,
            self.replacement,
            self.delimiter,
        )
    }
}
