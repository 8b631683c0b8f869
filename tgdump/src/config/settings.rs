//! Transaction settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::client::TransactionOption;

/// The type of transaction used for a dump run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// A short (optimistic) transaction.
    Short,
    /// A long transaction.
    Long,
    /// A read-only transaction.
    ReadOnly,
}

impl Default for TransactionKind {
    fn default() -> Self {
        Self::ReadOnly
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short => write!(f, "short"),
            Self::Long => write!(f, "long"),
            Self::ReadOnly => write!(f, "read_only"),
        }
    }
}

/// The durability level a commit waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitStatus {
    /// The commit request was accepted.
    Accepted,
    /// The committed data is visible to other transactions.
    Available,
    /// The committed data is stored locally.
    Stored,
    /// The committed data is propagated to replicas.
    Propagated,
}

impl Default for CommitStatus {
    fn default() -> Self {
        Self::Stored
    }
}

/// Settings used to build the transaction option when a session begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSettings {
    /// The transaction type.
    #[serde(default)]
    pub kind: TransactionKind,
    /// An optional transaction label.
    #[serde(default)]
    pub label: Option<String>,
    /// Tables to write-preserve (long transactions only).
    #[serde(default)]
    pub write_preserve: Vec<String>,
    /// Whether to restrict the read area to the dump target tables.
    #[serde(default)]
    pub enable_read_areas: bool,
    /// The durability level waited for on commit.
    #[serde(default)]
    pub commit_status: CommitStatus,
}

impl Default for TransactionSettings {
    fn default() -> Self {
        Self {
            kind: TransactionKind::default(),
            label: Some("tgdump".to_string()),
            write_preserve: Vec::new(),
            enable_read_areas: false,
            commit_status: CommitStatus::default(),
        }
    }
}

impl TransactionSettings {
    /// Creates new settings with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transaction type.
    #[must_use]
    pub fn with_kind(mut self, kind: TransactionKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the transaction label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Adds a write-preserve table.
    #[must_use]
    pub fn with_write_preserve(mut self, table: impl Into<String>) -> Self {
        self.write_preserve.push(table.into());
        self
    }

    /// Enables or disables read area inference.
    #[must_use]
    pub fn with_read_areas(mut self, enabled: bool) -> Self {
        self.enable_read_areas = enabled;
        self
    }

    /// Sets the commit status.
    #[must_use]
    pub fn with_commit_status(mut self, status: CommitStatus) -> Self {
        self.commit_status = status;
        self
    }

    /// Builds the protocol-level transaction option.
    ///
    /// `tables` are the tables accumulated during registration; they become
    /// the inclusive read area of long and read-only transactions when read
    /// areas are enabled.
    #[must_use]
    pub fn to_option(&self, tables: &BTreeSet<String>) -> TransactionOption {
        let mut option = TransactionOption::new(self.kind);
        if let Some(ref label) = self.label {
            option = option.with_label(label.clone());
        }
        if self.kind == TransactionKind::Long {
            option.write_preserve = self.write_preserve.clone();
        }
        if self.enable_read_areas && self.kind != TransactionKind::Short {
            option.inclusive_read_areas = tables.iter().cloned().collect();
        }
        option
    }
}
