//! Dump target value type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The kind of object a dump target refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// A database table, dumped in full.
    Table,
    /// An ad-hoc SQL query.
    Query,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Query => write!(f, "query"),
        }
    }
}

/// One unit of dump work: a table or a labeled query plus its destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DumpTarget {
    target_type: TargetType,
    label: String,
    target: String,
    destination: PathBuf,
}

impl DumpTarget {
    /// Creates a new dump target.
    #[must_use]
    pub fn new(
        target_type: TargetType,
        label: impl Into<String>,
        target: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            target_type,
            label: label.into(),
            target: target.into(),
            destination: destination.into(),
        }
    }

    /// Creates a table target whose label is the table name.
    #[must_use]
    pub fn table(name: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        let name = name.into();
        Self::new(TargetType::Table, name.clone(), name, destination)
    }

    /// Creates a query target.
    #[must_use]
    pub fn query(
        label: impl Into<String>,
        statement: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self::new(TargetType::Query, label, statement, destination)
    }

    /// Returns the target type.
    #[must_use]
    pub fn target_type(&self) -> TargetType {
        self.target_type
    }

    /// Returns the label used for reporting.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the table name or the SQL text.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the destination directory.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Returns a copy of this target with another destination.
    #[must_use]
    pub fn with_destination(&self, destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            ..self.clone()
        }
    }
}

impl fmt::Display for DumpTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}) -> {}",
            self.target_type,
            self.label,
            self.destination.display()
        )
    }
}
