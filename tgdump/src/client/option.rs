//! Protocol-level transaction option.

use serde::{Deserialize, Serialize};

use crate::config::TransactionKind;

/// The option object handed to [`super::SqlClient::create_transaction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOption {
    /// The transaction type.
    pub kind: TransactionKind,
    /// The transaction label.
    pub label: Option<String>,
    /// Tables the transaction may write.
    pub write_preserve: Vec<String>,
    /// Tables the transaction may read; empty means unrestricted.
    pub inclusive_read_areas: Vec<String>,
}

impl TransactionOption {
    /// Creates an option of the given type without hints.
    #[must_use]
    pub fn new(kind: TransactionKind) -> Self {
        Self {
            kind,
            label: None,
            write_preserve: Vec::new(),
            inclusive_read_areas: Vec::new(),
        }
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
