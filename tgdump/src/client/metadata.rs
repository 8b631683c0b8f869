//! Table metadata returned by the database.

use serde::{Deserialize, Serialize};

/// A column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column SQL type.
    pub sql_type: String,
}

impl Column {
    /// Creates a new column.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }
}

/// Metadata of a registered table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Database name, if the server reports one.
    #[serde(default)]
    pub database_name: Option<String>,
    /// Schema name, if the server reports one.
    #[serde(default)]
    pub schema_name: Option<String>,
    /// Simple table name.
    pub table_name: String,
    /// Columns in declaration order.
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl TableMetadata {
    /// Creates metadata for a table without columns.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            database_name: None,
            schema_name: None,
            table_name: table_name.into(),
            columns: Vec::new(),
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        self.columns.push(Column::new(name, sql_type));
        self
    }

    /// Sets the schema name.
    #[must_use]
    pub fn with_schema_name(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    /// Returns the name qualified by database and schema when present.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        [
            self.database_name.as_deref(),
            self.schema_name.as_deref(),
            Some(self.table_name.as_str()),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name() {
        let meta = TableMetadata::new("t1");
        assert_eq!(meta.qualified_name(), "t1");

        let meta = TableMetadata::new("t1").with_schema_name("public");
        assert_eq!(meta.qualified_name(), "public.t1");
    }

    #[test]
    fn test_columns() {
        let meta = TableMetadata::new("t1")
            .with_column("k", "INT")
            .with_column("v", "VARCHAR");
        assert_eq!(meta.columns.len(), 2);
        assert_eq!(meta.columns[1], Column::new("v", "VARCHAR"));
    }
}
