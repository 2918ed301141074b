//! Schema and row sources.
//!
//! The writers never talk to a database directly. A [`SchemaProvider`] reports which
//! tables exist and how their columns are declared, and a [`RowSource`] streams the rows
//! of one table with values in field order. Implementations:
//!
//! - [`SqliteSource`]: reads an SQLite database file through `rusqlite`
//! - [`MemorySource`]: holds schema and rows in memory

mod memory;
mod sqlite;

pub use memory::MemorySource;
pub use sqlite::SqliteSource;

use std::fmt;

use anyhow::Result;

use crate::trace::{ColumnInfo, Table, TableSchema, Value};

/// Supplies table and column metadata in schema order.
pub trait SchemaProvider {
    /// Names of all tables, in a stable order.
    fn table_names(&self) -> Result<Vec<String>>;

    /// Columns of `table` in declaration order.
    fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>>;

    /// Collects the full schema of every table.
    fn schema(&self) -> Result<Vec<TableSchema>> {
        self.table_names()?
            .into_iter()
            .map(|name| {
                let columns = self.columns(&name)?;
                Ok(TableSchema { name, columns })
            })
            .collect()
    }
}

/// Streams rows of a table, one pass, values aligned with the table's fields.
pub trait RowSource {
    /// Runs `query` against `table` and calls `visit` once per row.
    ///
    /// Errors returned by `visit` are passed through untouched; errors from the
    /// underlying store are reported as [`TraceError::Query`].
    fn scan(
        &self,
        table: &Table,
        query: &str,
        visit: &mut dyn FnMut(&[Value]) -> Result<()>,
    ) -> Result<()>;

    /// Number of rows in `table`.
    fn count_rows(&self, table: &Table) -> Result<u64> {
        let mut count = 0u64;
        self.scan(table, &table.select_query(), &mut |_| {
            count += 1;
            Ok(())
        })?;
        Ok(count)
    }
}

/// Builds the field model for every table reported by `provider`.
pub fn load_tables(provider: &impl SchemaProvider) -> Result<Vec<Table>> {
    Ok(provider.schema()?.iter().map(Table::from_schema).collect())
}

/// Error raised by a row source while reading a table.
#[derive(Debug, Clone)]
pub enum TraceError {
    /// The query for a table failed or a row could not be read.
    Query {
        table: String,
        query: String,
        message: String,
    },
    /// A row had a different number of values than the table has fields.
    RowShape {
        table: String,
        expected: usize,
        got: usize,
    },
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceError::Query {
                table,
                query,
                message,
            } => {
                write!(f, "Error reading table {table}: {message}\nQuery: {query}")
            }
            TraceError::RowShape {
                table,
                expected,
                got,
            } => {
                write!(f, "{table}: expected {expected} values per row, got {got}")
            }
        }
    }
}

impl std::error::Error for TraceError {}
