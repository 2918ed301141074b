//! In-memory schema and row source.

use std::collections::BTreeMap;

use anyhow::{bail, Result};

use super::{RowSource, SchemaProvider, TraceError};
use crate::trace::{ColumnInfo, Table, TableSchema, Value};

/// Tables and rows held in memory, in insertion order.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    tables: Vec<TableSchema>,
    rows: BTreeMap<String, Vec<Vec<Value>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table; a table with the same name is replaced.
    pub fn add_table(&mut self, name: &str, columns: Vec<ColumnInfo>) -> &mut Self {
        self.tables.retain(|t| t.name != name);
        self.tables.push(TableSchema {
            name: name.to_string(),
            columns,
        });
        self.rows.entry(name.to_string()).or_default();
        self
    }

    /// Appends a row to `table`. Values must be in column order.
    pub fn add_row(&mut self, table: &str, row: Vec<Value>) -> Result<&mut Self> {
        let Some(schema) = self.tables.iter().find(|t| t.name == table) else {
            bail!("Unknown table '{}'", table);
        };
        if row.len() != schema.columns.len() {
            return Err(TraceError::RowShape {
                table: table.to_string(),
                expected: schema.columns.len(),
                got: row.len(),
            }
            .into());
        }
        self.rows.entry(table.to_string()).or_default().push(row);
        Ok(self)
    }
}

impl SchemaProvider for MemorySource {
    fn table_names(&self) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        match self.tables.iter().find(|t| t.name == table) {
            Some(schema) => Ok(schema.columns.clone()),
            None => bail!("Unknown table '{}'", table),
        }
    }
}

impl RowSource for MemorySource {
    fn scan(
        &self,
        table: &Table,
        query: &str,
        visit: &mut dyn FnMut(&[Value]) -> Result<()>,
    ) -> Result<()> {
        let Some(rows) = self.rows.get(table.name()) else {
            return Err(TraceError::Query {
                table: table.name().to_string(),
                query: query.to_string(),
                message: "no such table".to_string(),
            }
            .into());
        };
        for row in rows {
            visit(row)?;
        }
        Ok(())
    }

    fn count_rows(&self, table: &Table) -> Result<u64> {
        Ok(self.rows.get(table.name()).map_or(0, |rows| rows.len() as u64))
    }
}
