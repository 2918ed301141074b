//! SQLite-backed schema provider and row source.
//!
//! Tables come from `sqlite_master`, columns from `PRAGMA table_info`. SQLite keeps the
//! declared column type verbatim, so MySQL-style declarations such as `varchar(45)` or
//! `bigint(20)` classify exactly as they would against a MySQL server.

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use super::{RowSource, SchemaProvider, TraceError};
use crate::trace::{quote_ident, ColumnInfo, Table, Value};

pub struct SqliteSource {
    conn: Connection,
}

impl SqliteSource {
    /// Opens the database at `path` read-only.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open SQLite database: {}", path.display()))?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int(v),
        ValueRef::Real(v) => Value::Real(v),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    }
}

impl SchemaProvider for SqliteSource {
    fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .context("Failed to prepare table list query")?;

        let names = stmt
            .query_map([], |row| row.get(0))
            .context("Failed to query table names")?
            .collect::<Result<Vec<String>, _>>()
            .context("Failed to collect table names")?;
        Ok(names)
    }

    fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let pragma = format!("PRAGMA table_info(\"{}\")", table.replace('"', "\"\""));
        let mut stmt = self
            .conn
            .prepare(&pragma)
            .with_context(|| format!("Failed to describe table {table}"))?;

        let columns = stmt
            .query_map([], |row| {
                let name: String = row.get(1)?;
                let raw_type: String = row.get(2)?;
                let not_null: i64 = row.get(3)?;
                let pk: i64 = row.get(5)?;
                Ok(ColumnInfo {
                    name,
                    raw_type,
                    nullable: not_null == 0,
                    primary_key: pk > 0,
                })
            })
            .with_context(|| format!("Failed to query columns of {table}"))?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to collect columns of {table}"))?;
        Ok(columns)
    }
}

impl RowSource for SqliteSource {
    fn scan(
        &self,
        table: &Table,
        query: &str,
        visit: &mut dyn FnMut(&[Value]) -> Result<()>,
    ) -> Result<()> {
        let query_error = |e: rusqlite::Error| TraceError::Query {
            table: table.name().to_string(),
            query: query.to_string(),
            message: e.to_string(),
        };

        let mut stmt = self.conn.prepare(query).map_err(query_error)?;
        let width = stmt.column_count();
        if width != table.fields().len() {
            return Err(TraceError::RowShape {
                table: table.name().to_string(),
                expected: table.fields().len(),
                got: width,
            }
            .into());
        }

        let mut rows = stmt.query([]).map_err(query_error)?;
        let mut values = Vec::with_capacity(width);
        while let Some(row) = rows.next().map_err(query_error)? {
            values.clear();
            for idx in 0..width {
                values.push(value_from_ref(row.get_ref(idx).map_err(query_error)?));
            }
            visit(&values)?;
        }
        Ok(())
    }

    fn count_rows(&self, table: &Table) -> Result<u64> {
        let query = format!("SELECT COUNT(*) FROM {}", quote_ident(table.name()));
        let count: i64 = self
            .conn
            .query_row(&query, [], |row| row.get(0))
            .map_err(|e| TraceError::Query {
                table: table.name().to_string(),
                query: query.clone(),
                message: e.to_string(),
            })?;
        Ok(count as u64)
    }
}
