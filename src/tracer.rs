//! Conversion driver.
//!
//! Ties the pieces together for one run: read the schema (through the cache when one
//! is configured), select tables, then write declarations and trace for exactly the
//! same table list.

use std::fmt;
use std::path::Path;

use anyhow::Result;

use crate::cache;
use crate::config::{Config, ConfigError};
use crate::output::{write_decls_file, write_trace_file, TraceOptions, TraceSummary};
use crate::paths::OutputPaths;
use crate::source::{RowSource, SchemaProvider, SqliteSource};
use crate::trace::{Table, TableSchema};

/// Result of a conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSummary {
    pub paths: OutputPaths,
    /// Number of tables selected for export
    pub tables: usize,
    /// Whether the declarations file was (re)written
    pub decls_written: bool,
    /// Trace counts, `None` when the trace was skipped
    pub trace: Option<TraceSummary>,
}

/// Builds the tables to export from `schema`, keeping schema order.
///
/// Names in `filter` that match no table are logged and otherwise ignored.
pub fn select_tables(
    schema: &[TableSchema],
    filter: Option<&std::collections::BTreeSet<String>>,
) -> Vec<Table> {
    let Some(filter) = filter else {
        return schema.iter().map(Table::from_schema).collect();
    };

    for name in filter {
        if !schema.iter().any(|t| &t.name == name) {
            tracing::warn!("Table '{}' not found in database, skipping", name);
        }
    }
    schema
        .iter()
        .filter(|t| filter.contains(&t.name))
        .map(Table::from_schema)
        .collect()
}

/// Runs a conversion from `source` as described by `config`.
pub fn convert<S>(config: &Config, source: &S) -> Result<ConvertSummary>
where
    S: SchemaProvider + RowSource,
{
    config.validate()?;
    let output = config.output.as_deref().ok_or(ConfigError::MissingOutput)?;
    let paths = OutputPaths::new(output, config.compression);

    let schema = match &config.schema_cache {
        Some(cache_path) => cache::load_or_reflect(source, cache_path, config.refresh_schema)?,
        None => source.schema()?,
    };
    let tables = select_tables(&schema, config.table_filter());
    tracing::info!("Exporting {} of {} tables", tables.len(), schema.len());

    let decls_written = if config.skip_decls {
        false
    } else {
        write_decls_file(
            &paths.decls,
            &tables,
            config.decls_version,
            !config.keep_decls,
        )?
    };

    let trace = if config.skip_trace {
        None
    } else {
        // Tables are already filtered; the trace writer sees the same list as the decls
        let options = TraceOptions {
            tables: None,
            append: config.append,
            compression: config.compression,
        };
        Some(write_trace_file(&paths.dtrace, &tables, source, &options)?)
    };

    Ok(ConvertSummary {
        paths,
        tables: tables.len(),
        decls_written,
        trace,
    })
}

/// Opens the SQLite database named in `config` and converts it.
pub fn convert_sqlite(config: &Config) -> Result<ConvertSummary> {
    config.validate()?;
    if config.database.as_os_str().is_empty() {
        return Err(ConfigError::MissingDatabase.into());
    }
    let source = SqliteSource::open(&config.database)?;
    convert(config, &source)
}

/// Size of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStats {
    pub name: String,
    pub columns: usize,
    pub rows: u64,
}

/// Size of a whole database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbStats {
    pub tables: Vec<TableStats>,
}

impl DbStats {
    pub fn total_columns(&self) -> usize {
        self.tables.iter().map(|t| t.columns).sum()
    }

    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

impl fmt::Display for DbStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .tables
            .iter()
            .map(|t| t.name.len())
            .max()
            .unwrap_or(0)
            .max("TOTAL".len());
        writeln!(f, "{:<width$} {:>8} {:>12}", "TABLE", "COLUMNS", "ROWS")?;
        for table in &self.tables {
            writeln!(
                f,
                "{:<width$} {:>8} {:>12}",
                table.name, table.columns, table.rows
            )?;
        }
        write!(
            f,
            "{:<width$} {:>8} {:>12}",
            "TOTAL",
            self.total_columns(),
            self.total_rows()
        )
    }
}

/// Counts tables, columns and rows of `source`.
pub fn collect_stats<S>(source: &S) -> Result<DbStats>
where
    S: SchemaProvider + RowSource,
{
    let mut stats = DbStats::default();
    for schema in source.schema()? {
        let table = Table::from_schema(&schema);
        let rows = source.count_rows(&table)?;
        stats.tables.push(TableStats {
            name: schema.name,
            columns: schema.columns.len(),
            rows,
        });
    }
    Ok(stats)
}

/// Opens the SQLite database at `path` and counts its contents.
pub fn sqlite_stats(path: &Path) -> Result<DbStats> {
    let source = SqliteSource::open(path)?;
    collect_stats(&source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_table_list;
    use crate::output::{Compression, DeclsVersion};
    use crate::source::MemorySource;
    use crate::trace::{ColumnInfo, Value};
    use tempfile::TempDir;

    fn source() -> MemorySource {
        let mut source = MemorySource::new();
        source
            .add_table(
                "t",
                vec![
                    ColumnInfo::new("id", "INT", false, true),
                    ColumnInfo::new("name", "VARCHAR(10)", true, false),
                ],
            )
            .add_table("u", vec![ColumnInfo::new("v", "int", false, false)]);
        source
            .add_row("t", vec![Value::Int(1), Value::from("Al")])
            .unwrap();
        source.add_row("t", vec![Value::Int(2), Value::Null]).unwrap();
        source.add_row("u", vec![Value::Int(7)]).unwrap();
        source
    }

    fn config(dir: &TempDir) -> Config {
        Config {
            output: Some(dir.path().join("db")),
            compression: Compression::Disabled,
            ..Config::default()
        }
    }

    #[test]
    fn test_convert_writes_both_files() {
        let dir = TempDir::new().unwrap();
        let summary = convert(&config(&dir), &source()).unwrap();

        assert_eq!(summary.tables, 2);
        assert!(summary.decls_written);
        assert_eq!(summary.trace, Some(TraceSummary { tables: 2, rows: 3 }));

        let decls = std::fs::read_to_string(&summary.paths.decls).unwrap();
        let trace = std::fs::read_to_string(&summary.paths.dtrace).unwrap();
        assert!(decls.starts_with("decl-version 2.0\n"));
        assert!(decls.contains("ppt u:::POINT"));
        assert_eq!(trace.matches("t:::POINT").count(), 2);
        assert!(summary.paths.dtrace.ends_with("db.dtrace"));
    }

    #[test]
    fn test_filter_applies_to_both_files() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            tables: parse_table_list("t,missing"),
            decls_version: DeclsVersion::V1,
            ..config(&dir)
        };
        let summary = convert(&config, &source()).unwrap();
        assert_eq!(summary.tables, 1);

        let decls = std::fs::read_to_string(&summary.paths.decls).unwrap();
        let trace = std::fs::read_to_string(&summary.paths.dtrace).unwrap();
        assert!(decls.starts_with("DECLARE\nt:::POINT\n"));
        assert!(!decls.contains("u:::POINT"));
        assert!(!trace.contains("u:::POINT"));
    }

    #[test]
    fn test_skip_and_keep_flags() {
        let dir = TempDir::new().unwrap();
        let base = config(&dir);

        let summary = convert(
            &Config {
                skip_trace: true,
                ..base.clone()
            },
            &source(),
        )
        .unwrap();
        assert!(summary.trace.is_none());
        assert!(!summary.paths.dtrace.exists());

        std::fs::write(&summary.paths.decls, "hand edited").unwrap();
        let summary = convert(
            &Config {
                keep_decls: true,
                ..base.clone()
            },
            &source(),
        )
        .unwrap();
        assert!(!summary.decls_written);
        assert_eq!(
            std::fs::read_to_string(&summary.paths.decls).unwrap(),
            "hand edited"
        );
        assert!(summary.paths.dtrace.exists());
    }

    #[test]
    fn test_invalid_config_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            output: None,
            ..config(&dir)
        };
        let err = convert(&config, &source()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::MissingOutput)
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_sqlite_conversion_needs_database() {
        let dir = TempDir::new().unwrap();
        let err = convert_sqlite(&config(&dir)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::MissingDatabase)
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_sqlite_conversion() {
        let dir = TempDir::new().unwrap();
        let database = dir.path().join("db.sqlite");
        let conn = rusqlite::Connection::open(&database).unwrap();
        conn.execute_batch("CREATE TABLE t (a INT NOT NULL); INSERT INTO t VALUES (4);")
            .unwrap();
        drop(conn);

        let config = Config {
            database,
            ..config(&dir)
        };
        let summary = convert_sqlite(&config).unwrap();
        assert_eq!(summary.trace, Some(TraceSummary { tables: 1, rows: 1 }));
        assert_eq!(
            std::fs::read_to_string(&summary.paths.dtrace).unwrap(),
            "\nt:::POINT\nt.a\n4\n1\n"
        );
    }

    #[test]
    fn test_schema_cache_is_written() {
        let dir = TempDir::new().unwrap();
        let cache_path = dir.path().join("schema.json");
        let config = Config {
            schema_cache: Some(cache_path.clone()),
            ..config(&dir)
        };
        convert(&config, &source()).unwrap();
        assert_eq!(cache::load(&cache_path).unwrap().len(), 2);
    }

    #[test]
    fn test_stats() {
        let stats = collect_stats(&source()).unwrap();
        assert_eq!(stats.tables.len(), 2);
        assert_eq!(stats.total_columns(), 3);
        assert_eq!(stats.total_rows(), 3);

        let report = stats.to_string();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("TABLE"));
        assert!(lines[3].starts_with("TOTAL"));
        assert!(lines[3].ends_with(" 3"));
    }
}
