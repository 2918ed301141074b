//! Data trace writer.
//!
//! Every row of every selected table becomes one program point sample:
//!
//! ```text
//!
//! <table>:::POINT
//! <indicator>        (nullable fields only)
//! null | 1
//! 1
//! <field>
//! <encoded value>
//! 1 | 2              (2 when the value is nonsensical)
//! ```
//!
//! A row is assembled in memory and handed to the sink with a single write, which
//! matters most when the sink compresses.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::sink::{Compression, TraceSink};
use crate::source::{RowSource, TraceError};
use crate::trace::constants::{
    MODIFIED, MODIFIED_NONSENSICAL, NONSENSICAL, NOT_NULL_SENTINEL, NULL_LITERAL,
};
use crate::trace::{Table, Value};

/// Options controlling a trace write.
#[derive(Debug, Clone, Default)]
pub struct TraceOptions {
    /// Tables to include; `None` or an empty set means every table.
    pub tables: Option<BTreeSet<String>>,
    /// Append to an existing trace file instead of replacing it.
    pub append: bool,
    pub compression: Compression,
}

impl TraceOptions {
    /// Returns true if `table` passes the table filter.
    pub fn includes(&self, table: &str) -> bool {
        match &self.tables {
            Some(filter) if !filter.is_empty() => filter.contains(table),
            _ => true,
        }
    }
}

/// Counts of what a trace write produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceSummary {
    pub tables: usize,
    pub rows: u64,
}

/// Appends the trace lines for one row to `buf`.
pub fn encode_row(buf: &mut String, table: &Table, point: &str, row: &[Value]) {
    buf.push('\n');
    buf.push_str(point);
    buf.push('\n');
    for (field, value) in table.fields().iter().zip(row) {
        if let Some(indicator) = field.null_indicator() {
            let state = if value.is_null() {
                NULL_LITERAL
            } else {
                NOT_NULL_SENTINEL
            };
            buf.push_str(indicator);
            buf.push('\n');
            buf.push_str(state);
            buf.push('\n');
            buf.push_str(MODIFIED);
            buf.push('\n');
        }

        let encoded = field.encode(value);
        let modified = if encoded == NONSENSICAL {
            MODIFIED_NONSENSICAL
        } else {
            MODIFIED
        };
        buf.push_str(field.escaped_name());
        buf.push('\n');
        buf.push_str(&encoded);
        buf.push('\n');
        buf.push_str(modified);
        buf.push('\n');
    }
}

/// Writes trace samples for every table in `tables` that passes the options filter.
///
/// Tables are visited in slice order, which should be the order used for the
/// declarations. Any read or write failure aborts the whole write.
pub fn write_trace<S, W>(
    tables: &[Table],
    source: &S,
    sink: &mut W,
    options: &TraceOptions,
) -> Result<TraceSummary>
where
    S: RowSource + ?Sized,
    W: Write + ?Sized,
{
    let mut summary = TraceSummary::default();
    let mut buf = String::with_capacity(4096);

    for table in tables.iter().filter(|t| options.includes(t.name())) {
        let point = table.point_name();
        let query = table.select_query();
        let width = table.fields().len();
        let mut rows = 0u64;

        tracing::debug!("Tracing {} with: {}", table.name(), query);
        source.scan(table, &query, &mut |row| {
            if row.len() != width {
                return Err(TraceError::RowShape {
                    table: table.name().to_string(),
                    expected: width,
                    got: row.len(),
                }
                .into());
            }
            buf.clear();
            encode_row(&mut buf, table, &point, row);
            sink.write_all(buf.as_bytes())
                .context("Failed to write trace row")?;
            rows += 1;
            Ok(())
        })?;

        tracing::info!("Traced {} rows from {}", rows, table.name());
        summary.tables += 1;
        summary.rows += rows;
    }

    Ok(summary)
}

/// Writes the trace for `tables` to the file at `path`.
///
/// The file is finished (gzip trailer written, buffers flushed) even when the write
/// fails part way; the write error takes precedence over a close error.
pub fn write_trace_file<S>(
    path: &Path,
    tables: &[Table],
    source: &S,
    options: &TraceOptions,
) -> Result<TraceSummary>
where
    S: RowSource + ?Sized,
{
    let mut sink = TraceSink::create(path, options.append, options.compression)?;
    let written = write_trace(tables, source, &mut sink, options);
    let closed = sink
        .finish()
        .with_context(|| format!("Failed to close trace file {}", path.display()));

    let summary = written.with_context(|| format!("Failed to write trace {}", path.display()))?;
    closed?;

    tracing::info!(
        "Wrote {} rows from {} tables to {}",
        summary.rows,
        summary.tables,
        path.display()
    );
    Ok(summary)
}
