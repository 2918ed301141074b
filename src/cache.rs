//! JSON cache of database schema metadata.
//!
//! Reading column metadata from a large server can take longer than tracing a small
//! table, so the schema is saved after the first run and reused until the caller asks
//! for a refresh.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::source::SchemaProvider;
use crate::trace::TableSchema;

const CACHE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SchemaCache {
    version: u32,
    tables: Vec<TableSchema>,
}

/// Saves `tables` to `path`.
pub fn save(path: &Path, tables: &[TableSchema]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Creating schema cache {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let cache = SchemaCache {
        version: CACHE_VERSION,
        tables: tables.to_vec(),
    };
    serde_json::to_writer_pretty(&mut writer, &cache).context("Writing schema cache JSON")?;
    writer.flush().context("Flushing schema cache")?;
    Ok(())
}

/// Loads a schema previously written by [`save`].
pub fn load(path: &Path) -> Result<Vec<TableSchema>> {
    let file =
        File::open(path).with_context(|| format!("Opening schema cache {}", path.display()))?;
    let cache: SchemaCache = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Parsing schema cache {}", path.display()))?;
    if cache.version != CACHE_VERSION {
        bail!(
            "Schema cache {} has version {}, expected {}",
            path.display(),
            cache.version,
            CACHE_VERSION
        );
    }
    Ok(cache.tables)
}

/// Returns the cached schema at `path`, or reads it from `provider` and caches it.
///
/// An unreadable cache is treated as missing. Failing to write the cache is only
/// logged, since the schema itself was read successfully.
pub fn load_or_reflect<P>(provider: &P, path: &Path, refresh: bool) -> Result<Vec<TableSchema>>
where
    P: SchemaProvider + ?Sized,
{
    if !refresh && path.exists() {
        match load(path) {
            Ok(tables) => {
                tracing::info!(
                    "Using cached schema for {} tables from {}",
                    tables.len(),
                    path.display()
                );
                return Ok(tables);
            }
            Err(e) => tracing::warn!("Ignoring schema cache: {:#}", e),
        }
    }

    let tables = provider.schema()?;
    if let Err(e) = save(path, &tables) {
        tracing::warn!("Failed to save schema cache: {:#}", e);
    }
    Ok(tables)
}
