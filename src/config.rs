//! Run configuration.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use crate::output::{Compression, DeclsVersion, MAX_LEVEL};

/// Compression level used when none is given.
pub const DEFAULT_COMPRESS_LEVEL: i32 = 3;

/// Configuration for a conversion run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Verbosity level (0 = warn, 1 = info, 2 = debug, 3+ = trace)
    pub verbosity: u8,
    /// SQLite database to read; only used when converting through [`convert_sqlite`]
    ///
    /// [`convert_sqlite`]: crate::tracer::convert_sqlite
    pub database: PathBuf,
    /// Base path of the output files; `.decls` and `.dtrace[.gz]` are appended
    pub output: Option<PathBuf>,
    pub decls_version: DeclsVersion,
    /// Tables to export (empty = all)
    pub tables: BTreeSet<String>,
    pub compression: Compression,
    /// Append to an existing trace file
    pub append: bool,
    /// JSON file caching the database schema
    pub schema_cache: Option<PathBuf>,
    /// Ignore the cached schema and read it from the database again
    pub refresh_schema: bool,
    /// Leave an existing declarations file untouched
    pub keep_decls: bool,
    pub skip_decls: bool,
    pub skip_trace: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            verbosity: 0,
            database: PathBuf::new(),
            output: None,
            decls_version: DeclsVersion::default(),
            tables: BTreeSet::new(),
            compression: Compression::default(),
            append: false,
            schema_cache: None,
            refresh_schema: false,
            keep_decls: false,
            skip_decls: false,
            skip_trace: false,
        }
    }
}

impl Config {
    /// Checks the configuration before any file is touched.
    ///
    /// The database path is not checked here since callers may supply their own source.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.output {
            Some(output) if !output.as_os_str().is_empty() => {}
            _ => return Err(ConfigError::MissingOutput),
        }
        if self.skip_decls && self.skip_trace {
            return Err(ConfigError::NothingToDo);
        }
        Ok(())
    }

    /// Table filter, `None` when every table is exported.
    pub fn table_filter(&self) -> Option<&BTreeSet<String>> {
        (!self.tables.is_empty()).then_some(&self.tables)
    }
}

/// Maps a command-line compression level to a [`Compression`].
///
/// `-1` disables compression and levels above the maximum are clamped with a warning.
pub fn compression_from_level(level: i32) -> Result<Compression, ConfigError> {
    match level {
        -1 => Ok(Compression::Disabled),
        l if l < -1 => Err(ConfigError::InvalidCompressionLevel(l)),
        l if l > MAX_LEVEL as i32 => {
            tracing::warn!(
                "Compression level {} is above the maximum, using {}",
                l,
                MAX_LEVEL
            );
            Ok(Compression::Gzip(MAX_LEVEL))
        }
        l => Ok(Compression::Gzip(l as u32)),
    }
}

/// Parses a comma separated table list, ignoring blanks.
pub fn parse_table_list(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingDatabase,
    MissingOutput,
    InvalidVersion(String),
    InvalidCompressionLevel(i32),
    NothingToDo,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingDatabase => write!(f, "No database given"),
            ConfigError::MissingOutput => write!(f, "No output file base given"),
            ConfigError::InvalidVersion(v) => {
                write!(f, "Unknown declarations version '{v}', expected 1 or 2")
            }
            ConfigError::InvalidCompressionLevel(l) => {
                write!(f, "Invalid compression level {l}, expected -1 to {MAX_LEVEL}")
            }
            ConfigError::NothingToDo => {
                write!(f, "Both declarations and trace are skipped, nothing to do")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
