//! dbtrace - export relational databases as Daikon declarations and data traces.
//!
//! Every table becomes one program point. Every column becomes a variable, and every
//! nullable column gets an extra null indicator variable in front of it. Each row is one
//! sample of the program point.
//!
//! # Modules
//!
//! - [`trace`] - type classification, value encoders and the field/table model
//! - [`source`] - schema providers and row sources (SQLite, in-memory)
//! - [`output`] - declarations and data trace writers
//! - [`tracer`] - conversion driver and database statistics
//! - [`config`], [`paths`], [`cache`] - run configuration, output paths, schema cache
//!
//! # Example
//!
//! ```no_run
//! use dbtrace::{convert_sqlite, Config};
//! use std::path::PathBuf;
//!
//! let config = Config {
//!     database: PathBuf::from("shop.sqlite"),
//!     output: Some(PathBuf::from("out/shop")),
//!     ..Config::default()
//! };
//! let summary = convert_sqlite(&config).expect("Failed to convert database");
//! println!("wrote {}", summary.paths.dtrace.display());
//! ```

pub mod cache;
pub mod config;
pub mod output;
pub mod paths;
pub mod source;
pub mod trace;
pub mod tracer;

pub use config::{compression_from_level, parse_table_list, Config, ConfigError};
pub use output::{Compression, DeclsVersion};
pub use paths::OutputPaths;
pub use source::{MemorySource, RowSource, SchemaProvider, SqliteSource, TraceError};
pub use tracer::{collect_stats, convert, convert_sqlite, sqlite_stats, ConvertSummary, DbStats};
