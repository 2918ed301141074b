//! dbtrace: export a database as Daikon declarations and data trace files.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::Level;

use dbtrace::config::DEFAULT_COMPRESS_LEVEL;
use dbtrace::{
    compression_from_level, convert_sqlite, parse_table_list, sqlite_stats, Compression, Config,
    DeclsVersion,
};

#[derive(Debug, Parser)]
#[command(name = "dbtrace")]
#[command(about = "Export database schemas and rows as Daikon traces")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write <OUTPUT>.decls and <OUTPUT>.dtrace[.gz] for a database
    Convert(ConvertArgs),
    /// Print table, column and row counts of a database
    Stats {
        /// Path to SQLite database
        #[arg(short, long)]
        database: PathBuf,
    },
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// Path to SQLite database
    #[arg(short, long)]
    database: PathBuf,

    /// Base path of the output files
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Declarations format version: 1 or 2
    #[arg(long, default_value = "2")]
    decls_version: String,

    /// Comma separated tables to export (default: all)
    #[arg(long)]
    tables: Option<String>,

    /// Gzip level for the trace, -1 to disable
    #[arg(long, default_value_t = DEFAULT_COMPRESS_LEVEL, allow_negative_numbers = true)]
    compress_level: i32,

    /// Write an uncompressed trace
    #[arg(long)]
    no_compress: bool,

    /// Append to an existing trace file
    #[arg(long)]
    append: bool,

    /// Cache the database schema in this JSON file
    #[arg(long)]
    schema_cache: Option<PathBuf>,

    /// Re-read the schema even if the cache exists
    #[arg(long)]
    refresh_schema: bool,

    /// Do not overwrite an existing declarations file
    #[arg(long)]
    keep_decls: bool,

    /// Do not write the declarations file
    #[arg(long)]
    skip_decls: bool,

    /// Do not write the trace file
    #[arg(long)]
    skip_trace: bool,
}

impl ConvertArgs {
    /// Fills in everything but verbosity, which is set first so logging is up while the
    /// arguments are checked.
    fn apply(self, config: &mut Config) -> Result<()> {
        config.compression = if self.no_compress {
            Compression::Disabled
        } else {
            compression_from_level(self.compress_level)?
        };
        config.decls_version = self.decls_version.parse::<DeclsVersion>()?;
        config.database = self.database;
        config.output = self.output;
        config.tables = self.tables.as_deref().map(parse_table_list).unwrap_or_default();
        config.append = self.append;
        config.schema_cache = self.schema_cache;
        config.refresh_schema = self.refresh_schema;
        config.keep_decls = self.keep_decls;
        config.skip_decls = self.skip_decls;
        config.skip_trace = self.skip_trace;
        Ok(())
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_convert(args: ConvertArgs, verbosity: u8) -> Result<()> {
    let mut config = Config {
        verbosity,
        ..Config::default()
    };
    setup_logging(config.verbosity);
    args.apply(&mut config)?;
    config.validate()?;
    if !config.database.exists() {
        bail!("Database not found: {}", config.database.display());
    }

    let summary = convert_sqlite(&config)?;
    if summary.decls_written {
        println!("Declarations: {}", summary.paths.decls.display());
    }
    if let Some(trace) = summary.trace {
        println!(
            "Trace: {} ({} rows from {} tables)",
            summary.paths.dtrace.display(),
            trace.rows,
            trace.tables
        );
    }
    Ok(())
}

fn run_stats(database: PathBuf, verbosity: u8) -> Result<()> {
    setup_logging(verbosity);
    if !database.exists() {
        bail!("Database not found: {}", database.display());
    }
    let stats = sqlite_stats(&database)?;
    println!("{stats}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert(args) => run_convert(args, cli.verbose),
        Commands::Stats { database } => run_stats(database, cli.verbose),
    }
}
