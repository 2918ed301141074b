//! Output writers for the declarations and data trace files.
//!
//! Both writers take the same slice of [`Table`](crate::trace::Table)s. Declarations are
//! produced from the schema alone; the data trace pulls rows through a
//! [`RowSource`](crate::source::RowSource) and writes them to a [`TraceSink`], which may
//! gzip the stream.

mod decls;
mod dtrace;
mod sink;

pub use decls::{write_decls, write_decls_file, write_decls_v1, write_decls_v2, DeclsVersion};
pub use dtrace::{encode_row, write_trace, write_trace_file, TraceOptions, TraceSummary};
pub use sink::{Compression, TraceSink, MAX_LEVEL};
