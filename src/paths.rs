//! Output file path management.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::output::Compression;

/// Paths of the two output files derived from one base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub decls: PathBuf,
    pub dtrace: PathBuf,
}

impl OutputPaths {
    /// `<base>.decls` and `<base>.dtrace`, with `.gz` added when compressed.
    ///
    /// The suffixes are appended rather than substituted, so a base such as
    /// `out/db.v2` keeps its dot.
    pub fn new(base: &Path, compression: Compression) -> Self {
        let dtrace_ext = if compression.is_enabled() {
            ".dtrace.gz"
        } else {
            ".dtrace"
        };
        Self {
            decls: with_suffix(base, ".decls"),
            dtrace: with_suffix(base, dtrace_ext),
        }
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
