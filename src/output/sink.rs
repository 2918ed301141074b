//! Output sinks for the data trace.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::write::GzEncoder;

/// Highest gzip compression level.
pub const MAX_LEVEL: u32 = 9;

/// Compression applied to the trace file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Disabled,
    /// Gzip at the given level (0-9).
    Gzip(u32),
}

impl Compression {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Compression::Gzip(_))
    }
}

impl Default for Compression {
    fn default() -> Self {
        Compression::Gzip(3)
    }
}

/// A trace file, optionally gzip compressed.
///
/// [`TraceSink::finish`] must be called to write the gzip trailer and flush buffered
/// data; dropping the sink only makes a best-effort attempt.
pub enum TraceSink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl TraceSink {
    /// Opens `path` for writing, appending instead of truncating when `append` is set.
    ///
    /// Appending to a compressed file adds a new gzip member, which readers treat as a
    /// continuation of the same stream.
    pub fn create(path: &Path, append: bool, compression: Compression) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .with_context(|| format!("Failed to open trace file {}", path.display()))?;
        let writer = BufWriter::with_capacity(256 * 1024, file);

        Ok(match compression {
            Compression::Disabled => TraceSink::Plain(writer),
            Compression::Gzip(level) => TraceSink::Gzip(GzEncoder::new(
                writer,
                flate2::Compression::new(level.min(MAX_LEVEL)),
            )),
        })
    }

    /// Flushes all data and closes the underlying stream.
    pub fn finish(self) -> Result<()> {
        let mut writer = match self {
            TraceSink::Plain(writer) => writer,
            TraceSink::Gzip(encoder) => encoder
                .finish()
                .context("Failed to finish gzip stream")?,
        };
        writer.flush().context("Failed to flush trace file")?;
        Ok(())
    }
}

impl Write for TraceSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            TraceSink::Plain(w) => w.write(buf),
            TraceSink::Gzip(w) => w.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            TraceSink::Plain(w) => w.write_all(buf),
            TraceSink::Gzip(w) => w.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            TraceSink::Plain(w) => w.flush(),
            TraceSink::Gzip(w) => w.flush(),
        }
    }
}
