//! Output targets for formatted log lines.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::error::{Result, ServerError};

/// Where a [`LogRecordServer`](crate::LogRecordServer) puts its lines.
///
/// Sinks never fail outward: a line that cannot be written is dropped and the
/// failure reported through `tracing`.
pub trait Sink {
    /// Write one line. The sink appends the line terminator.
    fn write(&mut self, line: &str);

    /// Push buffered output to its destination.
    fn flush(&mut self);
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write(&mut self, line: &str) {
        (**self).write(line)
    }

    fn flush(&mut self) {
        (**self).flush()
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn write(&mut self, line: &str) {
        (**self).write(line)
    }

    fn flush(&mut self) {
        (**self).flush()
    }
}

/// Writes lines to standard output.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl Sink for ConsoleSink {
    fn write(&mut self, line: &str) {
        if let Err(err) = writeln!(io::stdout().lock(), "{line}") {
            warn!(error = %err, "console write failed");
        }
    }

    fn flush(&mut self) {
        if let Err(err) = io::stdout().lock().flush() {
            warn!(error = %err, "console flush failed");
        }
    }
}

/// Appends lines to a file.
#[derive(Debug)]
pub struct FileSink {
    file: File,
    path: PathBuf,
}

impl FileSink {
    /// Open `path` for appending, creating it and any missing parent
    /// directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let sink_error = |source| ServerError::Sink {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(sink_error)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(sink_error)?;

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn write(&mut self, line: &str) {
        if let Err(err) = writeln!(self.file, "{line}") {
            warn!(path = ?self.path, error = %err, "log file write failed; line dropped");
        }
    }

    fn flush(&mut self) {
        if let Err(err) = self.file.flush() {
            warn!(path = ?self.path, error = %err, "log file flush failed");
        }
    }
}

/// Collects lines in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
    flushes: Arc<Mutex<usize>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of `flush` calls seen.
    pub fn flush_count(&self) -> usize {
        *self
            .flushes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Sink for MemorySink {
    fn write(&mut self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line.to_owned());
    }

    fn flush(&mut self) {
        *self
            .flushes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) += 1;
    }
}
