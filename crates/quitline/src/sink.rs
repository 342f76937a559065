//! Process-wide diagnostic sink.
//!
//! Lines take the form `<program-name>: <level>: <text>` and are written and
//! flushed in a single locked operation, so diagnostics survive an abrupt
//! kill and lines from the mainline and worker never interleave.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Severity marker written into each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Progress and lifecycle transitions.
    Debug,
    /// Failures, fatal or not.
    Error,
}

impl LogLevel {
    /// Marker text used in the line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the sink ended up writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkDestination {
    /// The mode-specific log file.
    File(PathBuf),
    /// The process's standard error stream.
    Stderr,
    /// A caller-supplied writer.
    Writer,
}

struct SinkInner {
    program: String,
    destination: SinkDestination,
    writer: Mutex<Box<dyn Write + Send>>,
}

/// Line-oriented diagnostic sink shared by every execution context.
#[derive(Clone)]
pub struct LogSink {
    inner: Arc<SinkInner>,
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink")
            .field("program", &self.inner.program)
            .field("destination", &self.inner.destination)
            .finish_non_exhaustive()
    }
}

impl LogSink {
    /// Opens `path` for writing, truncating previous contents.
    ///
    /// Falls back to standard error when the file cannot be opened. The
    /// failure is not reported: no sink exists yet to report it to.
    #[must_use]
    pub fn open(program: &str, path: &Path) -> Self {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_or_else(
                |_| Self::stderr(program),
                |file| {
                    Self::build(
                        program,
                        SinkDestination::File(path.to_path_buf()),
                        Box::new(file),
                    )
                },
            )
    }

    /// Sink writing to standard error.
    #[must_use]
    pub fn stderr(program: &str) -> Self {
        Self::build(program, SinkDestination::Stderr, Box::new(io::stderr()))
    }

    /// Sink writing to an arbitrary writer.
    #[must_use]
    pub fn from_writer<W>(program: &str, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self::build(program, SinkDestination::Writer, Box::new(writer))
    }

    fn build(program: &str, destination: SinkDestination, writer: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Arc::new(SinkInner {
                program: program.to_owned(),
                destination,
                writer: Mutex::new(writer),
            }),
        }
    }

    /// Program name prefixed to each line.
    #[must_use]
    pub fn program_name(&self) -> &str {
        &self.inner.program
    }

    /// Destination chosen when the sink was opened.
    #[must_use]
    pub fn destination(&self) -> &SinkDestination {
        &self.inner.destination
    }

    /// Writes a `debug` line.
    pub fn debug(&self, text: impl fmt::Display) {
        self.line(LogLevel::Debug, text);
    }

    /// Writes an `error` line.
    pub fn error(&self, text: impl fmt::Display) {
        self.line(LogLevel::Error, text);
    }

    /// Writes one line at the given level.
    pub fn line(&self, level: LogLevel, text: impl fmt::Display) {
        let line = format!("{}: {level}: {text}\n", self.inner.program);
        self.write_bytes(line.as_bytes());
    }

    /// Writes pre-formatted bytes as one atomic unit and flushes.
    pub(crate) fn write_bytes(&self, bytes: &[u8]) {
        let mut writer = self
            .inner
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // A failed diagnostic write has nowhere left to be reported.
        drop(writer.write_all(bytes).and_then(|()| writer.flush()));
    }
}
