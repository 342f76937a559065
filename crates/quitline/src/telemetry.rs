//! Routes `tracing` events emitted by the work function into the log sink.
//!
//! Events are rendered in the sink's own line format so application
//! diagnostics and lifecycle diagnostics read the same in the log file.

use std::io::{self, Write};

use once_cell::sync::OnceCell;
use tracing::{Event, Level, Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent, FormatFields, MakeWriter, format};
use tracing_subscriber::registry::LookupSpan;

use crate::sink::{LogLevel, LogSink};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the sink-backed subscriber as the global default.
///
/// Repeated calls are idempotent: only the first invocation installs the
/// subscriber.
///
/// # Errors
///
/// Fails when the filter directive is invalid or another global subscriber
/// is already installed.
pub fn initialise(sink: &LogSink, filter: &str) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| {
            let subscriber = subscriber(sink, filter)?;
            tracing::subscriber::set_global_default(subscriber)
                .map_err(TelemetryError::Subscriber)
        })
        .map(|_| TelemetryHandle)
}

/// Builds a subscriber that writes sink-formatted lines for events passing
/// `filter`.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the directive cannot be parsed.
pub fn subscriber(
    sink: &LogSink,
    filter: &str,
) -> Result<Box<dyn Subscriber + Send + Sync>, TelemetryError> {
    let env_filter =
        EnvFilter::try_new(filter).map_err(|error| TelemetryError::Filter(error.to_string()))?;
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(sink.clone())
        .event_format(SinkLineFormat::new(sink.program_name()))
        .finish();
    Ok(Box::new(subscriber))
}

/// Maps `tracing` levels onto the sink's two markers.
pub(crate) fn level_marker(level: Level) -> LogLevel {
    if level <= Level::WARN {
        LogLevel::Error
    } else {
        LogLevel::Debug
    }
}

/// Event formatter producing `<program-name>: <level>: <fields>`.
#[derive(Debug, Clone)]
pub struct SinkLineFormat {
    program: String,
}

impl SinkLineFormat {
    /// Formatter prefixing lines with `program`.
    #[must_use]
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_owned(),
        }
    }
}

impl<S, N> FormatEvent<S, N> for SinkLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let level = level_marker(*event.metadata().level());
        write!(writer, "{}: {level}: ", self.program)?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter {
            sink: self.clone(),
            buffer: Vec::new(),
        }
    }
}

/// Buffers one formatted event and hands it to the sink as a single line
/// when dropped.
#[derive(Debug)]
pub struct SinkWriter {
    sink: LogSink,
    buffer: Vec<u8>,
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for SinkWriter {
    fn drop(&mut self) {
        if !self.buffer.is_empty() {
            self.sink.write_bytes(&self.buffer);
        }
    }
}
