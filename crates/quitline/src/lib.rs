//! One application entry point, three execution modes.
//!
//! `quitline` runs a single work function as a plain foreground process, as
//! a POSIX process that quits cooperatively on `SIGINT`/`SIGTERM`, or as a
//! Windows service driven by the Service Control Manager. Whatever the mode,
//! the work function sees the same contract: it is invoked at most once, and
//! it polls [`shall_quit`] at its own cadence, returning once a quit has been
//! requested.
//!
//! ```no_run
//! use quitline::{ServiceConfig, shall_quit};
//!
//! let config = ServiceConfig::from_env("ticker").expect("valid program name");
//! let code = quitline::run(config, || {
//!     while !shall_quit() {
//!         std::thread::sleep(std::time::Duration::from_millis(10));
//!     }
//! });
//! std::process::exit(code);
//! ```
//!
//! ## Diagnostics
//!
//! Lifecycle diagnostics are written to a single [`LogSink`], one flushed
//! line per message in the form `<program-name>: <level>: <text>`. The sink
//! targets `<log_root>/<program-name>.log` and falls back to standard error
//! when the file cannot be opened; disabled mode always writes to standard
//! error. `tracing` events from the work function are routed into the same
//! sink.
//!
//! ## Windows services
//!
//! The [`scm`] module holds the service status state machine. The bridge is
//! platform-neutral: on Windows it is bound to the real SCM, elsewhere it can
//! be driven through [`scm::ServiceControlApi`] doubles.

pub mod config;
pub mod context;
pub mod defaults;
pub mod driver;
pub mod error;
pub mod quit;
pub mod scm;
pub mod sink;
pub mod telemetry;

pub use config::{ConfigError, LifecycleMode, ServiceConfig};
pub use context::LifecycleContext;
pub use driver::{LifecycleDriver, WorkFn, driver_for, run, run_with_context};
pub use error::{LifecycleError, ScmError, ScmOperation, exit_code};
pub use quit::{QuitLatch, QuitProbe, shall_quit};
pub use sink::{LogLevel, LogSink, SinkDestination};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
