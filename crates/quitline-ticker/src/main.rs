//! Demonstration service built on `quitline`.
//!
//! The work function ticks at a fixed interval and returns once a
//! cooperative quit is requested. Run it in the foreground with
//! `QUITLINE_MODE=disabled` and a `TICKER_LIMIT`, or under a signal or
//! service manager with the platform default mode.

use std::env;
use std::num::ParseIntError;
use std::thread;
use std::time::Duration;

use quitline::{ConfigError, LogSink, ServiceConfig, shall_quit};
use thiserror::Error;
use tracing::info;

const PROGRAM: &str = "quitline-ticker";
const INTERVAL_ENV_VAR: &str = "TICKER_INTERVAL_MS";
const LIMIT_ENV_VAR: &str = "TICKER_LIMIT";
const DEFAULT_INTERVAL_MS: u64 = 10;

#[derive(Debug, Error)]
enum TickerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid {variable} value '{value}': {source}")]
    InvalidNumber {
        variable: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

#[derive(Debug, Clone, Copy)]
struct TickerSettings {
    interval: Duration,
    limit: Option<u64>,
}

impl TickerSettings {
    fn from_env() -> Result<Self, TickerError> {
        let interval_ms = read_number(INTERVAL_ENV_VAR)?.unwrap_or(DEFAULT_INTERVAL_MS);
        Ok(Self {
            interval: Duration::from_millis(interval_ms),
            limit: read_number(LIMIT_ENV_VAR)?,
        })
    }
}

fn read_number(variable: &'static str) -> Result<Option<u64>, TickerError> {
    match env::var(variable) {
        Ok(value) if !value.is_empty() => value
            .parse()
            .map(Some)
            .map_err(|source| TickerError::InvalidNumber {
                variable,
                value,
                source,
            }),
        _ => Ok(None),
    }
}

fn tick(settings: TickerSettings) {
    let interval_ms = u64::try_from(settings.interval.as_millis()).unwrap_or(u64::MAX);
    info!(interval_ms, "ticker started");
    let mut ticks: u64 = 0;
    while !shall_quit() {
        if settings.limit.is_some_and(|limit| ticks >= limit) {
            info!(ticks, "tick limit reached");
            return;
        }
        thread::sleep(settings.interval);
        ticks = ticks.saturating_add(1);
    }
    info!(ticks, "quit requested");
}

fn launch() -> Result<i32, TickerError> {
    let config = ServiceConfig::from_env(PROGRAM)?;
    let settings = TickerSettings::from_env()?;
    Ok(quitline::run(config, move || tick(settings)))
}

fn main() {
    let code = launch().unwrap_or_else(|error| {
        LogSink::stderr(PROGRAM).error(format_args!("main: {error}"));
        1
    });
    std::process::exit(code);
}
