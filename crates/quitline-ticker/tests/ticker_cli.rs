//! Integration tests for the `quitline-ticker` binary.
//!
//! Disabled mode is exercised through standard error; the POSIX scenario
//! sends a real `SIGINT` to the child and reads its log file.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use predicates::str::contains;
use rstest::rstest;

#[rstest]
fn disabled_mode_logs_to_stderr_and_stops_at_the_limit() {
    let mut command = cargo_bin_cmd!("quitline-ticker");
    command
        .env("QUITLINE_MODE", "disabled")
        .env("TICKER_LIMIT", "3")
        .env("TICKER_INTERVAL_MS", "1")
        .env_remove("QUITLINE_LOG_FILTER");
    command
        .assert()
        .success()
        .stderr(contains("quitline-ticker: debug: main: Launching ..."))
        .stderr(contains("quitline-ticker: debug: ticker started interval_ms=1"))
        .stderr(contains("quitline-ticker: debug: tick limit reached ticks=3"))
        .stderr(contains("quitline-ticker: debug: main: Quitting ..."));
}

#[rstest]
#[case("QUITLINE_MODE", "launchd", "unknown lifecycle mode 'launchd'")]
#[case("TICKER_LIMIT", "many", "invalid TICKER_LIMIT value 'many'")]
fn invalid_settings_fail_before_launch(
    #[case] variable: &str,
    #[case] value: &str,
    #[case] message: &str,
) {
    let mut command = cargo_bin_cmd!("quitline-ticker");
    command.env("QUITLINE_MODE", "disabled").env(variable, value);
    command
        .assert()
        .code(1)
        .stderr(contains(format!("quitline-ticker: error: main: {message}")))
        .stderr(contains("Launching").not());
}

#[cfg(unix)]
mod posix {
    use std::fs;
    use std::path::Path;
    use std::process::{Command, Stdio};
    use std::thread;
    use std::time::{Duration, Instant};

    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;
    use tempfile::TempDir;

    const WAIT_TIMEOUT: Duration = Duration::from_secs(10);
    const POLL_INTERVAL: Duration = Duration::from_millis(10);

    fn wait_for_line(path: &Path, needle: &str) -> bool {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        while Instant::now() < deadline {
            if fs::read_to_string(path).is_ok_and(|log| log.contains(needle)) {
                return true;
            }
            thread::sleep(POLL_INTERVAL);
        }
        false
    }

    #[test]
    fn interrupt_stops_the_ticker_cooperatively() {
        let log_root = TempDir::new().expect("temp dir");
        let log_path = log_root.path().join("quitline-ticker.log");
        let mut child = Command::new(env!("CARGO_BIN_EXE_quitline-ticker"))
            .env("QUITLINE_MODE", "posix_signal")
            .env("QUITLINE_LOG_ROOT", log_root.path())
            .env_remove("TICKER_LIMIT")
            .env_remove("QUITLINE_LOG_FILTER")
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn ticker");

        assert!(
            wait_for_line(&log_path, "ticker started"),
            "ticker never started"
        );
        let pid = i32::try_from(child.id()).expect("pid fits in i32");
        kill(Pid::from_raw(pid), Signal::SIGINT).expect("send SIGINT");

        let deadline = Instant::now() + WAIT_TIMEOUT;
        let status = loop {
            if let Some(status) = child.try_wait().expect("poll ticker") {
                break status;
            }
            if Instant::now() >= deadline {
                child.kill().expect("kill hung ticker");
                panic!("ticker ignored SIGINT");
            }
            thread::sleep(POLL_INTERVAL);
        };

        assert!(status.success(), "ticker exited with {status:?}");
        let log = fs::read_to_string(&log_path).expect("read ticker log");
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(
            lines.first().copied(),
            Some("quitline-ticker: debug: main: Launching ...")
        );
        assert!(log.contains("quitline-ticker: debug: quit requested ticks="));
        assert_eq!(
            lines.last().copied(),
            Some("quitline-ticker: debug: main: Quitting ...")
        );
    }
}
