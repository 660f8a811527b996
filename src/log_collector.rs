//! Decoupled logging pipeline for provisioning runs.
//!
//! Every `log::` call lands in two places: a per-run file under the log
//! directory and the operator's terminal.
//!
//! # Architecture
//!
//! ```text
//! log::info!() / log::warn!() / ...
//!     |
//! [LogCollector] (non-blocking, crossbeam unbounded)
//!     |
//! [Disk persister thread] ---> logs/bootstrap_<ts>.log (every line)
//!     |
//!     +--> stderr (lines at or above the console level)
//! ```
//!
//! The persister is an OS thread, not a tokio task, so lines logged from
//! blocking sections or nested runtimes still reach disk.

use chrono::Local;
use crossbeam_channel::{unbounded, Sender};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Internal log line or special marker
enum LogMessage {
    Line(LogLine),
    /// Flush marker with channel sender to signal completion
    Flush(std::sync::mpsc::Sender<()>),
}

/// Ensure the logs directory exists
pub fn ensure_logs_dir_exists(log_dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(log_dir)
        .map_err(|e| format!("Failed to create logs directory: {}", e))?;
    Ok(())
}

/// Per-run log file name: `bootstrap_<YYYYmmdd_HHMMSS>.log`
pub fn session_file_name() -> String {
    format!("bootstrap_{}.log", Local::now().format("%Y%m%d_%H%M%S"))
}

/// A log line with metadata
#[derive(Clone, Debug)]
pub struct LogLine {
    pub message: String,
    pub level: Level,
    /// Timestamp of when the log was created
    pub timestamp: String,
}

impl LogLine {
    pub fn new(level: Level, message: String) -> Self {
        LogLine {
            message,
            level,
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
        }
    }

    fn file_format(&self) -> String {
        format!("[{}] [{}] {}\n", self.timestamp, self.level, self.message)
    }

    fn console_format(&self) -> String {
        match self.level {
            Level::Info => format!("{}\n", self.message),
            level => format!("[{}] {}\n", level, self.message),
        }
    }
}

/// Unified logger that persists every line and echoes to the terminal
pub struct LogCollector {
    /// crossbeam unbounded sender; usable from any thread or runtime
    tx: Sender<LogMessage>,
    log_path: PathBuf,
    max_level: LevelFilter,
}

impl LogCollector {
    /// Create the collector and its disk persister thread.
    ///
    /// `max_level` gates both sinks; `console_level` additionally filters
    /// the terminal echo.
    pub fn new(
        log_dir: PathBuf,
        max_level: LevelFilter,
        console_level: LevelFilter,
    ) -> Result<Self, String> {
        ensure_logs_dir_exists(&log_dir)?;

        let log_path = log_dir.join(session_file_name());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| format!("Failed to create log file: {}", e))?;

        let (tx, rx) = unbounded::<LogMessage>();

        std::thread::spawn(move || {
            while let Ok(msg) = rx.recv() {
                match msg {
                    LogMessage::Line(line) => {
                        let _ = file.write_all(line.file_format().as_bytes());

                        if line.level <= console_level {
                            let _ = std::io::stderr().write_all(line.console_format().as_bytes());
                        }
                    }
                    LogMessage::Flush(done) => {
                        let _ = file.flush();
                        let _ = file.sync_data();
                        let _ = std::io::stderr().flush();
                        let _ = done.send(());
                    }
                }
            }
        });

        Ok(LogCollector {
            tx,
            log_path,
            max_level,
        })
    }

    /// Path of the file receiving this run's lines
    pub fn session_log_path(&self) -> PathBuf {
        self.log_path.clone()
    }

    /// Send a log line (non-blocking)
    pub fn log_line(&self, line: LogLine) {
        let _ = self.tx.send(LogMessage::Line(line));
    }

    /// Wait for all pending lines to be written to disk.
    ///
    /// Call before the process exits so the final status line is persisted.
    pub async fn wait_for_empty(&self) -> Result<(), String> {
        let (tx, rx) = std::sync::mpsc::channel::<()>();

        self.tx
            .send(LogMessage::Flush(tx))
            .map_err(|e| format!("Failed to send flush marker: {}", e))?;

        tokio::task::spawn_blocking(move || rx.recv())
            .await
            .map_err(|e| format!("Flush task failed: {}", e))?
            .map_err(|e| format!("Flush signal interrupted: {}", e))
    }

    /// Install a clone of this collector as the global `log` backend.
    pub fn install(&self) -> Result<(), String> {
        log::set_boxed_logger(Box::new(self.clone()))
            .map(|()| log::set_max_level(self.max_level))
            .map_err(|e| format!("Failed to install logger: {}", e))
    }
}

impl Clone for LogCollector {
    fn clone(&self) -> Self {
        LogCollector {
            tx: self.tx.clone(),
            log_path: self.log_path.clone(),
            max_level: self.max_level,
        }
    }
}

/// Wires all log::info!(), log::warn!(), log::error!() calls into LogCollector
impl Log for LogCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.log_line(LogLine::new(record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}
