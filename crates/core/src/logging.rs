//! Category-based logging for the checker core.
//!
//! The core never prints directly; diagnostics go through [`log`], which is
//! filtered by a process-wide [`LogConfig`].
//!
//! # Architecture
//!
//! - **LogConfig**: Thread-safe global configuration using atomic operations
//! - **LogLevel**: Hierarchical log levels (Off < Error < Warn < Info < Debug < Trace)
//! - **LogCategory**: One category per pipeline stage (Collect, Archive, Verify, Report)
//! - **log()**: Common logging function, output goes to stderr or a log file
//!
//! Verification runs on a worker pool, so file output is handed to a
//! background writer thread and never blocks a worker on disk I/O.
//!
//! # Usage
//!
//! ```rust
//! use romcheck_core::logging::{log, LogCategory, LogLevel};
//!
//! log(LogCategory::Archive, LogLevel::Debug, || {
//!     format!("extracting {} entries", 3)
//! });
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};

/// Log level for controlling verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }
}

/// Log category, one per pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Input resolution and folder walking
    Collect,
    /// Archive extraction (zip and 7-zip backends)
    Archive,
    /// Header classification and the worker pool
    Verify,
    /// Table rendering
    Report,
}

impl LogCategory {
    const COUNT: usize = 4;

    /// Parse a category name (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "collect" => Some(LogCategory::Collect),
            "archive" => Some(LogCategory::Archive),
            "verify" => Some(LogCategory::Verify),
            "report" => Some(LogCategory::Report),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            LogCategory::Collect => 0,
            LogCategory::Archive => 1,
            LogCategory::Verify => 2,
            LogCategory::Report => 3,
        }
    }
}

/// Global logging configuration
pub struct LogConfig {
    /// Global log level (applies to all categories unless overridden)
    global_level: AtomicU8,
    /// Per-category overrides, `Off` meaning "use the global level"
    category_levels: [AtomicU8; LogCategory::COUNT],
    /// Channel to the background file writer, if a log file is configured
    log_sender: Mutex<Option<Sender<String>>>,
    log_writer: Mutex<Option<JoinHandle<()>>>,
    file_logging_enabled: AtomicBool,
}

impl LogConfig {
    fn new() -> Self {
        Self {
            global_level: AtomicU8::new(LogLevel::Off as u8),
            category_levels: [
                AtomicU8::new(LogLevel::Off as u8),
                AtomicU8::new(LogLevel::Off as u8),
                AtomicU8::new(LogLevel::Off as u8),
                AtomicU8::new(LogLevel::Off as u8),
            ],
            log_sender: Mutex::new(None),
            log_writer: Mutex::new(None),
            file_logging_enabled: AtomicBool::new(false),
        }
    }

    /// Get the global singleton instance
    pub fn global() -> &'static Self {
        use std::sync::OnceLock;
        static INSTANCE: OnceLock<LogConfig> = OnceLock::new();
        INSTANCE.get_or_init(LogConfig::new)
    }

    pub fn set_global_level(&self, level: LogLevel) {
        self.global_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn get_global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.category_levels[category.index()].store(level as u8, Ordering::Relaxed);
    }

    pub fn get_level(&self, category: LogCategory) -> LogLevel {
        LogLevel::from_u8(self.category_levels[category.index()].load(Ordering::Relaxed))
    }

    /// Check if a message should be logged for the given category and level
    ///
    /// A category with its own level set uses it; otherwise the global level
    /// applies.
    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        let category_level = self.get_level(category);
        if category_level != LogLevel::Off {
            level <= category_level
        } else {
            level <= self.get_global_level()
        }
    }

    /// Send log output to `path` (appending) instead of stderr.
    ///
    /// Starts a background writer thread. Calling this again replaces the
    /// previous writer, whose thread exits once its channel is dropped.
    pub fn set_log_file(&self, path: PathBuf) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let (sender, receiver) = channel::<String>();

        let writer = thread::Builder::new()
            .name("log-writer".to_string())
            .spawn(move || {
                let mut file = file;
                while let Ok(message) = receiver.recv() {
                    // Logging must never take the run down.
                    let _ = writeln!(file, "{}", message);
                    let _ = file.flush();
                }
            })?;

        *self
            .log_sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(sender);
        let previous = self
            .log_writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(writer);
        if let Some(previous) = previous {
            let _ = previous.join();
        }
        self.file_logging_enabled.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Stop logging to file and go back to stderr.
    ///
    /// Blocks until every queued message has been written.
    pub fn clear_log_file(&self) {
        self.file_logging_enabled.store(false, Ordering::Relaxed);
        *self
            .log_sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        let writer = self
            .log_writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(writer) = writer {
            let _ = writer.join();
        }
    }

    fn write_message(&self, message: String) {
        if self.file_logging_enabled.load(Ordering::Relaxed) {
            let log_sender = self
                .log_sender
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(sender) = log_sender.as_ref() {
                if let Err(unsent) = sender.send(message) {
                    eprintln!("{}", unsent.0);
                }
                return;
            }
            drop(log_sender);
            eprintln!("{}", message);
        } else {
            eprintln!("{}", message);
        }
    }
}

/// Log a message with the specified category and level
///
/// The message closure only runs when the category and level are enabled, so
/// formatting costs nothing on the default (Off) configuration.
pub fn log<F>(category: LogCategory, level: LogLevel, message_fn: F)
where
    F: FnOnce() -> String,
{
    let config = LogConfig::global();
    if config.should_log(category, level) {
        config.write_message(format!("[{:?}] {:?}: {}", category, level, message_fn()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("off"), Some(LogLevel::Off));
        assert_eq!(LogLevel::from_str("ERR"), Some(LogLevel::Error));
        assert_eq!(LogLevel::from_str("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("3"), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_str("Debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("trace"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::from_str("verbose"), None);
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Off < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }

    #[test]
    fn test_category_level_overrides_global() {
        let config = LogConfig::new();
        config.set_global_level(LogLevel::Error);
        config.set_level(LogCategory::Archive, LogLevel::Debug);

        assert!(config.should_log(LogCategory::Archive, LogLevel::Debug));
        assert!(!config.should_log(LogCategory::Verify, LogLevel::Warn));
        assert!(config.should_log(LogCategory::Verify, LogLevel::Error));
    }

    #[test]
    fn test_off_by_default() {
        let config = LogConfig::new();
        assert!(!config.should_log(LogCategory::Collect, LogLevel::Error));
    }

    #[test]
    fn test_log_category_parsing() {
        assert_eq!(LogCategory::from_str("archive"), Some(LogCategory::Archive));
        assert_eq!(LogCategory::from_str("VERIFY"), Some(LogCategory::Verify));
        assert_eq!(LogCategory::from_str("render"), None);
    }

    #[test]
    fn test_clearing_log_file_flushes_queued_messages() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("romcheck.log");
        let config = LogConfig::new();
        config.set_global_level(LogLevel::Info);
        config.set_log_file(path.clone()).expect("open log file");

        for i in 0..100 {
            config.write_message(format!("message {i}"));
        }
        config.clear_log_file();

        let contents = std::fs::read_to_string(&path).expect("read log");
        assert_eq!(contents.lines().count(), 100);
        assert!(contents.ends_with("message 99\n"));
    }
}
