//! In-memory logger that captures entries for later replay.
use std::sync::Mutex;

use super::types::Log;

/// A single captured log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// A stage header entry.
    Stage(String),
    /// An informational entry.
    Info(String),
    /// A debug entry.
    Debug(String),
    /// A warning entry.
    Warn(String),
    /// An error entry.
    Error(String),
    /// A dry-run entry.
    DryRun(String),
}

impl LogEntry {
    /// Lower-case level name (`"info"`, `"warn"`, ...).
    #[must_use]
    pub const fn level(&self) -> &'static str {
        match self {
            Self::Stage(_) => "stage",
            Self::Info(_) => "info",
            Self::Debug(_) => "debug",
            Self::Warn(_) => "warn",
            Self::Error(_) => "error",
            Self::DryRun(_) => "dry_run",
        }
    }

    /// The message text.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Stage(m)
            | Self::Info(m)
            | Self::Debug(m)
            | Self::Warn(m)
            | Self::Error(m)
            | Self::DryRun(m) => m,
        }
    }

    /// Re-emit this entry through `log` at its original level.
    fn replay(&self, log: &dyn Log) {
        match self {
            Self::Stage(msg) => log.stage(msg),
            Self::Info(msg) => log.info(msg),
            Self::Debug(msg) => log.debug(msg),
            Self::Warn(msg) => log.warn(msg),
            Self::Error(msg) => log.error(msg),
            Self::DryRun(msg) => log.dry_run(msg),
        }
    }
}

/// Implement the methods of [`Log`] by buffering each message into
/// `self.entries` as the corresponding [`LogEntry`] variant.
macro_rules! buffer_log_methods {
    ($($method:ident => $variant:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                if let Ok(mut guard) = self.entries.lock() {
                    guard.push(LogEntry::$variant(msg.to_string()));
                }
            }
        )+
    };
}

/// Captures log output in memory.
///
/// Commands that print machine-readable listings resolve with a
/// `BufferedLog` and replay its diagnostics after the listing, so the two
/// never interleave on stdout.
#[derive(Debug, Default)]
pub struct BufferedLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl BufferedLog {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every captured entry, in order.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Captured message texts, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.entries()
            .iter()
            .map(|e| e.message().to_string())
            .collect()
    }

    /// Return `true` if an entry at `level` contains `needle`.
    #[must_use]
    pub fn contains(&self, level: &str, needle: &str) -> bool {
        self.entries()
            .iter()
            .any(|e| e.level() == level && e.message().contains(needle))
    }

    /// Re-emit every captured entry through `log` and clear the buffer.
    pub fn replay(&self, log: &dyn Log) {
        let entries = match self.entries.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => return,
        };
        for entry in &entries {
            entry.replay(log);
        }
    }
}

impl Log for BufferedLog {
    buffer_log_methods! {
        stage   => Stage,
        info    => Info,
        debug   => Debug,
        warn    => Warn,
        error   => Error,
        dry_run => DryRun,
    }
}
