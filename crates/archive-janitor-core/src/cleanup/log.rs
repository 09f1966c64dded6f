use chrono::{DateTime, Local};
use std::fmt;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        })
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn render(&self) -> String {
        format!(
            "[{}] [{}] {}\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level,
            self.message
        )
    }
}

/// Ordered transcript of one cleanup run. Every entry is also forwarded to `tracing`.
#[derive(Debug, Default)]
pub struct CleanupLog {
    entries: Vec<LogEntry>,
}

impl CleanupLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Info => info!(target: "cleanup", "{}", message),
            LogLevel::Warn => warn!(target: "cleanup", "{}", message),
            LogLevel::Error => error!(target: "cleanup", "{}", message),
        }
        self.entries.push(LogEntry {
            timestamp: Local::now(),
            level,
            message,
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message);
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.message.contains(needle))
    }

    pub fn transcript(&self) -> String {
        self.entries.iter().map(LogEntry::render).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_format() {
        let mut log = CleanupLog::new();
        log.info("Starting cleanup task (LIVE)");
        log.error("boom");

        let transcript = log.transcript();
        let lines: Vec<&str> = transcript.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("] [INFO] Starting cleanup task (LIVE)"));
        assert!(lines[1].ends_with("] [ERROR] boom"));
        // "[YYYY-MM-DD HH:MM:SS]"
        assert_eq!(&lines[0][0..1], "[");
        assert_eq!(&lines[0][20..21], "]");
        assert!(transcript.ends_with('\n'));
    }
}
