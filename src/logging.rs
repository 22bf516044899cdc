/// Structured logging for the flood risk service
///
/// Provides component-tagged diagnostics with timestamps and severity
/// levels. Supports console output and an optional plain-text file.
/// This is separate from the JSON-lines risk journal (see `journal`),
/// which is a data product rather than a diagnostics stream.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;

use crate::model::FloodError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = FloodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(FloodError::Config(format!("unknown log level: {}", other))),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Pipeline stage a log line originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Generator,
    Trainer,
    Sensor,
    Risk,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Generator => write!(f, "GEN"),
            Component::Trainer => write!(f, "TRAIN"),
            Component::Sensor => write!(f, "SENSOR"),
            Component::Risk => write!(f, "RISK"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>) {
        let logger = Logger { min_level, log_file };
        if let Ok(mut guard) = LOGGER.lock() {
            *guard = Some(logger);
        }
    }

    /// Formats a file log line.
    fn format_entry(level: LogLevel, component: Component, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        format!("{} {} {}: {}", timestamp, level, component, message)
    }

    fn log(&self, level: LogLevel, component: Component, message: &str) {
        if level < self.min_level {
            return;
        }

        match level {
            LogLevel::Error => eprintln!("   ✗ {}: {}", component, message),
            LogLevel::Warning => eprintln!("   ⚠ {}: {}", component, message),
            LogLevel::Info => println!("   {}", message),
            LogLevel::Debug => println!("   [DEBUG] {}: {}", component, message),
        }

        if let Some(ref path) = self.log_file {
            let entry = Self::format_entry(level, component, message);
            if let Err(e) = Self::append_to_file(path, &entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>) {
    Logger::init(min_level, log_file.map(String::from));
}

fn dispatch(level: LogLevel, component: Component, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, component, message);
        }
    }
}

/// Log a general informational message
pub fn info(component: Component, message: &str) {
    dispatch(LogLevel::Info, component, message);
}

/// Log a warning message
pub fn warn(component: Component, message: &str) {
    dispatch(LogLevel::Warning, component, message);
}

/// Log an error message
pub fn error(component: Component, message: &str) {
    dispatch(LogLevel::Error, component, message);
}

/// Log a debug message
pub fn debug(component: Component, message: &str) {
    dispatch(LogLevel::Debug, component, message);
}

// ---------------------------------------------------------------------------
// Demo Summary Logging
// ---------------------------------------------------------------------------

/// Log how many demo readings landed in each risk tier.
///
/// Any high-risk reading raises the summary to a warning.
pub fn log_tier_summary(low: usize, medium: usize, high: usize) {
    let message = format!(
        "Demo complete: {} BAIXO, {} MÉDIO, {} ALTO",
        low, medium, high
    );

    if high > 0 {
        warn(Component::Risk, &message);
    } else {
        info(Component::Risk, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("info".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("Debug".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_format_entry_contains_level_and_component() {
        let entry = Logger::format_entry(LogLevel::Warning, Component::Trainer, "slow fit");
        assert!(entry.contains("WARN"));
        assert!(entry.contains("TRAIN"));
        assert!(entry.ends_with("slow fit"));
    }

    #[test]
    fn test_file_logging_respects_min_level() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("diagnostics.log");
        let logger = Logger {
            min_level: LogLevel::Warning,
            log_file: Some(path.to_string_lossy().into_owned()),
        };

        logger.log(LogLevel::Info, Component::System, "ignored");
        logger.log(LogLevel::Error, Component::System, "kept");

        let contents = std::fs::read_to_string(&path).expect("log file should exist");
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("kept"));
    }
}
