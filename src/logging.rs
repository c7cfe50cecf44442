/// Structured logging for the drainage flood control service
///
/// Provides context-rich logging with node/location identifiers,
/// timestamps, and severity levels. Supports both console output
/// and file-based logging for long-running simulator sessions.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

use crate::model::EngineError;

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

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Ingest,
    Scoring,
    Strategy,
    Catalog,
    Weather,
    Simulator,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Ingest => write!(f, "INGEST"),
            Component::Scoring => write!(f, "SCORE"),
            Component::Strategy => write!(f, "STRAT"),
            Component::Catalog => write!(f, "CATALOG"),
            Component::Weather => write!(f, "OWM"),
            Component::Simulator => write!(f, "SIM"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - bad input or an unconfigured location
    Expected,
    /// Unexpected failure - indicates service degradation or configuration issue
    Unexpected,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Process logger. Holds no domain state.
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        *LOGGER.lock().unwrap_or_else(PoisonError::into_inner) = Some(logger);
    }

    fn log(&self, level: LogLevel, component: Component, id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let id_part = id_tag(id);
        let log_entry = format_entry(level, component, &id_part, message);

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, id_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, id_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}{}: {}", component, id_part, message),
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

/// ` [drain_a01]`, or empty when there is no id.
fn id_tag(id: Option<&str>) -> String {
    id.map(|s| format!(" [{}]", s)).unwrap_or_default()
}

/// `2025-07-15 09:30:00 UTC WARN SCORE [drain_a01]: message`
fn format_entry(level: LogLevel, component: Component, id_part: &str, message: &str) -> String {
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    format!("{} {} {}{}: {}", timestamp, level, component, id_part, message)
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn emit(level: LogLevel, component: Component, id: Option<&str>, message: &str) {
    let guard = LOGGER.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(logger) = guard.as_ref() {
        logger.log(level, component, id, message);
    }
}

/// Log a general informational message
pub fn info(component: Component, id: Option<&str>, message: &str) {
    emit(LogLevel::Info, component, id, message);
}

/// Log a warning message
pub fn warn(component: Component, id: Option<&str>, message: &str) {
    emit(LogLevel::Warning, component, id, message);
}

/// Log an error message
pub fn error(component: Component, id: Option<&str>, message: &str) {
    emit(LogLevel::Error, component, id, message);
}

/// Log a debug message
pub fn debug(component: Component, id: Option<&str>, message: &str) {
    emit(LogLevel::Debug, component, id, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a pipeline failure. Only a missing model points at a
/// deployment problem; everything else is a bad request or unknown id.
pub fn classify_engine_failure(err: &EngineError) -> FailureType {
    match err {
        EngineError::ModelUnavailable(_) => FailureType::Unexpected,
        EngineError::ConfigurationMissing(_)
        | EngineError::MalformedInput(_)
        | EngineError::NodeNotFound(_) => FailureType::Expected,
    }
}

/// Log a pipeline failure with automatic classification
pub fn log_engine_failure(component: Component, id: Option<&str>, operation: &str, err: &EngineError) {
    let failure_type = classify_engine_failure(err);
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Expected => warn(component, id, &message),
        FailureType::Unexpected => error(component, id, &message),
    }
}

// ---------------------------------------------------------------------------
// Cycle Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one ingestion or status cycle
pub fn log_cycle_summary(component: Component, total: usize, successful: usize, failed: usize) {
    let message = format!(
        "Cycle complete: {}/{} successful, {} failed",
        successful, total, failed
    );

    if failed == 0 {
        info(component, None, &message);
    } else if successful == 0 {
        error(component, None, &message);
    } else {
        warn(component, None, &message);
    }
}
