//! Error types for notification dispatch.

use std::fmt;

/// Errors that can occur while configuring or running notification handlers.
///
/// None of these ever cross the engine boundary: handler faults are
/// contained by [`crate::handler::deliver`].
#[derive(Debug)]
pub enum NotifyError {
    /// Event sink failed to record an event.
    Sink(String),

    /// Decision policy failed to produce a decision.
    Policy {
        /// Callback the decision was requested for.
        callback: &'static str,
        /// Failure description.
        message: String,
    },

    /// Handler panicked while processing an event.
    HandlerPanicked(&'static str),

    /// Configuration could not be parsed.
    Config(String),

    /// Category name not recognised.
    UnknownCategory(String),

    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::Sink(msg) => write!(f, "Event sink error: {}", msg),
            NotifyError::Policy { callback, message } => {
                write!(f, "Decision policy error in {}: {}", callback, message)
            }
            NotifyError::HandlerPanicked(callback) => {
                write!(f, "Handler panicked in {}", callback)
            }
            NotifyError::Config(msg) => write!(f, "Configuration error: {}", msg),
            NotifyError::UnknownCategory(name) => {
                write!(f, "Unknown notification category: {}", name)
            }
            NotifyError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for NotifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NotifyError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for NotifyError {
    fn from(e: std::io::Error) -> Self {
        NotifyError::Io(e)
    }
}

impl From<toml::de::Error> for NotifyError {
    fn from(e: toml::de::Error) -> Self {
        NotifyError::Config(e.to_string())
    }
}
