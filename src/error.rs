//! Unified error types for Flowstate.
//!
//! Only one error kind belongs to the domain itself: `InvalidDomain`,
//! raised when a perception event names a front-end domain we do not know.
//! The remaining variants cover the ambient stack (config files, event
//! logs, wire decoding). Event sinks are side-channel only, so their
//! failures go through [`FailOpen`] and never reach the caller of
//! `FlowEngine::process`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Flowstate operations.
#[derive(Error, Debug)]
pub enum FlowError {
    /// The event's domain is not one of `game`, `narrative`, `dao`.
    #[error("invalid domain '{value}': expected one of game, narrative, dao")]
    InvalidDomain { value: String },

    /// Structural decode/encode failures (missing fields, wrong types).
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading or validation errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// I/O errors from the event log or config files.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O errors with no file behind them (stdin, pipes).
    #[error("i/o error: {source}")]
    Io {
        #[source]
        source: io::Error,
    },

    /// Event sink failures.
    #[error("sink error: {message}")]
    Sink { message: String },
}

/// A specialized Result type for Flowstate operations.
pub type Result<T> = std::result::Result<T, FlowError>;

impl FlowError {
    /// Create an invalid domain error carrying the offending value.
    pub fn invalid_domain(value: impl Into<String>) -> Self {
        Self::InvalidDomain {
            value: value.into(),
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a sink error.
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink {
            message: message.into(),
        }
    }

    /// Whether this error came from validating an event.
    ///
    /// Validation failures are not transient; callers should not retry them.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidDomain { .. } | Self::Serde { .. })
    }
}

impl From<io::Error> for FlowError {
    fn from(err: io::Error) -> Self {
        Self::Io { source: err }
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Log the error and continue with a safe value. Used for best-effort
/// side channels such as event sinks.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}

/// Exit codes for the `flowstate` CLI.
pub mod exit_codes {
    /// Every event was accepted.
    pub const SUCCESS: i32 = 0;

    /// The command could not run (unreadable input, bad config).
    pub const FAILURE: i32 = 1;

    /// At least one event was rejected by validation.
    pub const INVALID_INPUT: i32 = 2;
}
