//! Error types for hookwire.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`HookwireError`] - Top-level error type for all hookwire operations
//! - [`ConfigError`] - Construction-time errors (fatal by contract)
//! - [`RenderError`] - Errors from writing rendered records
//! - [`LoggerCloseError`] - Aggregated errors from closing every sink

use std::fmt;
use std::io;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all hookwire operations.
#[derive(Error, Debug)]
pub enum HookwireError {
    /// The pipeline was configured incorrectly.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A record could not be rendered to its stream.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// One or more sinks failed to close.
    #[error(transparent)]
    Close(#[from] LoggerCloseError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Errors raised while assembling a manager or compiling a template.
///
/// These are fatal: the composition root is expected to abort on them
/// rather than continue with a half-built pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A pattern registry tried to claim a reserved template character.
    #[error("pattern key '{0}' is reserved")]
    ReservedKey(char),

    /// A log hook was already registered on this manager.
    #[error("log hook already registered; only one log sink is allowed per manager")]
    DuplicateLogHook,

    /// The render configuration could not be used.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that can occur when writing a rendered record.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The underlying stream rejected the write.
    #[error("stream write failed: {0}")]
    Io(#[from] io::Error),

    /// The sink was already closed.
    #[error("render sink is closed")]
    Closed,

    /// The background flusher thread died before draining.
    #[error("background flusher panicked")]
    FlusherPanicked,
}

/// All failures collected while closing a set of sinks.
#[derive(Debug, Default)]
pub struct LoggerCloseError {
    errors: Vec<RenderError>,
}

impl LoggerCloseError {
    /// Record one more failure.
    pub fn push(&mut self, err: RenderError) {
        self.errors.push(err);
    }

    /// The collected failures, in sink order.
    pub fn errors(&self) -> &[RenderError] {
        &self.errors
    }

    /// True when nothing failed.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for LoggerCloseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sink(s) failed to close", self.errors.len())?;
        for (i, err) in self.errors.iter().enumerate() {
            write!(f, "{}{err}", if i == 0 { ": " } else { "; " })?;
        }
        Ok(())
    }
}

impl std::error::Error for LoggerCloseError {}

// Convenience conversions
impl From<BoxError> for HookwireError {
    fn from(err: BoxError) -> Self {
        HookwireError::Custom(err)
    }
}
