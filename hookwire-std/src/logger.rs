//! # Logger Set
//!
//! Forwards one argument bag to every configured [`RenderSink`].
//!
//! Each sink compiles its own pattern, so the same record can be rendered
//! differently per stream (JSON for the file, a readable line for stdout).
//!
//! # Design Philosophy
//!
//! - **No early exit**: a failing sink never keeps the others from receiving
//!   the record or from being closed
//! - **Caller decides**: `print` reports the first failure and `close`
//!   reports all of them; neither panics

use crate::{
    config::RenderConfig,
    pattern::Pattern,
    render::{RenderMode, RenderSink},
    rolling::RollingFile,
};
use hookwire_core::{
    Args, BoxError, HookwireError, LoggerCloseError, PatternRegistry, RecordSink, RenderError,
};
use std::io;

/// A set of render sinks fed the same records.
#[derive(Debug, Default)]
pub struct Logger {
    sinks: Vec<RenderSink>,
}

impl Logger {
    /// A logger over the given sinks.
    pub fn new(sinks: Vec<RenderSink>) -> Self {
        Self { sinks }
    }

    /// Open the sinks described by `config`.
    ///
    /// # Errors
    ///
    /// A template compile failure or an invalid configuration yields
    /// [`HookwireError::Config`]; failing to open the log file yields
    /// [`HookwireError::Render`].
    pub fn from_config(
        config: &RenderConfig,
        registry: &PatternRegistry,
    ) -> Result<Self, HookwireError> {
        config.validate()?;
        let mut sinks = Vec::new();

        if config.stdout {
            let pattern = Pattern::compile(&config.stdout_pattern, registry)?;
            sinks.push(RenderSink::new(pattern, io::stdout()));
        }

        if config.file_enabled() {
            let pattern = Pattern::compile(&config.out_pattern, registry)?;
            let file = RollingFile::open(&config.out_dir, &config.out_file, config.rolling_config())
                .map_err(RenderError::from)?;
            let sink = match config.render_mode() {
                RenderMode::Sync => RenderSink::new(pattern, file),
                mode => RenderSink::with_mode(pattern, file, mode).map_err(RenderError::from)?,
            };
            tracing::debug!(
                path = %config.file_path().display(),
                buffered = sink.is_buffered(),
                "opened log file sink"
            );
            sinks.push(sink);
        }

        Ok(Self { sinks })
    }

    /// Add one more sink.
    pub fn with_sink(mut self, sink: RenderSink) -> Self {
        self.sinks.push(sink);
        self
    }

    /// The configured sinks.
    pub fn sinks(&self) -> &[RenderSink] {
        &self.sinks
    }

    /// Number of sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// True when no sink is configured.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Write `args` to every sink.
    ///
    /// Every sink is tried; the first failure is returned.
    pub fn print(&self, args: &Args) -> Result<(), RenderError> {
        let mut first = None;
        for sink in &self.sinks {
            if let Err(err) = sink.write(args) {
                tracing::warn!(
                    template = sink.pattern().template(),
                    error = %err,
                    "log sink write failed"
                );
                first.get_or_insert(err);
            }
        }
        first.map_or(Ok(()), Err)
    }

    /// Flush every sink.
    pub fn flush(&self) -> Result<(), RenderError> {
        let mut first = None;
        for sink in &self.sinks {
            if let Err(err) = sink.flush() {
                first.get_or_insert(err);
            }
        }
        first.map_or(Ok(()), Err)
    }

    /// Close every sink, collecting all failures.
    pub fn close(&self) -> Result<(), LoggerCloseError> {
        let mut errors = LoggerCloseError::default();
        for sink in &self.sinks {
            if let Err(err) = sink.close() {
                errors.push(err);
            }
        }
        errors.into_result()
    }
}

impl RecordSink for Logger {
    fn print(&self, args: &Args) -> Result<(), BoxError> {
        Logger::print(self, args).map_err(Into::into)
    }

    fn close(&self) -> Result<(), BoxError> {
        Logger::close(self).map_err(Into::into)
    }
}
