//! Log handler.

use hookwire_core::{Handler, Hook};

/// Post-handler that prints the hook's arguments as one record through the
/// hook's logger.
///
/// The handler holds no logger of its own: it always prints to whatever
/// [`Hook::logger`] returns, so the logger a manager closes is the logger
/// records went to. Hooks without a logger are skipped.
///
/// Register it last so the record carries everything earlier handlers
/// added (duration, end time, error).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogHandler;

impl LogHandler {
    /// Create the handler.
    pub fn new() -> Self {
        Self
    }
}

impl Handler for LogHandler {
    fn handle(&self, hook: &mut Hook) {
        let Some(logger) = hook.logger() else {
            return;
        };
        if let Err(err) = logger.print(hook.args()) {
            tracing::warn!(error = %err, "failed to log hook record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{logger::Logger, pattern::Pattern, render::RenderSink, testing::SharedBuffer};
    use hookwire_core::{Args, Context, PatternRegistry, PatternResult, RecordSink};
    use std::sync::Arc;

    #[test]
    fn prints_through_the_hook_logger() {
        let registry = PatternRegistry::new()
            .with('r', |args: &Args| PatternResult::new("rows", args.i64("rows")));
        let buf = SharedBuffer::new();
        let logger = Logger::default()
            .with_sink(RenderSink::new(Pattern::compile("rows=%r", &registry).unwrap(), buf.clone()));

        let mut hook = Hook::new(Context::background()).with_logger(Arc::new(logger) as Arc<dyn RecordSink>);
        hook.add_arg("rows", 12);
        LogHandler::new().handle(&mut hook);

        assert_eq!(buf.contents(), "rows=12\n");
    }

    #[test]
    fn hook_without_logger_is_skipped() {
        let mut hook = Hook::new(Context::background());
        hook.add_arg("rows", 1);
        LogHandler::new().handle(&mut hook);
        assert!(hook.logger().is_none());
    }
}
