#![allow(dead_code)]

use hookwire::{
    Args, Hook, Logger, Pattern, PatternRegistry, PatternResult, RenderSink, keys,
    standard_registry, testing::SharedBuffer,
};
use std::sync::{Arc, Mutex};

// ============================================================================
// Event Trail
// ============================================================================

/// Ordered trail of events shared between handlers and the test body.
#[derive(Clone, Default)]
pub struct Trail(Arc<Mutex<Vec<String>>>);

impl Trail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// A handler that pushes `tag` plus whether `key` was set at that point.
    pub fn observer(&self, tag: &'static str, key: &'static str) -> impl Fn(&mut Hook) + use<> {
        let trail = self.clone();
        move |hook: &mut Hook| {
            let seen = if hook.args().contains(key) { "set" } else { "unset" };
            trail.push(format!("{tag}:{key}={seen}"));
        }
    }
}

// ============================================================================
// Loggers
// ============================================================================

/// A logger with one in-memory sink rendering `template` through the
/// standard registry.
pub fn buffer_logger(template: &str) -> (Logger, SharedBuffer) {
    let buf = SharedBuffer::new();
    let pattern = Pattern::compile(template, &standard_registry()).unwrap();
    let logger = Logger::default().with_sink(RenderSink::new(pattern, buf.clone()));
    (logger, buf)
}

/// The two-function registry of the rendering scenarios.
pub fn title_registry() -> PatternRegistry {
    PatternRegistry::new()
        .with('T', |args: &Args| match args.time("time") {
            Some(t) => PatternResult::new("time", t.format("%Y/%m/%d %H:%M:%S%.3f").to_string()),
            None => PatternResult::skip("time"),
        })
        .with('t', |_: &Args| PatternResult::new("title", "RENDER"))
}

/// Args of a finished cache call.
pub fn cache_call(command: &str) -> Args {
    [
        (keys::COMMAND_NAME, command),
        (keys::KEY, "session:42"),
        (keys::UUID, "req-1"),
    ]
    .into_iter()
    .collect()
}
