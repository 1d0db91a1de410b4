//! Testing utilities for hookwire.
//!
//! This module provides utilities to make testing handlers, sinks and
//! call sites easier.
//!
//! # Features
//!
//! - [`SharedBuffer`]: A clonable in-memory stream for asserting rendered output
//! - [`FailingWriter`]: A stream that rejects every write
//! - [`RecordingHandler`]: A handler that snapshots the arguments it sees
//! - [`CountingHandler`]: A handler that counts invocations

use hookwire_core::{Args, Handler, Hook};
use parking_lot::Mutex;
use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

// ============================================================================
// Shared Buffer
// ============================================================================

/// An in-memory stream whose clones share one buffer.
///
/// # Example
///
/// ```rust,ignore
/// let buf = SharedBuffer::new();
/// let sink = RenderSink::new(pattern, buf.clone());
/// sink.write(&args)?;
/// assert_eq!(buf.lines(), ["key=user:1"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, as lossy UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }

    /// Written lines without their terminators.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }

    /// Raw bytes written so far.
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.lock().clone()
    }

    /// Discard the contents.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Failing Writer
// ============================================================================

/// A stream whose writes and flushes always fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingWriter;

impl io::Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("write rejected"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::other("flush rejected"))
    }
}

// ============================================================================
// Recording Handler
// ============================================================================

/// A handler that records a snapshot of the arguments of every hook it sees.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingHandler::new();
/// let manager = Manager::builder()
///     .register_after_hook(recorder.clone())
///     .build();
///
/// manager.create_hook(ctx).run(|_| ());
/// assert_eq!(recorder.count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    seen: Arc<Mutex<Vec<Args>>>,
}

impl RecordingHandler {
    /// Create a new recording handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots recorded so far.
    pub fn records(&self) -> Vec<Args> {
        self.seen.lock().clone()
    }

    /// The most recent snapshot.
    pub fn last(&self) -> Option<Args> {
        self.seen.lock().last().cloned()
    }

    /// Number of hooks seen.
    pub fn count(&self) -> usize {
        self.seen.lock().len()
    }

    /// Clear all recorded snapshots.
    pub fn clear(&self) {
        self.seen.lock().clear();
    }
}

impl Handler for RecordingHandler {
    fn handle(&self, hook: &mut Hook) {
        self.seen.lock().push(hook.args().clone());
    }
}

// ============================================================================
// Counting Handler
// ============================================================================

/// A handler that counts how many times it was called.
#[derive(Debug, Clone, Default)]
pub struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    /// Create a new counting handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset the counter.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

impl Handler for CountingHandler {
    fn handle(&self, _hook: &mut Hook) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookwire_core::Context;
    use std::io::Write;

    #[test]
    fn shared_buffer_clones_share_contents() {
        let buf = SharedBuffer::new();
        let mut writer = buf.clone();
        writer.write_all(b"a\nb\n").unwrap();

        assert_eq!(buf.lines(), ["a", "b"]);
        buf.clear();
        assert!(buf.bytes().is_empty());
    }

    #[test]
    fn recording_and_counting_handlers() {
        let recorder = RecordingHandler::new();
        let counter = CountingHandler::new();
        let mut hook = Hook::new(Context::background());
        hook.add_arg("n", 1);

        recorder.handle(&mut hook);
        counter.handle(&mut hook);
        counter.handle(&mut hook);

        assert_eq!(recorder.count(), 1);
        assert_eq!(recorder.last().unwrap().i64("n"), 1);
        assert_eq!(counter.count(), 2);
        counter.reset();
        assert_eq!(counter.count(), 0);
    }
}
