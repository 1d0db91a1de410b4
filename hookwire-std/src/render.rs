//! # Render Sink
//!
//! A compiled [`Pattern`] bound to one output stream.
//!
//! # Modes
//!
//! - [`RenderMode::Sync`]: every record is written under a mutex with a
//!   single `write_all`, so concurrent records never interleave.
//! - [`RenderMode::Buffered`]: records are rendered on the calling thread and
//!   handed to a background flusher over a channel. The flusher batches them
//!   and writes on a timer or once the batch reaches its capacity.
//!
//! Closing a buffered sink stops accepting records, lets the flusher drain
//! everything already queued, and reports the final write's outcome. If that
//! write fails the number of lost bytes is logged.

use crate::pattern::Pattern;
use crossbeam_channel::{Receiver, Sender, select, tick, unbounded};
use hookwire_core::{Args, RenderError};
use parking_lot::{Mutex, RwLock};
use std::{
    fmt, io,
    io::Write,
    sync::atomic::{AtomicBool, Ordering},
    thread::{self, JoinHandle},
    time::Duration,
};

/// Default flush period of a buffered sink.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Default batch size, in bytes, that triggers an early flush.
pub const DEFAULT_BUFFER_CAPACITY: usize = 32 * 1024;

/// How a [`RenderSink`] delivers records to its stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Write each record on the calling thread.
    #[default]
    Sync,
    /// Queue records for a background flusher.
    Buffered {
        /// Period between timed flushes.
        flush_interval: Duration,
        /// Pending bytes that force a flush before the timer fires.
        capacity: usize,
    },
}

impl RenderMode {
    /// Buffered mode with default interval and capacity.
    pub fn buffered() -> Self {
        RenderMode::Buffered {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

enum Command {
    Record(Vec<u8>),
    Flush(Sender<io::Result<()>>),
}

enum Target {
    Sync(Mutex<Box<dyn Write + Send>>),
    Buffered {
        tx: RwLock<Option<Sender<Command>>>,
        handle: Mutex<Option<JoinHandle<io::Result<()>>>>,
    },
}

/// A compiled pattern writing to one stream.
pub struct RenderSink {
    pattern: Pattern,
    target: Target,
    closed: AtomicBool,
}

impl RenderSink {
    /// A synchronous sink.
    pub fn new(pattern: Pattern, writer: impl Write + Send + 'static) -> Self {
        Self {
            pattern,
            target: Target::Sync(Mutex::new(Box::new(writer))),
            closed: AtomicBool::new(false),
        }
    }

    /// A sink in the given mode.
    ///
    /// # Errors
    ///
    /// Fails if the flusher thread of a buffered sink cannot be spawned.
    pub fn with_mode(
        pattern: Pattern,
        writer: impl Write + Send + 'static,
        mode: RenderMode,
    ) -> io::Result<Self> {
        let (flush_interval, capacity) = match mode {
            RenderMode::Sync => return Ok(Self::new(pattern, writer)),
            RenderMode::Buffered {
                flush_interval,
                capacity,
            } => (flush_interval, capacity),
        };

        let (tx, rx) = unbounded();
        let writer: Box<dyn Write + Send> = Box::new(writer);
        let handle = thread::Builder::new()
            .name("hookwire-flusher".into())
            .spawn(move || run_flusher(writer, rx, flush_interval, capacity))?;

        Ok(Self {
            pattern,
            target: Target::Buffered {
                tx: RwLock::new(Some(tx)),
                handle: Mutex::new(Some(handle)),
            },
            closed: AtomicBool::new(false),
        })
    }

    /// The compiled pattern.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// True for a buffered sink.
    pub fn is_buffered(&self) -> bool {
        matches!(self.target, Target::Buffered { .. })
    }

    /// True once [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Render `args` as one line and deliver it.
    ///
    /// # Errors
    ///
    /// [`RenderError::Closed`] after close; [`RenderError::Io`] when the
    /// stream rejects a synchronous write.
    pub fn write(&self, args: &Args) -> Result<(), RenderError> {
        if self.is_closed() {
            return Err(RenderError::Closed);
        }
        match &self.target {
            Target::Sync(writer) => {
                let line = self.pattern.render_bytes(args);
                writer.lock().write_all(&line)?;
                Ok(())
            }
            Target::Buffered { tx, .. } => {
                let line = self.pattern.render_bytes(args);
                match tx.read().as_ref() {
                    Some(tx) => tx
                        .send(Command::Record(line))
                        .map_err(|_| RenderError::FlusherPanicked),
                    None => Err(RenderError::Closed),
                }
            }
        }
    }

    /// Render `args` into an arbitrary stream using this sink's pattern.
    pub fn render<W: Write + ?Sized>(&self, stream: &mut W, args: &Args) -> io::Result<()> {
        self.pattern.render(stream, args)
    }

    /// Render `args` into an owned line.
    pub fn render_string(&self, args: &Args) -> String {
        self.pattern.render_string(args)
    }

    /// Push everything written so far to the stream.
    ///
    /// A no-op after close.
    pub fn flush(&self) -> Result<(), RenderError> {
        match &self.target {
            Target::Sync(writer) => Ok(writer.lock().flush()?),
            Target::Buffered { tx, .. } => {
                let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
                {
                    let guard = tx.read();
                    let Some(tx) = guard.as_ref() else {
                        return Ok(());
                    };
                    tx.send(Command::Flush(ack_tx))
                        .map_err(|_| RenderError::FlusherPanicked)?;
                }
                match ack_rx.recv() {
                    Ok(result) => Ok(result?),
                    Err(_) => Err(RenderError::FlusherPanicked),
                }
            }
        }
    }

    /// Stop accepting records, drain and flush. Idempotent.
    ///
    /// # Errors
    ///
    /// The final flush error of the first call. Later calls return `Ok`.
    pub fn close(&self) -> Result<(), RenderError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        match &self.target {
            Target::Sync(writer) => Ok(writer.lock().flush()?),
            Target::Buffered { tx, handle } => {
                // Dropping the sender disconnects the flusher once it has
                // consumed every queued record.
                drop(tx.write().take());
                let Some(handle) = handle.lock().take() else {
                    return Ok(());
                };
                match handle.join() {
                    Ok(result) => Ok(result?),
                    Err(_) => Err(RenderError::FlusherPanicked),
                }
            }
        }
    }
}

impl Drop for RenderSink {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!(error = %err, "render sink failed to close on drop");
        }
    }
}

impl fmt::Debug for RenderSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderSink")
            .field("template", &self.pattern.template())
            .field("buffered", &self.is_buffered())
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn run_flusher(
    mut writer: Box<dyn Write + Send>,
    rx: Receiver<Command>,
    interval: Duration,
    capacity: usize,
) -> io::Result<()> {
    let ticker = tick(interval);
    let mut pending: Vec<u8> = Vec::with_capacity(capacity);

    loop {
        select! {
            recv(rx) -> msg => match msg {
                Ok(Command::Record(line)) => {
                    pending.extend_from_slice(&line);
                    if pending.len() >= capacity {
                        write_batch(&mut writer, &mut pending);
                    }
                }
                Ok(Command::Flush(ack)) => {
                    let result = drain(&mut writer, &mut pending);
                    let _ = ack.send(result);
                }
                Err(_) => break,
            },
            recv(ticker) -> _ => {
                if !pending.is_empty() {
                    write_batch(&mut writer, &mut pending);
                }
            }
        }
    }

    let lost = pending.len();
    let result = drain(&mut writer, &mut pending);
    if let Err(err) = &result {
        tracing::error!(lost_bytes = lost, error = %err, "final flush failed, buffered records lost");
    }
    result
}

fn drain(writer: &mut Box<dyn Write + Send>, pending: &mut Vec<u8>) -> io::Result<()> {
    let result = writer.write_all(&pending[..]).and_then(|()| writer.flush());
    pending.clear();
    result
}

fn write_batch(writer: &mut Box<dyn Write + Send>, pending: &mut Vec<u8>) {
    let len = pending.len();
    if let Err(err) = drain(writer, pending) {
        tracing::warn!(dropped_bytes = len, error = %err, "background flush failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingWriter, SharedBuffer};
    use hookwire_core::{PatternRegistry, PatternResult};
    use std::sync::Arc;

    fn pattern() -> Pattern {
        let registry = PatternRegistry::new()
            .with('k', |args: &Args| PatternResult::new("key", args.str("key").to_owned()));
        Pattern::compile("key=%k", &registry).unwrap()
    }

    fn args(key: &str) -> Args {
        [("key", key)].into_iter().collect()
    }

    #[test]
    fn sync_sink_writes_lines() {
        let buf = SharedBuffer::new();
        let sink = RenderSink::new(pattern(), buf.clone());
        sink.write(&args("a")).unwrap();
        sink.write(&args("b")).unwrap();

        assert_eq!(buf.contents(), "key=a\nkey=b\n");
        assert_eq!(sink.render_string(&args("c")), "key=c\n");
    }

    #[test]
    fn concurrent_sync_writes_do_not_interleave() {
        let buf = SharedBuffer::new();
        let sink = Arc::new(RenderSink::new(pattern(), buf.clone()));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let sink = sink.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        sink.write(&args(&format!("{t}-{i}"))).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let lines = buf.lines();
        assert_eq!(lines.len(), 400);
        assert!(lines.iter().all(|l| l.starts_with("key=") && l.matches('=').count() == 1));
    }

    #[test]
    fn buffered_sink_drains_on_close() {
        let buf = SharedBuffer::new();
        let sink = RenderSink::with_mode(
            pattern(),
            buf.clone(),
            RenderMode::Buffered {
                flush_interval: Duration::from_secs(3600),
                capacity: 1 << 20,
            },
        )
        .unwrap();

        for i in 0..100 {
            sink.write(&args(&i.to_string())).unwrap();
        }
        sink.close().unwrap();

        let lines = buf.lines();
        assert_eq!(lines.len(), 100);
        assert_eq!(lines[0], "key=0");
        assert_eq!(lines[99], "key=99");
    }

    #[test]
    fn buffered_flush_is_synchronous() {
        let buf = SharedBuffer::new();
        let sink = RenderSink::with_mode(pattern(), buf.clone(), RenderMode::buffered()).unwrap();
        sink.write(&args("x")).unwrap();
        sink.flush().unwrap();

        assert_eq!(buf.contents(), "key=x\n");
    }

    #[test]
    fn write_after_close_is_rejected() {
        let sink = RenderSink::new(pattern(), SharedBuffer::new());
        sink.close().unwrap();
        sink.close().unwrap();

        assert!(matches!(sink.write(&args("a")), Err(RenderError::Closed)));
    }

    #[test]
    fn sync_write_surfaces_stream_errors() {
        let sink = RenderSink::new(pattern(), FailingWriter);
        assert!(matches!(sink.write(&args("a")), Err(RenderError::Io(_))));
    }

    #[test]
    fn buffered_close_reports_failed_drain() {
        let sink = RenderSink::with_mode(
            pattern(),
            FailingWriter,
            RenderMode::Buffered {
                flush_interval: Duration::from_secs(3600),
                capacity: 1 << 20,
            },
        )
        .unwrap();
        sink.write(&args("a")).unwrap();

        assert!(matches!(sink.close(), Err(RenderError::Io(_))));
    }
}
