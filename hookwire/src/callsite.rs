//! # Call-Site Adapter
//!
//! Helpers for collaborators wrapping a user-facing operation in a hook.
//!
//! Every wrapped operation follows the same protocol:
//!
//! 1. create a hook from the manager
//! 2. push `start_time`, `source` and the operation's own fields
//! 3. run the pre-chain and use [`Hook::context`] for the underlying call
//! 4. perform the call
//! 5. push `end_time`, `duration` and `error`
//! 6. run the post-chain
//!
//! [`instrument`] and [`instrument_async`] run the whole protocol. The
//! [`CallSite`] extension trait exposes steps 2 and 5 for call sites that
//! need finer control.
//!
//! The reported `source` is the location of the collaborator's caller,
//! taken from `#[track_caller]`, never a frame inside this library.

use crate::manager::Manager;
use bytes::Bytes;
use chrono::Local;
use hookwire_core::{Args, Context, Hook, keys};
use std::{
    fmt,
    future::Future,
    io::{self, Cursor, Read},
    panic::Location,
    time::{Duration, Instant},
};

/// Monotonic start of the operation, parked in the hook's extensions.
#[derive(Debug, Clone, Copy)]
struct StartInstant(Instant);

/// Call-site steps of the hook protocol.
pub trait CallSite {
    /// Push `start_time` and the caller's `source`.
    #[track_caller]
    fn start(&mut self) -> &mut Self {
        self.start_at(Location::caller())
    }

    /// Push `start_time` and `source` for an explicit location.
    fn start_at(&mut self, location: &Location<'_>) -> &mut Self;

    /// Push the operation name as `func_name`.
    fn operation(&mut self, name: impl Into<String>) -> &mut Self;

    /// Push `end_time`, `duration` and, when present, `error`.
    ///
    /// `duration` is zero when [`start`](Self::start) was never called.
    fn finish(&mut self, error: Option<&dyn fmt::Display>) -> &mut Self;

    /// [`finish`](Self::finish) with the error of `result`, if any.
    fn finish_with<T, E: fmt::Display>(&mut self, result: &Result<T, E>) -> &mut Self {
        match result {
            Ok(_) => self.finish(None),
            Err(err) => self.finish(Some(err as &dyn fmt::Display)),
        }
    }
}

impl CallSite for Hook {
    fn start_at(&mut self, location: &Location<'_>) -> &mut Self {
        self.extensions_mut().insert(StartInstant(Instant::now()));
        self.add_arg(keys::START_TIME, Local::now())
            .add_arg(keys::SOURCE, format!("{}:{}", location.file(), location.line()))
    }

    fn operation(&mut self, name: impl Into<String>) -> &mut Self {
        self.add_arg(keys::FUNC_NAME, name.into())
    }

    fn finish(&mut self, error: Option<&dyn fmt::Display>) -> &mut Self {
        let end = Local::now();
        let duration = match self.extensions_mut().remove::<StartInstant>() {
            Some(StartInstant(start)) => start.elapsed(),
            None => self
                .args()
                .time(keys::START_TIME)
                .and_then(|start| (end - start).to_std().ok())
                .unwrap_or(Duration::ZERO),
        };
        self.add_arg(keys::END_TIME, end)
            .add_arg(keys::DURATION, duration);
        if let Some(err) = error {
            self.add_arg(keys::ERROR, err.to_string());
        }
        self
    }
}

/// Run `f` as one instrumented operation.
///
/// `fields` are pushed before the pre-chain runs; `f` receives the context
/// as left by the pre-chain. The result is returned unchanged.
#[track_caller]
pub fn instrument<T, E, F>(
    manager: &Manager,
    ctx: Context,
    operation: &str,
    fields: Args,
    f: F,
) -> Result<T, E>
where
    E: fmt::Display,
    F: FnOnce(&Context) -> Result<T, E>,
{
    let mut hook = manager.create_hook(ctx);
    hook.args_mut().extend(fields);
    hook.start().operation(operation);
    hook.process_pre_hook();

    let result = f(hook.context());

    hook.finish_with(&result);
    hook.process_after_hook();
    result
}

/// Asynchronous form of [`instrument`].
///
/// The caller location is captured when this function is called, not when
/// the returned future is first polled.
#[track_caller]
pub fn instrument_async<'a, T, E, F, Fut>(
    manager: &'a Manager,
    ctx: Context,
    operation: &'a str,
    fields: Args,
    f: F,
) -> impl Future<Output = Result<T, E>> + 'a
where
    T: 'a,
    E: fmt::Display + 'a,
    F: FnOnce(Context) -> Fut + 'a,
    Fut: Future<Output = Result<T, E>> + 'a,
{
    let location = Location::caller();
    async move {
        let mut hook = manager.create_hook(ctx);
        hook.args_mut().extend(fields);
        hook.start_at(location).operation(operation);
        hook.process_pre_hook();

        let result = f(hook.context().clone()).await;

        hook.finish_with(&result);
        hook.process_after_hook();
        result
    }
}

/// Read a body fully, returning a copy for logging and an equivalent reader
/// for the original consumer.
pub fn tee_body<R: Read>(mut reader: R) -> io::Result<(Bytes, Cursor<Bytes>)> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    let body = Bytes::from(buf);
    Ok((body.clone(), Cursor::new(body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookwire_std::testing::RecordingHandler;

    #[test]
    fn start_reports_the_caller() {
        let mut hook = Hook::new(Context::background());
        let line = line!() + 1;
        hook.start();

        assert_eq!(hook.args().str(keys::SOURCE), format!("{}:{line}", file!()));
        assert!(hook.args().time(keys::START_TIME).is_some());
    }

    #[test]
    fn finish_without_start_has_zero_duration() {
        let mut hook = Hook::new(Context::background());
        hook.finish(None);

        assert_eq!(hook.args().duration(keys::DURATION), Duration::ZERO);
        assert!(hook.args().time(keys::END_TIME).is_some());
        assert!(!hook.args().contains(keys::ERROR));
    }

    #[test]
    fn finish_with_records_the_error() {
        let mut hook = Hook::new(Context::background());
        hook.start();
        let result: Result<(), &str> = Err("connection refused");
        hook.finish_with(&result);

        assert_eq!(hook.args().error(keys::ERROR).as_deref(), Some("connection refused"));
        assert!(hook.args().time(keys::END_TIME) >= hook.args().time(keys::START_TIME));
    }

    #[test]
    fn instrument_runs_the_protocol() {
        let recorder = RecordingHandler::new();
        let manager = Manager::builder()
            .register_after_hook(recorder.clone())
            .build();
        let fields: Args = [(keys::COLLECTION_NAME, "users")].into_iter().collect();

        let out: Result<u32, String> =
            instrument(&manager, Context::background(), "count", fields, |_| Ok(7));

        assert_eq!(out, Ok(7));
        let args = recorder.last().unwrap();
        assert_eq!(args.str(keys::FUNC_NAME), "count");
        assert_eq!(args.str(keys::COLLECTION_NAME), "users");
        assert!(args.str(keys::SOURCE).starts_with(file!()));
        assert!(args.contains(keys::DURATION));
        assert!(!args.contains(keys::ERROR));
    }

    #[test]
    fn tee_body_preserves_the_stream() {
        let (copy, mut reader) = tee_body(&b"{\"ok\":true}"[..]).unwrap();
        let mut replay = String::new();
        reader.read_to_string(&mut replay).unwrap();

        assert_eq!(copy, Bytes::from_static(b"{\"ok\":true}"));
        assert_eq!(replay, "{\"ok\":true}");
    }
}
