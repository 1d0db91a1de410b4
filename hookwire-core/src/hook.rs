//! # Hook Kernel
//!
//! The per-operation record every collaborator wraps its calls in.
//!
//! A [`Hook`] carries the operation's argument bag, the caller's
//! [`Context`], and two ordered handler chains shared with the manager that
//! created it. The call site fills in arguments, runs the pre-chain, performs
//! the operation, fills in the outcome, and runs the post-chain.
//!
//! # Design Philosophy
//!
//! - **Single owner**: a hook belongs to exactly one operation and is mutated
//!   only through `&mut`, so it needs no internal locking
//! - **Shared chains**: chains are frozen `Arc` slices; creating a hook never
//!   copies handlers
//! - **Void handlers**: a [`Handler`] cannot fail the operation; it records
//!   what it needs and deals with its own errors
//!
//! # Ordering
//!
//! Handlers run in registration order. The pre-chain completes before the
//! operation starts and the post-chain starts after it completes, so
//! post-handlers observe every argument pushed by the call site.

use crate::{
    args::{Args, keys},
    context::Context,
    error::BoxError,
    extensions::Extensions,
    value::Value,
};
use std::{fmt, sync::Arc};

/// Correlation id used when the context carries none.
pub const UNKNOWN_UUID: &str = "unknown";

/// A callback run from a pre- or post-chain.
///
/// Closures of the shape `Fn(&mut Hook)` implement this trait, so most
/// handlers are registered as plain closures.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a hook handler",
    label = "missing `Handler` implementation",
    note = "Handlers are `Fn(&mut Hook) + Send + Sync + 'static` or implement `Handler` directly."
)]
pub trait Handler: Send + Sync + 'static {
    /// Called with the hook being processed.
    fn handle(&self, hook: &mut Hook);
}

impl<F> Handler for F
where
    F: Fn(&mut Hook) + Send + Sync + 'static,
{
    fn handle(&self, hook: &mut Hook) {
        self(hook)
    }
}

/// A frozen, shared sequence of handlers.
pub type Chain = Arc<[Arc<dyn Handler>]>;

/// Something that accepts a finalized argument bag as one record.
///
/// Implemented by the logger set in `hookwire-std`. Hooks hold a shared
/// handle so handlers can reach the manager's logger; only the manager
/// closes it.
pub trait RecordSink: Send + Sync + 'static {
    /// Emit one record.
    fn print(&self, args: &Args) -> Result<(), BoxError>;

    /// Flush and release the underlying streams.
    fn close(&self) -> Result<(), BoxError>;
}

/// Per-operation record of arguments, context and handler chains.
pub struct Hook {
    args: Args,
    ctx: Context,
    pre: Chain,
    post: Chain,
    logger: Option<Arc<dyn RecordSink>>,
    extensions: Extensions,
}

impl Hook {
    /// Create a hook with empty chains.
    pub fn new(ctx: Context) -> Self {
        Self::with_chains(ctx, Arc::from(Vec::new()), Arc::from(Vec::new()))
    }

    /// Create a hook that runs the given chains.
    pub fn with_chains(ctx: Context, pre: Chain, post: Chain) -> Self {
        Self {
            args: Args::new(),
            ctx,
            pre,
            post,
            logger: None,
            extensions: Extensions::new(),
        }
    }

    /// Seed the argument bag.
    pub fn with_args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    /// Attach the logger handlers may print to.
    pub fn with_logger(mut self, logger: Arc<dyn RecordSink>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Set or overwrite an argument.
    pub fn add_arg(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.args.insert(key, value);
        self
    }

    /// Look up one argument.
    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.get(key)
    }

    /// The whole argument bag.
    pub fn args(&self) -> &Args {
        &self.args
    }

    /// Mutable access to the argument bag.
    pub fn args_mut(&mut self) -> &mut Args {
        &mut self.args
    }

    /// Replace the context.
    pub fn set_context(&mut self, ctx: Context) -> &mut Self {
        self.ctx = ctx;
        self
    }

    /// The current context.
    ///
    /// Call sites must use this (not the context they passed in) for the
    /// wrapped operation, since pre-handlers may have replaced it.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Per-hook handler state.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable per-hook handler state.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// The manager's logger, if one was attached.
    pub fn logger(&self) -> Option<&Arc<dyn RecordSink>> {
        self.logger.as_ref()
    }

    /// Number of handlers in the pre-chain.
    pub fn pre_len(&self) -> usize {
        self.pre.len()
    }

    /// Number of handlers in the post-chain.
    pub fn post_len(&self) -> usize {
        self.post.len()
    }

    /// Fill the system arguments, then run every pre-handler in order.
    pub fn process_pre_hook(&mut self) -> &mut Self {
        let chain = Arc::clone(&self.pre);
        self.run_chain(&chain)
    }

    /// Fill the system arguments, then run every post-handler in order.
    pub fn process_after_hook(&mut self) -> &mut Self {
        let chain = Arc::clone(&self.post);
        self.run_chain(&chain)
    }

    /// Run the pre-chain, `f`, then the post-chain.
    pub fn run<T>(&mut self, f: impl FnOnce(&mut Hook) -> T) -> T {
        self.process_pre_hook();
        let out = f(self);
        self.process_after_hook();
        out
    }

    fn run_chain(&mut self, chain: &[Arc<dyn Handler>]) -> &mut Self {
        self.fill_system_args();
        for handler in chain {
            handler.handle(self);
        }
        self
    }

    fn fill_system_args(&mut self) {
        let (uuid, url, method) = match self.ctx.request() {
            Some(req) => (
                if req.uuid.is_empty() {
                    UNKNOWN_UUID.to_string()
                } else {
                    req.uuid.clone()
                },
                req.url.clone(),
                req.method.clone(),
            ),
            None => (UNKNOWN_UUID.to_string(), String::new(), String::new()),
        };
        self.args.insert(keys::UUID, uuid);
        self.args.insert(keys::WEB_URL, url);
        self.args.insert(keys::WEB_METHOD, method);
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("args", &self.args)
            .field("ctx", &self.ctx)
            .field("pre", &self.pre.len())
            .field("post", &self.post.len())
            .field("logger", &self.logger.is_some())
            .finish()
    }
}
