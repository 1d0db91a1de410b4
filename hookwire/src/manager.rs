//! # Hook Manager
//!
//! Factory and owner of the shared state of one collaborator's hooks.
//!
//! Registration happens on a [`ManagerBuilder`]; [`ManagerBuilder::build`]
//! freezes both handler chains. Every hook a [`Manager`] creates aliases
//! those frozen chains, so no hook can ever observe a chain changing under
//! it. Default arguments stay mutable after build and are snapshotted into
//! each hook at creation.
//!
//! # Example
//!
//! ```rust,ignore
//! let manager = Manager::builder()
//!     .add_arg(keys::DB_NAME, "orders")
//!     .register_tracing_hook(|hook| hook.args().str(keys::FUNC_NAME).to_owned(), |_, _| {}, |_, _| {})
//!     .register_log_hook(&RenderConfig::default(), &standard_registry())?
//!     .build();
//!
//! let mut hook = manager.create_hook(ctx);
//! hook.start().operation("find_one");
//! hook.process_pre_hook();
//! let result = collection.find_one(hook.context(), filter);
//! hook.finish_with(&result).process_after_hook();
//! ```

use dashmap::DashMap;
use hookwire_core::{
    Args, Breadcrumb, Chain, ConfigError, Context, Handler, Hook, HookwireError, PatternRegistry,
    RecordSink, Value,
};
use hookwire_std::{
    Logger, RenderConfig,
    hooks::{BreadcrumbHandler, LogHandler, tracing_handlers},
};
use std::{fmt, sync::Arc};
use tracing::Span;

/// Builder for a [`Manager`].
///
/// Handlers run in registration order within their chain. Register the log
/// hook last so the record includes whatever earlier post-handlers add.
#[derive(Default)]
pub struct ManagerBuilder {
    defaults: Args,
    pre: Vec<Arc<dyn Handler>>,
    post: Vec<Arc<dyn Handler>>,
    logger: Option<Arc<Logger>>,
    log_hook: bool,
}

impl ManagerBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a default argument seeded into every hook.
    pub fn add_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(key, value);
        self
    }

    /// Append a handler to the pre-chain.
    pub fn register_pre_hook<H: Handler>(mut self, handler: H) -> Self {
        self.pre.push(Arc::new(handler));
        self
    }

    /// Append a handler to the post-chain.
    pub fn register_after_hook<H: Handler>(mut self, handler: H) -> Self {
        self.post.push(Arc::new(handler));
        self
    }

    /// Append one handler to each chain.
    pub fn register_hook<P: Handler, A: Handler>(self, pre: P, post: A) -> Self {
        self.register_pre_hook(pre).register_after_hook(post)
    }

    /// Open a logger from `config` and print every finished hook through it.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DuplicateLogHook`] on a second call, plus anything
    /// [`Logger::from_config`] returns. All of them are fatal: the
    /// composition root should abort rather than run without its log sink.
    pub fn register_log_hook(
        self,
        config: &RenderConfig,
        registry: &PatternRegistry,
    ) -> Result<Self, HookwireError> {
        if self.log_hook {
            return Err(ConfigError::DuplicateLogHook.into());
        }
        let logger = Logger::from_config(config, registry)?;
        Ok(self.register_log_hook_with(logger)?)
    }

    /// Print every finished hook through an already built logger.
    ///
    /// The logger becomes the manager's logger; the log handler prints
    /// through [`Hook::logger`], so a later [`set_logger`](Self::set_logger)
    /// redirects it and [`Manager::close`] always closes the logger records
    /// went to.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DuplicateLogHook`] if a log hook is already registered.
    pub fn register_log_hook_with(mut self, logger: Logger) -> Result<Self, ConfigError> {
        if self.log_hook {
            return Err(ConfigError::DuplicateLogHook);
        }
        self.log_hook = true;
        self.logger = Some(Arc::new(logger));
        Ok(self.register_after_hook(LogHandler::new()))
    }

    /// Wrap every operation in a child `tracing` span.
    ///
    /// `span_name` returning `""` skips the span for that hook.
    pub fn register_tracing_hook<N, S, F>(self, span_name: N, on_start: S, on_finish: F) -> Self
    where
        N: Fn(&Hook) -> String + Send + Sync + 'static,
        S: Fn(&Span, &Hook) + Send + Sync + 'static,
        F: Fn(&Span, &Hook) + Send + Sync + 'static,
    {
        let (start, finish) = tracing_handlers(span_name, on_start, on_finish);
        self.register_hook(start, finish)
    }

    /// Count operations on a Prometheus counter.
    ///
    /// `labels` returning `None` skips the hook.
    #[cfg(feature = "metrics")]
    pub fn register_metric_counter_hook<F>(
        self,
        counter: prometheus::IntCounterVec,
        labels: F,
    ) -> Self
    where
        F: Fn(&Hook) -> Option<Vec<String>> + Send + Sync + 'static,
    {
        self.register_pre_hook(hookwire_std::hooks::CounterHandler::new(counter, labels))
    }

    /// Observe operation durations on a Prometheus histogram.
    ///
    /// `labels` returning `None` skips the hook.
    #[cfg(feature = "metrics")]
    pub fn register_metric_summary_hook<F>(
        self,
        histogram: prometheus::HistogramVec,
        labels: F,
    ) -> Self
    where
        F: Fn(&Hook) -> Option<Vec<String>> + Send + Sync + 'static,
    {
        self.register_after_hook(hookwire_std::hooks::SummaryHandler::new(histogram, labels))
    }

    /// Append a breadcrumb built from each finished hook to the context's
    /// trail.
    pub fn register_sentry_breadcrumb_hook<F>(self, build: F) -> Self
    where
        F: Fn(&Hook) -> Option<Breadcrumb> + Send + Sync + 'static,
    {
        self.register_after_hook(BreadcrumbHandler::new(build))
    }

    /// Set the logger attached to every hook.
    ///
    /// This does not register a log handler; the logger is reachable
    /// through [`Hook::logger`] and closed by [`Manager::close`]. A logger
    /// set earlier, including one from a log hook, is replaced and closed.
    pub fn set_logger(mut self, logger: Logger) -> Self {
        if let Some(previous) = self.logger.replace(Arc::new(logger)) {
            if let Err(err) = previous.close() {
                tracing::warn!(error = %err, "failed to close replaced logger");
            }
        }
        self
    }

    /// The logger set so far.
    pub fn logger(&self) -> Option<&Arc<Logger>> {
        self.logger.as_ref()
    }

    /// Freeze the chains and build the manager.
    pub fn build(self) -> Manager {
        let defaults = DashMap::with_capacity(self.defaults.len());
        for (key, value) in self.defaults {
            defaults.insert(key, value);
        }
        Manager {
            defaults,
            pre: self.pre.into(),
            post: self.post.into(),
            logger: self.logger,
        }
    }
}

impl fmt::Debug for ManagerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerBuilder")
            .field("defaults", &self.defaults)
            .field("pre", &self.pre.len())
            .field("post", &self.post.len())
            .field("log_hook", &self.log_hook)
            .finish()
    }
}

/// Creates hooks that share one set of chains, defaults and logger.
///
/// `Manager` is `Send + Sync`; share it behind an `Arc` between the
/// collaborators' call sites.
pub struct Manager {
    defaults: DashMap<String, Value>,
    pre: Chain,
    post: Chain,
    logger: Option<Arc<Logger>>,
}

impl Manager {
    /// Start building a manager.
    pub fn builder() -> ManagerBuilder {
        ManagerBuilder::new()
    }

    /// Set a default argument for hooks created from now on.
    ///
    /// Hooks that already exist keep the value they were created with.
    pub fn add_arg(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.defaults.insert(key.into(), value.into());
    }

    /// Current value of a default argument.
    pub fn arg(&self, key: &str) -> Option<Value> {
        self.defaults.get(key).map(|entry| entry.value().clone())
    }

    /// Create a hook for one operation.
    ///
    /// The hook's arguments are a snapshot of the current defaults; its
    /// chains alias the manager's frozen chains.
    pub fn create_hook(&self, ctx: Context) -> Hook {
        let args: Args = self
            .defaults
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        let hook = Hook::with_chains(ctx, Arc::clone(&self.pre), Arc::clone(&self.post))
            .with_args(args);
        match &self.logger {
            Some(logger) => hook.with_logger(Arc::clone(logger) as Arc<dyn RecordSink>),
            None => hook,
        }
    }

    /// The manager's logger.
    pub fn logger(&self) -> Option<&Arc<Logger>> {
        self.logger.as_ref()
    }

    /// Number of pre-handlers.
    pub fn pre_chain_len(&self) -> usize {
        self.pre.len()
    }

    /// Number of post-handlers.
    pub fn post_chain_len(&self) -> usize {
        self.post.len()
    }

    /// Close the logger. Idempotent.
    pub fn close(&self) -> Result<(), HookwireError> {
        match &self.logger {
            Some(logger) => Ok(logger.close()?),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("defaults", &self.defaults.len())
            .field("pre", &self.pre.len())
            .field("post", &self.post.len())
            .field("logger", &self.logger)
            .finish()
    }
}
