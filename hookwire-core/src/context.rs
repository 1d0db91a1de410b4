//! # Operation Context
//!
//! The caller-owned value that travels with an operation through its hook.
//!
//! A [`Context`] is immutable and cheap to clone; every `with_*` method
//! returns a new context and leaves the original untouched. Handlers that
//! need to change it (a tracing handler opening a child span) build a new
//! context and store it back with [`Hook::set_context`], and the call site
//! reads it back with [`Hook::context`] after the pre-chain has run.
//!
//! What the context carries:
//!
//! - [`RequestMeta`] - correlation id, path and method of the inbound request,
//!   copied into every hook as the system arguments
//! - the current [`tracing::Span`]
//! - a shared [`Breadcrumbs`] buffer
//! - an optional deadline the call site turns into a timeout
//! - typed values for collaborator-specific data
//!
//! [`Hook::set_context`]: crate::Hook::set_context
//! [`Hook::context`]: crate::Hook::context

use crate::breadcrumb::Breadcrumbs;
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::Span;

/// Identity of the inbound request an operation belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    /// Correlation id shared by every record of the request.
    pub uuid: String,
    /// Request path.
    pub url: String,
    /// Request method.
    pub method: String,
}

impl RequestMeta {
    /// Create request metadata.
    pub fn new(uuid: impl Into<String>, url: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            url: url.into(),
            method: method.into(),
        }
    }
}

/// The context value passed through a hook.
#[derive(Clone, Default)]
pub struct Context {
    request: Option<Arc<RequestMeta>>,
    span: Option<Span>,
    breadcrumbs: Option<Breadcrumbs>,
    deadline: Option<Instant>,
    values: Arc<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl Context {
    /// An empty context.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context for an inbound request.
    pub fn for_request(
        uuid: impl Into<String>,
        url: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self::default().with_request(RequestMeta::new(uuid, url, method))
    }

    /// Attach request metadata.
    pub fn with_request(&self, request: RequestMeta) -> Self {
        let mut ctx = self.clone();
        ctx.request = Some(Arc::new(request));
        ctx
    }

    /// Attach a fresh random correlation id, keeping path and method.
    pub fn with_new_request_id(&self) -> Self {
        let mut request = self.request.as_deref().cloned().unwrap_or_default();
        request.uuid = uuid::Uuid::new_v4().to_string();
        self.with_request(request)
    }

    /// Request metadata, if any.
    pub fn request(&self) -> Option<&RequestMeta> {
        self.request.as_deref()
    }

    /// Attach the current tracing span.
    pub fn with_span(&self, span: Span) -> Self {
        let mut ctx = self.clone();
        ctx.span = Some(span);
        ctx
    }

    /// Replace or clear the current tracing span.
    pub fn with_span_opt(&self, span: Option<Span>) -> Self {
        let mut ctx = self.clone();
        ctx.span = span;
        ctx
    }

    /// The current tracing span, if any.
    pub fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }

    /// Attach a breadcrumb buffer.
    pub fn with_breadcrumbs(&self, breadcrumbs: Breadcrumbs) -> Self {
        let mut ctx = self.clone();
        ctx.breadcrumbs = Some(breadcrumbs);
        ctx
    }

    /// The breadcrumb buffer, if any.
    pub fn breadcrumbs(&self) -> Option<&Breadcrumbs> {
        self.breadcrumbs.as_ref()
    }

    /// Set a deadline `timeout` from now. An earlier existing deadline wins.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Set an absolute deadline. An earlier existing deadline wins.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut ctx = self.clone();
        ctx.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        ctx
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline; `Some(ZERO)` once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Attach a typed value, replacing any previous value of the same type.
    pub fn with_value<T: Send + Sync + 'static>(&self, value: T) -> Self {
        let mut ctx = self.clone();
        let mut values = HashMap::clone(&self.values);
        values.insert(TypeId::of::<T>(), Arc::new(value));
        ctx.values = Arc::new(values);
        ctx
    }

    /// Borrow a typed value.
    pub fn value<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("request", &self.request)
            .field("span", &self.span.as_ref().and_then(Span::id))
            .field("breadcrumbs", &self.breadcrumbs.as_ref().map(Breadcrumbs::len))
            .field("deadline", &self.deadline)
            .field("values", &self.values.len())
            .finish()
    }
}
