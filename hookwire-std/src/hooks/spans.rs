//! Tracing span handlers.
//!
//! The start handler opens a child span under the span carried by the
//! hook's context, stores it back into the context so the wrapped call runs
//! inside it, and parks it in the hook's extensions. The finish handler
//! takes it back out, records the error, restores the parent span into the
//! context and closes the span.
//!
//! A span name function returning `""` disables both handlers for that hook.

use hookwire_core::{Handler, Hook, keys};
use std::{fmt, sync::Arc};
use tracing::{Span, field::Empty};

/// Derives the span name from a hook; `""` means "no span".
pub type SpanNameFn = Arc<dyn Fn(&Hook) -> String + Send + Sync>;

/// Callback applied to an open span.
pub type SpanFn = Arc<dyn Fn(&Span, &Hook) + Send + Sync>;

/// The span a start handler opened, parked in the hook's extensions.
#[derive(Debug, Clone)]
pub struct OpenSpan {
    /// The operation's span.
    pub span: Span,
    /// The context span it was opened under.
    pub parent: Option<Span>,
}

/// Pre-handler that opens the operation's span.
#[derive(Clone)]
pub struct SpanStartHandler {
    name: SpanNameFn,
    on_start: SpanFn,
}

/// Post-handler that closes the operation's span.
#[derive(Clone)]
pub struct SpanFinishHandler {
    on_finish: SpanFn,
}

/// Build a matching start/finish pair.
pub fn tracing_handlers<N, S, F>(
    name: N,
    on_start: S,
    on_finish: F,
) -> (SpanStartHandler, SpanFinishHandler)
where
    N: Fn(&Hook) -> String + Send + Sync + 'static,
    S: Fn(&Span, &Hook) + Send + Sync + 'static,
    F: Fn(&Span, &Hook) + Send + Sync + 'static,
{
    (
        SpanStartHandler {
            name: Arc::new(name),
            on_start: Arc::new(on_start),
        },
        SpanFinishHandler {
            on_finish: Arc::new(on_finish),
        },
    )
}

impl Handler for SpanStartHandler {
    fn handle(&self, hook: &mut Hook) {
        let name = (self.name)(hook);
        if name.is_empty() {
            return;
        }

        let parent = hook.context().span().cloned();
        let parent_id = parent.as_ref().and_then(Span::id);
        let span = tracing::info_span!(parent: parent_id, "hook", otel.name = %name, error = Empty);
        (self.on_start)(&span, hook);

        let ctx = hook.context().with_span(span.clone());
        hook.set_context(ctx);
        hook.extensions_mut().insert(OpenSpan { span, parent });
    }
}

impl Handler for SpanFinishHandler {
    fn handle(&self, hook: &mut Hook) {
        let Some(open) = hook.extensions_mut().remove::<OpenSpan>() else {
            return;
        };
        if let Some(err) = hook.args().error(keys::ERROR) {
            open.span.record("error", err.as_str());
        }
        (self.on_finish)(&open.span, hook);

        let ctx = hook.context().with_span_opt(open.parent);
        hook.set_context(ctx);
    }
}

impl fmt::Debug for SpanStartHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanStartHandler").finish_non_exhaustive()
    }
}

impl fmt::Debug for SpanFinishHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanFinishHandler").finish_non_exhaustive()
    }
}
