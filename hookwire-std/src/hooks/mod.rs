//! Built-in handlers.
//!
//! Each handler covers one cross-cutting concern and is registered on a
//! manager like any user closure:
//!
//! - [`LogHandler`]: prints the finished argument bag through a logger
//! - [`SpanStartHandler`] / [`SpanFinishHandler`]: wrap the operation in a
//!   child `tracing` span
//! - [`CounterHandler`] / [`SummaryHandler`]: Prometheus counters and
//!   duration histograms (feature `metrics`)
//! - [`BreadcrumbHandler`]: appends a breadcrumb to the context's trail

mod breadcrumb;
mod logging;
#[cfg(feature = "metrics")]
mod metrics;
mod spans;

pub use breadcrumb::{BreadcrumbHandler, default_breadcrumb};
pub use logging::LogHandler;
#[cfg(feature = "metrics")]
pub use metrics::{CounterHandler, LabelFn, SummaryHandler};
pub use spans::{
    OpenSpan, SpanFinishHandler, SpanFn, SpanNameFn, SpanStartHandler, tracing_handlers,
};
