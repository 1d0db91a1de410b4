//! # hookwire-core
//!
//! Core primitives for the hookwire instrumentation pipeline.
//!
//! This crate has minimal dependencies and is meant to be imported by
//! collaborators (database, cache, queue and HTTP client wrappers) that only
//! need to build hooks and write handlers, without pulling in the rendering
//! engine from `hookwire-std`.
//!
//! # Three-Layer Architecture
//!
//! ## Layer 1: Values ([`Value`], [`Args`])
//!
//! The argument bag every operation carries. Values are a tagged union with
//! text and JSON forms; the bag's typed accessors never fail.
//!
//! ## Layer 2: Context ([`Context`])
//!
//! The caller-owned value that travels with the operation: request identity,
//! current tracing span, breadcrumb trail, deadline, typed values.
//!
//! ## Layer 3: Kernel ([`Hook`], [`Handler`])
//!
//! The per-operation record and the callbacks that observe it. Pattern
//! functions ([`PatternFn`]) are the read side of the same bag: they turn a
//! finished hook's arguments into renderable fields.
//!
//! # Error Types
//!
//! - [`HookwireError`] - Top-level error type
//! - [`ConfigError`] - Construction-time errors
//! - [`RenderError`] - Stream write errors

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod args;
mod breadcrumb;
mod context;
mod error;
mod extensions;
mod hook;
mod pattern;
mod value;

// Re-exports
pub use args::{Args, keys};
pub use breadcrumb::{Breadcrumb, BreadcrumbLevel, Breadcrumbs, DEFAULT_MAX_BREADCRUMBS};
pub use context::{Context, RequestMeta};
pub use error::{BoxError, ConfigError, HookwireError, LoggerCloseError, RenderError};
pub use extensions::Extensions;
pub use hook::{Chain, Handler, Hook, RecordSink, UNKNOWN_UUID};
pub use pattern::{PatternFn, PatternRegistry, PatternResult, RESERVED_KEY};
pub use value::{Opaque, TIME_FORMAT, Value, write_loose_map};
