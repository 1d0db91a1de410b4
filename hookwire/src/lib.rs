//! # hookwire - Hook-Based Instrumentation Pipeline
//!
//! `hookwire` wraps every user-facing operation of a storage, cache or HTTP
//! client in a [`Hook`]: an argument bag plus two ordered handler chains.
//! Handlers turn the finished bag into log records, tracing spans, metrics
//! and error breadcrumbs; the pattern engine renders log records through
//! `%X` / `%J{...}` templates.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hookwire::prelude::*;
//!
//! let manager = Manager::builder()
//!     .register_log_hook(&RenderConfig::default(), &standard_registry())?
//!     .build();
//!
//! let rows = instrument(&manager, ctx, "find_one", Args::new(), |ctx| {
//!     db.find_one(ctx, filter)
//! })?;
//! ```
//!
//! ## Crates
//!
//! - `hookwire-core`: values, context, the hook kernel and pattern primitives
//! - `hookwire-std`: pattern engine, sinks, logger and built-in handlers
//! - `hookwire`: the manager, call-site helpers and the global default

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub mod callsite;
pub mod global;
pub mod manager;

pub use hookwire_core::{
    Args, BoxError, Breadcrumb, BreadcrumbLevel, Breadcrumbs, Chain, ConfigError, Context,
    Extensions, Handler, Hook, HookwireError, LoggerCloseError, PatternFn, PatternRegistry,
    PatternResult, RecordSink, RenderError, RequestMeta, Value, keys,
};

pub use hookwire_std::{
    Logger, Pattern, RenderConfig, RenderMode, RenderSink, RollingConfig, RollingFile,
    presets::{DEFAULT_FILE_PATTERN, DEFAULT_STDOUT_PATTERN, standard_registry},
};

pub use callsite::{CallSite, instrument, instrument_async, tee_body};
pub use manager::{Manager, ManagerBuilder};

/// Standard pattern function builders.
pub mod presets {
    #![allow(clippy::wildcard_imports)]
    pub use hookwire_std::presets::*;
}

/// Built-in handlers.
pub mod hooks {
    #![allow(clippy::wildcard_imports)]
    pub use hookwire_std::hooks::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use hookwire_std::testing::*;
}

/// Prelude module - common imports for hookwire.
///
/// # Usage
///
/// ```rust,ignore
/// use hookwire::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Args, CallSite, Context, Handler, Hook, HookwireError, Logger, Manager, ManagerBuilder,
        PatternRegistry, PatternResult, RenderConfig, Value, instrument, instrument_async, keys,
        standard_registry,
    };
}
