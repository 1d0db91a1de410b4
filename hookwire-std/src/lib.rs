//! # hookwire-std
//!
//! Standard implementations for the hookwire instrumentation pipeline.
//!
//! This crate provides:
//! - **Pattern engine**: [`Pattern`] compiles `%X` / `%J{...}` templates
//! - **Render sinks**: [`RenderSink`] in synchronous or buffered mode
//! - **Rolling files**: [`RollingFile`], a size-rotated log file
//! - **Logger set**: [`Logger`] and its [`RenderConfig`]
//! - **Standard pattern functions**: [`presets`]
//! - **Built-in handlers**: [`hooks`] for logging, tracing spans, metrics
//!   and breadcrumbs

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use hookwire_core;

// Modules
pub mod config;
pub mod hooks;
pub mod logger;
pub mod pattern;
pub mod presets;
pub mod render;
pub mod rolling;
pub mod testing;

pub use config::RenderConfig;
pub use logger::Logger;
pub use pattern::Pattern;
pub use render::{RenderMode, RenderSink};
pub use rolling::{RollingConfig, RollingFile};
