//! Error breadcrumbs.
//!
//! A breadcrumb is a short trail entry describing one operation that ran
//! before an error was reported. Breadcrumbs are collected into a bounded
//! [`Breadcrumbs`] buffer carried by the [`Context`](crate::Context), so an
//! error reporter at the edge of the request can attach the whole trail.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::{collections::BTreeMap, collections::VecDeque, sync::Arc};

/// Default number of breadcrumbs a buffer keeps.
pub const DEFAULT_MAX_BREADCRUMBS: usize = 100;

/// Severity of a breadcrumb.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BreadcrumbLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    #[default]
    Info,
    /// Something unexpected that did not fail the operation.
    Warning,
    /// The operation failed.
    Error,
    /// The process cannot continue.
    Fatal,
}

/// One entry of the breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breadcrumb {
    /// When the operation finished.
    pub timestamp: DateTime<Utc>,
    /// Breadcrumb type, e.g. `"query"` or `"http"`.
    #[serde(rename = "type")]
    pub ty: String,
    /// Dotted category, e.g. `"redis.command"`.
    pub category: Option<String>,
    /// Human-readable summary.
    pub message: Option<String>,
    /// Severity.
    pub level: BreadcrumbLevel,
    /// Structured details.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, serde_json::Value>,
}

impl Default for Breadcrumb {
    fn default() -> Self {
        Self {
            timestamp: Utc::now(),
            ty: "default".to_string(),
            category: None,
            message: None,
            level: BreadcrumbLevel::Info,
            data: BTreeMap::new(),
        }
    }
}

impl Breadcrumb {
    /// Create a breadcrumb of the given type stamped with the current time.
    pub fn new(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            ..Default::default()
        }
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the level.
    pub fn with_level(mut self, level: BreadcrumbLevel) -> Self {
        self.level = level;
        self
    }

    /// Attach one structured detail.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// A shared, bounded trail of breadcrumbs.
///
/// Clones share the same buffer. Once full, pushing drops the oldest entry.
#[derive(Debug, Clone)]
pub struct Breadcrumbs {
    inner: Arc<Mutex<VecDeque<Breadcrumb>>>,
    capacity: usize,
}

impl Default for Breadcrumbs {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BREADCRUMBS)
    }
}

impl Breadcrumbs {
    /// Create a buffer that keeps at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(64)))),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest when full.
    pub fn push(&self, crumb: Breadcrumb) {
        if self.capacity == 0 {
            return;
        }
        let mut trail = self.inner.lock();
        while trail.len() >= self.capacity {
            trail.pop_front();
        }
        trail.push_back(crumb);
    }

    /// Copy out the current trail, oldest first.
    pub fn snapshot(&self) -> Vec<Breadcrumb> {
        self.inner.lock().iter().cloned().collect()
    }

    /// Take the current trail, leaving the buffer empty.
    pub fn take(&self) -> Vec<Breadcrumb> {
        self.inner.lock().drain(..).collect()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True when no entry is held.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Maximum number of entries kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
