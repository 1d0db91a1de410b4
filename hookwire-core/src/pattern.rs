//! Pattern functions and the registry that names them.
//!
//! A template refers to pattern functions by a single character. Each
//! function maps an argument bag to a [`PatternResult`]; the engine in
//! `hookwire-std` decides where that result lands in the output line.

use crate::{args::Args, value::Value};
use std::{collections::HashMap, fmt, sync::Arc};

/// Template character reserved for JSON grouping (`%J{...}`).
pub const RESERVED_KEY: char = 'J';

/// Output of one pattern function invocation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatternResult {
    /// Field name used when the result is aggregated into a JSON group.
    pub key: String,
    /// The value to render.
    pub value: Value,
    /// When set, the result contributes nothing to any output.
    pub skip: bool,
}

impl PatternResult {
    /// A result that is rendered.
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            skip: false,
        }
    }

    /// A result that is omitted everywhere.
    pub fn skip(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Value::Null,
            skip: true,
        }
    }

    /// Build a result whose `skip` flag is decided by the caller.
    pub fn with_skip(key: impl Into<String>, value: impl Into<Value>, skip: bool) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            skip,
        }
    }
}

/// A shareable pattern function.
pub type PatternFn = Arc<dyn Fn(&Args) -> PatternResult + Send + Sync>;

/// Mapping from template character to pattern function.
///
/// The registry is handed to the engine once, when templates are compiled.
/// It accepts any character at insertion time; the reserved `J` is rejected
/// when a template is compiled against the registry.
#[derive(Clone, Default)]
pub struct PatternRegistry {
    funcs: HashMap<char, PatternFn>,
}

impl PatternRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` under `key`, replacing any previous function.
    pub fn insert<F>(&mut self, key: char, f: F) -> &mut Self
    where
        F: Fn(&Args) -> PatternResult + Send + Sync + 'static,
    {
        self.funcs.insert(key, Arc::new(f));
        self
    }

    /// Register an already shared function.
    pub fn insert_shared(&mut self, key: char, f: PatternFn) -> &mut Self {
        self.funcs.insert(key, f);
        self
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with<F>(mut self, key: char, f: F) -> Self
    where
        F: Fn(&Args) -> PatternResult + Send + Sync + 'static,
    {
        self.insert(key, f);
        self
    }

    /// Copy every function of `other` into this registry.
    pub fn merge(&mut self, other: &PatternRegistry) -> &mut Self {
        for (key, f) in &other.funcs {
            self.funcs.insert(*key, Arc::clone(f));
        }
        self
    }

    /// Look up the function for `key`.
    pub fn get(&self, key: char) -> Option<&PatternFn> {
        self.funcs.get(&key)
    }

    /// True if `key` is registered.
    pub fn contains(&self, key: char) -> bool {
        self.funcs.contains_key(&key)
    }

    /// Registered characters, sorted.
    pub fn keys(&self) -> Vec<char> {
        let mut keys: Vec<char> = self.funcs.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Number of registered functions.
    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}

impl fmt::Debug for PatternRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_replaces_and_merges() {
        let mut base = PatternRegistry::new()
            .with('a', |_| PatternResult::new("a", 1))
            .with('b', |_| PatternResult::skip("b"));
        let extra = PatternRegistry::new().with('a', |_| PatternResult::new("a", 2));
        base.merge(&extra);

        assert_eq!(base.keys(), vec!['a', 'b']);
        let result = (base.get('a').unwrap())(&Args::new());
        assert_eq!(result.value, Value::from(2));
        assert!((base.get('b').unwrap())(&Args::new()).skip);
    }
}
