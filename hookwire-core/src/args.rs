//! The argument bag carried by every hook.

use crate::value::Value;
use chrono::{DateTime, Local};
use std::{
    collections::{HashMap, hash_map},
    time::Duration,
};

/// Well-known argument keys.
///
/// The system keys (`UUID`, `WEB_URL`, `WEB_METHOD`) are filled from the
/// context before every chain; the timing keys are pushed by call sites.
/// Everything else is collaborator-specific and listed here so that
/// templates and handlers agree on spelling.
#[allow(missing_docs)]
pub mod keys {
    /// Correlation id, `"unknown"` when the context carries none.
    pub const UUID: &str = "uuid";
    /// Request path of the inbound request that triggered the operation.
    pub const WEB_URL: &str = "web_url";
    /// Request method of the inbound request.
    pub const WEB_METHOD: &str = "web_method";

    pub const START_TIME: &str = "start_time";
    pub const END_TIME: &str = "end_time";
    pub const DURATION: &str = "duration";
    pub const SOURCE: &str = "source";
    pub const ERROR: &str = "error";

    pub const FUNC_NAME: &str = "func_name";
    pub const COMMAND_NAME: &str = "command_name";
    pub const COLLECTION_NAME: &str = "collection_name";
    pub const DB_NAME: &str = "db_name";
    pub const FILTER_FIELD: &str = "filter_field";
    pub const CHANGE_FIELD: &str = "change_field";
    pub const OPTION_FIELD: &str = "option_field";
    pub const PREFIX: &str = "prefix";
    pub const KEY: &str = "key";
    pub const VALUE: &str = "value";
    pub const EXTRA: &str = "extra";
    pub const ENDPOINT: &str = "endpoint";
    pub const METHOD_NAME: &str = "method_name";
    pub const URL: &str = "url";
    pub const METHOD: &str = "method";
    pub const HEADERS: &str = "headers";
    pub const REQUEST_BODY: &str = "request_body";
    pub const RESPONSE_BODY: &str = "response_body";
    pub const STATUS_CODE: &str = "status_code";
    pub const DSN: &str = "dsn";
    pub const ROWS: &str = "rows";
    pub const LEVEL: &str = "level";
    pub const OPERATION: &str = "operation";
    pub const TABLE: &str = "table";
    pub const SQL: &str = "sql";
    pub const STATE: &str = "state";
    pub const MODE: &str = "mode";
    pub const GROUP_NAME: &str = "group_name";
    pub const GROUP_ID: &str = "group_id";
    pub const TASK_NAME: &str = "task_name";
    pub const TASK_ID: &str = "task_id";
    pub const LOCK_NAME: &str = "lock_name";
}

/// Mapping from argument name to [`Value`].
///
/// Insertion order is irrelevant. Setting a key twice keeps the last value.
/// The typed accessors never fail: a missing key or a value of the wrong
/// type yields the accessor's default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(HashMap<String, Value>);

impl Args {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bag with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self(HashMap::with_capacity(capacity))
    }

    /// Set `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Look up a raw value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Remove a key.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// True if `key` is set (even to [`Value::Null`]).
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no argument is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over all entries in arbitrary order.
    pub fn iter(&self) -> hash_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Text of a string argument, `""` otherwise.
    pub fn str(&self, key: &str) -> &str {
        self.get(key).and_then(Value::as_str).unwrap_or_default()
    }

    /// Signed integer argument, `0` otherwise.
    pub fn i64(&self, key: &str) -> i64 {
        self.get(key).and_then(Value::as_i64).unwrap_or_default()
    }

    /// Unsigned integer argument, `0` otherwise.
    pub fn u64(&self, key: &str) -> u64 {
        self.get(key).and_then(Value::as_u64).unwrap_or_default()
    }

    /// Numeric argument as a float, `0.0` otherwise.
    pub fn f64(&self, key: &str) -> f64 {
        self.get(key).and_then(Value::as_f64).unwrap_or_default()
    }

    /// Boolean argument, `false` otherwise.
    pub fn bool(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or_default()
    }

    /// Timestamp argument.
    pub fn time(&self, key: &str) -> Option<DateTime<Local>> {
        self.get(key).and_then(Value::as_time)
    }

    /// Duration argument, [`Duration::ZERO`] otherwise.
    pub fn duration(&self, key: &str) -> Duration {
        self.get(key).and_then(Value::as_duration).unwrap_or_default()
    }

    /// Error text of an error argument.
    ///
    /// Both [`Value::Error`] and non-empty strings count; anything else,
    /// including an empty string, means "no error".
    pub fn error(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::Error(e) => Some(e.to_string()),
            Value::Str(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Args {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Args {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a> IntoIterator for &'a Args {
    type Item = (&'a String, &'a Value);
    type IntoIter = hash_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Args {
    type Item = (String, Value);
    type IntoIter = hash_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
