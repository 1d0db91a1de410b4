//! Standard pattern functions.
//!
//! Builders for the common shapes of pattern function, and
//! [`standard_registry`], which binds the canonical argument keys to
//! template characters:
//!
//! | char | key | | char | key |
//! |---|---|---|---|---|
//! | `T` | `start_time` | | `f` | `func_name` |
//! | `E` | `end_time` | | `c` | `command_name` |
//! | `D` | `duration` | | `n` | `collection_name` |
//! | `u` | `uuid` | | `d` | `db_name` |
//! | `U` | `web_url` | | `t` | `table` |
//! | `M` | `web_method` | | `o` | `operation` |
//! | `s` | `source` | | `q` | `sql` |
//! | `e` | `error` | | `k` | `key` |
//! | `L` | `url` | | `v` | `value` |
//! | `m` | `method` | | `S` | `status_code` |
//! | `r` | `request_body` | | `R` | `response_body` |
//! | `x` | `extra` | | | |

use hookwire_core::{Args, PatternFn, PatternRegistry, PatternResult, TIME_FORMAT, Value, keys};
use std::sync::Arc;

/// Readable single-line template for terminals.
pub const DEFAULT_STDOUT_PATTERN: &str = "%T %u %s %f %D %e";

/// One JSON object per record, for files.
pub const DEFAULT_FILE_PATTERN: &str = "%J{TEDuUMsefcndtoqkvLmSrRx}";

/// Text of a string argument, rendered even when empty.
pub fn string(field: &'static str, key: &'static str) -> PatternFn {
    Arc::new(move |args: &Args| PatternResult::new(key, args.str(field).to_owned()))
}

/// Text of a string argument; skipped when empty or absent.
pub fn optional_string(field: &'static str, key: &'static str) -> PatternFn {
    Arc::new(move |args: &Args| {
        let text = args.str(field);
        PatternResult::with_skip(key, text.to_owned(), text.is_empty())
    })
}

/// The raw value of an argument; skipped when absent or null.
pub fn value(field: &'static str, key: &'static str) -> PatternFn {
    Arc::new(move |args: &Args| match args.get(field) {
        Some(v) if !v.is_null() => PatternResult::new(key, v.clone()),
        _ => PatternResult::skip(key),
    })
}

/// A timestamp argument formatted with a chrono format string.
pub fn time(field: &'static str, key: &'static str, format: &'static str) -> PatternFn {
    Arc::new(move |args: &Args| match args.time(field) {
        Some(t) => PatternResult::new(key, t.format(format).to_string()),
        None => PatternResult::skip(key),
    })
}

/// A duration argument in its `Debug` form (`1.5ms`).
pub fn duration(field: &'static str, key: &'static str) -> PatternFn {
    Arc::new(move |args: &Args| match args.get(field).and_then(Value::as_duration) {
        Some(d) => PatternResult::new(key, d),
        None => PatternResult::skip(key),
    })
}

/// Error text of an error argument; skipped when there is no error.
pub fn error(field: &'static str, key: &'static str) -> PatternFn {
    Arc::new(move |args: &Args| match args.error(field) {
        Some(text) => PatternResult::new(key, text),
        None => PatternResult::skip(key),
    })
}

/// The same value for every record.
pub fn constant(key: &'static str, value: impl Into<Value>) -> PatternFn {
    let value = value.into();
    Arc::new(move |_: &Args| PatternResult::new(key, value.clone()))
}

/// Registry binding the canonical keys to their template characters.
pub fn standard_registry() -> PatternRegistry {
    let mut registry = PatternRegistry::new();
    registry
        .insert_shared('T', time(keys::START_TIME, keys::START_TIME, TIME_FORMAT))
        .insert_shared('E', time(keys::END_TIME, keys::END_TIME, TIME_FORMAT))
        .insert_shared('D', duration(keys::DURATION, keys::DURATION))
        .insert_shared('u', string(keys::UUID, keys::UUID))
        .insert_shared('U', optional_string(keys::WEB_URL, keys::WEB_URL))
        .insert_shared('M', optional_string(keys::WEB_METHOD, keys::WEB_METHOD))
        .insert_shared('s', optional_string(keys::SOURCE, keys::SOURCE))
        .insert_shared('e', error(keys::ERROR, keys::ERROR))
        .insert_shared('f', optional_string(keys::FUNC_NAME, keys::FUNC_NAME))
        .insert_shared('c', optional_string(keys::COMMAND_NAME, keys::COMMAND_NAME))
        .insert_shared('n', optional_string(keys::COLLECTION_NAME, keys::COLLECTION_NAME))
        .insert_shared('d', optional_string(keys::DB_NAME, keys::DB_NAME))
        .insert_shared('t', optional_string(keys::TABLE, keys::TABLE))
        .insert_shared('o', optional_string(keys::OPERATION, keys::OPERATION))
        .insert_shared('q', optional_string(keys::SQL, keys::SQL))
        .insert_shared('k', value(keys::KEY, keys::KEY))
        .insert_shared('v', value(keys::VALUE, keys::VALUE))
        .insert_shared('L', optional_string(keys::URL, keys::URL))
        .insert_shared('m', optional_string(keys::METHOD, keys::METHOD))
        .insert_shared('S', value(keys::STATUS_CODE, keys::STATUS_CODE))
        .insert_shared('r', value(keys::REQUEST_BODY, keys::REQUEST_BODY))
        .insert_shared('R', value(keys::RESPONSE_BODY, keys::RESPONSE_BODY))
        .insert_shared('x', value(keys::EXTRA, keys::EXTRA));
    registry
}
