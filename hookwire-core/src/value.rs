//! Argument values.
//!
//! Hooks carry a bag of loosely-typed values. [`Value`] is the tagged union
//! that every argument is stored as; pattern functions read it back through
//! the typed accessors on [`Args`](crate::Args), which fall back to defaults
//! instead of failing on a missing key or a type mismatch.

use chrono::{DateTime, Local};
use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};
use std::{any::Any, collections::BTreeMap, fmt, sync::Arc, time::Duration};

/// Text layout used when a timestamp is rendered as a plain value.
pub const TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.3f";

/// A single argument value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value. Renders as the empty string and as JSON `null`.
    #[default]
    Null,
    /// UTF-8 text.
    Str(String),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point number.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
    /// Wall-clock timestamp.
    Time(DateTime<Local>),
    /// Elapsed time.
    Duration(Duration),
    /// Raw bytes, rendered as lossy UTF-8.
    Bytes(Vec<u8>),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Nested mapping with deterministic key order.
    Map(BTreeMap<String, Value>),
    /// Pre-built JSON document.
    Json(serde_json::Value),
    /// An error captured from the wrapped operation.
    Error(Arc<dyn std::error::Error + Send + Sync>),
    /// Anything else; rendered by its label, never serialized.
    Opaque(Opaque),
}

/// A type-erased value that only knows how to name itself.
#[derive(Clone)]
pub struct Opaque {
    label: Arc<str>,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    /// Wrap `value`, rendering it as `label` in text positions.
    pub fn new<T: Any + Send + Sync>(label: impl Into<Arc<str>>, value: T) -> Self {
        Self {
            label: label.into(),
            inner: Arc::new(value),
        }
    }

    /// The text this value renders as.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Borrow the wrapped value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Opaque").field(&self.label).finish()
    }
}

impl Value {
    /// Wrap an error value.
    pub fn error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Value::Error(Arc::new(err))
    }

    /// Wrap an arbitrary value under a display label.
    pub fn opaque<T: Any + Send + Sync>(label: impl Into<Arc<str>>, value: T) -> Self {
        Value::Opaque(Opaque::new(label, value))
    }

    /// True for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the text of a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view; unsigned values that fit are accepted.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            Value::UInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Unsigned view; non-negative signed values are accepted.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::UInt(v) => Some(v),
            Value::Int(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Float view; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(v),
            Value::Int(v) => Some(v as f64),
            Value::UInt(v) => Some(v as f64),
            _ => None,
        }
    }

    /// Boolean view.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// Timestamp view.
    pub fn as_time(&self) -> Option<DateTime<Local>> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }

    /// Duration view.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Value::Duration(d) => Some(*d),
            _ => None,
        }
    }

    /// Borrow the wrapped error.
    pub fn as_error(&self) -> Option<&(dyn std::error::Error + Send + Sync)> {
        match self {
            Value::Error(e) => Some(e.as_ref()),
            _ => None,
        }
    }

    /// Convert to a JSON document. Fails only for [`Value::Opaque`] content.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Str(s) => f.write_str(s),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Time(t) => write!(f, "{}", t.format(TIME_FORMAT)),
            Value::Duration(d) => write!(f, "{d:?}"),
            Value::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            Value::Json(j) => write!(f, "{j}"),
            Value::Error(e) => write!(f, "{e}"),
            Value::Opaque(o) => f.write_str(o.label()),
            Value::List(items) => match serde_json::to_string(self) {
                Ok(s) => f.write_str(&s),
                Err(_) => {
                    f.write_str("[")?;
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            f.write_str(" ")?;
                        }
                        write!(f, "{item}")?;
                    }
                    f.write_str("]")
                }
            },
            Value::Map(map) => match serde_json::to_string(self) {
                Ok(s) => f.write_str(&s),
                Err(_) => write_loose_map(f, map.iter()),
            },
        }
    }
}

/// Write `{k:v k:v}` using each value's text form.
///
/// This is the last-resort rendering for mappings that cannot be encoded as
/// JSON.
pub fn write_loose_map<'a, I>(f: &mut impl fmt::Write, entries: I) -> fmt::Result
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    f.write_char('{')?;
    for (i, (k, v)) in entries.into_iter().enumerate() {
        if i > 0 {
            f.write_char(' ')?;
        }
        write!(f, "{k}:{v}")?;
    }
    f.write_char('}')
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => Arc::ptr_eq(a, b) || a.to_string() == b.to_string(),
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(&a.inner, &b.inner),
            _ => false,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::UInt(v) => serializer.serialize_u64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Time(t) => serializer.collect_str(&t.format(TIME_FORMAT)),
            Value::Duration(d) => serializer.collect_str(&format_args!("{d:?}")),
            Value::Bytes(b) => serializer.serialize_str(&String::from_utf8_lossy(b)),
            Value::Json(j) => j.serialize(serializer),
            Value::Error(e) => serializer.collect_str(e),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Opaque(o) => Err(S::Error::custom(format_args!(
                "opaque value `{}` cannot be serialized",
                o.label()
            ))),
        }
    }
}

// Conversions

macro_rules! impl_from {
    ($($ty:ty => $variant:ident $(as $cast:ty)?),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v $(as $cast)?)
                }
            }
        )+
    };
}

impl_from! {
    String => Str,
    i64 => Int,
    i32 => Int as i64,
    i16 => Int as i64,
    u64 => UInt,
    u32 => UInt as u64,
    u16 => UInt as u64,
    usize => UInt as u64,
    f64 => Float,
    f32 => Float as f64,
    bool => Bool,
    DateTime<Local> => Time,
    Duration => Duration,
    Vec<u8> => Bytes,
    Vec<Value> => List,
    BTreeMap<String, Value> => Map,
    serde_json::Value => Json,
    Opaque => Opaque,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Str(v.clone())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
