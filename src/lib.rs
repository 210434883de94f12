//! # serde_cyclic
//!
//! Cycle-safe JSON serialization for value graphs that are not trees.
//!
//! Ordinary serializers recurse forever on a structure that contains itself.
//! `serde_cyclic` walks the graph depth-first and, at the exact point where a
//! container would be re-entered while it is still being written, emits a
//! sentinel instead. Containers that are merely *shared* (reachable twice, but
//! not from themselves) are written out in full at every occurrence, exactly as
//! if they were separate copies.
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_cyclic::{to_string, Object, Value};
//!
//! let obj = Object::new();
//! let inner = Object::new();
//! inner.set("a", obj.clone());
//! obj.set("a", inner);
//!
//! assert_eq!(
//!     to_string(&Value::from(obj.clone())).unwrap(),
//!     r#"{"a":{"a":"[CIRCULAR #1]"}}"#
//! );
//! # obj.remove("a");
//! ```
//!
//! ## Shared, not cyclic
//!
//! ```rust
//! use serde_cyclic::{graph, to_string};
//!
//! let third = graph!({ "x": 1 });
//! let root = graph!([{ "a": (third.clone()) }, { "a": (third.clone()) }]);
//! assert_eq!(to_string(&root).unwrap(), r#"[{"a":{"x":1}},{"a":{"x":1}}]"#);
//! ```
//!
//! ## Custom transforms and sentinels
//!
//! ```rust
//! use serde_cyclic::{to_string_with, Key, Object, StringifyOptions, Value};
//!
//! let obj = Object::new();
//! obj.set("a", 14);
//! let b = Object::new();
//! let c = Object::new();
//! b.set("c", c.clone());
//! c.set("d", b.clone());
//! obj.set("b", b.clone());
//!
//! let json = to_string_with(
//!     &Value::from(obj.clone()),
//!     |_key: &Key, value: Value| {
//!         Ok(Some(match value.as_i64() {
//!             Some(n) => Value::from(format!("{}h", n)),
//!             None => value,
//!         }))
//!     },
//!     |path: &[Key], _ancestor: &Value| {
//!         Ok(Value::object(vec![
//!             ("circular", Value::from(true)),
//!             ("circleLength", Value::from(path.len() as i64)),
//!         ]))
//!     },
//!     StringifyOptions::new(),
//! )
//! .unwrap();
//! assert_eq!(
//!     json,
//!     r#"{"a":"14h","b":{"c":{"d":{"circular":true,"circleLength":"2h"}}}}"#
//! );
//! # c.remove("d");
//! ```
//!
//! Note that the sentinel's own children still pass through the value transform.
//!
//! ## Architecture
//!
//! - [`TransformHook`]: called by the engine for every node; applies the value
//!   transform, big integer coercion, and cycle substitution
//! - [`IdentityTracker`]: remembers where each container was last seen and walks
//!   those positions upward to tell cycles from shared references
//! - [`encode`]: the JSON engine (`serde_json`) driven through the hook
//!
//! A hook owns all per-call state; nothing persists between calls.

pub mod coerce;
pub mod error;
pub mod hook;
pub mod macros;
pub mod map;
pub mod options;
pub mod path;
pub mod ser;
pub mod tracker;
pub mod value;

pub use coerce::coerce;
pub use error::{Error, Result};
pub use hook::{CircularIndex, CycleSentinel, TransformHook, Unchanged, ValueTransform};
pub use map::ObjectMap;
pub use options::{Space, StringifyOptions};
pub use path::Key;
pub use ser::{encode, encode_to_writer, ValueSerializer};
pub use tracker::{IdentityTracker, Position, Resolution};
pub use value::{Array, Identity, Number, Object, Value};

use serde::Serialize;
use std::io;

/// Serializes a value graph to compact JSON, replacing cycles with
/// `"[CIRCULAR #n]"` and big integers with decimal strings.
///
/// # Errors
///
/// Fails only if the engine rejects the output writer, which cannot happen for
/// a string.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string(value: &Value) -> Result<String> {
    to_string_with_options(value, StringifyOptions::default())
}

/// Serializes a value graph to JSON indented by two spaces per level.
///
/// # Errors
///
/// See [`to_string`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_pretty(value: &Value) -> Result<String> {
    to_string_with_options(value, StringifyOptions::pretty())
}

/// Serializes a value graph with the default transform and sentinel.
///
/// ```rust
/// use num_bigint::BigInt;
/// use serde_cyclic::{graph, to_string_with_options, StringifyOptions, Value};
///
/// let data = graph!({ "a": (BigInt::from(7)) });
/// let options = StringifyOptions::pretty();
/// assert_eq!(to_string_with_options(&data, options).unwrap(), "{\n  \"a\": \"7\"\n}");
/// ```
///
/// # Errors
///
/// Returns [`Error::UnsupportedType`] when coercion is disabled and a big
/// integer is encountered.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options(value: &Value, options: StringifyOptions) -> Result<String> {
    to_string_with(value, Unchanged, CircularIndex::new(), options)
}

/// Serializes a value graph with a caller-supplied value transform and cycle
/// sentinel producer.
///
/// # Errors
///
/// Errors returned by `transform` or `sentinel` are returned unchanged; big
/// integers reaching the engine fail with [`Error::UnsupportedType`].
pub fn to_string_with<T, S>(
    value: &Value,
    transform: T,
    sentinel: S,
    options: StringifyOptions,
) -> Result<String>
where
    T: ValueTransform,
    S: CycleSentinel,
{
    let hook = TransformHook::new(transform, sentinel, options.coerce_bigints);
    encode(value, hook, &options.space)
}

/// Serializes a value graph to a writer.
///
/// # Errors
///
/// As [`to_string_with_options`], plus [`Error::Io`] on write failure.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W>(writer: W, value: &Value) -> Result<()>
where
    W: io::Write,
{
    to_writer_with_options(writer, value, StringifyOptions::default())
}

/// Serializes a value graph to a writer with custom options.
///
/// # Errors
///
/// As [`to_string_with_options`], plus [`Error::Io`] on write failure.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W>(writer: W, value: &Value, options: StringifyOptions) -> Result<()>
where
    W: io::Write,
{
    let hook = TransformHook::new(Unchanged, CircularIndex::new(), options.coerce_bigints);
    encode_to_writer(writer, value, hook, &options.space)
}

/// Converts any `T: Serialize` into a [`Value`] tree.
///
/// ```rust
/// use serde::Serialize;
/// use serde_cyclic::{to_string, to_value};
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let value = to_value(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(to_string(&value).unwrap(), r#"{"x":1,"y":2}"#);
/// ```
///
/// # Errors
///
/// Returns an error if a map key is not a string, number or bool.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}
