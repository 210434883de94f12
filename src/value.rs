//! Dynamic value graph.
//!
//! This module provides the [`Value`] enum, which describes data that is not
//! necessarily a tree. Arrays and objects are shared handles: cloning an
//! [`Array`] or [`Object`] yields another reference to the *same* container, so
//! a container can appear at several places in a graph, or inside itself.
//!
//! ## Core Types
//!
//! - [`Value`]: null, bool, number, string, big integer, date, array or object
//! - [`Number`]: a finite or non-finite double, or an exact 64-bit integer
//! - [`Array`] / [`Object`]: shared, interiorly mutable containers
//! - [`Identity`]: the address that distinguishes one container from another
//!
//! ## Building a cycle
//!
//! ```rust
//! use serde_cyclic::{Object, Value};
//!
//! let obj = Object::new();
//! obj.set("a", obj.clone());
//!
//! let inner = obj.get("a").unwrap();
//! assert!(inner.ptr_eq(&Value::from(obj.clone())));
//! ```
//!
//! ## Equality
//!
//! Leaves compare by content. Arrays and objects compare by identity only, since
//! comparing the contents of a cyclic graph would never terminate.
//!
//! Graphs built with cycles keep themselves alive through their `Rc` handles.
//! Break the cycle (for example with [`Object::remove`]) to release them.

use crate::ObjectMap;
use chrono::{DateTime, SecondsFormat, Utc};
use num_bigint::BigInt;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Address of a shared container, stable for as long as a handle to it exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity(usize);

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A dynamically-typed value that may share or contain itself.
///
/// # Examples
///
/// ```rust
/// use serde_cyclic::{Number, Value};
///
/// let num = Value::Number(Number::Integer(42));
/// let text = Value::from("hello");
/// let list = Value::array(vec![num.clone(), text]);
///
/// assert!(num.is_number());
/// assert!(list.is_composite());
/// assert!(list.identity().is_some());
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    BigInt(BigInt),
    Date(DateTime<Utc>),
    Array(Array),
    Object(Object),
}

/// A numeric value: either an exact 64-bit integer or a double.
///
/// Non-finite doubles are allowed and encode as `null`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    /// Converts this number to an `i64` if it has no fractional part and fits.
    ///
    /// ```rust
    /// use serde_cyclic::Number;
    ///
    /// assert_eq!(Number::Integer(42).as_i64(), Some(42));
    /// assert_eq!(Number::Float(42.0).as_i64(), Some(42));
    /// assert_eq!(Number::Float(42.5).as_i64(), None);
    /// assert_eq!(Number::Float(f64::NAN).as_i64(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Float(f) => {
                if f.is_finite()
                    && f.fract() == 0.0
                    && *f >= i64::MIN as f64
                    && *f <= i64::MAX as f64
                {
                    Some(*f as i64)
                } else {
                    None
                }
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(fl) => write!(f, "{}", fl),
        }
    }
}

/// Shared handle to an array of values.
///
/// Clones share the same underlying vector.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Array {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity(Rc::as_ptr(&self.0) as *const () as usize)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.0.borrow_mut().push(value.into());
    }

    /// Returns a handle to the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    /// Stores `value` at `index`, padding with `null` when `index` is past the end.
    pub fn set(&self, index: usize, value: impl Into<Value>) {
        let mut items = self.0.borrow_mut();
        if index >= items.len() {
            items.resize(index + 1, Value::Null);
        }
        items[index] = value.into();
    }

    /// Copies out the element handles so that no borrow is held while they are visited.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Array({}, len={})", self.identity(), self.len())
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl From<Vec<Value>> for Array {
    fn from(items: Vec<Value>) -> Self {
        Array(Rc::new(RefCell::new(items)))
    }
}

/// Shared handle to an insertion-ordered object.
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<ObjectMap>>);

impl Object {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity(Rc::as_ptr(&self.0) as *const () as usize)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Sets a property. An existing property keeps its position.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().remove(key)
    }

    /// Copies out the entries so that no borrow is held while they are visited.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({}, len={})", self.identity(), self.len())
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl From<ObjectMap> for Object {
    fn from(map: ObjectMap) -> Self {
        Object(Rc::new(RefCell::new(map)))
    }
}

impl Value {
    /// Builds a fresh array value.
    #[must_use]
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Array::from(items))
    }

    /// Builds a fresh object value from key-value pairs.
    #[must_use]
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let map: ObjectMap = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::Object(Object::from(map))
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_bigint(&self) -> bool {
        matches!(self, Value::BigInt(_))
    }

    /// Returns `true` for arrays and objects, the values tracked by identity.
    #[inline]
    #[must_use]
    pub const fn is_composite(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }

    /// Identity of the container, or `None` for leaves.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        match self {
            Value::Array(a) => Some(a.identity()),
            Value::Object(o) => Some(o.identity()),
            _ => None,
        }
    }

    /// Returns `true` when both values are the same container.
    ///
    /// Leaves are never identical to anything, not even themselves.
    #[must_use]
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bigint(&self) -> Option<&BigInt> {
        match self {
            Value::BigInt(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

/// Renders a date the way its JSON conversion does: ISO-8601, milliseconds, `Z`.
pub(crate) fn date_to_json_string(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! from_small_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(Number::Integer(value as i64))
                }
            }
        )*
    };
}

from_small_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Value::Number(Number::Integer(i)),
            Err(_) => Value::BigInt(BigInt::from(value)),
        }
    }
}

impl From<i128> for Value {
    fn from(value: i128) -> Self {
        match i64::try_from(value) {
            Ok(i) => Value::Number(Number::Integer(i)),
            Err(_) => Value::BigInt(BigInt::from(value)),
        }
    }
}

impl From<u128> for Value {
    fn from(value: u128) -> Self {
        match i64::try_from(value) {
            Ok(i) => Value::Number(Number::Integer(i)),
            Err(_) => Value::BigInt(BigInt::from(value)),
        }
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(Number::Float(value as f64))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::Float(value))
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::BigInt(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::array(value)
    }
}

impl From<ObjectMap> for Value {
    fn from(value: ObjectMap) -> Self {
        Value::Object(Object::from(value))
    }
}

impl From<Array> for Value {
    fn from(value: Array) -> Self {
        Value::Array(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Number(Number::Integer(i))
                } else if let Some(u) = n.as_u64() {
                    Value::from(u)
                } else {
                    Value::Number(Number::Float(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::object(map.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_clone_shares_container() {
        let arr = Array::new();
        let alias = arr.clone();
        alias.push(1);
        assert_eq!(arr.len(), 1);
        assert!(arr.ptr_eq(&alias));
        assert_eq!(arr.identity(), alias.identity());
    }

    #[test]
    fn test_distinct_containers_differ() {
        let a = Value::object(Vec::<(String, Value)>::new());
        let b = Value::object(Vec::<(String, Value)>::new());
        assert!(!a.ptr_eq(&b));
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_leaves_have_no_identity() {
        assert_eq!(Value::from(1).identity(), None);
        assert!(!Value::Null.ptr_eq(&Value::Null));
        assert_eq!(Value::from("x"), Value::from("x"));
    }

    #[test]
    fn test_self_reference_debug_terminates() {
        let obj = Object::new();
        obj.set("me", obj.clone());
        let text = format!("{:?}", Value::from(obj.clone()));
        assert!(text.starts_with("Object(Object(0x"));
        obj.remove("me");
    }

    #[test]
    fn test_array_set_pads_with_null() {
        let arr = Array::new();
        arr.set(2, "c");
        assert_eq!(arr.snapshot(), vec![Value::Null, Value::Null, Value::from("c")]);
    }

    #[test]
    fn test_wide_integers_become_bigint() {
        assert!(Value::from(u64::MAX).is_bigint());
        assert!(Value::from(i128::MIN).is_bigint());
        assert_eq!(Value::from(5u128).as_i64(), Some(5));
    }

    #[test]
    fn test_date_json_string() {
        let date = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(date_to_json_string(&date), "2024-01-15T10:30:00.000Z");
    }

    #[test]
    fn test_from_json_preserves_order() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"z":null,"a":[1,2.5],"m":true}"#).unwrap();
        let value = Value::from(json);
        let obj = value.as_object().unwrap();
        let keys: Vec<_> = obj.snapshot().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        let arr = obj.get("a").unwrap();
        assert_eq!(
            arr.as_array().unwrap().snapshot(),
            vec![Value::from(1), Value::from(2.5)]
        );
    }
}
