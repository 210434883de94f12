//! The per-node transform hook.
//!
//! The JSON engine calls [`TransformHook::apply`] once for every `(receiver,
//! key, value)` triple, parent before child, in container order. The hook:
//!
//! 1. runs the caller's [`ValueTransform`] (returning `None` skips the entry);
//! 2. coerces big integers in leaf results to decimal strings, when enabled;
//! 3. hands containers to the [`IdentityTracker`], and on a cycle replaces the
//!    value with whatever the [`CycleSentinel`] produces.
//!
//! A hook carries state for exactly one root value. Build a new one per call.
//!
//! ## Custom hooks
//!
//! Closures implement both traits:
//!
//! ```rust
//! use serde_cyclic::{encode, Key, Object, Space, TransformHook, Value};
//!
//! let obj = Object::new();
//! obj.set("n", 14);
//! obj.set("me", obj.clone());
//!
//! let hook = TransformHook::new(
//!     |_key: &Key, value: Value| Ok(Some(value)),
//!     |path: &[Key], _ancestor: &Value| Ok(Value::from(format!("<cycle of {}>", path.len()))),
//!     true,
//! );
//! let json = encode(&Value::from(obj.clone()), hook, &Space::None).unwrap();
//! assert_eq!(json, r#"{"n":14,"me":"<cycle of 1>"}"#);
//! # obj.remove("me");
//! ```

use crate::coerce::coerce;
use crate::tracker::{IdentityTracker, Resolution};
use crate::{Identity, Key, Result, Value};
use std::collections::HashMap;

/// Caller-supplied replacement applied to every node before anything else.
///
/// Returning `Ok(None)` omits an object property (array elements become
/// `null`). Errors are returned from the serialization call unchanged.
pub trait ValueTransform {
    fn transform(&mut self, key: &Key, value: Value) -> Result<Option<Value>>;
}

impl<F> ValueTransform for F
where
    F: FnMut(&Key, Value) -> Result<Option<Value>>,
{
    fn transform(&mut self, key: &Key, value: Value) -> Result<Option<Value>> {
        self(key, value)
    }
}

/// The identity transform.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unchanged;

impl ValueTransform for Unchanged {
    fn transform(&mut self, _key: &Key, value: Value) -> Result<Option<Value>> {
        Ok(Some(value))
    }
}

/// Produces the value emitted where a cycle closes.
///
/// `path` holds the keys leading from `ancestor` back to itself, outermost
/// first. `ancestor` is the repeated container after the value transform ran.
/// A returned container is serialized normally and is not checked for cycles.
pub trait CycleSentinel {
    fn sentinel(&mut self, path: &[Key], ancestor: &Value) -> Result<Value>;
}

impl<F> CycleSentinel for F
where
    F: FnMut(&[Key], &Value) -> Result<Value>,
{
    fn sentinel(&mut self, path: &[Key], ancestor: &Value) -> Result<Value> {
        self(path, ancestor)
    }
}

/// Default sentinel: `"[CIRCULAR #n]"`, numbering each distinct ancestor from 1
/// in the order its first cycle closes.
///
/// ```rust
/// use serde_cyclic::{CircularIndex, CycleSentinel, Value};
///
/// let mut sentinel = CircularIndex::new();
/// let a = Value::array(vec![]);
/// let b = Value::array(vec![]);
/// assert_eq!(sentinel.sentinel(&[], &a).unwrap(), Value::from("[CIRCULAR #1]"));
/// assert_eq!(sentinel.sentinel(&[], &b).unwrap(), Value::from("[CIRCULAR #2]"));
/// assert_eq!(sentinel.sentinel(&[], &a).unwrap(), Value::from("[CIRCULAR #1]"));
/// ```
#[derive(Debug, Default)]
pub struct CircularIndex {
    indexes: HashMap<Identity, usize>,
    anchors: Vec<Value>,
    next: usize,
}

impl CircularIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn index_of(&mut self, ancestor: &Value) -> usize {
        let id = ancestor.identity();
        if let Some(index) = id.and_then(|id| self.indexes.get(&id)) {
            return *index;
        }
        self.next += 1;
        if let Some(id) = id {
            self.indexes.insert(id, self.next);
        }
        // Keeps the address behind `id` from being handed to another container.
        self.anchors.push(ancestor.clone());
        self.next
    }
}

impl CycleSentinel for CircularIndex {
    fn sentinel(&mut self, _path: &[Key], ancestor: &Value) -> Result<Value> {
        Ok(Value::String(format!("[CIRCULAR #{}]", self.index_of(ancestor))))
    }
}

/// Stateful hook for one serialization call.
pub struct TransformHook<T = Unchanged, S = CircularIndex> {
    tracker: IdentityTracker,
    transform: T,
    sentinel: S,
    coerce_bigints: bool,
}

impl Default for TransformHook {
    fn default() -> Self {
        TransformHook::new(Unchanged, CircularIndex::new(), true)
    }
}

impl<T: ValueTransform, S: CycleSentinel> TransformHook<T, S> {
    /// Builds a hook with its own empty identity map.
    pub fn new(transform: T, sentinel: S, coerce_bigints: bool) -> Self {
        TransformHook {
            tracker: IdentityTracker::new(),
            transform,
            sentinel,
            coerce_bigints,
        }
    }

    #[must_use]
    pub fn coerces_bigints(&self) -> bool {
        self.coerce_bigints
    }

    /// Processes one node. `receiver` is the container being expanded, `None`
    /// for the root.
    ///
    /// Returns the value to encode in place of `value`, or `None` to skip it.
    pub fn apply(&mut self, receiver: Option<&Value>, key: &Key, value: Value) -> Result<Option<Value>> {
        let Some(value) = self.transform.transform(key, value)? else {
            return Ok(None);
        };

        if !value.is_composite() {
            return Ok(Some(coerce(value, self.coerce_bigints)));
        }

        match self.tracker.resolve(receiver, key, &value) {
            Resolution::Pass => Ok(Some(value)),
            Resolution::Cycle(path) => {
                let ancestor = coerce(value, self.coerce_bigints);
                let replacement = self.sentinel.sentinel(&path, &ancestor)?;
                Ok(Some(coerce(replacement, self.coerce_bigints)))
            }
        }
    }
}
