//! Identity tracking and cycle resolution.
//!
//! The tracker remembers, for every array or object seen during one
//! serialization, the container and key under which it was *last* found. No
//! explicit stack of open ancestors is kept. When a container shows up a second
//! time, the recorded positions are followed upward from the new occurrence:
//!
//! - reaching the repeated container itself means it is still open above us, so
//!   the occurrence closes a cycle, and the keys collected on the way are the
//!   cycle path;
//! - running out of recorded positions means it is merely shared, and the entry
//!   is overwritten with the new position so later walks follow the live path.
//!
//! Every open container's entry always describes its place on the current path,
//! which is what makes the walk equivalent to a membership test on the stack.

use crate::{Identity, Key, Value};
use std::collections::HashMap;

/// Where a container was found: its immediate container (`None` for the root)
/// and the key it sits under.
#[derive(Clone, Debug)]
pub struct Position {
    pub container: Option<Value>,
    pub key: Key,
}

#[derive(Debug)]
struct Entry {
    // Held so that the address behind the identity cannot be reused mid-call.
    _value: Value,
    position: Position,
}

/// Outcome of [`IdentityTracker::resolve`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Serialize the value normally.
    Pass,
    /// The value is an open ancestor. Carries the keys leading from it back to
    /// itself, outermost first.
    Cycle(Vec<Key>),
}

/// Per-call map from container identity to its most recent position.
#[derive(Debug, Default)]
pub struct IdentityTracker {
    entries: HashMap<Identity, Entry>,
}

impl IdentityTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct containers recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent position recorded for `value`.
    #[must_use]
    pub fn position_of(&self, value: &Value) -> Option<&Position> {
        value
            .identity()
            .and_then(|id| self.entries.get(&id))
            .map(|entry| &entry.position)
    }

    /// Classifies `value`, found under `key` inside `receiver`.
    ///
    /// Leaves always pass and are never recorded.
    ///
    /// ```rust
    /// use serde_cyclic::{IdentityTracker, Key, Object, Resolution, Value};
    ///
    /// let obj = Object::new();
    /// obj.set("a", obj.clone());
    /// let root = Value::from(obj.clone());
    ///
    /// let mut tracker = IdentityTracker::new();
    /// assert_eq!(tracker.resolve(None, &Key::Root, &root), Resolution::Pass);
    /// assert_eq!(
    ///     tracker.resolve(Some(&root), &Key::from("a"), &root),
    ///     Resolution::Cycle(vec![Key::from("a")])
    /// );
    /// ```
    pub fn resolve(&mut self, receiver: Option<&Value>, key: &Key, value: &Value) -> Resolution {
        let Some(id) = value.identity() else {
            return Resolution::Pass;
        };
        let fresh = Position {
            container: receiver.cloned(),
            key: key.clone(),
        };

        if !self.entries.contains_key(&id) {
            self.record(id, value, fresh);
            return Resolution::Pass;
        }

        let mut keys = Vec::new();
        let mut cursor = Some(&fresh);
        // A chain through distinct open containers has at most one link per entry.
        let mut budget = self.entries.len() + 1;
        while let Some(position) = cursor {
            if budget == 0 {
                break;
            }
            budget -= 1;

            keys.push(position.key.clone());
            let container = position.container.as_ref().and_then(Value::identity);
            if container == Some(id) {
                keys.reverse();
                return Resolution::Cycle(keys);
            }
            cursor = container
                .and_then(|cid| self.entries.get(&cid))
                .map(|entry| &entry.position);
        }

        self.record(id, value, fresh);
        Resolution::Pass
    }

    fn record(&mut self, id: Identity, value: &Value, position: Position) {
        self.entries.insert(
            id,
            Entry {
                _value: value.clone(),
                position,
            },
        );
    }
}
