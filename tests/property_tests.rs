//! Property-based tests.
//!
//! - Acyclic trees must serialize byte-for-byte like `serde_json` does.
//! - Random graphs with sharing and cycles (built the way the randomized
//!   conformance fuzzer builds them) must match a reference renderer that keeps
//!   an explicit stack of open containers.

use num_bigint::BigInt;
use proptest::prelude::*;
use serde_cyclic::{to_string, to_string_pretty, Array, Identity, Key, Object, Value};
use std::collections::{HashMap, VecDeque};

fn json_tree() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::Bool),
        any::<i64>().prop_map(serde_json::Value::from),
        "[a-z \"\\\\\n]{0,8}".prop_map(serde_json::Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(serde_json::Value::Array),
            prop::collection::btree_map("[a-f]{1,3}", inner, 0..6)
                .prop_map(|map| serde_json::Value::Object(map.into_iter().collect())),
        ]
    })
}

/// Deterministic source of choices for the graph generator.
struct Dice<'a> {
    rolls: &'a [u32],
    pos: usize,
}

impl Dice<'_> {
    fn roll(&mut self, sides: u32) -> u32 {
        let value = self.rolls[self.pos % self.rolls.len()];
        self.pos += 1;
        value % sides
    }
}

const MAX_CONTAINERS: usize = 40;

fn random_leaf(dice: &mut Dice<'_>, generated: &[Value]) -> Value {
    match dice.roll(15) {
        0..=4 => {
            if generated.is_empty() {
                Value::Null
            } else {
                generated[dice.roll(generated.len() as u32) as usize].clone()
            }
        }
        5..=9 => Value::from(dice.roll(20)),
        10..=12 => {
            let text: String = (0..12)
                .map(|_| char::from(b'a' + dice.roll(5) as u8))
                .collect();
            Value::from(text)
        }
        _ => Value::from(BigInt::from(dice.roll(20))),
    }
}

fn place(holder: &Value, key: &Key, value: Value) {
    match (holder, key) {
        (Value::Array(array), Key::Index(index)) => array.set(*index, value),
        (Value::Object(object), Key::Name(name)) => {
            object.set(name.clone(), value);
        }
        _ => unreachable!("holder and key kinds always match"),
    }
}

/// Breadth-first random graph; leaves may point back at any container made so far.
fn random_graph(rolls: &[u32]) -> Value {
    let mut dice = Dice { rolls, pos: 0 };
    let slot = Array::new();
    slot.push(Value::Null);

    let mut generated: Vec<Value> = Vec::new();
    let mut queue = VecDeque::new();
    queue.push_back((Value::from(slot.clone()), Key::Index(0)));

    while let Some((holder, key)) = queue.pop_front() {
        let value = if generated.len() >= MAX_CONTAINERS || dice.roll(2) == 0 {
            random_leaf(&mut dice, &generated)
        } else if dice.roll(2) == 0 {
            let array = Value::from(Array::new());
            for index in 0..dice.roll(5) as usize {
                place(&array, &Key::Index(index), Value::Null);
                queue.push_back((array.clone(), Key::Index(index)));
            }
            generated.push(array.clone());
            array
        } else {
            let object = Value::from(Object::new());
            for index in 0..dice.roll(5) {
                let name = Key::Name(char::from(b'a' + index as u8).to_string());
                place(&object, &name, Value::Null);
                queue.push_back((object.clone(), name));
            }
            generated.push(object.clone());
            object
        };
        place(&holder, &key, value);
    }

    slot.get(0).unwrap_or_default()
}

fn reference(
    value: &Value,
    open: &mut Vec<Identity>,
    indexes: &mut HashMap<Identity, usize>,
) -> serde_json::Value {
    if let Some(id) = value.identity() {
        if open.contains(&id) {
            let next = indexes.len() + 1;
            let index = *indexes.entry(id).or_insert(next);
            return serde_json::Value::String(format!("[CIRCULAR #{}]", index));
        }
    }

    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => serde_json::Value::from(n.as_i64().unwrap_or_default()),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::BigInt(b) => serde_json::Value::String(b.to_string()),
        Value::Date(_) => unreachable!("generator makes no dates"),
        Value::Array(array) => {
            open.push(array.identity());
            let items = array
                .snapshot()
                .iter()
                .map(|item| reference(item, open, indexes))
                .collect();
            open.pop();
            serde_json::Value::Array(items)
        }
        Value::Object(object) => {
            open.push(object.identity());
            // serde_json keeps insertion order here (preserve_order).
            let entries = object
                .snapshot()
                .into_iter()
                .map(|(k, v)| (k, reference(&v, open, indexes)))
                .collect();
            open.pop();
            serde_json::Value::Object(entries)
        }
    }
}

proptest! {
    #[test]
    fn prop_acyclic_matches_serde_json(tree in json_tree()) {
        let value = Value::from(tree.clone());
        prop_assert_eq!(to_string(&value).unwrap(), serde_json::to_string(&tree).unwrap());
        prop_assert_eq!(
            to_string_pretty(&value).unwrap(),
            serde_json::to_string_pretty(&tree).unwrap()
        );
    }

    #[test]
    fn prop_graphs_match_explicit_stack(rolls in prop::collection::vec(any::<u32>(), 1..256)) {
        let graph = random_graph(&rolls);
        let expected = reference(&graph, &mut Vec::new(), &mut HashMap::new());
        prop_assert_eq!(to_string(&graph).unwrap(), serde_json::to_string(&expected).unwrap());
    }
}
