//! Serialization.
//!
//! This module holds two serde bridges:
//!
//! - the **encoding engine**: a graph is presented to `serde_json` through a
//!   `Serialize` adapter that runs the [`TransformHook`] on every child right
//!   before serializing it, parent before child, so the hook sees nodes in the
//!   same depth-first order the JSON text is written in;
//! - [`ValueSerializer`]: converts any `T: Serialize` into a [`Value`] tree.
//!
//! ## Direct engine usage
//!
//! ```rust
//! use serde_cyclic::{encode, Array, Space, TransformHook, Value};
//!
//! let list = Array::new();
//! list.push(1);
//! list.push(list.clone());
//!
//! let json = encode(&Value::from(list.clone()), TransformHook::default(), &Space::None).unwrap();
//! assert_eq!(json, r#"[1,"[CIRCULAR #1]"]"#);
//! # list.set(1, Value::Null);
//! ```

use crate::hook::{CycleSentinel, TransformHook, ValueTransform};
use crate::value::date_to_json_string;
use crate::{Error, Identity, Key, Number, ObjectMap, Result, Space, Value};
use serde::ser::{self, SerializeMap as _, SerializeSeq as _};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::cell::RefCell;
use std::io;

/// Largest magnitude at which every integer is exactly representable as `f64`.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Serializes `root` to a JSON string, consulting `hook` for every node.
///
/// The hook must be fresh. Errors returned by its value transform or sentinel
/// producer are returned as-is.
///
/// # Errors
///
/// Returns the hook's own error, [`Error::UnsupportedType`] if a big integer
/// reaches the engine, or an engine error.
pub fn encode<T, S>(root: &Value, hook: TransformHook<T, S>, space: &Space) -> Result<String>
where
    T: ValueTransform,
    S: CycleSentinel,
{
    let mut buffer = Vec::with_capacity(256);
    encode_to_writer(&mut buffer, root, hook, space)?;
    String::from_utf8(buffer).map_err(Error::custom)
}

/// Like [`encode`], writing the JSON text to `writer`.
///
/// # Errors
///
/// As [`encode`], plus [`Error::Io`] when writing fails.
pub fn encode_to_writer<W, T, S>(
    writer: W,
    root: &Value,
    hook: TransformHook<T, S>,
    space: &Space,
) -> Result<()>
where
    W: io::Write,
    T: ValueTransform,
    S: CycleSentinel,
{
    let session = Session {
        hook: RefCell::new(hook),
        failure: RefCell::new(None),
        open: RefCell::new(Vec::new()),
    };
    let value = session
        .hook
        .borrow_mut()
        .apply(None, &Key::Root, presented(root.clone()))?
        .unwrap_or(Value::Null);
    let node = Node {
        session: &session,
        value,
    };

    let outcome = match space.indent() {
        None => {
            let mut serializer = serde_json::Serializer::new(writer);
            node.serialize(&mut serializer)
        }
        Some(indent) => {
            let formatter = PrettyFormatter::with_indent(indent.as_bytes());
            let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
            node.serialize(&mut serializer)
        }
    };

    outcome.map_err(|err| session.failure.take().unwrap_or_else(|| Error::from(err)))
}

/// Dates are handed to the hook already converted, like their JSON conversion runs
/// before any replacer.
fn presented(value: Value) -> Value {
    match value {
        Value::Date(date) => Value::String(date_to_json_string(&date)),
        other => other,
    }
}

struct Session<T, S> {
    hook: RefCell<TransformHook<T, S>>,
    // First error raised on our side; serde_json only carries its message.
    failure: RefCell<Option<Error>>,
    // Containers currently being written, outermost first.
    open: RefCell<Vec<Identity>>,
}

impl<T: ValueTransform, S: CycleSentinel> Session<T, S> {
    fn visit<E: ser::Error>(
        &self,
        receiver: &Value,
        key: Key,
        value: Value,
    ) -> std::result::Result<Option<Value>, E> {
        let outcome = self
            .hook
            .borrow_mut()
            .apply(Some(receiver), &key, presented(value));
        outcome.map_err(|err| self.fail(err))
    }

    /// Refuses to write a container that is already open. Sentinel values are
    /// not resolved again, so a cycle can still get here.
    fn enter<E: ser::Error>(&self, identity: Identity) -> std::result::Result<(), E> {
        if self.open.borrow().contains(&identity) {
            return Err(self.fail(Error::json("Converting circular structure to JSON")));
        }
        self.open.borrow_mut().push(identity);
        Ok(())
    }

    fn leave(&self) {
        self.open.borrow_mut().pop();
    }

    fn fail<E: ser::Error>(&self, err: Error) -> E {
        let message = err.to_string();
        let mut failure = self.failure.borrow_mut();
        if failure.is_none() {
            *failure = Some(err);
        }
        E::custom(message)
    }
}

struct Node<'s, T, S> {
    session: &'s Session<T, S>,
    value: Value,
}

impl<'s, T: ValueTransform, S: CycleSentinel> Node<'s, T, S> {
    fn child(&self, value: Value) -> Node<'s, T, S> {
        Node {
            session: self.session,
            value,
        }
    }
}

impl<T: ValueTransform, S: CycleSentinel> Serialize for Node<'_, T, S> {
    fn serialize<Ser>(&self, serializer: Ser) -> std::result::Result<Ser::Ok, Ser::Error>
    where
        Ser: ser::Serializer,
    {
        match &self.value {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serialize_number(*n, serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Date(date) => serializer.serialize_str(&date_to_json_string(date)),
            Value::BigInt(_) => Err(self.session.fail(Error::unsupported_type(
                "BigInt value can't be serialized in JSON",
            ))),
            Value::Array(array) => {
                self.session.enter::<Ser::Error>(array.identity())?;
                let items = array.snapshot();
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for (index, item) in items.into_iter().enumerate() {
                    let child = self
                        .session
                        .visit::<Ser::Error>(&self.value, Key::Index(index), item)?
                        .unwrap_or(Value::Null);
                    seq.serialize_element(&self.child(child))?;
                }
                let done = seq.end();
                self.session.leave();
                done
            }
            Value::Object(object) => {
                self.session.enter::<Ser::Error>(object.identity())?;
                let entries = object.snapshot();
                let mut map = serializer.serialize_map(None)?;
                for (name, item) in entries {
                    let key = Key::Name(name);
                    if let Some(child) = self.session.visit::<Ser::Error>(&self.value, key.clone(), item)? {
                        map.serialize_entry(&key.to_string(), &self.child(child))?;
                    }
                }
                let done = map.end();
                self.session.leave();
                done
            }
        }
    }
}

fn serialize_number<Ser: ser::Serializer>(
    number: Number,
    serializer: Ser,
) -> std::result::Result<Ser::Ok, Ser::Error> {
    match number {
        Number::Integer(i) => serializer.serialize_i64(i),
        Number::Float(f) if !f.is_finite() => serializer.serialize_unit(),
        Number::Float(f) if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
            serializer.serialize_i64(f as i64)
        }
        Number::Float(f) => serializer.serialize_f64(f),
    }
}

/// Serializer producing a [`Value`] tree from any `T: Serialize`.
///
/// The result never shares containers; sharing and cycles are only expressible
/// by building the graph from [`Value`] handles directly.
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<Value>,
}

pub struct SerializeTupleVariant {
    name: String,
    vec: Vec<Value>,
}

pub struct SerializeMap {
    map: ObjectMap,
    current_key: Option<String>,
}

pub struct SerializeStructVariant {
    name: String,
    map: ObjectMap,
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::array(v.iter().map(|&b| Value::from(b)).collect()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::from(variant))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        let inner = value.serialize(ValueSerializer)?;
        Ok(Value::object(vec![(variant, inner)]))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec {
            vec: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant> {
        Ok(SerializeTupleVariant {
            name: variant.to_string(),
            vec: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap {
            map: ObjectMap::with_capacity(len.unwrap_or(0)),
            current_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeMap> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeStructVariant> {
        Ok(SerializeStructVariant {
            name: variant.to_string(),
            map: ObjectMap::with_capacity(len),
        })
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::array(self.vec))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::object(vec![(self.name, Value::array(self.vec))]))
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = match key.serialize(ValueSerializer)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::BigInt(b) => b.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return Err(Error::custom("Map keys must be strings")),
        };
        self.current_key = Some(key);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.map.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::from(self.map))
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map
            .insert(key.to_string(), value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::from(self.map))
    }
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map
            .insert(key.to_string(), value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::object(vec![(self.name, Value::from(self.map))]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CircularIndex, Object, Unchanged};
    use chrono::{TimeZone, Utc};

    fn compact(value: &Value) -> Result<String> {
        encode(value, TransformHook::default(), &Space::None)
    }

    #[test]
    fn test_leaves() {
        assert_eq!(compact(&Value::Null).unwrap(), "null");
        assert_eq!(compact(&Value::from(1337)).unwrap(), "1337");
        assert_eq!(compact(&Value::from("a\"b\n")).unwrap(), r#""a\"b\n""#);
        assert_eq!(compact(&Value::from(true)).unwrap(), "true");
    }

    #[test]
    fn test_number_rendering() {
        assert_eq!(compact(&Value::from(2.0)).unwrap(), "2");
        assert_eq!(compact(&Value::from(-0.0)).unwrap(), "0");
        assert_eq!(compact(&Value::from(2.5)).unwrap(), "2.5");
        assert_eq!(compact(&Value::from(f64::NAN)).unwrap(), "null");
        assert_eq!(compact(&Value::from(f64::INFINITY)).unwrap(), "null");
    }

    #[test]
    fn test_engine_refuses_open_container() {
        let obj = Object::new();
        obj.set("a", obj.clone());
        let hook = TransformHook::new(
            Unchanged,
            |_: &[Key], ancestor: &Value| Ok(ancestor.clone()),
            true,
        );
        let err = encode(&Value::from(obj.clone()), hook, &Space::None).unwrap_err();
        assert_eq!(err, Error::json("Converting circular structure to JSON"));
        obj.remove("a");
    }

    #[test]
    fn test_closed_container_may_reappear() {
        let shared = Object::new();
        shared.set("x", 1);
        let value = Value::array(vec![Value::from(shared.clone()), Value::from(shared)]);
        assert_eq!(compact(&value).unwrap(), r#"[{"x":1},{"x":1}]"#);
    }

    #[test]
    fn test_date_is_iso_string() {
        let date = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let value = Value::object(vec![("at", Value::from(date))]);
        assert_eq!(compact(&value).unwrap(), r#"{"at":"2024-01-15T10:30:00.000Z"}"#);
    }

    #[test]
    fn test_bigint_refused_without_coercion() {
        let value = Value::object(vec![("a", Value::from(num_bigint::BigInt::from(5)))]);
        let hook = TransformHook::new(Unchanged, CircularIndex::new(), false);
        let err = encode(&value, hook, &Space::None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)));
    }

    #[test]
    fn test_skipped_entries() {
        let value = Value::object(vec![
            ("keep", Value::from(1)),
            ("drop", Value::from(2)),
        ]);
        let list = Value::array(vec![Value::from(1), Value::from(2)]);
        let drop_twos = |_: &Key, v: Value| -> Result<Option<Value>> {
            Ok(if v.as_i64() == Some(2) { None } else { Some(v) })
        };

        let hook = TransformHook::new(drop_twos, CircularIndex::new(), true);
        assert_eq!(encode(&value, hook, &Space::None).unwrap(), r#"{"keep":1}"#);

        let hook = TransformHook::new(drop_twos, CircularIndex::new(), true);
        assert_eq!(encode(&list, hook, &Space::None).unwrap(), "[1,null]");

        let hook = TransformHook::new(|_: &Key, _: Value| Ok(None), CircularIndex::new(), true);
        assert_eq!(encode(&list, hook, &Space::None).unwrap(), "null");
    }

    #[test]
    fn test_transform_error_is_returned_unchanged() {
        let value = Value::object(vec![("a", Value::object(vec![("b", Value::from(1))]))]);
        let hook = TransformHook::new(
            |key: &Key, v: Value| {
                if key == &Key::from("b") {
                    Err(Error::custom("refusing b"))
                } else {
                    Ok(Some(v))
                }
            },
            CircularIndex::new(),
            true,
        );
        let err = encode(&value, hook, &Space::None).unwrap_err();
        assert_eq!(err, Error::custom("refusing b"));
    }

    #[test]
    fn test_transform_may_mutate_graph() {
        let obj = Object::new();
        obj.set("a", 1);
        obj.set("b", 2);
        let root = Value::from(obj.clone());
        let handle = obj.clone();
        let hook = TransformHook::new(
            move |key: &Key, v: Value| {
                if key == &Key::from("a") {
                    handle.set("c", 3);
                }
                Ok(Some(v))
            },
            CircularIndex::new(),
            true,
        );
        // Entries are snapshotted before the first child is visited.
        assert_eq!(encode(&root, hook, &Space::None).unwrap(), r#"{"a":1,"b":2}"#);
        assert_eq!(obj.len(), 3);
    }

    #[test]
    fn test_pretty_layout() {
        let value = Value::object(vec![
            ("a", Value::array(vec![Value::from(1), Value::from(2)])),
            ("e", Value::array(vec![])),
            ("o", Value::object(Vec::<(String, Value)>::new())),
        ]);
        let json = encode(&value, TransformHook::default(), &Space::Indent(2)).unwrap();
        assert_eq!(
            json,
            "{\n  \"a\": [\n    1,\n    2\n  ],\n  \"e\": [],\n  \"o\": {}\n}"
        );
    }

    #[derive(Serialize)]
    enum Shape {
        Point,
        Circle(f64),
        Rect { w: u32, h: u32 },
        Pair(u8, u8),
    }

    #[test]
    fn test_value_serializer() {
        let shapes = vec![
            Shape::Point,
            Shape::Circle(1.5),
            Shape::Rect { w: 2, h: 3 },
            Shape::Pair(4, 5),
        ];
        let value = shapes.serialize(ValueSerializer).unwrap();
        assert_eq!(
            compact(&value).unwrap(),
            r#"["Point",{"Circle":1.5},{"Rect":{"w":2,"h":3}},{"Pair":[4,5]}]"#
        );
    }

    #[test]
    fn test_value_serializer_wide_integers() {
        let value = (u128::MAX, 7u64).serialize(ValueSerializer).unwrap();
        assert_eq!(
            compact(&value).unwrap(),
            r#"["340282366920938463463374607431768211455",7]"#
        );
    }
}
