//! Format-agnostic structured data tree.
//!
//! [`Value`] is the in-memory form of every persisted document: component
//! data, scene files, shader and material definitions. Maps keep insertion
//! order so saved documents list fields in the order they were written.
//!
//! Vectors and quaternions are encoded as fixed-arity number arrays
//! (`[x, y, z]`, `[x, y, z, w]`).

use std::fmt;

use glam::{Quat, Vec3, Vec4};
use serde::de::{self, DeserializeOwned, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::DataError;

/// A node of a structured data document.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Map(Vec<(String, Value)>),
}

impl Value {
    /// Builds a map from `(key, value)` pairs, preserving order.
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// An empty map.
    pub fn empty_map() -> Self {
        Value::Map(Vec::new())
    }

    /// Encodes a 3-vector as `[x, y, z]`.
    pub fn from_vec3(v: Vec3) -> Self {
        Value::List(v.to_array().iter().map(|&c| Value::from(c)).collect())
    }

    /// Encodes a 4-vector as `[x, y, z, w]`.
    pub fn from_vec4(v: Vec4) -> Self {
        Value::List(v.to_array().iter().map(|&c| Value::from(c)).collect())
    }

    /// Encodes a quaternion as `[x, y, z, w]`.
    pub fn from_quat(q: Quat) -> Self {
        Value::List(q.to_array().iter().map(|&c| Value::from(c)).collect())
    }

    /// Short name of this node's kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Looks up a key in a map. `Null` entries count as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v)
                .filter(|v| !v.is_null()),
            _ => None,
        }
    }

    /// Inserts or replaces a key. Turns `Null` into an empty map first.
    ///
    /// Has no effect on scalars and lists.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        if self.is_null() {
            *self = Value::empty_map();
        }
        if let Value::Map(entries) = self {
            let key = key.into();
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
        }
    }

    /// Map entries in document order.
    pub fn entries(&self) -> &[(String, Value)] {
        match self {
            Value::Map(entries) => entries,
            _ => &[],
        }
    }

    /// Fails unless this node is a map. `field` names the node in the error.
    pub fn expect_map(&self, field: &str) -> Result<&[(String, Value)], DataError> {
        match self {
            Value::Map(entries) => Ok(entries),
            other => Err(DataError::mismatch(field, "map", other.kind_name())),
        }
    }

    /// Reads this node as a list.
    pub fn read_list(&self, field: &str) -> Result<&[Value], DataError> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(DataError::mismatch(field, "list", other.kind_name())),
        }
    }

    /// Reads this node as a number.
    pub fn read_f64(&self, field: &str) -> Result<f64, DataError> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(DataError::mismatch(field, "number", other.kind_name())),
        }
    }

    /// Reads this node as a single-precision number.
    pub fn read_f32(&self, field: &str) -> Result<f32, DataError> {
        self.read_f64(field).map(|n| n as f32)
    }

    /// Reads this node as a non-negative integer.
    pub fn read_u32(&self, field: &str) -> Result<u32, DataError> {
        let n = self.read_f64(field)?;
        if n < 0.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
            return Err(DataError::mismatch(field, "unsigned integer", "number"));
        }
        Ok(n as u32)
    }

    /// Reads this node as a boolean.
    pub fn read_bool(&self, field: &str) -> Result<bool, DataError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(DataError::mismatch(field, "bool", other.kind_name())),
        }
    }

    /// Reads this node as a string.
    pub fn read_str(&self, field: &str) -> Result<&str, DataError> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(DataError::mismatch(field, "string", other.kind_name())),
        }
    }

    /// Reads a fixed-arity number array.
    pub fn read_array<const N: usize>(&self, field: &str) -> Result<[f32; N], DataError> {
        let items = self.read_list(field)?;
        if items.len() != N {
            return Err(DataError::WrongArity {
                field: field.to_owned(),
                expected: N,
                found: items.len(),
            });
        }
        let mut out = [0.0; N];
        for (slot, item) in out.iter_mut().zip(items) {
            *slot = item.read_f32(field)?;
        }
        Ok(out)
    }

    /// Reads `[x, y, z]`.
    pub fn read_vec3(&self, field: &str) -> Result<Vec3, DataError> {
        self.read_array::<3>(field).map(Vec3::from_array)
    }

    /// Reads `[x, y, z, w]`.
    pub fn read_vec4(&self, field: &str) -> Result<Vec4, DataError> {
        self.read_array::<4>(field).map(Vec4::from_array)
    }

    /// Reads `[x, y, z, w]` as a quaternion and normalizes it.
    ///
    /// A zero quaternion is rejected rather than silently turned into NaNs.
    pub fn read_quat(&self, field: &str) -> Result<Quat, DataError> {
        let q = Quat::from_array(self.read_array::<4>(field)?);
        if q.length_squared() <= f32::EPSILON {
            return Err(DataError::mismatch(field, "non-zero quaternion", "zero"));
        }
        Ok(q.normalize())
    }

    /// Reads an optional map field, falling back to `default` when absent.
    pub fn field_or<T>(
        &self,
        key: &str,
        default: T,
        read: impl FnOnce(&Value, &str) -> Result<T, DataError>,
    ) -> Result<T, DataError> {
        match self.get(key) {
            Some(value) => read(value, key),
            None => Ok(default),
        }
    }

    /// Reads a required map field.
    pub fn field<'a, T>(
        &'a self,
        key: &str,
        read: impl FnOnce(&'a Value, &str) -> Result<T, DataError>,
    ) -> Result<T, DataError> {
        match self.get(key) {
            Some(value) => read(value, key),
            None => Err(DataError::MissingField {
                field: key.to_owned(),
            }),
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

// ---------------------------------------------------------------------------
// serde integration
// ---------------------------------------------------------------------------

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
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
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a structured data value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_char<E: de::Error>(self, v: char) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut entries: Vec<(String, Value)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            entries.push((key, value));
        }
        Ok(Value::Map(entries))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Convert any `T: Serialize` into a [`Value`].
pub fn to_value<T: Serialize>(value: &T) -> Result<Value, DataError> {
    serde_json::to_value(value)
        .map(Value::from)
        .map_err(|e| DataError::Format(e.to_string()))
}

/// Convert a [`Value`] into any `T: DeserializeOwned`.
pub fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, DataError> {
    let json = serde_json::to_value(value).map_err(|e| DataError::Format(e.to_string()))?;
    serde_json::from_value(json).map_err(|e| DataError::Format(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_treats_null_as_absent() {
        let v = Value::object([("a", Value::Null), ("b", Value::from(2.0f32))]);
        assert!(v.get("a").is_none());
        assert_eq!(v.get("b"), Some(&Value::Number(2.0)));
        assert!(v.get("c").is_none());
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut v = Value::Null;
        v.insert("x", Value::from(1.0f32));
        v.insert("y", Value::from(2.0f32));
        v.insert("x", Value::from(3.0f32));
        assert_eq!(v.entries().len(), 2);
        assert_eq!(v.entries()[0], ("x".to_string(), Value::Number(3.0)));
    }

    #[test]
    fn read_vec3_arity() {
        let ok = Value::from_vec3(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(ok.read_vec3("p").unwrap(), Vec3::new(1.0, 2.0, 3.0));

        let short = Value::List(vec![Value::from(1.0f32)]);
        let err = short.read_vec3("p").unwrap_err();
        assert!(matches!(
            err,
            DataError::WrongArity {
                expected: 3,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn read_quat_normalizes() {
        let v = Value::List(vec![0.0f32, 0.0, 0.0, 2.0].into_iter().map(Value::from).collect());
        let q = v.read_quat("rotation").unwrap();
        assert!(q.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn read_quat_rejects_zero() {
        let v = Value::from_vec4(Vec4::ZERO);
        assert!(v.read_quat("rotation").is_err());
    }

    #[test]
    fn type_mismatch_names_field() {
        let v = Value::from("text");
        let err = v.read_f32("intensity").unwrap_err();
        assert_eq!(
            err.to_string(),
            "type mismatch for 'intensity': expected number, found string"
        );
    }

    #[test]
    fn json_roundtrip_preserves_order() {
        let text = r#"{"z":1,"a":[true,null,"s"],"m":{"k":2.5}}"#;
        let value: Value = serde_json::from_str(text).unwrap();
        let keys: Vec<_> = value.entries().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        let back: Value = serde_json::from_str(&serde_json::to_string(&value).unwrap()).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn typed_roundtrip_through_value() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Point {
            x: f32,
            label: String,
        }
        let p = Point {
            x: 1.5,
            label: "origin".into(),
        };
        let v = to_value(&p).unwrap();
        assert_eq!(v.get("label"), Some(&Value::from("origin")));
        let back: Point = from_value(&v).unwrap();
        assert_eq!(back, p);
    }
}
