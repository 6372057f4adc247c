//! Generic JSON values.
//!
//! [`Value`] is the tree produced by the
//! [`TreeAssembler`](crate::TreeAssembler) and by the tree decoder: a tagged
//! variant over the JSON scalar kinds, arrays, and insertion-ordered objects.
//! Values are immutable once returned by an assembler. [`Display`] renders
//! compact JSON text, which is also the write-side forward pass: a value can
//! be serialized and fed back through the byte pipeline.
//!
//! [`Display`]: core::fmt::Display

use core::fmt;

use bstr::ByteSlice;
use indexmap::IndexMap;

/// An ordered JSON object: field insertion order is preserved, keys are
/// unique, and a duplicate field name overwrites the earlier value in place.
pub type Map = IndexMap<String, Value>;

/// A JSON array.
pub type Array = Vec<Value>;

/// A generic JSON value.
///
/// Integers keep the width split reported by the lexer: values that fit in
/// 32 bits are [`Value::Int`], wider ones [`Value::Long`]. [`Value::as_i64`]
/// reads both.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// `null`.
    #[default]
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// An integer that fits in 32 bits.
    Int(i32),
    /// An integer wider than 32 bits.
    Long(i64),
    /// A floating-point number.
    Double(f64),
    /// A string.
    String(String),
    /// An opaque embedded payload from a lexer extension.
    ///
    /// Rendered by [`Display`](core::fmt::Display) as a JSON string of the
    /// payload's lossily decoded text.
    Embedded(Vec<u8>),
    /// An array of values, in document order.
    Array(Array),
    /// An object with insertion-ordered fields.
    Object(Map),
}

impl Value {
    /// Whether this value is `null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The boolean payload, if this is a [`Value::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer payload of an [`Value::Int`] or [`Value::Long`].
    ///
    /// ```
    /// # use jsonflume::Value;
    /// assert_eq!(Value::Int(7).as_i64(), Some(7));
    /// assert_eq!(Value::Long(1 << 40).as_i64(), Some(1 << 40));
    /// assert_eq!(Value::Double(7.0).as_i64(), None);
    /// ```
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(i64::from(*n)),
            Value::Long(n) => Some(*n),
            _ => None,
        }
    }

    /// The numeric payload widened to `f64`, for any number variant.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(f64::from(*n)),
            #[allow(clippy::cast_precision_loss)]
            Value::Long(n) => Some(*n as f64),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// The string payload, if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The elements, if this is a [`Value::Array`].
    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The fields, if this is a [`Value::Object`].
    #[must_use]
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(m) => Some(m),
            _ => None,
        }
    }

    /// Looks up a field by name on an object value.
    ///
    /// Returns `None` for missing fields and for non-object values.
    ///
    /// ```
    /// # use jsonflume::{Map, Value};
    /// let mut m = Map::new();
    /// m.insert("id".to_string(), Value::Int(3));
    /// let v = Value::Object(m);
    /// assert_eq!(v.get("id"), Some(&Value::Int(3)));
    /// assert_eq!(v.get("missing"), None);
    /// ```
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Value::Object(m) => m.get(field),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Object(m)
    }
}

fn write_escaped_char(f: &mut fmt::Formatter<'_>, ch: char) -> fmt::Result {
    match ch {
        '"' => f.write_str("\\\""),
        '\\' => f.write_str("\\\\"),
        '\n' => f.write_str("\\n"),
        '\r' => f.write_str("\\r"),
        '\t' => f.write_str("\\t"),
        '\u{08}' => f.write_str("\\b"),
        '\u{0C}' => f.write_str("\\f"),
        c if c < '\u{20}' => write!(f, "\\u{:04x}", c as u32),
        c => fmt::Write::write_char(f, c),
    }
}

fn write_escaped_str(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in s.chars() {
        write_escaped_char(f, ch)?;
    }
    f.write_str("\"")
}

/// Renders `n` so that it re-reads as a floating-point literal: small
/// integral values keep a trailing `.0`, wide magnitudes switch to exponent
/// form (a bare digit run would re-read as an integer), and non-finite
/// values (which JSON cannot represent) degrade to `null`.
fn write_double(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if !n.is_finite() {
        f.write_str("null")
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        write!(f, "{n:.1}")
    } else if n.abs() >= 1e15 {
        write!(f, "{n:e}")
    } else {
        write!(f, "{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::Int(n) => write!(f, "{n}"),
            Value::Long(n) => write!(f, "{n}"),
            Value::Double(n) => write_double(f, *n),
            Value::String(s) => write_escaped_str(f, s),
            Value::Embedded(bytes) => {
                f.write_str("\"")?;
                for ch in bytes.chars() {
                    write_escaped_char(f, ch)?;
                }
                f.write_str("\"")
            }
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write_escaped_str(f, name)?;
                    f.write_str(":")?;
                    write!(f, "{value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

mod serde_impls {
    use core::fmt;

    use serde::{
        Deserialize, Deserializer, Serialize, Serializer,
        de::{MapAccess, SeqAccess, Visitor},
        ser::{SerializeMap, SerializeSeq},
    };

    use super::{Map, Value};

    impl Serialize for Value {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Value::Null => serializer.serialize_unit(),
                Value::Bool(b) => serializer.serialize_bool(*b),
                Value::Int(n) => serializer.serialize_i32(*n),
                Value::Long(n) => serializer.serialize_i64(*n),
                Value::Double(n) => serializer.serialize_f64(*n),
                Value::String(s) => serializer.serialize_str(s),
                Value::Embedded(bytes) => serializer.serialize_bytes(bytes),
                Value::Array(items) => {
                    let mut seq = serializer.serialize_seq(Some(items.len()))?;
                    for item in items {
                        seq.serialize_element(item)?;
                    }
                    seq.end()
                }
                Value::Object(fields) => {
                    let mut map = serializer.serialize_map(Some(fields.len()))?;
                    for (name, value) in fields {
                        map.serialize_entry(name, value)?;
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
            f.write_str("any JSON value")
        }

        fn visit_bool<E>(self, b: bool) -> Result<Value, E> {
            Ok(Value::Bool(b))
        }

        fn visit_i64<E>(self, n: i64) -> Result<Value, E> {
            Ok(i32::try_from(n).map_or(Value::Long(n), Value::Int))
        }

        #[allow(clippy::cast_precision_loss)]
        fn visit_u64<E>(self, n: u64) -> Result<Value, E> {
            Ok(i64::try_from(n).map_or(Value::Double(n as f64), |n| {
                i32::try_from(n).map_or(Value::Long(n), Value::Int)
            }))
        }

        fn visit_f64<E>(self, n: f64) -> Result<Value, E> {
            Ok(Value::Double(n))
        }

        fn visit_str<E>(self, s: &str) -> Result<Value, E> {
            Ok(Value::String(s.to_string()))
        }

        fn visit_string<E>(self, s: String) -> Result<Value, E> {
            Ok(Value::String(s))
        }

        fn visit_bytes<E>(self, bytes: &[u8]) -> Result<Value, E> {
            Ok(Value::Embedded(bytes.to_vec()))
        }

        fn visit_unit<E>(self) -> Result<Value, E> {
            Ok(Value::Null)
        }

        fn visit_none<E>(self) -> Result<Value, E> {
            Ok(Value::Null)
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
            deserializer.deserialize_any(ValueVisitor)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
            let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(item) = seq.next_element()? {
                items.push(item);
            }
            Ok(Value::Array(items))
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
            let mut fields = Map::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, value)) = map.next_entry::<String, Value>()? {
                fields.insert(name, value);
            }
            Ok(Value::Object(fields))
        }
    }

    impl<'de> Deserialize<'de> for Value {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
            deserializer.deserialize_any(ValueVisitor)
        }
    }
}
