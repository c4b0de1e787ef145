//! Decoded MessagePack values.
use alloc::{borrow::Cow, string::String, vec::Vec};
use core::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeTuple, Serializer};

/// The most elements preallocated on behalf of a declared container length.
pub(crate) const MAX_PREALLOC: usize = 1024;

/// The general kind of a MessagePack item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Nil,
    Boolean,
    Integer,
    Float,
    String,
    Binary,
    Array,
    Map,
    Extension,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Nil => "nil",
            Kind::Boolean => "bool",
            Kind::Integer => "int",
            Kind::Float => "float",
            Kind::String => "str",
            Kind::Binary => "bin",
            Kind::Array => "array",
            Kind::Map => "map",
            Kind::Extension => "ext",
        })
    }
}

/// A failed typed view of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AccessError {
    /// The value is of another kind
    TypeMismatch {
        expected: Kind,
        found: Kind,
    },
    /// The text view of a `str` that is not valid UTF-8
    InvalidUtf8,
    /// An integer does not fit in the requested type
    IntegerOverflow,
}

impl serde::de::StdError for AccessError {}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::TypeMismatch { expected, found } => write!(f,
                "Expected MessagePack {}, found {}", expected, found),
            AccessError::InvalidUtf8 => f.write_str("MessagePack str is not valid UTF-8"),
            AccessError::IntegerOverflow => f.write_str("MessagePack int out of range"),
        }
    }
}

type AccessResult<T> = core::result::Result<T, AccessError>;

/// A MessagePack integer: any value from `i64::MIN` to `u64::MAX`.
///
/// Equal numbers compare equal no matter which encoding carried them.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Integer(N);

// non-negative numbers are always `Unsigned`
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum N {
    Unsigned(u64),
    Negative(i64),
}

impl Integer {
    pub fn is_negative(&self) -> bool {
        matches!(self.0, N::Negative(..))
    }
    pub fn as_u64(&self) -> Option<u64> {
        match self.0 {
            N::Unsigned(n) => Some(n),
            N::Negative(_) => None
        }
    }
    pub fn as_i64(&self) -> Option<i64> {
        match self.0 {
            N::Unsigned(n) => i64::try_from(n).ok(),
            N::Negative(n) => Some(n)
        }
    }
    /// `Ok` with a non-negative number, `Err` with a negative one.
    pub(crate) fn split_sign(&self) -> core::result::Result<u64, i64> {
        match self.0 {
            N::Unsigned(n) => Ok(n),
            N::Negative(n) => Err(n)
        }
    }
    pub fn as_f64(&self) -> f64 {
        match self.0 {
            N::Unsigned(n) => n as f64,
            N::Negative(n) => n as f64
        }
    }
}

impl fmt::Debug for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            N::Unsigned(n) => fmt::Display::fmt(&n, f),
            N::Negative(n) => fmt::Display::fmt(&n, f)
        }
    }
}

macro_rules! impl_integer_from {
    (unsigned $($ty:ty),*; signed $($ity:ty),*) => {$(
        impl From<$ty> for Integer {
            fn from(n: $ty) -> Self {
                Integer(N::Unsigned(n as u64))
            }
        }
    )*$(
        impl From<$ity> for Integer {
            fn from(n: $ity) -> Self {
                if n < 0 {
                    Integer(N::Negative(n as i64))
                }
                else {
                    Integer(N::Unsigned(n as u64))
                }
            }
        }
    )*};
}

impl_integer_from!(unsigned u8, u16, u32, u64, usize; signed i8, i16, i32, i64, isize);

/// The payload of a MessagePack `str`.
///
/// MessagePack does not guarantee that a `str` holds UTF-8, so the bytes are
/// kept as they are when they don't; such a string has only a binary view.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Str(Repr);

#[derive(Clone, PartialEq, Eq, Hash)]
enum Repr {
    Text(String),
    Raw(Vec<u8>),
}

impl Str {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Str(Repr::Text(text)),
            Err(err) => Str(Repr::Raw(err.into_bytes()))
        }
    }
    pub fn is_utf8(&self) -> bool {
        matches!(self.0, Repr::Text(..))
    }
    pub fn as_str(&self) -> Option<&str> {
        match &self.0 {
            Repr::Text(text) => Some(text),
            Repr::Raw(_) => None
        }
    }
    pub fn as_bytes(&self) -> &[u8] {
        match &self.0 {
            Repr::Text(text) => text.as_bytes(),
            Repr::Raw(bytes) => bytes
        }
    }
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }
    pub fn into_string(self) -> AccessResult<String> {
        match self.0 {
            Repr::Text(text) => Ok(text),
            Repr::Raw(_) => Err(AccessError::InvalidUtf8)
        }
    }
    pub fn into_bytes(self) -> Vec<u8> {
        match self.0 {
            Repr::Text(text) => text.into_bytes(),
            Repr::Raw(bytes) => bytes
        }
    }
}

impl fmt::Debug for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Text(text) => fmt::Debug::fmt(text, f),
            Repr::Raw(bytes) => f.debug_tuple("Raw").field(bytes).finish()
        }
    }
}

impl From<Vec<u8>> for Str {
    fn from(bytes: Vec<u8>) -> Self {
        Str::from_bytes(bytes)
    }
}

impl From<String> for Str {
    fn from(text: String) -> Self {
        Str(Repr::Text(text))
    }
}

impl From<&str> for Str {
    fn from(text: &str) -> Self {
        Str(Repr::Text(text.into()))
    }
}

/// Any MessagePack value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Boolean(bool),
    Integer(Integer),
    F32(f32),
    F64(f64),
    String(Str),
    Binary(Vec<u8>),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Extension(i8, Vec<u8>),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Nil => Kind::Nil,
            Value::Boolean(_) => Kind::Boolean,
            Value::Integer(_) => Kind::Integer,
            Value::F32(_)|Value::F64(_) => Kind::Float,
            Value::String(_) => Kind::String,
            Value::Binary(_) => Kind::Binary,
            Value::Array(_) => Kind::Array,
            Value::Map(_) => Kind::Map,
            Value::Extension(..) => Kind::Extension,
        }
    }

    fn mismatch<T>(&self, expected: Kind) -> AccessResult<T> {
        Err(AccessError::TypeMismatch { expected, found: self.kind() })
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> AccessResult<bool> {
        match *self {
            Value::Boolean(v) => Ok(v),
            _ => self.mismatch(Kind::Boolean)
        }
    }

    pub fn as_integer(&self) -> AccessResult<Integer> {
        match *self {
            Value::Integer(n) => Ok(n),
            _ => self.mismatch(Kind::Integer)
        }
    }

    pub fn as_u64(&self) -> AccessResult<u64> {
        self.as_integer()?.as_u64().ok_or(AccessError::IntegerOverflow)
    }

    pub fn as_i64(&self) -> AccessResult<i64> {
        self.as_integer()?.as_i64().ok_or(AccessError::IntegerOverflow)
    }

    /// Any number as `f64`, integers included.
    pub fn as_f64(&self) -> AccessResult<f64> {
        match *self {
            Value::F32(v) => Ok(v.into()),
            Value::F64(v) => Ok(v),
            Value::Integer(n) => Ok(n.as_f64()),
            _ => self.mismatch(Kind::Float)
        }
    }

    /// The text view, available for a `str` holding valid UTF-8.
    pub fn as_text(&self) -> AccessResult<&str> {
        match self {
            Value::String(s) => s.as_str().ok_or(AccessError::InvalidUtf8),
            _ => self.mismatch(Kind::String)
        }
    }

    /// The binary view, available for both `bin` and `str`.
    pub fn as_binary(&self) -> AccessResult<&[u8]> {
        match self {
            Value::String(s) => Ok(s.as_bytes()),
            Value::Binary(bytes) => Ok(bytes),
            _ => self.mismatch(Kind::Binary)
        }
    }

    pub fn as_array(&self) -> AccessResult<&[Value]> {
        match self {
            Value::Array(items) => Ok(items),
            _ => self.mismatch(Kind::Array)
        }
    }

    pub fn as_map(&self) -> AccessResult<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Ok(entries),
            _ => self.mismatch(Kind::Map)
        }
    }

    pub fn as_ext(&self) -> AccessResult<(i8, &[u8])> {
        match self {
            Value::Extension(ty, data) => Ok((*ty, data)),
            _ => self.mismatch(Kind::Extension)
        }
    }

    pub fn into_string(self) -> AccessResult<String> {
        match self {
            Value::String(s) => s.into_string(),
            _ => self.mismatch(Kind::String)
        }
    }

    pub fn into_binary(self) -> AccessResult<Vec<u8>> {
        match self {
            Value::String(s) => Ok(s.into_bytes()),
            Value::Binary(bytes) => Ok(bytes),
            _ => self.mismatch(Kind::Binary)
        }
    }

    pub fn into_array(self) -> AccessResult<Vec<Value>> {
        match self {
            Value::Array(items) => Ok(items),
            _ => self.mismatch(Kind::Array)
        }
    }

    pub fn into_map(self) -> AccessResult<Vec<(Value, Value)>> {
        match self {
            Value::Map(entries) => Ok(entries),
            _ => self.mismatch(Kind::Map)
        }
    }
}

macro_rules! impl_value_from_int {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Value {
            fn from(n: $ty) -> Self {
                Value::Integer(n.into())
            }
        }
    )*};
}

impl_value_from_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl From<Integer> for Value {
    fn from(n: Integer) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::String(text.into())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::String(text.into())
    }
}

impl From<Str> for Value {
    fn from(text: Str) -> Self {
        Value::String(text)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::Binary(bytes.into())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Binary(bytes)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Vec<(Value, Value)>> for Value {
    fn from(entries: Vec<(Value, Value)>) -> Self {
        Value::Map(entries)
    }
}

struct Bytes<'a>(&'a [u8]);

impl Serialize for Bytes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.0)
    }
}

impl Serialize for Integer {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        match self.0 {
            N::Unsigned(n) => serializer.serialize_u64(n),
            N::Negative(n) => serializer.serialize_i64(n)
        }
    }
}

/// Extensions serialize as a `(type, bytes)` tuple; a `str` that is not
/// UTF-8 serializes as bytes.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Boolean(v) => serializer.serialize_bool(*v),
            Value::Integer(n) => n.serialize(serializer),
            Value::F32(v) => serializer.serialize_f32(*v),
            Value::F64(v) => serializer.serialize_f64(*v),
            Value::String(s) => match s.as_str() {
                Some(text) => serializer.serialize_str(text),
                None => serializer.serialize_bytes(s.as_bytes())
            }
            Value::Binary(bytes) => serializer.serialize_bytes(bytes),
            Value::Array(items) => serializer.collect_seq(items),
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::Extension(ty, data) => {
                let mut tuple = serializer.serialize_tuple(2)?;
                tuple.serialize_element(ty)?;
                tuple.serialize_element(&Bytes(data))?;
                tuple.end()
            }
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any value representable in MessagePack")
    }

    fn visit_unit<E: de::Error>(self) -> core::result::Result<Value, E> {
        Ok(Value::Nil)
    }

    fn visit_none<E: de::Error>(self) -> core::result::Result<Value, E> {
        Ok(Value::Nil)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> core::result::Result<Value, D::Error> {
        Deserialize::deserialize(deserializer)
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(self, deserializer: D) -> core::result::Result<Value, D::Error> {
        Deserialize::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> core::result::Result<Value, E> {
        Ok(Value::Boolean(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> core::result::Result<Value, E> {
        Ok(v.into())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> core::result::Result<Value, E> {
        Ok(v.into())
    }

    fn visit_f32<E: de::Error>(self, v: f32) -> core::result::Result<Value, E> {
        Ok(Value::F32(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> core::result::Result<Value, E> {
        Ok(Value::F64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> core::result::Result<Value, E> {
        Ok(v.into())
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> core::result::Result<Value, E> {
        Ok(v.into())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> core::result::Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(MAX_PREALLOC));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> core::result::Result<Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0).min(MAX_PREALLOC));
        while let Some(entry) = map.next_entry()? {
            entries.push(entry);
        }
        Ok(Value::Map(entries))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}
