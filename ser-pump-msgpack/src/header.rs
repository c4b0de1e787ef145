//! The MessagePack type code table.
//!
//! A type code determines how many fixed header bytes follow it (a length
//! prefix, a scalar body or an extension type) and whether a variable length
//! payload comes after those.
use crate::context::Decoded;
use crate::magick::*;
use crate::value::{Integer, Value};

/// The layout of an item as announced by its type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Header {
    /// The code is the entire item.
    Immediate(Immediate),
    /// A big-endian scalar body follows the code.
    Scalar(Scalar),
    /// The payload length is embedded in the code.
    FixRaw(Raw, usize),
    /// A big-endian length prefix of `width` bytes precedes the payload.
    Raw(Raw, usize),
    /// The element count is embedded in the code.
    FixContainer(Container, u32),
    /// A big-endian element count of `width` bytes follows the code.
    Container(Container, usize),
    /// A length prefix of `width` bytes and the extension type precede the data.
    Ext(usize),
    /// The extension type precedes exactly `len` bytes of data.
    FixExt(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Immediate {
    Nil,
    Bool(bool),
    Int(i8),
    Uint(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scalar {
    U8, U16, U32, U64,
    I8, I16, I32, I64,
    F32, F64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Raw {
    Str,
    Bin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Container {
    Array,
    Map,
}

/// What kind of payload follows the header bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PayloadKind {
    Str,
    Bin,
    Ext(i8),
}

/// An item after its header bytes were interpreted.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Resolved {
    Done(Decoded),
    Payload(PayloadKind, usize),
}

impl Header {
    /// Look up a type code, `None` for the reserved code.
    pub fn of(code: u8) -> Option<Header> {
        Some(match code {
            0x00..=MAX_POSFIXINT => Header::Immediate(Immediate::Uint(code)),
            c@(FIXMAP..=FIXMAP_MAX) => Header::FixContainer(Container::Map, u32::from(c) & MAX_FIXMAP_SIZE as u32),
            c@(FIXARRAY..=FIXARRAY_MAX) => Header::FixContainer(Container::Array, u32::from(c) & MAX_FIXARRAY_SIZE as u32),
            c@(FIXSTR..=FIXSTR_MAX) => Header::FixRaw(Raw::Str, (c as usize) & MAX_FIXSTR_SIZE),
            NIL => Header::Immediate(Immediate::Nil),
            RESERVED => return None,
            FALSE => Header::Immediate(Immediate::Bool(false)),
            TRUE => Header::Immediate(Immediate::Bool(true)),
            BIN_8 => Header::Raw(Raw::Bin, 1),
            BIN_16 => Header::Raw(Raw::Bin, 2),
            BIN_32 => Header::Raw(Raw::Bin, 4),
            EXT_8 => Header::Ext(1),
            EXT_16 => Header::Ext(2),
            EXT_32 => Header::Ext(4),
            FLOAT_32 => Header::Scalar(Scalar::F32),
            FLOAT_64 => Header::Scalar(Scalar::F64),
            UINT_8 => Header::Scalar(Scalar::U8),
            UINT_16 => Header::Scalar(Scalar::U16),
            UINT_32 => Header::Scalar(Scalar::U32),
            UINT_64 => Header::Scalar(Scalar::U64),
            INT_8 => Header::Scalar(Scalar::I8),
            INT_16 => Header::Scalar(Scalar::I16),
            INT_32 => Header::Scalar(Scalar::I32),
            INT_64 => Header::Scalar(Scalar::I64),
            FIXEXT_1 => Header::FixExt(1),
            FIXEXT_2 => Header::FixExt(2),
            FIXEXT_4 => Header::FixExt(4),
            FIXEXT_8 => Header::FixExt(8),
            FIXEXT_16 => Header::FixExt(16),
            STR_8 => Header::Raw(Raw::Str, 1),
            STR_16 => Header::Raw(Raw::Str, 2),
            STR_32 => Header::Raw(Raw::Str, 4),
            ARRAY_16 => Header::Container(Container::Array, 2),
            ARRAY_32 => Header::Container(Container::Array, 4),
            MAP_16 => Header::Container(Container::Map, 2),
            MAP_32 => Header::Container(Container::Map, 4),
            NEGFIXINT..=0xff => Header::Immediate(Immediate::Int(code as i8)),
        })
    }

    /// The number of header bytes following the type code.
    pub fn width(&self) -> usize {
        match *self {
            Header::Immediate(_)|
            Header::FixRaw(..)|
            Header::FixContainer(..) => 0,
            Header::Scalar(scalar) => scalar.width(),
            Header::Raw(_, width)|
            Header::Container(_, width) => width,
            Header::Ext(width) => width + 1,
            Header::FixExt(_) => 1,
        }
    }

    /// Interpret the header bytes, `head.len()` must equal [`Header::width`].
    pub fn resolve(self, head: &[u8]) -> Resolved {
        match self {
            Header::Immediate(imm) => Resolved::Done(Decoded::Value(imm.into_value())),
            Header::Scalar(scalar) => Resolved::Done(Decoded::Value(scalar.decode(head))),
            Header::FixRaw(raw, len) => Resolved::Payload(raw.into(), len),
            Header::Raw(raw, _) => Resolved::Payload(raw.into(), be_length(head)),
            Header::FixContainer(container, len) => Resolved::Done(container.header(len)),
            Header::Container(container, _) => {
                // element counts are at most 32 bits wide
                let len = u32::try_from(be_uint(head)).unwrap_or(u32::MAX);
                Resolved::Done(container.header(len))
            }
            Header::Ext(width) => {
                let (len, ty) = head.split_at(width);
                Resolved::Payload(PayloadKind::Ext(ty[0] as i8), be_length(len))
            }
            Header::FixExt(len) => Resolved::Payload(PayloadKind::Ext(head[0] as i8), len),
        }
    }
}

impl Immediate {
    fn into_value(self) -> Value {
        match self {
            Immediate::Nil => Value::Nil,
            Immediate::Bool(v) => Value::Boolean(v),
            Immediate::Int(v) => Value::Integer(Integer::from(v)),
            Immediate::Uint(v) => Value::Integer(Integer::from(v)),
        }
    }
}

impl Scalar {
    fn width(self) -> usize {
        match self {
            Scalar::U8|Scalar::I8 => 1,
            Scalar::U16|Scalar::I16 => 2,
            Scalar::U32|Scalar::I32|Scalar::F32 => 4,
            Scalar::U64|Scalar::I64|Scalar::F64 => 8,
        }
    }

    fn decode(self, head: &[u8]) -> Value {
        match self {
            Scalar::U8  => Value::Integer(u8::from_be_bytes(be_array(head)).into()),
            Scalar::U16 => Value::Integer(u16::from_be_bytes(be_array(head)).into()),
            Scalar::U32 => Value::Integer(u32::from_be_bytes(be_array(head)).into()),
            Scalar::U64 => Value::Integer(u64::from_be_bytes(be_array(head)).into()),
            Scalar::I8  => Value::Integer(i8::from_be_bytes(be_array(head)).into()),
            Scalar::I16 => Value::Integer(i16::from_be_bytes(be_array(head)).into()),
            Scalar::I32 => Value::Integer(i32::from_be_bytes(be_array(head)).into()),
            Scalar::I64 => Value::Integer(i64::from_be_bytes(be_array(head)).into()),
            Scalar::F32 => Value::F32(f32::from_be_bytes(be_array(head))),
            Scalar::F64 => Value::F64(f64::from_be_bytes(be_array(head))),
        }
    }
}

impl Container {
    fn header(self, len: u32) -> Decoded {
        match self {
            Container::Array => Decoded::Array(len),
            Container::Map => Decoded::Map(len),
        }
    }
}

impl From<Raw> for PayloadKind {
    fn from(raw: Raw) -> Self {
        match raw {
            Raw::Str => PayloadKind::Str,
            Raw::Bin => PayloadKind::Bin,
        }
    }
}

fn be_array<const N: usize>(head: &[u8]) -> [u8; N] {
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(&head[..N]);
    bytes
}

/// Accumulate a big-endian unsigned integer of up to 8 bytes.
fn be_uint(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0, |acc, &b| (acc << 8) | u64::from(b))
}

/// A payload length saturated to `usize`, so that it fails the length limit
/// on targets where it does not fit.
fn be_length(bytes: &[u8]) -> usize {
    usize::try_from(be_uint(bytes)).unwrap_or(usize::MAX)
}
