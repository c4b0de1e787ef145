//! MessagePack encoding.
use alloc::vec::Vec;

use ser_pump::{ByteSink, SinkError, SinkResult};

use crate::magick::*;
use crate::value::{Integer, Value};

/// Writes MessagePack items to a [`ByteSink`], always choosing the
/// smallest representation.
///
/// ```
/// use ser_pump_msgpack::Packer;
///
/// let mut packer = Packer::new(Vec::new());
/// packer.write_array_len(2).unwrap();
/// packer.write_str("hi").unwrap();
/// packer.write_i64(-33).unwrap();
/// assert_eq!(packer.into_inner(), b"\x92\xa2hi\xd0\xdf");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packer<W> {
    output: W,
}

impl<W: ByteSink> Packer<W> {
    #[inline(always)]
    pub fn new(output: W) -> Self {
        Packer { output }
    }
    #[inline(always)]
    pub fn into_inner(self) -> W {
        self.output
    }
    #[inline(always)]
    pub fn get_ref(&self) -> &W {
        &self.output
    }
    #[inline(always)]
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn write_nil(&mut self) -> SinkResult<()> {
        self.output.write_byte(NIL)
    }

    pub fn write_bool(&mut self, v: bool) -> SinkResult<()> {
        self.output.write_byte(if v { TRUE } else { FALSE })
    }

    pub fn write_u64(&mut self, v: u64) -> SinkResult<()> {
        if v <= MAX_POSFIXINT as u64 {
            self.output.write_byte(v as u8)
        }
        else if let Ok(v) = u8::try_from(v) {
            self.output.write_byte(UINT_8)?;
            self.output.write_byte(v)
        }
        else if let Ok(v) = u16::try_from(v) {
            self.output.write_byte(UINT_16)?;
            self.output.write(&v.to_be_bytes())
        }
        else if let Ok(v) = u32::try_from(v) {
            self.output.write_byte(UINT_32)?;
            self.output.write(&v.to_be_bytes())
        }
        else {
            self.output.write_byte(UINT_64)?;
            self.output.write(&v.to_be_bytes())
        }
    }

    /// Non-negative numbers are written as unsigned.
    pub fn write_i64(&mut self, v: i64) -> SinkResult<()> {
        if let Ok(v) = u64::try_from(v) {
            self.write_u64(v)
        }
        else if v >= MIN_NEGFIXINT as i64 {
            self.output.write_byte(v as u8)
        }
        else if let Ok(v) = i8::try_from(v) {
            self.output.write_byte(INT_8)?;
            self.output.write_byte(v as u8)
        }
        else if let Ok(v) = i16::try_from(v) {
            self.output.write_byte(INT_16)?;
            self.output.write(&v.to_be_bytes())
        }
        else if let Ok(v) = i32::try_from(v) {
            self.output.write_byte(INT_32)?;
            self.output.write(&v.to_be_bytes())
        }
        else {
            self.output.write_byte(INT_64)?;
            self.output.write(&v.to_be_bytes())
        }
    }

    pub fn write_integer(&mut self, n: Integer) -> SinkResult<()> {
        match n.split_sign() {
            Ok(v) => self.write_u64(v),
            Err(v) => self.write_i64(v)
        }
    }

    pub fn write_f32(&mut self, v: f32) -> SinkResult<()> {
        self.output.write_byte(FLOAT_32)?;
        self.output.write(&v.to_be_bytes())
    }

    pub fn write_f64(&mut self, v: f64) -> SinkResult<()> {
        self.output.write_byte(FLOAT_64)?;
        self.output.write(&v.to_be_bytes())
    }

    pub fn write_str(&mut self, s: &str) -> SinkResult<()> {
        self.write_str_bytes(s.as_bytes())
    }

    /// Write a `str` item with a payload that may not be UTF-8.
    pub fn write_str_bytes(&mut self, bytes: &[u8]) -> SinkResult<()> {
        self.write_str_len(bytes.len())?;
        self.output.write(bytes)
    }

    pub fn write_str_len(&mut self, len: usize) -> SinkResult<()> {
        if len <= MAX_FIXSTR_SIZE {
            self.output.write_byte(FIXSTR | (len as u8))
        }
        else if let Ok(len) = u8::try_from(len) {
            self.output.write_byte(STR_8)?;
            self.output.write_byte(len)
        }
        else if let Ok(len) = u16::try_from(len) {
            self.output.write_byte(STR_16)?;
            self.output.write(&len.to_be_bytes())
        }
        else if let Ok(len) = u32::try_from(len) {
            self.output.write_byte(STR_32)?;
            self.output.write(&len.to_be_bytes())
        }
        else {
            Err(SinkError::LengthOverflow)
        }
    }

    pub fn write_bin(&mut self, bytes: &[u8]) -> SinkResult<()> {
        self.write_bin_len(bytes.len())?;
        self.output.write(bytes)
    }

    pub fn write_bin_len(&mut self, len: usize) -> SinkResult<()> {
        if let Ok(len) = u8::try_from(len) {
            self.output.write_byte(BIN_8)?;
            self.output.write_byte(len)
        }
        else if let Ok(len) = u16::try_from(len) {
            self.output.write_byte(BIN_16)?;
            self.output.write(&len.to_be_bytes())
        }
        else if let Ok(len) = u32::try_from(len) {
            self.output.write_byte(BIN_32)?;
            self.output.write(&len.to_be_bytes())
        }
        else {
            Err(SinkError::LengthOverflow)
        }
    }

    /// Write an array header, the elements must follow.
    pub fn write_array_len(&mut self, len: usize) -> SinkResult<()> {
        if len <= MAX_FIXARRAY_SIZE {
            self.output.write_byte(FIXARRAY | (len as u8))
        }
        else if let Ok(len) = u16::try_from(len) {
            self.output.write_byte(ARRAY_16)?;
            self.output.write(&len.to_be_bytes())
        }
        else if let Ok(len) = u32::try_from(len) {
            self.output.write_byte(ARRAY_32)?;
            self.output.write(&len.to_be_bytes())
        }
        else {
            Err(SinkError::LengthOverflow)
        }
    }

    /// Write a map header, `len` key-value pairs must follow.
    pub fn write_map_len(&mut self, len: usize) -> SinkResult<()> {
        if len <= MAX_FIXMAP_SIZE {
            self.output.write_byte(FIXMAP | (len as u8))
        }
        else if let Ok(len) = u16::try_from(len) {
            self.output.write_byte(MAP_16)?;
            self.output.write(&len.to_be_bytes())
        }
        else if let Ok(len) = u32::try_from(len) {
            self.output.write_byte(MAP_32)?;
            self.output.write(&len.to_be_bytes())
        }
        else {
            Err(SinkError::LengthOverflow)
        }
    }

    pub fn write_ext(&mut self, ty: i8, data: &[u8]) -> SinkResult<()> {
        match data.len() {
            1 => self.output.write_byte(FIXEXT_1)?,
            2 => self.output.write_byte(FIXEXT_2)?,
            4 => self.output.write_byte(FIXEXT_4)?,
            8 => self.output.write_byte(FIXEXT_8)?,
            16 => self.output.write_byte(FIXEXT_16)?,
            len => if let Ok(len) = u8::try_from(len) {
                self.output.write(&[EXT_8, len])?;
            }
            else if let Ok(len) = u16::try_from(len) {
                self.output.write_byte(EXT_16)?;
                self.output.write(&len.to_be_bytes())?;
            }
            else if let Ok(len) = u32::try_from(len) {
                self.output.write_byte(EXT_32)?;
                self.output.write(&len.to_be_bytes())?;
            }
            else {
                return Err(SinkError::LengthOverflow)
            }
        }
        self.output.write_byte(ty as u8)?;
        self.output.write(data)
    }

    pub fn write_value(&mut self, value: &Value) -> SinkResult<()> {
        match value {
            Value::Nil => self.write_nil(),
            Value::Boolean(v) => self.write_bool(*v),
            Value::Integer(n) => self.write_integer(*n),
            Value::F32(v) => self.write_f32(*v),
            Value::F64(v) => self.write_f64(*v),
            Value::String(s) => self.write_str_bytes(s.as_bytes()),
            Value::Binary(bytes) => self.write_bin(bytes),
            Value::Array(items) => {
                self.write_array_len(items.len())?;
                items.iter().try_for_each(|item| self.write_value(item))
            }
            Value::Map(entries) => {
                self.write_map_len(entries.len())?;
                entries.iter().try_for_each(|(key, value)| {
                    self.write_value(key)?;
                    self.write_value(value)
                })
            }
            Value::Extension(ty, data) => self.write_ext(*ty, data),
        }
    }
}

/// Encode `value` into `output`.
pub fn to_writer<W: ByteSink>(output: W, value: &Value) -> SinkResult<()> {
    Packer::new(output).write_value(value)
}

/// Encode `value` into a new vector.
pub fn to_vec(value: &Value) -> SinkResult<Vec<u8>> {
    let mut vec = Vec::new();
    to_writer(&mut vec, value)?;
    Ok(vec)
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use ser_pump::SliceSink;
    use crate::from_slice;
    use super::*;

    fn packed<F: FnOnce(&mut Packer<Vec<u8>>) -> SinkResult<()>>(f: F) -> Vec<u8> {
        let mut packer = Packer::new(Vec::new());
        f(&mut packer).unwrap();
        packer.into_inner()
    }

    #[test]
    fn test_pack_integers() {
        assert_eq!(packed(|p| p.write_u64(0)), [0x00]);
        assert_eq!(packed(|p| p.write_u64(127)), [0x7f]);
        assert_eq!(packed(|p| p.write_u64(128)), [0xcc, 0x80]);
        assert_eq!(packed(|p| p.write_u64(256)), [0xcd, 0x01, 0x00]);
        assert_eq!(packed(|p| p.write_u64(65536)), [0xce, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(packed(|p| p.write_u64(u64::MAX)), [0xcf, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(packed(|p| p.write_i64(5)), [0x05]);
        assert_eq!(packed(|p| p.write_i64(200)), [0xcc, 200]);
        assert_eq!(packed(|p| p.write_i64(-1)), [0xff]);
        assert_eq!(packed(|p| p.write_i64(-32)), [0xe0]);
        assert_eq!(packed(|p| p.write_i64(-33)), [0xd0, 0xdf]);
        assert_eq!(packed(|p| p.write_i64(-128)), [0xd0, 0x80]);
        assert_eq!(packed(|p| p.write_i64(-129)), [0xd1, 0xff, 0x7f]);
        assert_eq!(packed(|p| p.write_i64(-32769)), [0xd2, 0xff, 0xff, 0x7f, 0xff]);
        assert_eq!(packed(|p| p.write_i64(i64::MIN)), [0xd3, 0x80, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(packed(|p| p.write_integer((-2i8).into())), [0xfe]);
        assert_eq!(packed(|p| p.write_integer(u64::MAX.into()))[0], 0xcf);
    }

    #[test]
    fn test_pack_raw_headers() {
        assert_eq!(packed(|p| p.write_str_len(0)), [0xa0]);
        assert_eq!(packed(|p| p.write_str_len(31)), [0xbf]);
        assert_eq!(packed(|p| p.write_str_len(32)), [0xd9, 32]);
        assert_eq!(packed(|p| p.write_str_len(255)), [0xd9, 255]);
        assert_eq!(packed(|p| p.write_str_len(256)), [0xda, 0x01, 0x00]);
        assert_eq!(packed(|p| p.write_str_len(65535)), [0xda, 0xff, 0xff]);
        assert_eq!(packed(|p| p.write_str_len(65536)), [0xdb, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(packed(|p| p.write_bin_len(0)), [0xc4, 0]);
        assert_eq!(packed(|p| p.write_bin_len(256)), [0xc5, 0x01, 0x00]);
        assert_eq!(packed(|p| p.write_bin_len(65536)), [0xc6, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(packed(|p| p.write_array_len(15)), [0x9f]);
        assert_eq!(packed(|p| p.write_array_len(16)), [0xdc, 0x00, 0x10]);
        assert_eq!(packed(|p| p.write_array_len(65536)), [0xdd, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(packed(|p| p.write_map_len(0)), [0x80]);
        assert_eq!(packed(|p| p.write_map_len(16)), [0xde, 0x00, 0x10]);
        assert_eq!(packed(|p| p.write_map_len(70000)), [0xdf, 0x00, 0x01, 0x11, 0x70]);
    }

    #[test]
    fn test_pack_ext() {
        assert_eq!(packed(|p| p.write_ext(1, &[0xaa])), [0xd4, 0x01, 0xaa]);
        assert_eq!(packed(|p| p.write_ext(-1, &[0; 16]))[..2], [0xd8, 0xff]);
        assert_eq!(packed(|p| p.write_ext(2, &[])), [0xc7, 0x00, 0x02]);
        assert_eq!(packed(|p| p.write_ext(3, &[1, 2, 3])), [0xc7, 0x03, 0x03, 1, 2, 3]);
        assert_eq!(packed(|p| p.write_ext(4, &[0; 256]))[..4], [0xc8, 0x01, 0x00, 0x04]);
    }

    #[test]
    fn test_pack_scalars() {
        assert_eq!(packed(|p| p.write_nil()), [0xc0]);
        assert_eq!(packed(|p| p.write_bool(false)), [0xc2]);
        assert_eq!(packed(|p| p.write_bool(true)), [0xc3]);
        assert_eq!(packed(|p| p.write_f32(1.0)), [0xca, 0x3f, 0x80, 0x00, 0x00]);
        assert_eq!(packed(|p| p.write_f64(1.0)), [0xcb, 0x3f, 0xf0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(packed(|p| p.write_str("ó")), [0xa2, 0xc3, 0xb3]);
        assert_eq!(packed(|p| p.write_bin(b"ab")), [0xc4, 0x02, b'a', b'b']);
    }

    #[test]
    fn test_pack_value() {
        let value = Value::Map(vec![
            ("id".into(), 300u16.into()),
            ("tags".into(), Value::Array(vec!["a".into(), Value::Binary(vec![0xff]), Value::Nil])),
            ("at".into(), Value::Extension(-1, vec![0, 0, 0, 1])),
            ("t".into(), Value::F64(0.5)),
        ]);
        let bytes = to_vec(&value).unwrap();
        assert_eq!(&bytes[..8], b"\x84\xa2id\xcd\x01\x2c\xa4");
        assert_eq!(from_slice(&bytes), Ok((value, bytes.len())));
    }

    #[test]
    fn test_pack_slice_full() {
        let mut buf = [0u8; 4];
        let mut sink = SliceSink::new(&mut buf);
        assert_eq!(to_writer(&mut sink, &Value::from("abcd")), Err(SinkError::BufferFull));
        let mut buf = [0u8; 5];
        let mut sink = SliceSink::new(&mut buf);
        assert_eq!(to_writer(&mut sink, &Value::from("abcd")), Ok(()));
        assert_eq!(sink.as_ref(), b"\xa4abcd");
    }
}
