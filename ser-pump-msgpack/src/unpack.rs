//! Assembling complete values.
use alloc::{string::String, vec::Vec};
use core::mem;

use ser_pump::ByteSource;

use crate::config::Config;
use crate::context::{DecodeContext, Decoded, Phase, Pump};
use crate::error::{Error, Result};
use crate::value::{Value, MAX_PREALLOC};

/// A resumable decoder of whole MessagePack values.
///
/// Drives a [`DecodeContext`] and keeps a stack of the arrays and maps being
/// filled, so a value of any shape can arrive split at any byte.
///
/// ```
/// use ser_pump::FeedSource;
/// use ser_pump_msgpack::{Pump, Unpacker, Value};
///
/// let mut source = FeedSource::new();
/// let mut unpacker = Unpacker::new();
/// source.feed(&[0x92, 0x01]);
/// assert_eq!(unpacker.pump(&mut source), Ok(Pump::NeedMoreData));
/// assert_eq!(unpacker.depth(), 1);
/// source.feed(&[0xa2, b'o', b'k']);
/// assert_eq!(unpacker.pump(&mut source),
///            Ok(Pump::Ready(Value::Array(vec![1u8.into(), "ok".into()]))));
/// assert_eq!(unpacker.consumed(), 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Unpacker {
    context: DecodeContext,
    stack: Vec<Frame>,
    consumed: usize,
    ready: bool,
    failed: Option<Error>,
}

#[derive(Debug, Clone)]
enum Frame {
    Array {
        items: Vec<Value>,
        remaining: u32,
    },
    Map {
        entries: Vec<(Value, Value)>,
        key: Option<Value>,
        remaining: u32,
    },
}

impl Frame {
    /// Add an element, returning the container once it is full.
    fn push(&mut self, value: Value) -> Option<Value> {
        match self {
            Frame::Array { items, remaining } => {
                items.push(value);
                *remaining -= 1;
                (*remaining == 0).then(|| Value::Array(mem::take(items)))
            }
            Frame::Map { entries, key, remaining } => match key.take() {
                None => {
                    *key = Some(value);
                    None
                }
                Some(k) => {
                    entries.push((k, value));
                    *remaining -= 1;
                    (*remaining == 0).then(|| Value::Map(mem::take(entries)))
                }
            }
        }
    }
}

impl Unpacker {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Unpacker {
            context: DecodeContext::with_config(config),
            stack: Vec::new(),
            consumed: 0,
            ready: false,
            failed: None,
        }
    }

    pub fn config(&self) -> &Config {
        self.context.config()
    }

    /// The item decoder, for inspecting progress inside the current item.
    pub fn context(&self) -> &DecodeContext {
        &self.context
    }

    /// Number of arrays and maps currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Bytes consumed by the value being decoded, or by the value just
    /// returned until the next pump.
    pub fn consumed(&self) -> usize {
        match self.context.phase() {
            Phase::Complete => self.consumed,
            _ => self.consumed + self.context.consumed()
        }
    }

    pub fn is_poisoned(&self) -> bool {
        self.failed.is_some()
    }

    /// Discard any partial value and a recorded error.
    pub fn reset(&mut self) {
        self.context.reset();
        self.stack.clear();
        self.consumed = 0;
        self.ready = false;
        self.failed = None;
    }

    /// Advance decoding of the current value as far as `source` allows.
    ///
    /// [`Pump::EndOfStream`] is only reported between values; a source ending
    /// inside an array or a map is an [`Error::UnexpectedEof`]. Errors are
    /// fatal until [`Unpacker::reset`].
    pub fn pump<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<Pump<Value>> {
        if let Some(err) = &self.failed {
            return Err(err.clone())
        }
        self.advance(source).map_err(|err| {
            self.failed = Some(err.clone());
            err
        })
    }

    /// Pump a value and return its text.
    ///
    /// A value of another kind is consumed whole and reported as
    /// [`Error::Access`], which leaves the unpacker usable.
    pub fn pump_str<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<Pump<String>> {
        self.pump(source)?.try_map(|value| value.into_string().map_err(Error::from))
    }

    /// Pump a value and return its bytes, accepting both `bin` and `str` values.
    pub fn pump_bin<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<Pump<Vec<u8>>> {
        self.pump(source)?.try_map(|value| value.into_binary().map_err(Error::from))
    }

    /// Iterate over the values of a source that blocks rather than running dry.
    ///
    /// The iterator keeps pumping while the source reports no data, so with a
    /// non-blocking source it spins. It ends after the first error.
    pub fn values<'a, S: ByteSource + ?Sized>(&'a mut self, source: &'a mut S) -> Values<'a, S> {
        Values { unpacker: self, source, done: false }
    }

    fn advance<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<Pump<Value>> {
        if mem::take(&mut self.ready) {
            self.consumed = 0;
        }
        loop {
            let item = match self.context.pump(source)? {
                Pump::Ready(item) => item,
                Pump::NeedMoreData => return Ok(Pump::NeedMoreData),
                Pump::EndOfStream if self.stack.is_empty() => return Ok(Pump::EndOfStream),
                Pump::EndOfStream => {
                    log!(warn, "MessagePack input ended with {} containers open", self.stack.len());
                    return Err(Error::UnexpectedEof { phase: Phase::TypeCode, expected: 1, obtained: 0 })
                }
            };
            self.consumed += self.context.consumed();
            let mut value = match item {
                Decoded::Value(value) => value,
                Decoded::Array(len) => {
                    self.check_depth()?;
                    if len == 0 {
                        Value::Array(Vec::new())
                    }
                    else {
                        self.stack.push(Frame::Array {
                            items: Vec::with_capacity((len as usize).min(MAX_PREALLOC)),
                            remaining: len
                        });
                        continue
                    }
                }
                Decoded::Map(len) => {
                    self.check_depth()?;
                    if len == 0 {
                        Value::Map(Vec::new())
                    }
                    else {
                        self.stack.push(Frame::Map {
                            entries: Vec::with_capacity((len as usize).min(MAX_PREALLOC)),
                            key: None,
                            remaining: len
                        });
                        continue
                    }
                }
            };
            loop {
                let Some(frame) = self.stack.last_mut() else {
                    self.ready = true;
                    log!(debug, "MessagePack {} unpacked from {} bytes", value.kind(), self.consumed);
                    return Ok(Pump::Ready(value))
                };
                match frame.push(value) {
                    Some(container) => {
                        self.stack.pop();
                        value = container;
                    }
                    None => break
                }
            }
        }
    }

    fn check_depth(&self) -> Result<()> {
        let limit = self.context.config().max_depth();
        if self.stack.len() >= limit {
            log!(warn, "MessagePack containers nested deeper than {}", limit);
            return Err(Error::DepthLimit(limit))
        }
        Ok(())
    }
}

/// An iterator over the values of a blocking source, see [`Unpacker::values`].
#[derive(Debug)]
pub struct Values<'a, S: ?Sized> {
    unpacker: &'a mut Unpacker,
    source: &'a mut S,
    done: bool,
}

impl<S: ByteSource + ?Sized> Iterator for Values<'_, S> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.unpacker.pump(&mut *self.source) {
                Ok(Pump::Ready(value)) => return Some(Ok(value)),
                Ok(Pump::NeedMoreData) => {}
                Ok(Pump::EndOfStream) => self.done = true,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err))
                }
            }
        }
        None
    }
}

/// Decode the first value of a complete buffer.
///
/// Returns the value and the number of bytes it occupied.
///
/// ```
/// use ser_pump_msgpack::{from_slice, Value};
///
/// let (value, len) = from_slice(b"\xa5hello\xc0").unwrap();
/// assert_eq!(value, Value::from("hello"));
/// assert_eq!(len, 6);
/// ```
pub fn from_slice(input: &[u8]) -> Result<(Value, usize)> {
    let mut unpacker = Unpacker::new();
    let mut source = input;
    match unpacker.pump(&mut source)? {
        Pump::Ready(value) => Ok((value, unpacker.consumed())),
        _ => Err(Error::UnexpectedEof { phase: Phase::TypeCode, expected: 1, obtained: 0 })
    }
}

/// Decode the first value of a complete buffer and return the bytes after it.
pub fn from_slice_split_tail(input: &[u8]) -> Result<(Value, &[u8])> {
    let mut unpacker = Unpacker::new();
    let mut source = input;
    match unpacker.pump(&mut source)? {
        Pump::Ready(value) => Ok((value, source)),
        _ => Err(Error::UnexpectedEof { phase: Phase::TypeCode, expected: 1, obtained: 0 })
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use ser_pump::{Chunked, FeedSource};
    use crate::value::AccessError;
    use crate::Kind;
    use super::*;

    fn nested() -> (Vec<u8>, Value) {
        // {"a": [1, [], {}], "b": nil}
        let bytes = vec![0x82, 0xa1, b'a', 0x93, 0x01, 0x90, 0x80, 0xa1, b'b', 0xc0];
        let value = Value::Map(vec![
            ("a".into(), Value::Array(vec![1u8.into(), Value::Array(vec![]), Value::Map(vec![])])),
            ("b".into(), Value::Nil),
        ]);
        (bytes, value)
    }

    #[test]
    fn test_nested_any_chunking() {
        let (bytes, expected) = nested();
        let mut input = bytes.clone();
        input.push(0xc3);
        let mut unpacker = Unpacker::new();
        let mut source = Chunked::bytewise(&input[..]).stalling();
        let value = loop {
            match unpacker.pump(&mut source).unwrap() {
                Pump::Ready(value) => break value,
                Pump::NeedMoreData => {}
                Pump::EndOfStream => panic!("unexpected end"),
            }
        };
        assert_eq!(value, expected);
        assert_eq!(unpacker.consumed(), bytes.len());
        assert_eq!(unpacker.depth(), 0);
        assert_eq!(*source.get_ref(), &[0xc3u8][..]);
        assert_eq!(from_slice(&input), Ok((expected, bytes.len())));
    }

    #[test]
    fn test_consumed_mid_value() {
        let mut unpacker = Unpacker::new();
        let mut source = FeedSource::new();
        source.feed(&[0x91, 0xda, 0x00, 0x04, b'a']);
        assert_eq!(unpacker.pump(&mut source), Ok(Pump::NeedMoreData));
        assert_eq!(unpacker.consumed(), 5);
        assert_eq!(unpacker.context().phase(), Phase::Payload);
        source.feed(b"bcd\x07");
        assert_eq!(unpacker.pump(&mut source), Ok(Pump::Ready(Value::Array(vec!["abcd".into()]))));
        assert_eq!(unpacker.consumed(), 8);
        assert_eq!(unpacker.pump(&mut source), Ok(Pump::Ready(7u8.into())));
        assert_eq!(unpacker.consumed(), 1);
        assert_eq!(unpacker.pump(&mut source), Ok(Pump::NeedMoreData));
        assert_eq!(unpacker.consumed(), 0);
        source.close();
        assert_eq!(unpacker.pump(&mut source), Ok(Pump::EndOfStream));
    }

    #[test]
    fn test_end_inside_container() {
        let mut unpacker = Unpacker::new();
        let mut source: &[u8] = &[0x92, 0x01];
        assert_eq!(unpacker.pump(&mut source), Err(Error::UnexpectedEof {
            phase: Phase::TypeCode, expected: 1, obtained: 0 }));
        assert!(unpacker.is_poisoned());
        assert_eq!(from_slice(&[0x81, 0xc0]), Err(Error::UnexpectedEof {
            phase: Phase::TypeCode, expected: 1, obtained: 0 }));
        assert_eq!(from_slice(&[0x91, 0xa3, b'x']), Err(Error::UnexpectedEof {
            phase: Phase::Payload, expected: 3, obtained: 1 }));
        assert_eq!(from_slice(&[]), Err(Error::UnexpectedEof {
            phase: Phase::TypeCode, expected: 1, obtained: 0 }));
    }

    #[test]
    fn test_depth_limit() {
        let config = Config::new().with_max_depth(2);
        let mut unpacker = Unpacker::with_config(config);
        let mut source: &[u8] = &[0x91, 0x90, 0x91, 0x91, 0x91, 0xc0];
        assert_eq!(unpacker.pump(&mut source),
            Ok(Pump::Ready(Value::Array(vec![Value::Array(vec![])]))));
        assert_eq!(unpacker.pump(&mut source), Err(Error::DepthLimit(2)));
        assert_eq!(unpacker.pump(&mut source), Err(Error::DepthLimit(2)));
        unpacker.reset();
        // an empty container still counts as a level
        let mut source: &[u8] = &[0x91, 0x91, 0x90];
        assert_eq!(unpacker.pump(&mut source), Err(Error::DepthLimit(2)));
        unpacker.reset();
        let mut source: &[u8] = &[0x80];
        assert_eq!(unpacker.pump(&mut source), Ok(Pump::Ready(Value::Map(vec![]))));
    }

    #[test]
    fn test_deep_nesting_default() {
        let mut input = vec![0x91; 1000];
        input.push(0xc0);
        let (mut value, len) = from_slice(&input).unwrap();
        assert_eq!(len, 1001);
        for _ in 0..1000 {
            value = value.into_array().unwrap().pop().unwrap();
        }
        assert_eq!(value, Value::Nil);
        let input = vec![0x91; 1025];
        assert_eq!(from_slice(&input), Err(Error::DepthLimit(1024)));
    }

    #[test]
    fn test_typed_pumps() {
        let mut unpacker = Unpacker::new();
        let mut source: &[u8] = b"\x92\x01\x02\xa2hi\xc4\x01\x00";
        assert_eq!(unpacker.pump_str(&mut source), Err(Error::Access(AccessError::TypeMismatch {
            expected: Kind::String, found: Kind::Array })));
        assert!(!unpacker.is_poisoned());
        assert_eq!(unpacker.pump_str(&mut source), Ok(Pump::Ready("hi".into())));
        assert_eq!(unpacker.pump_bin(&mut source), Ok(Pump::Ready(vec![0])));
        assert_eq!(unpacker.pump_bin(&mut source), Ok(Pump::EndOfStream));
    }

    #[test]
    fn test_values_iterator() {
        let mut unpacker = Unpacker::new();
        let input = [0x01, 0xa1, b'x', 0xc2, 0xc1, 0xc0];
        let mut source = Chunked::bytewise(&input[..]).stalling();
        let values: Vec<_> = unpacker.values(&mut source).collect();
        assert_eq!(values, vec![
            Ok(1u8.into()),
            Ok("x".into()),
            Ok(false.into()),
            Err(Error::InvalidTypeCode(0xc1)),
        ]);
        unpacker.reset();
        let mut source: &[u8] = &[0x0a, 0x0b];
        assert_eq!(unpacker.values(&mut source).collect::<Result<Vec<_>>>(),
            Ok(vec![10u8.into(), 11u8.into()]));
    }

    #[test]
    fn test_split_tail() {
        let (value, tail) = from_slice_split_tail(b"\xc4\x02ab\xa1c").unwrap();
        assert_eq!(value, Value::Binary(b"ab".to_vec()));
        assert_eq!(tail, b"\xa1c");
        let (value, tail) = from_slice_split_tail(tail).unwrap();
        assert_eq!(value, "c".into());
        assert!(tail.is_empty());
    }
}
