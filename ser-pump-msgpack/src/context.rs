//! The resumable single item decoder.
use alloc::{string::String, vec::Vec};
use core::{fmt, mem, slice};

use ser_pump::{ByteSource, Fill};

use crate::config::{Config, Utf8Policy};
use crate::error::{Error, Result};
use crate::header::{Header, PayloadKind, Resolved};
use crate::value::{AccessError, Kind, Str, Value};

/// Payload buffers grow by at most this many bytes ahead of the received data,
/// so that a declared length alone never allocates more than this.
const PAYLOAD_GROWTH: usize = 64 * 1024;

/// The decoding phase of the current item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Waiting for the type code byte
    TypeCode,
    /// Reading the bytes between the type code and the payload: a length
    /// prefix, the body of a fixed-width scalar or an extension type
    LengthPrefix,
    /// Reading the payload of a `str`, `bin` or `ext` item
    Payload,
    /// The item was handed out
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::TypeCode => "type code",
            Phase::LengthPrefix => "length prefix",
            Phase::Payload => "payload",
            Phase::Complete => "complete item",
        })
    }
}

/// The outcome of a successful pump.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Pump<T> {
    /// An item is complete
    Ready(T),
    /// The source has no bytes right now; pump again once it might
    NeedMoreData,
    /// The source ended cleanly, before the first byte of an item
    EndOfStream,
}

impl<T> Pump<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Pump::Ready(..))
    }
    /// Return the item, if complete.
    pub fn ready(self) -> Option<T> {
        match self {
            Pump::Ready(item) => Some(item),
            _ => None
        }
    }
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Pump<U> {
        match self {
            Pump::Ready(item) => Pump::Ready(f(item)),
            Pump::NeedMoreData => Pump::NeedMoreData,
            Pump::EndOfStream => Pump::EndOfStream,
        }
    }
    pub fn try_map<U, E, F>(self, f: F) -> core::result::Result<Pump<U>, E>
        where F: FnOnce(T) -> core::result::Result<U, E>
    {
        Ok(match self {
            Pump::Ready(item) => Pump::Ready(f(item)?),
            Pump::NeedMoreData => Pump::NeedMoreData,
            Pump::EndOfStream => Pump::EndOfStream,
        })
    }
}

/// A single decoded MessagePack item.
///
/// Arrays and maps are reported by their headers only: the elements follow
/// as separate items. [`Unpacker`](crate::Unpacker) assembles them.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Any item other than an array or a map
    Value(Value),
    /// An array header with the number of elements that follow
    Array(u32),
    /// A map header with the number of key-value pairs that follow
    Map(u32),
}

impl Decoded {
    pub fn kind(&self) -> Kind {
        match self {
            Decoded::Value(value) => value.kind(),
            Decoded::Array(_) => Kind::Array,
            Decoded::Map(_) => Kind::Map,
        }
    }
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Decoded::Value(value) => Some(value),
            _ => None
        }
    }
    /// Return a container header's element count.
    pub fn header_len(&self) -> Option<u32> {
        match *self {
            Decoded::Array(len)|Decoded::Map(len) => Some(len),
            Decoded::Value(_) => None
        }
    }
    pub fn into_value(self) -> Option<Value> {
        match self {
            Decoded::Value(value) => Some(value),
            _ => None
        }
    }
    /// The text view of a `str` item.
    pub fn as_text(&self) -> core::result::Result<&str, AccessError> {
        match self {
            Decoded::Value(value) => value.as_text(),
            _ => Err(AccessError::TypeMismatch { expected: Kind::String, found: self.kind() })
        }
    }
    /// The binary view of a `str` or `bin` item.
    pub fn as_binary(&self) -> core::result::Result<&[u8], AccessError> {
        match self {
            Decoded::Value(value) => value.as_binary(),
            _ => Err(AccessError::TypeMismatch { expected: Kind::Binary, found: self.kind() })
        }
    }
    pub fn into_string(self) -> core::result::Result<String, AccessError> {
        match self {
            Decoded::Value(value) => value.into_string(),
            _ => Err(AccessError::TypeMismatch { expected: Kind::String, found: self.kind() })
        }
    }
    pub fn into_binary(self) -> core::result::Result<Vec<u8>, AccessError> {
        match self {
            Decoded::Value(value) => value.into_binary(),
            _ => Err(AccessError::TypeMismatch { expected: Kind::Binary, found: self.kind() })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    TypeCode,
    Prefix(Header),
    Payload(PayloadKind),
    Complete,
}

/// The resumable state of decoding one MessagePack item.
///
/// [`DecodeContext::pump`] reads from a [`ByteSource`] only as many bytes as
/// the current item still needs, so bytes following the item stay in the
/// source. A source delivering one byte per read is handled the same as one
/// delivering everything at once.
///
/// ```
/// use ser_pump::FeedSource;
/// use ser_pump_msgpack::{DecodeContext, Pump};
///
/// let mut source = FeedSource::new();
/// let mut context = DecodeContext::new();
/// source.feed(&[0xd9, 0x05, b'H', b'e']);
/// assert_eq!(context.pump(&mut source), Ok(Pump::NeedMoreData));
/// source.feed(b"llo");
/// let item = context.pump(&mut source).unwrap().ready().unwrap();
/// assert_eq!(item.as_text(), Ok("Hello"));
/// assert_eq!(context.consumed(), 7);
/// source.close();
/// assert_eq!(context.pump(&mut source), Ok(Pump::EndOfStream));
/// ```
#[derive(Debug, Clone)]
pub struct DecodeContext {
    config: Config,
    state: State,
    code: u8,
    prefix: [u8; 8],
    prefix_width: usize,
    prefix_read: usize,
    payload: Vec<u8>,
    payload_len: usize,
    payload_read: usize,
    consumed: usize,
    failed: Option<Error>,
}

impl Default for DecodeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeContext {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        DecodeContext {
            config,
            state: State::TypeCode,
            code: 0,
            prefix: [0; 8],
            prefix_width: 0,
            prefix_read: 0,
            payload: Vec::new(),
            payload_len: 0,
            payload_read: 0,
            consumed: 0,
            failed: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::TypeCode => Phase::TypeCode,
            State::Prefix(_) => Phase::LengthPrefix,
            State::Payload(_) => Phase::Payload,
            State::Complete => Phase::Complete,
        }
    }

    /// The type code of the current item, once read.
    pub fn type_code(&self) -> Option<u8> {
        match self.state {
            State::TypeCode => None,
            _ => Some(self.code)
        }
    }

    /// Number of bytes between the type code and the payload of the current item.
    pub fn prefix_width(&self) -> usize {
        self.prefix_width
    }

    pub fn prefix_read(&self) -> usize {
        self.prefix_read
    }

    /// Declared payload length of the current item, once known.
    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    pub fn payload_read(&self) -> usize {
        self.payload_read
    }

    /// Bytes consumed so far by the current item, or by the item just
    /// handed out until the next pump.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// `true` after a fatal error, until [`DecodeContext::reset`].
    pub fn is_poisoned(&self) -> bool {
        self.failed.is_some()
    }

    /// Discard any partial item and a recorded error.
    pub fn reset(&mut self) {
        self.begin();
        self.failed = None;
    }

    /// Advance decoding of the current item as far as `source` allows.
    ///
    /// Returns at the first point where the source has no bytes to give. After
    /// [`Pump::Ready`] the next call starts decoding the following item.
    ///
    /// Any error is fatal for the stream: it is returned again by every
    /// subsequent call until [`DecodeContext::reset`].
    pub fn pump<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<Pump<Decoded>> {
        if let Some(err) = &self.failed {
            return Err(err.clone())
        }
        self.advance(source).map_err(|err| {
            log!(warn, "MessagePack decoding failed: {}", err);
            self.failed = Some(err.clone());
            err
        })
    }

    /// Pump an item and return its text.
    ///
    /// An item of another kind is consumed and reported as [`Error::Access`],
    /// which leaves the context usable.
    pub fn pump_str<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<Pump<String>> {
        self.pump(source)?.try_map(|item| item.into_string().map_err(Error::from))
    }

    /// Pump an item and return its bytes, accepting both `bin` and `str` items.
    pub fn pump_bin<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<Pump<Vec<u8>>> {
        self.pump(source)?.try_map(|item| item.into_binary().map_err(Error::from))
    }

    fn begin(&mut self) {
        self.state = State::TypeCode;
        self.prefix_width = 0;
        self.prefix_read = 0;
        self.payload = Vec::new();
        self.payload_len = 0;
        self.payload_read = 0;
        self.consumed = 0;
    }

    fn advance<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<Pump<Decoded>> {
        loop {
            match self.state {
                State::Complete => self.begin(),
                State::TypeCode => {
                    let mut code = 0u8;
                    match read_some(source, slice::from_mut(&mut code))? {
                        Fill::Read(_) => {}
                        Fill::Pending => return Ok(Pump::NeedMoreData),
                        Fill::Ended => return Ok(Pump::EndOfStream),
                    }
                    self.code = code;
                    self.consumed = 1;
                    let header = Header::of(code).ok_or(Error::InvalidTypeCode(code))?;
                    log!(trace, "MessagePack type code {:#04x}", code);
                    self.prefix_width = header.width();
                    if self.prefix_width == 0 {
                        if let Some(item) = self.resolve(header)? {
                            return Ok(Pump::Ready(item))
                        }
                    }
                    else {
                        self.state = State::Prefix(header);
                    }
                }
                State::Prefix(header) => {
                    let (read, width) = (self.prefix_read, self.prefix_width);
                    match read_some(source, &mut self.prefix[read..width])? {
                        Fill::Read(n) => {
                            self.prefix_read += n;
                            self.consumed += n;
                        }
                        Fill::Pending => return Ok(Pump::NeedMoreData),
                        Fill::Ended => return Err(Error::UnexpectedEof {
                            phase: Phase::LengthPrefix, expected: width, obtained: read
                        })
                    }
                    if self.prefix_read == width {
                        if let Some(item) = self.resolve(header)? {
                            return Ok(Pump::Ready(item))
                        }
                    }
                }
                State::Payload(kind) => {
                    let read = self.payload_read;
                    if self.payload.len() == read {
                        let end = self.payload_len.min(read.saturating_add(PAYLOAD_GROWTH));
                        self.payload.resize(end, 0);
                    }
                    match read_some(source, &mut self.payload[read..])? {
                        Fill::Read(n) => {
                            self.payload_read += n;
                            self.consumed += n;
                        }
                        Fill::Pending => return Ok(Pump::NeedMoreData),
                        Fill::Ended => return Err(Error::UnexpectedEof {
                            phase: Phase::Payload, expected: self.payload_len, obtained: read
                        })
                    }
                    if self.payload_read == self.payload_len {
                        let payload = mem::take(&mut self.payload);
                        return self.finish(kind, payload).map(Pump::Ready)
                    }
                }
            }
        }
    }

    /// Interpret the complete header; `None` when a payload follows.
    fn resolve(&mut self, header: Header) -> Result<Option<Decoded>> {
        match header.resolve(&self.prefix[..self.prefix_width]) {
            Resolved::Done(item) => {
                self.state = State::Complete;
                log!(debug, "MessagePack {} decoded from {} bytes", item.kind(), self.consumed);
                Ok(Some(item))
            }
            Resolved::Payload(kind, len) => {
                let limit = self.config.max_payload_len();
                if len > limit {
                    return Err(Error::LengthLimit { len, limit })
                }
                self.payload_len = len;
                self.payload_read = 0;
                if len == 0 {
                    return self.finish(kind, Vec::new()).map(Some)
                }
                self.payload = Vec::with_capacity(len.min(PAYLOAD_GROWTH));
                self.state = State::Payload(kind);
                log!(trace, "MessagePack payload of {} bytes follows", len);
                Ok(None)
            }
        }
    }

    fn finish(&mut self, kind: PayloadKind, payload: Vec<u8>) -> Result<Decoded> {
        let value = match kind {
            PayloadKind::Str => {
                let text = Str::from(payload);
                if !text.is_utf8() && self.config.utf8() == Utf8Policy::Strict {
                    return Err(Error::InvalidUtf8)
                }
                Value::String(text)
            }
            PayloadKind::Bin => Value::Binary(payload),
            PayloadKind::Ext(ty) => Value::Extension(ty, payload),
        };
        self.state = State::Complete;
        log!(debug, "MessagePack {} decoded from {} bytes", value.kind(), self.consumed);
        Ok(Decoded::Value(value))
    }
}

/// A read that never reports more bytes than fit in `buf`; a source claiming
/// to have read nothing is treated as pending.
fn read_some<S: ByteSource + ?Sized>(source: &mut S, buf: &mut [u8]) -> Result<Fill> {
    Ok(match source.try_read(buf)? {
        Fill::Read(0) => Fill::Pending,
        Fill::Read(n) => Fill::Read(n.min(buf.len())),
        fill => fill
    })
}
