//! Byte I/O traits for resumable decoders and writer-style encoders.
/*!

[`ByteSource`] is the input side: a non-blocking source that hands out
whatever bytes it has right now, possibly just one, and tells apart
"nothing yet" ([`Fill::Pending`]) from "nothing ever again" ([`Fill::Ended`]).
Decoders built on it must treat a short read as the normal case.

[`ByteSink`] is the output side: encoders write complete chunks to it and
receive [`SinkError::BufferFull`] when a bounded sink runs out of room.

Both traits are implemented for the usual suspects: byte slices, [`SliceSink`],
[`Chunked`] and, with `std` or `alloc`, `Vec<u8>`, `VecDeque<u8>` and
[`FeedSource`].
*/
#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "std")]
extern crate std;

#[cfg(all(feature = "alloc",not(feature = "std")))]
extern crate alloc;

use core::fmt;
use core::num::NonZeroUsize;

mod foreign;
#[cfg(any(feature = "std", feature = "alloc"))]
mod feed;

#[cfg(any(feature = "std", feature = "alloc"))]
pub use feed::FeedSource;
#[cfg(feature = "std")]
pub use foreign::ReadSource;

pub type SourceResult<T> = Result<T, SourceError>;
pub type SinkResult<T> = Result<T, SinkError>;

/// The outcome of a single [`ByteSource::try_read`] attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fill {
    /// This many bytes, at least one, were copied to the front of the buffer.
    Read(usize),
    /// No bytes are available at the moment, but more may arrive later.
    Pending,
    /// The source is permanently exhausted.
    Ended,
}

/// An error returned by [`ByteSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SourceError {
    /// The source failed and can not be read from anymore
    ReadFailed,
    /// The underlying reader returned an I/O error
    #[cfg(feature = "std")]
    #[cfg_attr(docsrs, doc(cfg(feature = "std")))]
    Io(std::io::ErrorKind),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::ReadFailed => f.write_str("byte source failed"),
            #[cfg(feature = "std")]
            SourceError::Io(kind) => write!(f, "byte source I/O error: {}", kind),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SourceError {}

/// An error returned by [`ByteSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SinkError {
    /// Buffer is full
    BufferFull,
    /// A length does not fit the encoding's widest length field
    LengthOverflow,
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SinkError::BufferFull => "buffer is full",
            SinkError::LengthOverflow => "length exceeds the encodable maximum",
        })
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SinkError {}

/// Decoders read data from the implementations of this trait.
///
/// A read must never block indefinitely. Implementations copy up to `buf.len()`
/// bytes and are free to copy fewer, including none.
pub trait ByteSource {
    /// Try to fill the front of `buf` with available bytes.
    ///
    /// Callers always pass a non-empty `buf`. On `Ok(Fill::Read(n))` the
    /// first `n` bytes of `buf` are valid, with `1 <= n <= buf.len()`.
    fn try_read(&mut self, buf: &mut [u8]) -> SourceResult<Fill>;
}

impl<S: ByteSource + ?Sized> ByteSource for &'_ mut S {
    #[inline]
    fn try_read(&mut self, buf: &mut [u8]) -> SourceResult<Fill> {
        (**self).try_read(buf)
    }
}

/// A slice never stalls: it hands out its bytes and then ends.
impl ByteSource for &[u8] {
    fn try_read(&mut self, buf: &mut [u8]) -> SourceResult<Fill> {
        if self.is_empty() {
            return Ok(Fill::Ended)
        }
        let len = buf.len().min(self.len());
        let (head, tail) = self.split_at(len);
        buf[..len].copy_from_slice(head);
        *self = tail;
        Ok(Fill::Read(len))
    }
}

/// Encoders should write data to the implementations of this trait.
pub trait ByteSink {
    /// Write all bytes from `buf` to the internal buffer.
    ///
    /// When over capacity return `Err(SinkError::BufferFull)`.
    fn write(&mut self, buf: &[u8]) -> SinkResult<()>;
    /// Write a single `byte` to the internal buffer.
    #[inline]
    fn write_byte(&mut self, byte: u8) -> SinkResult<()> {
        self.write(core::slice::from_ref(&byte))
    }
    /// Write a string to the internal buffer.
    #[inline]
    fn write_str(&mut self, s: &str) -> SinkResult<()> {
        self.write(s.as_bytes())
    }
}

impl<T: ByteSink + ?Sized> ByteSink for &'_ mut T {
    fn write(&mut self, buf: &[u8]) -> SinkResult<()> {
        (**self).write(buf)
    }
}

/// A sink writing to a borrowed, fixed size slice.
#[derive(Debug, PartialEq)]
pub struct SliceSink<'a> {
    buf: &'a mut [u8],
    len: usize
}

impl AsRef<[u8]> for SliceSink<'_> {
    /// Returns the written portion of the slice
    fn as_ref(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl<'a> SliceSink<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        SliceSink { buf, len: 0 }
    }
    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }
    /// Number of bytes that can still be written
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.len
    }
    /// Consume the sink and return the written portion with the lifetime of the
    /// original slice.
    pub fn into_written(self) -> &'a mut [u8] {
        let SliceSink { buf, len } = self;
        &mut buf[..len]
    }
}

impl ByteSink for SliceSink<'_> {
    fn write(&mut self, buf: &[u8]) -> SinkResult<()> {
        let end = self.len + buf.len();
        let chunk = self.buf.get_mut(self.len..end).ok_or(SinkError::BufferFull)?;
        chunk.copy_from_slice(buf);
        self.len = end;
        Ok(())
    }
}

/// Throttles another source to at most `limit` bytes per read.
///
/// A stalling `Chunked` additionally answers [`Fill::Pending`] before every
/// chunk, so a reader has to come back once for each piece of the input.
/// With a limit of one byte this is the worst case a resumable decoder has
/// to survive.
#[derive(Debug, Clone)]
pub struct Chunked<S> {
    inner: S,
    limit: NonZeroUsize,
    stall: bool,
    stalled: bool,
}

impl<S> Chunked<S> {
    pub fn new(inner: S, limit: NonZeroUsize) -> Self {
        Chunked { inner, limit, stall: false, stalled: false }
    }
    /// Deliver a single byte per read.
    pub fn bytewise(inner: S) -> Self {
        Self::new(inner, NonZeroUsize::MIN)
    }
    /// Report [`Fill::Pending`] once before each chunk.
    pub fn stalling(mut self) -> Self {
        self.stall = true;
        self
    }
    pub fn limit(&self) -> NonZeroUsize {
        self.limit
    }
    pub fn get_ref(&self) -> &S {
        &self.inner
    }
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ByteSource> ByteSource for Chunked<S> {
    fn try_read(&mut self, buf: &mut [u8]) -> SourceResult<Fill> {
        if self.stall && !self.stalled {
            self.stalled = true;
            return Ok(Fill::Pending)
        }
        let len = buf.len().min(self.limit.get());
        let fill = self.inner.try_read(&mut buf[..len])?;
        if let Fill::Read(_) = fill {
            self.stalled = false;
        }
        Ok(fill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_source() {
        let mut source: &[u8] = b"Hello";
        let mut buf = [0u8;3];
        assert_eq!(source.try_read(&mut buf), Ok(Fill::Read(3)));
        assert_eq!(&buf, b"Hel");
        assert_eq!(source.try_read(&mut buf), Ok(Fill::Read(2)));
        assert_eq!(&buf[..2], b"lo");
        assert_eq!(source.try_read(&mut buf), Ok(Fill::Ended));
        assert_eq!(source.try_read(&mut buf), Ok(Fill::Ended));
    }

    #[test]
    fn test_chunked_bytewise() {
        let mut source = Chunked::bytewise(&b"ab"[..]);
        let mut buf = [0u8;8];
        assert_eq!(source.try_read(&mut buf), Ok(Fill::Read(1)));
        assert_eq!(buf[0], b'a');
        assert_eq!(source.try_read(&mut buf), Ok(Fill::Read(1)));
        assert_eq!(buf[0], b'b');
        assert_eq!(source.try_read(&mut buf), Ok(Fill::Ended));
        assert!(source.get_ref().is_empty());
    }

    #[test]
    fn test_chunked_stalling() {
        let limit = NonZeroUsize::new(2).unwrap();
        let mut source = Chunked::new(&b"abc"[..], limit).stalling();
        let mut buf = [0u8;8];
        assert_eq!(source.try_read(&mut buf), Ok(Fill::Pending));
        assert_eq!(source.try_read(&mut buf), Ok(Fill::Read(2)));
        assert_eq!(&buf[..2], b"ab");
        assert_eq!(source.try_read(&mut buf), Ok(Fill::Pending));
        assert_eq!(source.try_read(&mut buf), Ok(Fill::Read(1)));
        assert_eq!(buf[0], b'c');
        assert_eq!(source.try_read(&mut buf), Ok(Fill::Pending));
        assert_eq!(source.try_read(&mut buf), Ok(Fill::Ended));
        assert_eq!(source.try_read(&mut buf), Ok(Fill::Ended));
    }

    #[test]
    fn test_slice_sink() {
        let mut buf = [0u8;22];
        let mut sink = SliceSink::new(&mut buf[..]);
        assert!(sink.is_empty());
        sink.write(b"Hello World!").unwrap();
        sink.write_byte(b' ').unwrap();
        sink.write_str("Good Bye!").unwrap();
        assert_eq!(sink.as_ref(), b"Hello World! Good Bye!");
        assert_eq!(sink.remaining(), 0);
        assert_eq!(sink.write_byte(b' '), Err(SinkError::BufferFull));
        assert_eq!(sink.len(), sink.capacity());
        assert_eq!(sink.into_written(), b"Hello World! Good Bye!");
    }
}
