//! Implementations for foreign types
#[cfg(feature = "std")]
use std::{vec::Vec, collections::VecDeque, io::{self, Cursor, Read}};
#[cfg(all(feature = "alloc",not(feature = "std")))]
use alloc::{vec::Vec, collections::VecDeque};

#[allow(unused_imports)]
use super::*;

#[cfg(any(feature = "std", feature = "alloc"))]
#[cfg_attr(docsrs, doc(cfg(any(feature = "std", feature = "alloc"))))]
impl ByteSink for Vec<u8> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> SinkResult<()> {
        self.extend_from_slice(buf);
        Ok(())
    }
    #[inline]
    fn write_byte(&mut self, byte: u8) -> SinkResult<()> {
        self.push(byte);
        Ok(())
    }
}

#[cfg(any(feature = "std", feature = "alloc"))]
#[cfg_attr(docsrs, doc(cfg(any(feature = "std", feature = "alloc"))))]
impl ByteSink for VecDeque<u8> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> SinkResult<()> {
        self.extend(buf.iter().copied());
        Ok(())
    }
    #[inline]
    fn write_byte(&mut self, byte: u8) -> SinkResult<()> {
        self.push_back(byte);
        Ok(())
    }
}

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
impl<T> ByteSink for Cursor<T>
    where Cursor<T>: io::Write
{
    #[inline]
    fn write(&mut self, buf: &[u8]) -> SinkResult<()> {
        io::Write::write_all(self, buf).map_err(|_| SinkError::BufferFull)
    }
}

#[cfg(feature = "arrayvec")]
#[cfg_attr(docsrs, doc(cfg(feature = "arrayvec")))]
impl<const CAP: usize> ByteSink for arrayvec::ArrayVec<u8, CAP> {
    fn write(&mut self, buf: &[u8]) -> SinkResult<()> {
        self.try_extend_from_slice(buf).map_err(|_| SinkError::BufferFull)
    }
    #[inline]
    fn write_byte(&mut self, byte: u8) -> SinkResult<()> {
        self.try_push(byte).map_err(|_| SinkError::BufferFull)
    }
}

#[cfg(feature = "heapless")]
#[cfg_attr(docsrs, doc(cfg(feature = "heapless")))]
impl<const CAP: usize> ByteSink for heapless::Vec<u8, CAP> {
    fn write(&mut self, buf: &[u8]) -> SinkResult<()> {
        self.extend_from_slice(buf).map_err(|_| SinkError::BufferFull)
    }
    #[inline]
    fn write_byte(&mut self, byte: u8) -> SinkResult<()> {
        self.push(byte).map_err(|_| SinkError::BufferFull)
    }
}

/// A `SmallVec` spills to the heap, so it never fills up.
#[cfg(feature = "smallvec")]
#[cfg_attr(docsrs, doc(cfg(feature = "smallvec")))]
impl<A: smallvec::Array<Item = u8>> ByteSink for smallvec::SmallVec<A> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> SinkResult<()> {
        self.extend_from_slice(buf);
        Ok(())
    }
    #[inline]
    fn write_byte(&mut self, byte: u8) -> SinkResult<()> {
        self.push(byte);
        Ok(())
    }
}

#[cfg(feature = "tinyvec")]
#[cfg_attr(docsrs, doc(cfg(feature = "tinyvec")))]
impl<A: tinyvec::Array<Item = u8>> ByteSink for tinyvec::ArrayVec<A> {
    fn write(&mut self, buf: &[u8]) -> SinkResult<()> {
        if buf.len() > self.capacity() - self.len() {
            return Err(SinkError::BufferFull)
        }
        self.extend_from_slice(buf);
        Ok(())
    }
    #[inline]
    fn write_byte(&mut self, byte: u8) -> SinkResult<()> {
        match self.try_push(byte) {
            None => Ok(()),
            Some(_) => Err(SinkError::BufferFull)
        }
    }
}

/// Adapts a [`std::io::Read`] implementation to a [`ByteSource`].
///
/// * `Ok(0)` from the reader is a permanent end,
/// * `WouldBlock` and `Interrupted` errors become [`Fill::Pending`],
/// * any other error is reported as [`SourceError::Io`].
#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
#[derive(Debug)]
pub struct ReadSource<R> {
    reader: R,
}

#[cfg(feature = "std")]
impl<R> ReadSource<R> {
    pub fn new(reader: R) -> Self {
        ReadSource { reader }
    }
    pub fn get_ref(&self) -> &R {
        &self.reader
    }
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(feature = "std")]
impl<R: Read> ByteSource for ReadSource<R> {
    fn try_read(&mut self, buf: &mut [u8]) -> SourceResult<Fill> {
        match self.reader.read(buf) {
            Ok(0) => Ok(Fill::Ended),
            Ok(n) => Ok(Fill::Read(n)),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock|io::ErrorKind::Interrupted) => {
                Ok(Fill::Pending)
            }
            Err(e) => Err(SourceError::Io(e.kind()))
        }
    }
}

#[cfg(test)]
mod tests {
    #[allow(unused_imports)]
    use super::*;

    #[cfg(any(feature = "std", feature = "alloc"))]
    #[test]
    fn test_sink_vec() {
        let mut sink = Vec::new();
        sink.write(b"Hello World!").unwrap();
        sink.write_byte(b' ').unwrap();
        sink.write_str("Good Bye!").unwrap();
        assert_eq!(&sink, b"Hello World! Good Bye!");
    }

    #[cfg(any(feature = "std", feature = "alloc"))]
    #[test]
    fn test_sink_vec_deque() {
        let mut sink = VecDeque::new();
        sink.write(b"Hello").unwrap();
        sink.write_byte(b'!').unwrap();
        assert_eq!(&sink, b"Hello!");
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_sink_cursor() {
        let mut sink = Cursor::new([0u8;6]);
        sink.write(b"Hello").unwrap();
        sink.write_byte(b'!').unwrap();
        assert_eq!(sink.get_ref(), b"Hello!");
        assert_eq!(sink.write_byte(b' '), Err(SinkError::BufferFull));
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_read_source() {
        struct Flaky<'a> {
            data: &'a [u8],
            calls: usize,
        }
        impl Read for Flaky<'_> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                self.calls += 1;
                match self.calls {
                    1 => Err(io::ErrorKind::WouldBlock.into()),
                    2 => Err(io::ErrorKind::Interrupted.into()),
                    5 => Err(io::ErrorKind::ConnectionReset.into()),
                    _ => self.data.read(buf)
                }
            }
        }
        let mut source = ReadSource::new(Flaky { data: b"xy", calls: 0 });
        let mut buf = [0u8;4];
        assert_eq!(source.try_read(&mut buf), Ok(Fill::Pending));
        assert_eq!(source.try_read(&mut buf), Ok(Fill::Pending));
        assert_eq!(source.try_read(&mut buf), Ok(Fill::Read(2)));
        assert_eq!(&buf[..2], b"xy");
        assert_eq!(source.try_read(&mut buf), Ok(Fill::Ended));
        assert_eq!(source.try_read(&mut buf), Err(SourceError::Io(io::ErrorKind::ConnectionReset)));
        assert_eq!(source.get_ref().calls, 5);
    }

    #[cfg(feature = "arrayvec")]
    #[test]
    fn test_sink_arrayvec() {
        let mut sink = arrayvec::ArrayVec::<u8,6>::new();
        sink.write(b"Hello").unwrap();
        sink.write_byte(b'!').unwrap();
        assert_eq!(sink.as_slice(), b"Hello!");
        assert_eq!(sink.write_byte(b' '), Err(SinkError::BufferFull));
    }

    #[cfg(feature = "heapless")]
    #[test]
    fn test_sink_heapless() {
        let mut sink = heapless::Vec::<u8,6>::new();
        sink.write(b"Hello").unwrap();
        sink.write_byte(b'!').unwrap();
        assert_eq!(sink.as_slice(), b"Hello!");
        assert_eq!(sink.write(b" "), Err(SinkError::BufferFull));
    }

    #[cfg(feature = "smallvec")]
    #[test]
    fn test_sink_smallvec() {
        let mut sink = smallvec::SmallVec::<[u8;4]>::new();
        sink.write(b"Hello").unwrap();
        sink.write_byte(b'!').unwrap();
        assert_eq!(sink.as_slice(), b"Hello!");
        assert!(sink.spilled());
    }

    #[cfg(feature = "tinyvec")]
    #[test]
    fn test_sink_tinyvec() {
        let mut sink = tinyvec::ArrayVec::<[u8;6]>::new();
        sink.write(b"Hello").unwrap();
        sink.write_byte(b'!').unwrap();
        assert_eq!(sink.as_slice(), b"Hello!");
        assert_eq!(sink.write_byte(b' '), Err(SinkError::BufferFull));
        assert_eq!(sink.write(b"  "), Err(SinkError::BufferFull));
    }
}
