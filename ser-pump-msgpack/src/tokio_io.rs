//! Unpacking values from tokio readers.
use alloc::{boxed::Box, vec};
use std::io;

use ser_pump::{FeedSource, SourceError};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::Config;
use crate::context::Pump;
use crate::error::{Error, Result};
use crate::unpack::Unpacker;
use crate::value::Value;

const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Reads MessagePack values from an [`AsyncRead`].
///
/// Bytes read past the end of a value are kept for the next one.
///
/// ```
/// use ser_pump_msgpack::{AsyncUnpacker, Value};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let input: &[u8] = b"\xa2hi\xc3";
/// let mut unpacker = AsyncUnpacker::new(input);
/// assert_eq!(unpacker.next().await.unwrap(), Some(Value::from("hi")));
/// assert_eq!(unpacker.next().await.unwrap(), Some(Value::from(true)));
/// assert_eq!(unpacker.next().await.unwrap(), None);
/// # });
/// ```
#[derive(Debug)]
pub struct AsyncUnpacker<R> {
    reader: R,
    feed: FeedSource,
    unpacker: Unpacker,
    buf: Box<[u8]>,
}

impl<R: AsyncRead + Unpin> AsyncUnpacker<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, Config::default())
    }

    pub fn with_config(reader: R, config: Config) -> Self {
        Self::with_buffer_size(reader, config, DEFAULT_BUFFER_SIZE)
    }

    /// `size` is the most bytes requested from the reader at once.
    pub fn with_buffer_size(reader: R, config: Config, size: usize) -> Self {
        AsyncUnpacker {
            reader,
            feed: FeedSource::with_capacity(size.max(1)),
            unpacker: Unpacker::with_config(config),
            buf: vec![0; size.max(1)].into_boxed_slice(),
        }
    }

    /// Read the next value, `None` when the reader ended between values.
    ///
    /// Decoding errors are fatal, see [`Unpacker::pump`]. An I/O error is
    /// returned as [`Error::Source`] and the read may be retried.
    pub async fn next(&mut self) -> Result<Option<Value>> {
        loop {
            match self.unpacker.pump(&mut self.feed)? {
                Pump::Ready(value) => return Ok(Some(value)),
                Pump::EndOfStream => return Ok(None),
                Pump::NeedMoreData => self.fill().await?,
            }
        }
    }

    async fn fill(&mut self) -> Result<()> {
        match self.reader.read(&mut self.buf).await {
            Ok(0) => {
                log!(trace, "MessagePack reader ended");
                self.feed.close();
            }
            Ok(n) => {
                log!(trace, "MessagePack reader delivered {} bytes", n);
                self.feed.feed(&self.buf[..n]);
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => {
                log!(warn, "MessagePack reader failed: {}", err);
                return Err(Error::Source(SourceError::Io(err.kind())))
            }
        }
        Ok(())
    }

    /// Bytes read ahead of the value being decoded.
    pub fn buffered(&self) -> usize {
        self.feed.len()
    }

    pub fn unpacker(&self) -> &Unpacker {
        &self.unpacker
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Return the reader, dropping any bytes read ahead.
    pub fn into_inner(self) -> R {
        self.reader
    }
}
