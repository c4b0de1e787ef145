#[cfg(feature = "std")]
use std::collections::VecDeque;
#[cfg(all(feature = "alloc",not(feature = "std")))]
use alloc::collections::VecDeque;

use super::*;

/// A queue of bytes fed by the caller as they arrive from elsewhere.
///
/// Reading an empty queue answers [`Fill::Pending`] until [`FeedSource::close`]
/// was called, after which it answers [`Fill::Ended`] once the remaining
/// bytes were read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedSource {
    queue: VecDeque<u8>,
    closed: bool,
}

impl FeedSource {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_capacity(capacity: usize) -> Self {
        FeedSource { queue: VecDeque::with_capacity(capacity), closed: false }
    }
    /// Append bytes to the back of the queue.
    ///
    /// Bytes fed after [`FeedSource::close`] are still delivered.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.queue.extend(bytes.iter().copied());
    }
    /// Mark the end of the stream.
    pub fn close(&mut self) {
        self.closed = true;
    }
    pub fn is_closed(&self) -> bool {
        self.closed
    }
    /// Number of bytes waiting to be read
    pub fn len(&self) -> usize {
        self.queue.len()
    }
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl ByteSource for FeedSource {
    fn try_read(&mut self, buf: &mut [u8]) -> SourceResult<Fill> {
        if self.queue.is_empty() {
            return Ok(if self.closed { Fill::Ended } else { Fill::Pending })
        }
        let len = buf.len().min(self.queue.len());
        for (dst, src) in buf[..len].iter_mut().zip(self.queue.drain(..len)) {
            *dst = src;
        }
        Ok(Fill::Read(len))
    }
}
