/// How `str` payloads that are not valid UTF-8 are treated.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Utf8Policy {
    /// Keep the bytes; the text view of such a string reports an error.
    #[default]
    Lenient,
    /// Fail decoding with [`Error::InvalidUtf8`](crate::Error::InvalidUtf8).
    Strict,
}

/// Decoding limits and policies shared by [`DecodeContext`](crate::DecodeContext)
/// and [`Unpacker`](crate::Unpacker).
///
/// ```
/// use ser_pump_msgpack::{Config, Utf8Policy};
///
/// let config = Config::new()
///     .with_max_payload_len(1 << 20)
///     .with_max_depth(32)
///     .with_utf8(Utf8Policy::Strict);
/// assert_eq!(config.max_payload_len(), 1 << 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Config {
    max_payload_len: usize,
    max_depth: usize,
    utf8: Utf8Policy,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// No payload limit, nesting up to 1024 levels and lenient strings.
    pub const fn new() -> Self {
        Config {
            max_payload_len: usize::MAX,
            max_depth: 1024,
            utf8: Utf8Policy::Lenient,
        }
    }
    /// The largest declared `str`, `bin` or `ext` length accepted.
    ///
    /// Checked before the payload buffer is allocated.
    pub const fn with_max_payload_len(mut self, len: usize) -> Self {
        self.max_payload_len = len;
        self
    }
    /// The deepest nesting of arrays and maps the [`Unpacker`](crate::Unpacker) accepts.
    pub const fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
    pub const fn with_utf8(mut self, policy: Utf8Policy) -> Self {
        self.utf8 = policy;
        self
    }
    pub const fn max_payload_len(&self) -> usize {
        self.max_payload_len
    }
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }
    pub const fn utf8(&self) -> Utf8Policy {
        self.utf8
    }
}
