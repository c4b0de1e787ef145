use core::fmt;
use ser_pump::SourceError;

use crate::context::Phase;
use crate::value::AccessError;

/// Unpacking result
pub type Result<T> = core::result::Result<T, Error>;

/// Unpacking error
///
/// Every variant except [`Error::Access`] is fatal for the stream: the
/// context that produced it keeps reporting it until it is reset.
#[derive(Debug, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The source ended inside an item
    UnexpectedEof {
        /// The phase that was starved
        phase: Phase,
        /// Bytes the phase needed in total
        expected: usize,
        /// Bytes the phase had received
        obtained: usize,
    },
    /// A type code not defined by MessagePack (`0xc1`)
    InvalidTypeCode(u8),
    /// A declared payload length is above the configured limit
    LengthLimit {
        len: usize,
        limit: usize,
    },
    /// Arrays and maps are nested deeper than the configured limit
    DepthLimit(usize),
    /// A `str` payload is not valid UTF-8 and the policy is strict
    InvalidUtf8,
    /// A typed read found an item of another kind; the item was consumed
    Access(AccessError),
    /// The byte source failed
    Source(SourceError),
}

impl Error {
    /// `true` when the stream ended too early, as opposed to carrying
    /// corrupt or unacceptable data.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Error::UnexpectedEof {..})
    }
    /// `false` only for errors after which the stream is still aligned on an
    /// item boundary.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Access(..))
    }
}

impl serde::de::StdError for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnexpectedEof { phase, expected, obtained } => write!(f,
                "Unexpected end of MessagePack input while reading {}: expected {} bytes, got {}",
                phase, expected, obtained),
            Error::InvalidTypeCode(code) => write!(f, "Invalid MessagePack type code {:#04x}", code),
            Error::LengthLimit { len, limit } => write!(f,
                "MessagePack payload length {} exceeds the limit of {}", len, limit),
            Error::DepthLimit(depth) => write!(f,
                "MessagePack containers nested deeper than {}", depth),
            Error::InvalidUtf8 => f.write_str("Invalid UTF-8 in MessagePack string"),
            Error::Access(err) => write!(f, "{}", err),
            Error::Source(err) => write!(f, "{} while reading MessagePack", err),
        }
    }
}

impl From<SourceError> for Error {
    fn from(err: SourceError) -> Self {
        Error::Source(err)
    }
}

impl From<AccessError> for Error {
    fn from(err: AccessError) -> Self {
        Error::Access(err)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use super::*;
    use crate::value::Kind;

    #[test]
    fn test_error_display() {
        let err = Error::UnexpectedEof { phase: Phase::Payload, expected: 31, obtained: 30 };
        assert!(err.is_truncation());
        assert!(err.is_fatal());
        assert_eq!(err.to_string(),
            "Unexpected end of MessagePack input while reading payload: expected 31 bytes, got 30");
        let err = Error::InvalidTypeCode(0xc1);
        assert!(!err.is_truncation());
        assert_eq!(err.to_string(), "Invalid MessagePack type code 0xc1");
        let err = Error::from(AccessError::TypeMismatch { expected: Kind::String, found: Kind::Binary });
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "Expected MessagePack str, found bin");
        assert_eq!(Error::from(SourceError::ReadFailed).to_string(),
            "byte source failed while reading MessagePack");
    }
}
