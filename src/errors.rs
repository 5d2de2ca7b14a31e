use std::{error, fmt};

/// Failures reported by [`GrowVec`](crate::GrowVec) and
/// [`DoublyList`](crate::DoublyList).
///
/// Every container operation checks its arguments before touching any state,
/// so an `Err` always means the container is exactly as it was before the
/// call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerError {
    /// The element type has size zero. Zero-sized elements carry no data to
    /// store and are rejected by every mutating operation.
    ZeroSizedItem,

    /// A positional argument exceeded the valid range for the operation.
    IndexOutOfBounds { index: usize, len: usize },
    /// `start + count` exceeded the current length (or overflowed).
    RangeOutOfBounds { start: usize, count: usize, len: usize },

    /// The allocator refused the request. Prior contents are intact.
    AllocFailed,
    /// Capacity arithmetic overflowed `usize`.
    CapacityOverflow,
}

impl error::Error for ContainerError {}
impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSizedItem => write!(f, "zero-sized element type"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds (len {len})")
            }
            Self::RangeOutOfBounds { start, count, len } => {
                write!(f, "range {start}..{start}+{count} out of bounds (len {len})")
            }
            Self::AllocFailed => write!(f, "allocation failed"),
            Self::CapacityOverflow => write!(f, "capacity overflow"),
        }
    }
}

/// Failures reported by the wire parser.
///
/// A parse failure is final for the buffer: the caller discards the request
/// and treats the connection as unusable. The cursor passed in is never
/// advanced on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// The first line is not CRLF-terminated, or carries no method token
    /// before its first space. An unrecognized token is *not* an error, it
    /// parses as [`Method::Unknown`](crate::Method::Unknown).
    InvalidMethod,
    /// No URL span before the next space of the request line.
    InvalidUrl,
    /// A duplicated span (URL or header) is not valid UTF-8.
    InvalidEncoding,
    /// Anything other than the literal `HTTP/1.1\r\n` after the URL.
    UnsupportedVersion,
    /// Header line without `: ` after a non-empty key, missing CRLF, or the
    /// buffer ended before the empty terminator line.
    InvalidHeader,
    /// The header array could not store a parsed pair.
    Container(ContainerError),
}

impl From<ContainerError> for ParseError {
    fn from(err: ContainerError) -> Self {
        ParseError::Container(err)
    }
}

impl error::Error for ParseError {}
impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMethod => write!(f, "malformed request line"),
            Self::InvalidUrl => write!(f, "malformed request url"),
            Self::InvalidEncoding => write!(f, "request is not valid UTF-8"),
            Self::UnsupportedVersion => write!(f, "unknown/unsupported http version"),
            Self::InvalidHeader => write!(f, "malformed header line"),
            Self::Container(err) => write!(f, "failed to store header: {err}"),
        }
    }
}
