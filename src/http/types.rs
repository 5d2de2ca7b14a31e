//! Core HTTP protocol types

/// HTTP request methods
///
/// # References
///
/// - [RFC 7231, Section 4](https://datatracker.ietf.org/doc/html/rfc7231#section-4)
/// - [RFC 5789](https://datatracker.ietf.org/doc/html/rfc5789) (PATCH method)
///
/// A token matching none of the nine known methods parses as
/// [`Unknown`](Method::Unknown). That is a valid parse outcome, not a
/// failure; callers that only serve a subset reject `Unknown` at the
/// protocol level with `405 Method Not Allowed`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET method - transfer a current representation of the target resource
    /// [[RFC7231, Section 4.3.1](https://tools.ietf.org/html/rfc7231#section-4.3.1)]
    Get,
    /// PUT method - replace all current representations of the target resource with the request payload
    /// [[RFC7231, Section 4.3.4](https://tools.ietf.org/html/rfc7231#section-4.3.4)]
    Put,
    /// POST method - perform resource-specific processing on the request payload
    /// [[RFC7231, Section 4.3.3](https://tools.ietf.org/html/rfc7231#section-4.3.3)]
    Post,
    /// HEAD method - same as GET but without response body
    /// [[RFC7231, Section 4.3.2](https://tools.ietf.org/html/rfc7231#section-4.3.2)]
    Head,
    /// PATCH method - apply partial modifications to a resource
    /// [[RFC5789, Section 2](https://tools.ietf.org/html/rfc5789#section-2)]
    Patch,
    /// DELETE method - remove all current representations of the target resource
    /// [[RFC7231, Section 4.3.5](https://tools.ietf.org/html/rfc7231#section-4.3.5)]
    Delete,
    /// OPTIONS method - describe the communication options for the target resource
    /// [[RFC7231, Section 4.3.7](https://tools.ietf.org/html/rfc7231#section-4.3.7)]
    Options,
    /// CONNECT method - establish a tunnel to the server identified by the target resource
    /// [[RFC7231, Section 4.3.6](https://tools.ietf.org/html/rfc7231#section-4.3.6)]
    Connect,
    /// TRACE method - perform a message loop-back test along the path to the target resource
    /// [[RFC7231, Section 4.3.8](https://tools.ietf.org/html/rfc7231#section-4.3.8)]
    Trace,
    /// Any other token in the method position.
    Unknown,
}

impl Method {
    /// Matches a raw method token. Branches on length first, then on exact
    /// content, so no input ever compares against all nine literals.
    #[inline]
    pub(crate) fn from_token(token: &[u8]) -> Self {
        match token.len() {
            3 => match token {
                b"GET" => Method::Get,
                b"PUT" => Method::Put,
                _ => Method::Unknown,
            },
            4 => match token {
                b"POST" => Method::Post,
                b"HEAD" => Method::Head,
                _ => Method::Unknown,
            },
            5 => match token {
                b"PATCH" => Method::Patch,
                b"TRACE" => Method::Trace,
                _ => Method::Unknown,
            },
            6 => match token {
                b"DELETE" => Method::Delete,
                _ => Method::Unknown,
            },
            7 => match token {
                b"OPTIONS" => Method::Options,
                b"CONNECT" => Method::Connect,
                _ => Method::Unknown,
            },
            _ => Method::Unknown,
        }
    }
}

/// One parsed header line: an owned key/value string pair.
///
/// The parser moves pairs into the header array as they are produced;
/// releasing a [`Request`](crate::Request) releases its pairs with it.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Header {
    pub key: String,
    pub value: String,
}

impl Header {
    #[inline]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Header {
            key: key.into(),
            value: value.into(),
        }
    }
}
