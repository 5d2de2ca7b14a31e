//! HTTP/1.1 wire parser.
//!
//! The parser is not a persistent state machine. Each stage receives a
//! [`Cursor`] over the unconsumed bytes and returns a new cursor plus its
//! result, or fails without the caller's cursor moving at all — `Cursor` is
//! `Copy`, so "no mutation on failure" holds by construction and the stages
//! compose freely.
//!
//! # Input data requirements
//!
//! The request line and headers must match this template exactly, with
//! `CRLF` meaning the two-byte sequence `"\r\n"` (bare `CR` or `LF` are
//! rejected) and `SP` a single ASCII space:
//!
//! ```text
//! [METHOD] SP [URL] SP "HTTP/1.1" CRLF
//! [KEY] ":" SP [VALUE] CRLF        (zero or more)
//! CRLF
//! ```
//!
//! Duplicated spans (URL, header keys and values) must be UTF-8; everything
//! else is treated as raw bytes. Only `HTTP/1.1` is accepted — any other
//! version literal is a hard failure, while an unrecognized method token is
//! a *valid* parse producing [`Method::Unknown`].

use crate::{
    container::vec::GrowVec,
    errors::ParseError,
    http::types::{Header, Method},
};
use memchr::memchr;

const VERSION_LINE: &[u8; 10] = b"HTTP/1.1\r\n";

/// Immutable view of the unconsumed input: the "remaining size" plus read
/// position, carried as one value.
///
/// The underlying buffer must stay valid and unmodified for the duration of
/// a parse call; the borrow checker enforces exactly that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor<'a> {
    rest: &'a [u8],
}

impl<'a> Cursor<'a> {
    #[inline(always)]
    pub const fn new(buf: &'a [u8]) -> Self {
        Cursor { rest: buf }
    }

    /// Count of valid, unconsumed bytes.
    #[inline(always)]
    pub const fn remaining(&self) -> usize {
        self.rest.len()
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    /// The unconsumed bytes themselves.
    #[inline(always)]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.rest
    }

    #[inline(always)]
    fn advance(self, n: usize) -> Self {
        Cursor {
            rest: &self.rest[n..],
        }
    }
}

/// One parsed HTTP/1.1 request: method, owned URL, headers in arrival
/// order, and the number of bytes the parse consumed.
#[derive(Debug, PartialEq, Eq)]
pub struct Request {
    method: Method,
    url: String,
    headers: GrowVec<Header>,
    consumed: usize,
}

impl Default for Request {
    fn default() -> Self {
        Request {
            method: Method::Unknown,
            url: String::new(),
            headers: GrowVec::new(),
            consumed: 0,
        }
    }
}

impl Request {
    /// Parses one request from the front of `cursor`.
    ///
    /// On success the returned cursor sits past the consumed bytes (request
    /// line + headers + terminating empty line); whatever follows — for this
    /// core, nothing meaningful, since bodies are not parsed — is untouched.
    ///
    /// An empty cursor parses to a default record with the cursor unchanged:
    /// zero bytes received is a no-op, not an error. Callers distinguish
    /// "nothing received" from "malformed bytes" by checking
    /// [`Cursor::remaining`] before the call.
    ///
    /// On failure no record is returned and the caller's cursor is exactly
    /// as passed in; the buffer is considered unusable.
    pub fn parse(cursor: Cursor<'_>) -> Result<(Cursor<'_>, Request), ParseError> {
        if cursor.is_empty() {
            return Ok((cursor, Request::default()));
        }

        let before = cursor.remaining();
        let (cursor, method) = parse_method(cursor)?;
        let (cursor, url) = parse_url(cursor)?;
        let cursor = expect_version(cursor)?;
        let (cursor, headers) = parse_headers(cursor)?;

        let request = Request {
            method,
            url,
            headers,
            consumed: before - cursor.remaining(),
        };
        Ok((cursor, request))
    }

    #[inline(always)]
    pub const fn method(&self) -> Method {
        self.method
    }

    #[inline(always)]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Headers in arrival order.
    #[inline(always)]
    pub const fn headers(&self) -> &GrowVec<Header> {
        &self.headers
    }

    /// First header value whose key matches `key` exactly (case-sensitive).
    /// Linear scan.
    #[inline]
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.key == key)
            .map(|h| h.value.as_str())
    }

    /// Total bytes the parse consumed, request line through the empty line.
    #[inline(always)]
    pub const fn consumed(&self) -> usize {
        self.consumed
    }
}

// Index of the first `\r`, which must be immediately followed by `\n`.
// A `\r` without its `\n` is malformed, not "keep searching".
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    let i = memchr(b'\r', buf)?;
    (buf.get(i + 1) == Some(&b'\n')).then_some(i)
}

// Stage 1: method token up to the first space of a CRLF-terminated line.
// An unrecognized token is Method::Unknown, still a successful parse; the
// cursor advances past the token and the space either way.
fn parse_method(cursor: Cursor<'_>) -> Result<(Cursor<'_>, Method), ParseError> {
    let buf = cursor.as_bytes();

    let Some(line_end) = find_crlf(buf) else {
        log::error!("failed to get first line of request.");
        return Err(ParseError::InvalidMethod);
    };
    let Some(token_end) = memchr(b' ', &buf[..line_end]) else {
        log::error!("no method delimiter in request line.");
        return Err(ParseError::InvalidMethod);
    };
    if token_end == 0 {
        log::error!("empty method token.");
        return Err(ParseError::InvalidMethod);
    }

    let method = Method::from_token(&buf[..token_end]);
    Ok((cursor.advance(token_end + 1), method))
}

// Stage 2: URL span up to the next space, duplicated into an owned string.
fn parse_url(cursor: Cursor<'_>) -> Result<(Cursor<'_>, String), ParseError> {
    let buf = cursor.as_bytes();

    let Some(line_end) = find_crlf(buf) else {
        log::error!("failed to get request line end.");
        return Err(ParseError::InvalidUrl);
    };
    let Some(url_end) = memchr(b' ', &buf[..line_end]) else {
        log::error!("no url delimiter in request line.");
        return Err(ParseError::InvalidUrl);
    };

    let url = duplicate_span(&buf[..url_end])?;
    Ok((cursor.advance(url_end + 1), url))
}

// Stage 3: the next ten bytes must be the literal `HTTP/1.1\r\n`.
fn expect_version(cursor: Cursor<'_>) -> Result<Cursor<'_>, ParseError> {
    let buf = cursor.as_bytes();
    if buf.len() < VERSION_LINE.len() || &buf[..VERSION_LINE.len()] != VERSION_LINE {
        log::error!("unknown/unsupported http version.");
        return Err(ParseError::UnsupportedVersion);
    }
    Ok(cursor.advance(VERSION_LINE.len()))
}

// Stage 4: header lines until the empty line. Pairs move into the array in
// arrival order; the empty line is consumed with them.
fn parse_headers(cursor: Cursor<'_>) -> Result<(Cursor<'_>, GrowVec<Header>), ParseError> {
    let mut headers = GrowVec::new();
    let mut cursor = cursor;

    loop {
        if cursor.as_bytes().starts_with(b"\r\n") {
            return Ok((cursor.advance(2), headers));
        }

        let (next, header) = parse_header_line(cursor)?;
        headers.push(header)?;
        cursor = next;
    }
}

// One `KEY: VALUE\r\n` line. Key and value must be non-empty, the colon
// must sit before the CR and be followed by exactly one space.
fn parse_header_line(cursor: Cursor<'_>) -> Result<(Cursor<'_>, Header), ParseError> {
    let buf = cursor.as_bytes();
    if buf.is_empty() {
        log::error!("buffer ended before header terminator.");
        return Err(ParseError::InvalidHeader);
    }

    let Some(line_end) = find_crlf(buf) else {
        log::error!("failed to find header end, CRLF expected.");
        return Err(ParseError::InvalidHeader);
    };
    let Some(colon) = memchr(b':', &buf[..line_end]) else {
        log::error!("failed to find header key end.");
        return Err(ParseError::InvalidHeader);
    };
    if colon == 0 {
        log::error!("empty header key.");
        return Err(ParseError::InvalidHeader);
    }
    if buf.get(colon + 1) != Some(&b' ') {
        log::error!("expected <space> after header key.");
        return Err(ParseError::InvalidHeader);
    }

    let value_span = &buf[colon + 2..line_end];
    if value_span.is_empty() {
        log::error!("empty header value.");
        return Err(ParseError::InvalidHeader);
    }

    let header = Header {
        key: duplicate_span(&buf[..colon])?,
        value: duplicate_span(value_span)?,
    };
    Ok((cursor.advance(line_end + 2), header))
}

// Owned deep copy of a span, validated as UTF-8 on the way out.
#[inline]
fn duplicate_span(span: &[u8]) -> Result<String, ParseError> {
    match simdutf8::basic::from_utf8(span) {
        Ok(text) => Ok(text.to_owned()),
        Err(_) => {
            log::error!("request span is not valid UTF-8.");
            Err(ParseError::InvalidEncoding)
        }
    }
}

#[cfg(test)]
mod request_self {
    use super::*;

    fn parse(input: &str) -> Result<(Cursor<'_>, Request), ParseError> {
        Request::parse(Cursor::new(input.as_bytes()))
    }

    #[test]
    fn parse_well_formed_request() {
        let input = "GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let (rest, request) = parse(input).unwrap();

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.url(), "/index.html");
        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.header("Host"), Some("example.com"));
        assert_eq!(request.consumed(), input.len());
        assert_eq!(rest.remaining(), 0);
    }

    #[test]
    fn parse_method_tokens() {
        #[rustfmt::skip]
        let cases = [
            ("GET",     Method::Get),
            ("PUT",     Method::Put),
            ("POST",    Method::Post),
            ("HEAD",    Method::Head),
            ("PATCH",   Method::Patch),
            ("TRACE",   Method::Trace),
            ("DELETE",  Method::Delete),
            ("OPTIONS", Method::Options),
            ("CONNECT", Method::Connect),

            // Valid parses, unknown tokens.
            ("BREW",     Method::Unknown),
            ("get",      Method::Unknown),
            ("PROPFIND", Method::Unknown),
        ];

        for (token, expected) in cases {
            let input = format!("{token} /url HTTP/1.1\r\n\r\n");
            let (rest, request) = parse(&input).unwrap();

            assert_eq!(request.method(), expected, "{token}");
            assert_eq!(request.url(), "/url", "{token}");
            assert_eq!(rest.remaining(), 0, "{token}");
        }
    }

    #[test]
    fn malformed_request_line() {
        #[rustfmt::skip]
        let cases = [
            ("",                        None), // empty input is a no-op success
            (" GET / HTTP/1.1\r\n\r\n", Some(ParseError::InvalidMethod)),
            // "GET/index" reads as an Unknown method token, the failure
            // lands on the missing url delimiter.
            ("GET/index HTTP/1.1\r\n",  Some(ParseError::InvalidUrl)),
            ("GET",                     Some(ParseError::InvalidMethod)),
            ("GET / HTTP/1.1\n\n",      Some(ParseError::InvalidMethod)),
            ("GET /\r\n",               Some(ParseError::InvalidUrl)),
        ];

        for (input, expected) in cases {
            match (parse(input), expected) {
                (Ok(_), None) => {}
                (Err(err), Some(expected)) => assert_eq!(err, expected, "{input:?}"),
                (result, expected) => panic!("{input:?}: got {result:?}, want {expected:?}"),
            }
        }
    }

    #[test]
    fn empty_buffer_is_noop() {
        let cursor = Cursor::new(b"");
        let (rest, request) = Request::parse(cursor).unwrap();

        assert_eq!(rest, cursor);
        assert_eq!(request, Request::default());
        assert_eq!(request.method(), Method::Unknown);
        assert_eq!(request.url(), "");
        assert!(request.headers().is_empty());
        assert_eq!(request.consumed(), 0);
    }

    #[test]
    fn rejects_other_versions() {
        #[rustfmt::skip]
        let cases = [
            "GET / HTTP/1.0\r\n\r\n",
            "GET / HTTP/2.0\r\n\r\n",
            "GET / http/1.1\r\n\r\n",
            "GET / HTTP/1.1 \r\n\r\n",
            "GET / HTT\r\n",
        ];

        for input in cases {
            let cursor = Cursor::new(input.as_bytes());
            let before = cursor.remaining();

            assert_eq!(
                Request::parse(cursor),
                Err(ParseError::UnsupportedVersion),
                "{input:?}"
            );
            // The caller's cursor never moved.
            assert_eq!(cursor.remaining(), before);
        }
    }

    #[test]
    fn malformed_headers() {
        #[rustfmt::skip]
        let cases = [
            "Host example.com\r\n\r\n",   // no colon
            "Host:example.com\r\n\r\n",   // no space after colon
            ": example.com\r\n\r\n",      // empty key
            "Host: \r\n\r\n",             // empty value
            "Host: example.com\n\r\n",    // bare LF
            "Host: example.com\r\n",      // buffer ends before empty line
            "Host: example.com",          // no CRLF at all
        ];

        for headers in cases {
            let input = format!("GET / HTTP/1.1\r\n{headers}");
            assert_eq!(parse(&input), Err(ParseError::InvalidHeader), "{headers:?}");
        }
    }

    #[test]
    fn headers_kept_in_arrival_order() {
        let input = "GET / HTTP/1.1\r\n\
                     Host: example.com\r\n\
                     Accept: text/html\r\n\
                     Host: other.org\r\n\
                     \r\n";
        let (_, request) = parse(input).unwrap();

        let collected: Vec<(&str, &str)> = request
            .headers()
            .iter()
            .map(|h| (h.key.as_str(), h.value.as_str()))
            .collect();
        #[rustfmt::skip]
        assert_eq!(collected, vec![
            ("Host",   "example.com"),
            ("Accept", "text/html"),
            ("Host",   "other.org"),
        ]);

        // Lookup returns the first match.
        assert_eq!(request.header("Host"), Some("example.com"));
    }

    #[test]
    fn header_lookup_is_case_sensitive() {
        let input = "GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let (_, request) = parse(input).unwrap();

        assert_eq!(request.header("Host"), Some("example.com"));
        assert_eq!(request.header("HOST"), None);
        assert_eq!(request.header("host"), None);
        assert_eq!(request.header("Accept"), None);
    }

    #[test]
    fn zero_headers_accepted() {
        let (rest, request) = parse("DELETE /thing HTTP/1.1\r\n\r\n").unwrap();

        assert_eq!(request.method(), Method::Delete);
        assert_eq!(request.url(), "/thing");
        assert!(request.headers().is_empty());
        assert_eq!(rest.remaining(), 0);
    }

    #[test]
    fn consumed_stops_at_empty_line() {
        let head = "POST /submit HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let input = format!("{head}leftover-bytes");
        let (rest, request) = parse(&input).unwrap();

        assert_eq!(request.consumed(), head.len());
        assert_eq!(rest.remaining(), input.len() - head.len());
        assert_eq!(rest.as_bytes(), b"leftover-bytes");
    }

    #[test]
    fn rejects_non_utf8_url() {
        let input = b"GET /\xff\xfe HTTP/1.1\r\n\r\n";
        assert_eq!(
            Request::parse(Cursor::new(input)),
            Err(ParseError::InvalidEncoding)
        );
    }

    #[test]
    fn value_keeps_inner_spaces() {
        let input = "GET / HTTP/1.1\r\nUser-Agent: curl/8.0 (unix)\r\n\r\n";
        let (_, request) = parse(input).unwrap();
        assert_eq!(request.header("User-Agent"), Some("curl/8.0 (unix)"));
    }
}
