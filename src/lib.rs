//! joist - Minimal HTTP/1.1 server core built from first principles
//!
//! A small foundation for serving HTTP without a framework: growable
//! containers built directly on the raw allocator, and a wire parser that
//! walks a received byte buffer with an explicit cursor. The crate stops at
//! the protocol boundary, the caller owns the sockets and the accept loop.
//!
//! # What is here
//!
//! - **[`GrowVec`]** - contiguous growable array with doubling growth,
//!   positional insert/remove, range drain, sort, and deep duplication
//! - **[`DoublyList`]** - doubly-linked list with the same operation set,
//!   cheap at the ends, linear in the middle
//! - **[`Request`]** - one-shot HTTP/1.1 request parser over a [`Cursor`];
//!   no state machine, no partial-input resumption
//! - **[`Response`]** - status/content-type/body record that renders the
//!   full wire image into a single buffer
//!
//! Every fallible operation returns a `Result`; containers never panic on
//! bad arguments and never lose prior contents on failure.
//!
//! # Examples
//!
//! ```
//! use joist::{Cursor, Request, Response, ContentType, Method, StatusCode};
//!
//! let bytes = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
//! let (rest, request) = Request::parse(Cursor::new(bytes)).unwrap();
//!
//! assert_eq!(request.method(), Method::Get);
//! assert_eq!(request.url(), "/index.html");
//! assert_eq!(request.header("Host"), Some("example.com"));
//! assert_eq!(rest.remaining(), 0);
//!
//! let reply = Response::new(StatusCode::Ok, ContentType::TextHtml)
//!     .body("<h1>hello</h1>")
//!     .render();
//! assert!(reply.starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```
//!
//! Containers:
//! ```
//! use joist::GrowVec;
//!
//! let mut items: GrowVec<u32> = GrowVec::new();
//! items.push(3).unwrap();
//! items.push(1).unwrap();
//! items.insert(1, 2).unwrap();
//! items.sort_by(|a, b| a.cmp(b));
//! assert_eq!(items.as_slice(), &[1, 2, 3]);
//! ```

pub(crate) mod container {
    pub(crate) mod list;
    pub(crate) mod vec;
}
pub(crate) mod http {
    pub(crate) mod request;
    pub(crate) mod response;
    pub(crate) mod types;
}
pub(crate) mod errors;

pub use crate::{
    container::{list::DoublyList, vec::GrowVec},
    errors::{ContainerError, ParseError},
    http::{
        request::{Cursor, Request},
        response::{ContentType, Response, StatusCode},
        types::{Header, Method},
    },
};
