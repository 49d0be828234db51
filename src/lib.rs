//! A parser for an INI-like configuration dialect.
//!
//! ```text
//! # comment
//! name = demo
//!
//! [Server]
//! host = "localhost"
//! ports = [8080, 8081]
//! limits = { rps = 10, burst = 20 }
//!
//! [[backend]]
//! url = http://a.example
//! ```
//!
//! Keys and section names are ASCII case-insensitive. Values are kept as the
//! text they were written as and only converted when asked for:
//!
//! ```
//! let doc = confit::parse("[server]\nports = [8080, 8081]\ndebug = on").unwrap();
//! let server = &doc["server"];
//! assert_eq!(server["ports"].to::<Vec<u16>>(), Some(vec![8080, 8081]));
//! assert!(server["debug"].or(false));
//! assert_eq!(server["workers"].or(4u8), 4);
//! ```
pub mod api;
pub mod convert;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod utils;
pub mod value;
mod serialization;

pub use api::{parse, parse_bytes, parse_file, Document, Source, DEFAULT_SECTION};
pub use convert::FromValue;
pub use error::{Error, ErrorKind, ParseError};
pub use value::Value;
