//! CIF, the indentation-structured configuration format.
//!
//! ```text
//! # comment
//! name = demo
//! database:
//!     url = pg://localhost/demo
//!     replicas = pg://a
//!              , pg://b
//! server.http:
//!     banner = welcome
//!            | to the demo
//! ```
//!
//! Containers are opened with `path:` and nest by indentation. Fields are
//! `key = value`, where the value is the raw rest of the line. `|` lines
//! continue a scalar value with a newline, `,` lines turn the field into a
//! list. Line numbers in errors count non-blank lines only.

mod grammar;
mod parser;
mod writer;

pub use grammar::{Line, Lines, Token, lines, parse_line, split_indent, tokenize};
pub use parser::{from_reader, from_str};
pub use writer::to_string;
