//! Layered, hierarchical settings for Rust applications, read from CIF files,
//! TOML files, environment variables and overrides.
//!
//! Cifconf parses configuration into a [`ValueStore`], a tree of named
//! containers holding string fields, and folds any number of stores into one
//! through a [`MergeEngine`] whose per-field strategies decide what happens
//! when two layers set the same field.
//!
//! ```ignore
//! let engine = MergeEngine::default();
//! let input = ResolveInput {
//!     files: read_files(["/etc/myapp.cif", "myapp.cif"])?,
//!     env_vars: std::env::vars().collect(),
//!     environment: Some(EnvironmentParser::new().prefix("MYAPP")),
//!     overrides: vec![parse_override("database.pool_size=10")?],
//! };
//! let settings = Namespace::new(resolve(&engine, input)?);
//! let pool_size = settings.get_int("database.pool_size")?.unwrap_or(5);
//! ```
//!
//! # The CIF format
//!
//! CIF is an indentation-structured format. Containers open with a dotted
//! path and a colon; fields are `key = value`, where the value is the raw
//! rest of the line (leading space included, no comments after it):
//!
//! ```text
//! # comments start with '#'
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
//! - Indentation is spaces only. A tab in the indentation is a syntax error.
//! - A deeper line nests under the line above it, an equal indent is a
//!   sibling, and a shallower one closes blocks until a matching indent is
//!   found.
//! - `|` continues a scalar value on a new line, `,` turns the field into a
//!   list and appends an element. Continuations must be indented deeper than
//!   their field and line up with each other.
//! - Defining the same container or field twice in one document is an error.
//!
//! [`cif::to_string`] writes a store back out in the same format.
//!
//! # The value store
//!
//! Every container maps names to exactly one of: a scalar field, a
//! non-empty list field, or a child container. Fields and containers share
//! one namespace, so `database` cannot be both. All values are strings;
//! conversion to typed values happens at read time through [`Namespace`].
//!
//! Paths are addressed with [`Path`], parsed from dotted strings. Segments
//! that are not made of alphanumerics, `_` and `-` are quoted:
//! `server."listen address"`.
//!
//! # Layer precedence
//!
//! ```text
//! Config files          in the order given, later files win
//!        ↑ overridden by
//! Environment vars      PREFIX__SECTION__KEY or explicit bindings
//!        ↑ overridden by
//! Overrides             ("database.url", "pg://...")
//! ```
//!
//! Every layer is sparse: it only sets the fields it mentions. "Overridden"
//! is the behaviour of the default [`Replace`] strategy. Register a
//! [`Keep`] or [`Append`] rule on the engine, for a single field or for every
//! field of a container, to change it:
//!
//! ```ignore
//! let engine = MergeEngine::default()
//!     .field_rule(Path::parse("server")?, "hosts", Append)
//!     .container_rule(Path::parse("secrets")?, Keep);
//! ```
//!
//! # Environment variables
//!
//! With prefix `MYAPP`, variables map via double-underscore nesting:
//!
//! | Env var | Field |
//! |---------|-------|
//! | `MYAPP__HOST` | `host` |
//! | `MYAPP__DATABASE__URL` | `database.url` |
//!
//! `__` separates nesting levels, a single `_` is part of the name, and
//! names are lowercased. Explicit bindings
//! ([`EnvironmentParser::var`]) map any variable to any field and can be
//! marked required.
//!
//! # Error handling
//!
//! All fallible operations return [`SettingsError`]. Syntax errors carry the
//! line number (counting non-blank lines) and the offending text; errors
//! from files are wrapped with the file path. See the [`error`] module for
//! the full set.

pub mod cif;
pub mod converters;
pub mod error;

mod env;
mod file;
mod merge;
mod namespace;
mod overrides;
mod path;
mod resolve;
mod store;

#[cfg(test)]
mod fixtures;

pub use env::EnvironmentParser;
pub use error::{Result, SettingsError};
pub use file::{Format, load_file, parse_content, read_files};
pub use merge::{Append, Keep, MergeEngine, MergeStrategy, Replace};
pub use namespace::Namespace;
pub use overrides::{overrides_to_store, parse_override};
pub use path::Path;
pub use resolve::{ResolveInput, resolve};
pub use store::{Container, Entry, EntryKind, Fields, FieldValue, Node, ValueStore};
