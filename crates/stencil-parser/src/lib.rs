//! Mustache-style tag parser for the stencil template engine.
//!
//! This crate turns a raw template string into a token tree: text runs,
//! escaped/raw variables, sections and inverted sections (nested by
//! matching open/close tags on a stack), partial references, comments,
//! and delimiter-change directives.
//!
//! # Example
//!
//! ```rust
//! use stencil_parser::{parse, Delimiters, Token};
//!
//! let tokens = parse("Hello, {{name}}!", &Delimiters::default()).unwrap();
//! assert_eq!(tokens.len(), 3);
//! assert!(matches!(&tokens[1], Token::Variable { name, raw: false, .. } if name == "name"));
//! ```
//!
//! # Tag syntax
//!
//! | Tag | Meaning |
//! |-----|---------|
//! | `{{name}}` | escaped variable |
//! | `{{{name}}}` / `{{&name}}` | raw (unescaped) variable |
//! | `{{#name}}...{{/name}}` | section |
//! | `{{^name}}...{{/name}}` | inverted section |
//! | `{{>name}}` | partial |
//! | `{{!comment}}` | comment |
//! | `{{=<% %>=}}` | delimiter change |
//!
//! Rendering the tree against a data context is the concern of
//! `stencil-render`; this crate has no opinion about values, scopes, or
//! formatter pipes (a tag body like `price|number(2)` is kept whole).

mod error;
mod parse;
mod scanner;
mod token;

pub use error::ParseError;
pub use parse::parse;
pub use scanner::Scanner;
pub use token::{Delimiters, Span, Token};
