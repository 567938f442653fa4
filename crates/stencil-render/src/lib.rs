//! Logic-less template rendering with formatter pipes.
//!
//! Templates are mustache-style: `{{name}}` interpolates (HTML-escaped),
//! `{{{name}}}` interpolates raw, `{{#items}}...{{/items}}` sections
//! branch and iterate, `{{>header}}` pulls in partials. On top of that,
//! any lookup can pipe its value through formatters:
//! `{{price|number(2)}}`.
//!
//! ```rust
//! use stencil_render::{render, Value, ValueMap};
//!
//! let view: Value = [
//!     ("name", Value::from("World")),
//!     ("price", Value::from(5)),
//! ]
//! .into_iter()
//! .collect::<ValueMap>()
//! .into();
//!
//! assert_eq!(render("Hello, {{name}}!", &view).unwrap(), "Hello, World!");
//! assert_eq!(render("{{price|number(2)}}", &view).unwrap(), "5.00");
//! ```
//!
//! Parsed templates are cached process-wide; rendering the same template
//! again reuses the token tree. Formatter chains are forgiving by
//! design: unknown or failing formatters log a warning through
//! `tracing` and pass the value through rather than failing the render.

mod cache;
mod context;
mod error;
mod escape;
pub mod pipe;
mod value;
mod writer;

pub use cache::{clear_cache, parse_count};
pub use context::{Context, Memo};
pub use error::{FormatterError, RenderError};
pub use escape::escape;
pub use pipe::{FormatterFn, FormatterRegistry};
pub use stencil_parser::{Delimiters, ParseError, Span, Token};
pub use value::{ContextSource, SectionLambda, SubRender, Value, ValueMap};
pub use writer::{
    parse, render, render_with, render_with_partials, render_with_registry, PartialSource,
    RenderConfig,
};
