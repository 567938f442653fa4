//! # Stencil — logic-less templates with formatter pipes
//!
//! Stencil renders mustache-style templates against any `Serialize`
//! view, with an extra trick mustache lacks: any lookup can pipe its
//! value through a chain of formatters.
//!
//! - `{{name}}` interpolates, HTML-escaped; `{{{name}}}` interpolates raw
//! - `{{#items}}...{{/items}}` sections branch on truthiness and
//!   iterate arrays
//! - `{{^items}}...{{/items}}` inverted sections render when the name
//!   is missing, falsy, or an empty array
//! - `{{>header}}` pulls in a partial template
//! - `{{price|number(2)}}` pipes the value through formatters
//! - `{{=<% %>=}}` switches tag delimiters for the rest of the template
//!
//! ## Quick Start
//!
//! ```rust
//! use serde::Serialize;
//! use stencil::render_data;
//!
//! #[derive(Serialize)]
//! struct Receipt {
//!     item: String,
//!     price: f64,
//! }
//!
//! let receipt = Receipt {
//!     item: "coffee".into(),
//!     price: 3.5,
//! };
//! let out = render_data("{{item|capitalize}}: {{price|number(2)}}", &receipt).unwrap();
//! assert_eq!(out, "Coffee: 3.50");
//! ```
//!
//! ## Working with values directly
//!
//! Views that are not plain data — lazily computed fields, section
//! lambdas, programmatic resolvers — are built from [`Value`] instead
//! of `Serialize`:
//!
//! ```rust
//! use stencil::{render, Value, ValueMap};
//!
//! let view: Value = [("greeting", Value::thunk(|| Value::from("hello")))]
//!     .into_iter()
//!     .collect::<ValueMap>()
//!     .into();
//! assert_eq!(render("{{greeting}}!", &view).unwrap(), "hello!");
//! ```
//!
//! ## Formatters
//!
//! The default registry ships with string and number builtins (`upper`,
//! `lower`, `capitalize`, `trim`, `number`, `default`, `truncate`,
//! `pad_left`, `pad_right`, `json`); [`pipe::register`] adds your own.
//! Formatter failures never fail a render: the offending stage logs a
//! warning and passes its input through.

pub use stencil_render::pipe;
pub use stencil_render::{
    clear_cache, escape, parse, parse_count, render, render_with, render_with_partials,
    render_with_registry, ContextSource, Delimiters, FormatterError, FormatterFn,
    FormatterRegistry, ParseError, PartialSource, RenderConfig, RenderError, SectionLambda,
    SubRender, Token, Value, ValueMap,
};

use serde::Serialize;

/// Render a template against any `Serialize` view.
pub fn render_data<T: Serialize>(template: &str, view: &T) -> Result<String, RenderError> {
    let value = Value::from_serialize(view)?;
    render(template, &value)
}

/// Render a template against a `Serialize` view, with partials.
pub fn render_data_with_partials<T: Serialize>(
    template: &str,
    view: &T,
    partials: &dyn PartialSource,
) -> Result<String, RenderError> {
    let value = Value::from_serialize(view)?;
    render_with_partials(template, &value, partials)
}
