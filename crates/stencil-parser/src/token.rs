//! Token tree produced by parsing a template.

use std::fmt;

/// The open/close marker strings that bound a tag.
///
/// Defaults to `{{` / `}}`. A delimiter-change directive
/// (`{{=<% %>=}}`) swaps the active pair for the remainder of the
/// current parse only; it never leaks into other templates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delimiters {
    pub open: String,
    pub close: String,
}

impl Delimiters {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new("{{", "}}")
    }
}

impl fmt::Display for Delimiters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.open, self.close)
    }
}

/// Byte offsets into the original template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A node in the parsed template tree.
///
/// Spans cover the whole construct including its delimiters; a section's
/// `inner` span covers the raw sub-template between its open and close
/// tags, which is what lambda sections receive as unparsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A run of plain text, appended verbatim.
    Text { text: String, span: Span },

    /// A variable tag. `raw` variables (`{{{x}}}` or `{{&x}}`) skip
    /// HTML escaping.
    Variable { name: String, raw: bool, span: Span },

    /// A section (`{{#name}}...{{/name}}`) or inverted section
    /// (`{{^name}}...{{/name}}`).
    Section {
        name: String,
        inverted: bool,
        children: Vec<Token>,
        span: Span,
        inner: Span,
    },

    /// A partial reference (`{{>name}}`).
    Partial { name: String, span: Span },

    /// A comment (`{{!...}}`). Emits nothing.
    Comment { span: Span },

    /// A delimiter-change directive (`{{=<% %>=}}`). Consumed during
    /// tokenization; inert at render time.
    SetDelimiters { span: Span },
}

impl Token {
    /// The source span this token covers.
    pub fn span(&self) -> Span {
        match self {
            Token::Text { span, .. }
            | Token::Variable { span, .. }
            | Token::Section { span, .. }
            | Token::Partial { span, .. }
            | Token::Comment { span }
            | Token::SetDelimiters { span } => *span,
        }
    }
}
