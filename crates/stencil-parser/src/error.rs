//! Structural parse errors.

use thiserror::Error;

/// Error raised while tokenizing or nesting a template.
///
/// All variants carry the byte offset of the offending tag in the
/// original source. Parse errors are not recoverable locally; rendering
/// aborts and the error propagates to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A tag was opened but its close delimiter never appeared.
    #[error("unterminated tag at offset {offset}")]
    UnclosedTag { offset: usize },

    /// A section was opened but never closed.
    #[error("unclosed section \"{name}\" opened at offset {offset}")]
    UnclosedSection { name: String, offset: usize },

    /// A close tag appeared with no section open.
    #[error("unexpected section close \"{name}\" at offset {offset}")]
    UnopenedSection { name: String, offset: usize },

    /// A close tag did not match the innermost open section.
    #[error(
        "section mismatch: \"{open}\" opened at offset {open_offset} \
         closed by \"{close}\" at offset {close_offset}"
    )]
    SectionMismatch {
        open: String,
        open_offset: usize,
        close: String,
        close_offset: usize,
    },

    /// A delimiter-change directive did not contain exactly two markers.
    #[error("invalid delimiter change at offset {offset}")]
    InvalidDelimiters { offset: usize },
}
