//! Render-side error types.

use thiserror::Error;

pub use stencil_parser::ParseError;

/// Error raised while rendering a template.
///
/// Parse failures of the template (or of a partial) abort the render and
/// surface here. Formatter failures deliberately do not: a failing or
/// unknown formatter logs a warning and passes its input through, so a
/// bad pipe stage can never take down a render.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// View data could not be converted into the template value model.
    #[error("data serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::Serialization(err.to_string())
    }
}

/// Error returned by a formatter function.
///
/// Returning this from a registered formatter marks the stage as failed;
/// the pipeline logs it and continues with the stage's input value.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct FormatterError {
    message: String,
}

impl FormatterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
