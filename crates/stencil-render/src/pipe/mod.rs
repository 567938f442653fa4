//! Formatter pipelines.
//!
//! Templates attach formatter chains to lookups with `|`:
//! `{{price|number(2)}}` resolves `price`, then runs the value through
//! the `number` formatter. The free functions here operate on the
//! process-wide default registry (pre-loaded with the builtins); use
//! [`FormatterRegistry`] directly and
//! [`render_with_registry`](crate::render_with_registry) for an isolated
//! set of formatters.

mod builtins;
mod parser;
mod registry;

pub use parser::{parse_chain, split_name, Arg, FormatterCall};
pub use registry::{FormatterFn, FormatterRegistry};

use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;

use crate::error::FormatterError;
use crate::value::Value;

static DEFAULT_REGISTRY: Lazy<RwLock<FormatterRegistry>> =
    Lazy::new(|| RwLock::new(FormatterRegistry::with_builtins()));

pub(crate) fn with_default<R>(f: impl FnOnce(&FormatterRegistry) -> R) -> R {
    let registry = DEFAULT_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    f(&registry)
}

/// Register a formatter in the default registry.
pub fn register<F>(name: impl Into<String>, formatter: F)
where
    F: Fn(&Value, &[Value]) -> Result<Value, FormatterError> + Send + Sync + 'static,
{
    DEFAULT_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(name, formatter);
}

/// Remove a formatter from the default registry.
pub fn unregister(name: &str) -> bool {
    DEFAULT_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .unregister(name)
}

pub fn has_formatter(name: &str) -> bool {
    with_default(|r| r.has(name))
}

/// Apply one formatter from the default registry.
pub fn apply(name: &str, value: &Value, args: &[Value]) -> Value {
    with_default(|r| r.apply(name, value, args))
}

/// Run a chain expression through the default registry.
pub fn pipe(value: Value, chain: &str, scope: Option<&Value>) -> Value {
    with_default(|r| r.pipe(value, chain, scope))
}
