//! Process-wide parsed-template cache.
//!
//! Templates are keyed by `(source, delimiters)` so the same source
//! parsed under different delimiter pairs gets separate entries. Entries
//! are insert-only; a racing parse of the same key produces an identical
//! tree and the first insert wins.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;
use stencil_parser::{Delimiters, ParseError, Token};

type CacheMap = HashMap<(String, Delimiters), Arc<Vec<Token>>>;

static TEMPLATE_CACHE: Lazy<Mutex<CacheMap>> = Lazy::new(|| Mutex::new(HashMap::new()));
static PARSE_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Parse `template` under `tags`, or return the cached tree.
pub fn parsed(template: &str, tags: &Delimiters) -> Result<Arc<Vec<Token>>, ParseError> {
    {
        let cache = TEMPLATE_CACHE
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = cache.get(&(template.to_string(), tags.clone())) {
            return Ok(hit.clone());
        }
    }
    // Parse outside the lock; errors are not cached.
    let tokens = Arc::new(stencil_parser::parse(template, tags)?);
    PARSE_COUNT.fetch_add(1, Ordering::Relaxed);
    let mut cache = TEMPLATE_CACHE
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    Ok(cache
        .entry((template.to_string(), tags.clone()))
        .or_insert(tokens)
        .clone())
}

/// Drop all cached templates.
pub fn clear_cache() {
    TEMPLATE_CACHE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}

/// Number of cache-miss parses performed so far. Instrumentation for
/// tests asserting that repeated renders reuse the cached tree.
pub fn parse_count() -> usize {
    PARSE_COUNT.load(Ordering::Relaxed)
}
