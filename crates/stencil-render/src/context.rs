//! Scope chain and name resolution.
//!
//! A [`Context`] is one frame of the scope chain: a value plus a parent
//! link. Sections push frames; lookups walk the chain from the innermost
//! frame outward, trying the full dotted path at each frame before
//! moving to the parent.
//!
//! Dot-prefixed names (`.x`) never walk the chain: they resolve against
//! the current frame only, and their results are coerced for the two
//! template uses — existence (collections collapse to a boolean) or
//! iteration (objects expand to `{key, value}` entries).
//!
//! Every frame gets an integer id from the per-render [`Memo`], and
//! successful resolutions (thunks already forced) are memoized under
//! `(frame id, mode, name)`. The memo lives for one top-level render and
//! is shared across partials and lambda sub-renders, so a thunk behind a
//! given frame runs at most once per render.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::value::{Value, ValueMap};

/// Per-render resolution cache and frame id allocator.
#[derive(Debug, Default)]
pub struct Memo {
    entries: HashMap<(u32, bool, String), Value>,
    next_id: u32,
}

impl Memo {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn get(&self, id: u32, iter: bool, name: &str) -> Option<&Value> {
        self.entries.get(&(id, iter, name.to_string()))
    }

    fn insert(&mut self, id: u32, iter: bool, name: &str, value: Value) {
        self.entries.insert((id, iter, name.to_string()), value);
    }
}

/// One frame of the scope chain.
///
/// The root frame borrows the caller's view; pushed frames own their
/// values, so rendering never mutates caller data.
pub struct Context<'a> {
    value: Cow<'a, Value>,
    parent: Option<&'a Context<'a>>,
    id: u32,
}

impl<'a> Context<'a> {
    pub fn root(value: &'a Value, memo: &mut Memo) -> Context<'a> {
        Context {
            value: Cow::Borrowed(value),
            parent: None,
            id: memo.alloc(),
        }
    }

    /// Push a child frame with `self` as parent.
    pub fn push<'b>(&'b self, value: Value, memo: &mut Memo) -> Context<'b> {
        Context {
            value: Cow::Owned(value),
            parent: Some(self),
            id: memo.alloc(),
        }
    }

    pub fn value(&self) -> &Value {
        self.value.as_ref()
    }

    /// Resolve a name. Dot-prefixed names get existence coercion.
    pub fn resolve(&self, name: &str, memo: &mut Memo) -> Option<Value> {
        self.resolve_mode(name, false, memo)
    }

    /// Resolve a name for iteration. Dot-prefixed names get iteration
    /// coercion instead of existence coercion.
    pub fn resolve_for_iteration(&self, name: &str, memo: &mut Memo) -> Option<Value> {
        self.resolve_mode(name, true, memo)
    }

    fn resolve_mode(&self, name: &str, iter: bool, memo: &mut Memo) -> Option<Value> {
        if name == "." {
            let value = force(self.value.as_ref().clone());
            return Some(if iter { coerce_iteration(value) } else { value });
        }
        if let Some(hit) = memo.get(self.id, iter, name) {
            return Some(hit.clone());
        }
        let resolved = if let Some(local) = name.strip_prefix('.') {
            // Current frame only; no chain walk for dot-prefixed names.
            resolve_path(self.value.as_ref(), local)
                .map(force)
                .map(|v| {
                    if iter {
                        coerce_iteration(v)
                    } else {
                        coerce_existence(v)
                    }
                })
        } else {
            let mut scope = Some(self);
            let mut found = None;
            while let Some(frame) = scope {
                if let Some(v) = resolve_path(frame.value.as_ref(), name) {
                    found = Some(force(v));
                    break;
                }
                scope = frame.parent;
            }
            found
        };
        if let Some(v) = &resolved {
            memo.insert(self.id, iter, name, v.clone());
        }
        resolved
    }
}

/// Walk a dotted path within a single value. Objects resolve by key,
/// arrays by numeric index, sources by delegation.
fn resolve_path(value: &Value, path: &str) -> Option<Value> {
    let mut current = Cow::Borrowed(value);
    for segment in path.split('.') {
        if segment.is_empty() {
            return None;
        }
        let next = match current.as_ref() {
            Value::Object(map) => map.get(segment).cloned(),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i).cloned()),
            Value::Source(source) => source.resolve(segment),
            _ => None,
        }?;
        current = Cow::Owned(next);
    }
    Some(current.into_owned())
}

fn force(mut value: Value) -> Value {
    loop {
        match value {
            Value::Thunk(f) => value = f(),
            other => return other,
        }
    }
}

/// Existence coercion: collections collapse to non-emptiness.
fn coerce_existence(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Bool(!items.is_empty()),
        Value::Object(map) => Value::Bool(!map.is_empty()),
        other => other,
    }
}

/// Iteration coercion: objects expand to an array of `{key, value}`
/// entries in insertion order; arrays pass through.
fn coerce_iteration(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Array(
            map.iter()
                .map(|(k, v)| {
                    let mut entry = ValueMap::new();
                    entry.insert("key", k);
                    entry.insert("value", v.clone());
                    Value::Object(entry)
                })
                .collect(),
        ),
        other => other,
    }
}
