//! The runtime value model templates render against.
//!
//! [`Value`] covers the plain data shapes (null, bool, number, string,
//! array, object) plus three behavioral variants: [`Value::Thunk`] for
//! lazily computed values, [`Value::Lambda`] for sections that receive
//! their raw inner text, and [`Value::Source`] for views that resolve
//! names programmatically instead of holding a map.
//!
//! Truthiness and display follow loose scripting conventions: `null`,
//! `false`, `0`, `NaN` and the empty string are falsy; `null` displays
//! as the empty string; whole numbers display without a fraction part.

use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::error::RenderError;

/// A view that resolves names itself instead of exposing fields.
///
/// Pushed onto the scope chain like any other value; each path segment
/// that lands on a `Source` is answered by [`ContextSource::resolve`].
pub trait ContextSource {
    fn resolve(&self, name: &str) -> Option<Value>;
}

/// Callback handed to a section lambda for rendering a template string
/// against the scope the lambda was found in. The lifetime covers the
/// renderer state the callback borrows for the duration of the call.
pub type SubRender<'a> = dyn FnMut(&str) -> Result<String, RenderError> + 'a;

/// A section lambda: receives the raw (unparsed) inner text of its
/// section and a sub-render callback. Returning `None` emits nothing.
pub type SectionLambda = dyn Fn(&str, &mut SubRender<'_>) -> Option<String>;

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(ValueMap),
    /// Lazily computed value, invoked (and memoized) on lookup.
    Thunk(Rc<dyn Fn() -> Value>),
    /// Section lambda, see [`SectionLambda`].
    Lambda(Rc<SectionLambda>),
    /// Programmatic name resolver, see [`ContextSource`].
    Source(Rc<dyn ContextSource>),
}

impl Value {
    pub fn thunk(f: impl Fn() -> Value + 'static) -> Value {
        Value::Thunk(Rc::new(f))
    }

    pub fn lambda(f: impl Fn(&str, &mut SubRender<'_>) -> Option<String> + 'static) -> Value {
        Value::Lambda(Rc::new(f))
    }

    pub fn source(s: impl ContextSource + 'static) -> Value {
        Value::Source(Rc::new(s))
    }

    /// Convert any `Serialize` view into a `Value` tree.
    pub fn from_serialize<T: Serialize>(view: &T) -> Result<Value, RenderError> {
        Ok(Value::from(serde_json::to_value(view)?))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Loose truthiness: `null`, `false`, `0`, `NaN` and `""` are falsy.
    /// Arrays and objects are always truthy, even when empty; emptiness
    /// is a separate question answered at lookup time.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// The text a variable tag interpolates for this value.
    pub fn to_display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(Value::to_display)
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => serde_json::to_string(&self.to_json()).unwrap_or_default(),
            Value::Thunk(_) | Value::Lambda(_) | Value::Source(_) => String::new(),
        }
    }

    /// Numeric coercion used by numeric formatters: numbers pass
    /// through, numeric strings parse, everything else is `None`.
    pub fn coerce_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Project the data variants into JSON. Behavioral variants (thunk,
    /// lambda, source) have no data representation and map to `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
            Value::Thunk(_) | Value::Lambda(_) | Value::Source(_) => serde_json::Value::Null,
        }
    }
}

/// Whole numbers print without a fraction part (`5`, not `5.0`).
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Object(map) => f.debug_tuple("Object").field(map).finish(),
            Value::Thunk(_) => f.write_str("Thunk(..)"),
            Value::Lambda(_) => f.write_str("Lambda(..)"),
            Value::Source(_) => f.write_str("Source(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Thunk(a), Value::Thunk(b)) => Rc::ptr_eq(a, b),
            (Value::Lambda(a), Value::Lambda(b)) => Rc::ptr_eq(a, b),
            (Value::Source(a), Value::Source(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(items: Vec<V>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Object(map)
    }
}

/// An insertion-ordered string-keyed map.
///
/// Iteration order is the order keys were first inserted, which is what
/// object iteration in templates exposes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap {
    entries: Vec<(String, Value)>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Replacing keeps the key's original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
