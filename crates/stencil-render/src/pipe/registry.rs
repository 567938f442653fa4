//! Formatter registration and pipeline execution.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::context::{Context, Memo};
use crate::error::FormatterError;
use crate::pipe::builtins;
use crate::pipe::parser::{parse_chain, Arg, FormatterCall};
use crate::value::Value;

/// A registered formatter: receives the piped value and the evaluated
/// arguments, returns the transformed value or an error.
pub type FormatterFn = Arc<dyn Fn(&Value, &[Value]) -> Result<Value, FormatterError> + Send + Sync>;

/// A named collection of formatters.
///
/// Pipeline execution is deliberately forgiving: an unknown formatter or
/// a failing formatter logs a warning and passes its input value through
/// unchanged, and the rest of the chain still runs. A broken pipe stage
/// degrades output, it never aborts a render.
#[derive(Clone, Default)]
pub struct FormatterRegistry {
    formatters: HashMap<String, FormatterFn>,
}

impl FormatterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the builtin formatters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::install(&mut registry);
        registry
    }

    /// Register a formatter, replacing any existing one of that name.
    pub fn register<F>(&mut self, name: impl Into<String>, formatter: F)
    where
        F: Fn(&Value, &[Value]) -> Result<Value, FormatterError> + Send + Sync + 'static,
    {
        self.formatters.insert(name.into(), Arc::new(formatter));
    }

    /// Remove a formatter. Returns whether it existed.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.formatters.remove(name).is_some()
    }

    pub fn has(&self, name: &str) -> bool {
        self.formatters.contains_key(name)
    }

    /// Apply one formatter by name. Unknown names and formatter errors
    /// warn and return the input value unchanged.
    pub fn apply(&self, name: &str, value: &Value, args: &[Value]) -> Value {
        let Some(formatter) = self.formatters.get(name) else {
            warn!(formatter = name, "unknown formatter, passing value through");
            return value.clone();
        };
        match formatter(value, args) {
            Ok(out) => out,
            Err(err) => {
                warn!(
                    formatter = name,
                    error = %err,
                    "formatter failed, passing value through"
                );
                value.clone()
            }
        }
    }

    /// Run a chain expression against a value, resolving reference
    /// arguments in `scope` (or nothing, when `None`).
    pub fn pipe(&self, value: Value, chain: &str, scope: Option<&Value>) -> Value {
        let calls = parse_chain(chain);
        let mut memo = Memo::new();
        let null = Value::Null;
        let ctx = Context::root(scope.unwrap_or(&null), &mut memo);
        self.run_chain(value, &calls, &ctx, &mut memo)
    }

    pub(crate) fn run_chain(
        &self,
        mut value: Value,
        calls: &[FormatterCall],
        ctx: &Context<'_>,
        memo: &mut Memo,
    ) -> Value {
        for call in calls {
            let args: Vec<Value> = call
                .args
                .iter()
                .map(|arg| match arg {
                    Arg::Literal(v) => v.clone(),
                    // A reference that resolves to nothing degrades to
                    // its own text as a string literal.
                    Arg::Reference(name) => ctx
                        .resolve(name, memo)
                        .unwrap_or_else(|| Value::String(name.clone())),
                })
                .collect();
            value = self.apply(&call.name, &value, &args);
        }
        value
    }
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.formatters.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FormatterRegistry")
            .field("formatters", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_apply_unregister() {
        let mut registry = FormatterRegistry::new();
        registry.register("shout", |v: &Value, _: &[Value]| {
            Ok(Value::String(v.to_display().to_uppercase()))
        });
        assert!(registry.has("shout"));
        assert_eq!(
            registry.apply("shout", &Value::from("hi"), &[]),
            Value::from("HI")
        );
        assert!(registry.unregister("shout"));
        assert!(!registry.unregister("shout"));
    }

    #[test]
    fn unknown_formatter_passes_value_through() {
        let registry = FormatterRegistry::new();
        let v = Value::from("keep me");
        assert_eq!(registry.apply("nope", &v, &[]), v);
    }

    #[test]
    fn failing_formatter_passes_value_through() {
        let mut registry = FormatterRegistry::new();
        registry.register("bad", |_: &Value, _: &[Value]| {
            Err(FormatterError::new("always fails"))
        });
        let v = Value::from("keep me");
        assert_eq!(registry.apply("bad", &v, &[]), v);
    }

    #[test]
    fn chain_continues_after_failure() {
        let mut registry = FormatterRegistry::new();
        registry.register("bad", |_: &Value, _: &[Value]| {
            Err(FormatterError::new("always fails"))
        });
        registry.register("exclaim", |v: &Value, _: &[Value]| {
            Ok(Value::String(format!("{}!", v.to_display())))
        });
        assert_eq!(
            registry.pipe(Value::from("hi"), "bad|exclaim", None),
            Value::from("hi!")
        );
    }

    #[test]
    fn reference_args_resolve_in_scope() {
        let mut registry = FormatterRegistry::new();
        registry.register("append", |v: &Value, args: &[Value]| {
            let suffix = args.first().map(Value::to_display).unwrap_or_default();
            Ok(Value::String(format!("{}{}", v.to_display(), suffix)))
        });
        let scope: Value = [("suffix", Value::from("-ok"))]
            .into_iter()
            .collect::<crate::value::ValueMap>()
            .into();
        assert_eq!(
            registry.pipe(Value::from("x"), "append(suffix)", Some(&scope)),
            Value::from("x-ok")
        );
    }

    #[test]
    fn unresolved_references_degrade_to_literal_strings() {
        let mut registry = FormatterRegistry::new();
        registry.register("first_arg", |_: &Value, args: &[Value]| {
            Ok(args.first().cloned().unwrap_or(Value::Null))
        });
        assert_eq!(
            registry.pipe(Value::Null, "first_arg(missing)", None),
            Value::from("missing")
        );
        // A resolvable reference still wins over its own spelling.
        let scope: Value = [("missing", Value::from("found"))]
            .into_iter()
            .collect::<crate::value::ValueMap>()
            .into();
        assert_eq!(
            registry.pipe(Value::Null, "first_arg(missing)", Some(&scope)),
            Value::from("found")
        );
    }
}
