//! Token-tree rendering.
//!
//! The writer walks a parsed token tree against a scope chain and
//! appends output. Variable tags resolve, run their pipe chain if any,
//! and interpolate (HTML-escaped unless raw); sections branch on
//! truthiness, iterate arrays, or invoke lambdas; partials re-enter the
//! renderer with the current scope as a fresh root. One [`Memo`] spans
//! the whole top-level render, partials and lambda sub-renders included.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use stencil_parser::{Delimiters, ParseError, Span, Token};

use crate::cache;
use crate::context::{Context, Memo};
use crate::error::RenderError;
use crate::escape::escape;
use crate::pipe::{self, parse_chain, split_name, FormatterCall, FormatterRegistry};
use crate::value::Value;

/// Per-render options.
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    /// Initial tag delimiters; `None` means `{{` / `}}`.
    pub tags: Option<Delimiters>,
}

/// Supplies partial templates by name.
///
/// A missing partial is not an error: the tag renders nothing.
pub trait PartialSource {
    fn partial(&self, name: &str) -> Option<String>;
}

/// No partials.
impl PartialSource for () {
    fn partial(&self, _name: &str) -> Option<String> {
        None
    }
}

impl PartialSource for HashMap<String, String> {
    fn partial(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl PartialSource for HashMap<&str, &str> {
    fn partial(&self, name: &str) -> Option<String> {
        self.get(name).map(|s| s.to_string())
    }
}

impl PartialSource for BTreeMap<String, String> {
    fn partial(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<F> PartialSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn partial(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Render a template against a view, with no partials and default
/// options. Formatters come from the default registry.
pub fn render(template: &str, view: &Value) -> Result<String, RenderError> {
    render_with(template, view, &(), &RenderConfig::default())
}

/// Render with partials.
pub fn render_with_partials(
    template: &str,
    view: &Value,
    partials: &dyn PartialSource,
) -> Result<String, RenderError> {
    render_with(template, view, partials, &RenderConfig::default())
}

/// Render with partials and options. Formatters come from the default
/// registry, snapshotted at entry so a lambda registering formatters
/// mid-render cannot deadlock.
pub fn render_with(
    template: &str,
    view: &Value,
    partials: &dyn PartialSource,
    config: &RenderConfig,
) -> Result<String, RenderError> {
    let registry = pipe::with_default(FormatterRegistry::clone);
    render_with_registry(template, view, partials, config, &registry)
}

/// Render with an explicit formatter registry instead of the default.
pub fn render_with_registry(
    template: &str,
    view: &Value,
    partials: &dyn PartialSource,
    config: &RenderConfig,
    registry: &FormatterRegistry,
) -> Result<String, RenderError> {
    let tags = config.tags.clone().unwrap_or_default();
    let tokens = cache::parsed(template, &tags)?;
    let mut writer = Writer {
        partials,
        registry,
        config,
        memo: Memo::new(),
    };
    let mut out = String::with_capacity(template.len());
    let root = Context::root(view, &mut writer.memo);
    writer.walk(&tokens, template, &root, &mut out)?;
    Ok(out)
}

/// Parse a template (through the cache) without rendering it.
pub fn parse(
    template: &str,
    tags: Option<&Delimiters>,
) -> Result<Arc<Vec<Token>>, ParseError> {
    cache::parsed(template, &tags.cloned().unwrap_or_default())
}

/// A tag body split into its lookup name, iteration marker, and pipe
/// chain. In `{{#.items|iter|upper}}` the name is `.items`, `iter` is
/// the marker (only recognized argument-less and first, on dot-prefixed
/// names), and `upper` starts the chain.
struct NameSpec<'s> {
    name: &'s str,
    iter: bool,
    calls: Vec<FormatterCall>,
}

fn parse_name(body: &str) -> NameSpec<'_> {
    let (name, chain) = split_name(body);
    let mut calls = chain.map(parse_chain).unwrap_or_default();
    let iter = name.starts_with('.')
        && calls
            .first()
            .map_or(false, |c| c.name == "iter" && c.args.is_empty());
    if iter {
        calls.remove(0);
    }
    NameSpec { name, iter, calls }
}

struct Writer<'r> {
    partials: &'r dyn PartialSource,
    registry: &'r FormatterRegistry,
    config: &'r RenderConfig,
    memo: Memo,
}

impl<'r> Writer<'r> {
    fn walk(
        &mut self,
        tokens: &[Token],
        src: &str,
        ctx: &Context<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        for token in tokens {
            match token {
                Token::Text { text, .. } => out.push_str(text),
                Token::Variable { name, raw, .. } => self.write_variable(name, *raw, ctx, out),
                Token::Section {
                    name,
                    inverted: false,
                    children,
                    inner,
                    ..
                } => self.write_section(name, children, *inner, src, ctx, out)?,
                Token::Section {
                    name,
                    inverted: true,
                    children,
                    ..
                } => self.write_inverted(name, children, src, ctx, out)?,
                Token::Partial { name, .. } => self.write_partial(name, ctx, out)?,
                Token::Comment { .. } | Token::SetDelimiters { .. } => {}
            }
        }
        Ok(())
    }

    fn resolve_spec(&mut self, spec: &NameSpec<'_>, ctx: &Context<'_>) -> Option<Value> {
        let resolved = if spec.iter {
            ctx.resolve_for_iteration(spec.name, &mut self.memo)
        } else {
            ctx.resolve(spec.name, &mut self.memo)
        };
        if spec.calls.is_empty() {
            return resolved;
        }
        // The chain runs even for unresolved names so formatters like
        // `default` can supply a value.
        let input = resolved.unwrap_or(Value::Null);
        Some(
            self.registry
                .run_chain(input, &spec.calls, ctx, &mut self.memo),
        )
    }

    fn write_variable(&mut self, body: &str, raw: bool, ctx: &Context<'_>, out: &mut String) {
        let spec = parse_name(body);
        if let Some(value) = self.resolve_spec(&spec, ctx) {
            let text = value.to_display();
            if raw {
                out.push_str(&text);
            } else {
                out.push_str(&escape(&text));
            }
        }
    }

    fn write_section(
        &mut self,
        body: &str,
        children: &[Token],
        inner: Span,
        src: &str,
        ctx: &Context<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let spec = parse_name(body);
        let Some(value) = self.resolve_spec(&spec, ctx) else {
            return Ok(());
        };
        match value {
            v if !v.is_truthy() => {}
            Value::Array(items) => {
                for item in items {
                    let frame = ctx.push(item, &mut self.memo);
                    self.walk(children, src, &frame, out)?;
                }
            }
            Value::Lambda(lambda) => {
                let raw_inner = &src[inner.start..inner.end];
                let mut sub = |tpl: &str| self.render_fragment(tpl, ctx);
                if let Some(rendered) = lambda(raw_inner, &mut sub) {
                    out.push_str(&rendered);
                }
            }
            other => {
                let frame = ctx.push(other, &mut self.memo);
                self.walk(children, src, &frame, out)?;
            }
        }
        Ok(())
    }

    fn write_inverted(
        &mut self,
        body: &str,
        children: &[Token],
        src: &str,
        ctx: &Context<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let spec = parse_name(body);
        let fire = match self.resolve_spec(&spec, ctx) {
            None => true,
            Some(Value::Array(items)) => items.is_empty(),
            Some(v) => !v.is_truthy(),
        };
        if fire {
            // No frame is pushed; children see the enclosing scope.
            self.walk(children, src, ctx, out)?;
        }
        Ok(())
    }

    fn write_partial(
        &mut self,
        name: &str,
        ctx: &Context<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let Some(source) = self.partials.partial(name) else {
            return Ok(());
        };
        let tags = self.config.tags.clone().unwrap_or_default();
        let tokens = cache::parsed(&source, &tags)?;
        // The partial starts its own scope chain rooted at the current
        // value; the memo carries over.
        let view = ctx.value().clone();
        let root = Context::root(&view, &mut self.memo);
        self.walk(&tokens, &source, &root, out)
    }

    /// Render a template string against an existing scope. Used by
    /// section lambdas through their sub-render callback.
    fn render_fragment(&mut self, template: &str, ctx: &Context<'_>) -> Result<String, RenderError> {
        let tags = self.config.tags.clone().unwrap_or_default();
        let tokens = cache::parsed(template, &tags)?;
        let mut out = String::with_capacity(template.len());
        self.walk(&tokens, template, ctx, &mut out)?;
        Ok(out)
    }
}
