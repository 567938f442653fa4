//! Pipe-chain parsing.
//!
//! A chain like `number(2)|pad:8|wrap('<', '>')` is split into
//! [`FormatterCall`]s on top-level `|`, each call split into a name and
//! arguments. Splitting is quote-aware and depth-aware: separators
//! inside `'...'`/`"..."` or inside `()`, `[]`, `{}` never split, so
//! quoted commas and JSON-object arguments survive intact.
//!
//! Chain parsing never fails. Malformed stages degrade to string
//! literals or empty stages rather than aborting a render.

use crate::value::Value;

/// One stage of a pipe chain.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatterCall {
    pub name: String,
    pub args: Vec<Arg>,
}

/// A parsed formatter argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A literal: quoted string, number, bool, null, or JSON value.
    Literal(Value),
    /// A bare name, resolved against the scope chain at call time.
    /// A name that resolves to nothing degrades to its own text as a
    /// string literal.
    Reference(String),
}

/// Parse a full chain. Empty stages (`a||b`) are dropped.
pub fn parse_chain(chain: &str) -> Vec<FormatterCall> {
    split_top_level(chain, '|')
        .into_iter()
        .filter_map(parse_call)
        .collect()
}

/// Split a tag body into the lookup name and the pipe chain after the
/// first top-level `|`, if any.
pub fn split_name(body: &str) -> (&str, Option<&str>) {
    match find_top_level(body, '|') {
        Some(i) => (body[..i].trim(), Some(&body[i + 1..])),
        None => (body.trim(), None),
    }
}

/// Parse one stage: `name`, `name(a, b)`, or `name:a:b`.
fn parse_call(call: &str) -> Option<FormatterCall> {
    let call = call.trim();
    if call.is_empty() {
        return None;
    }
    match name_boundary(call) {
        Some((i, '(')) => {
            let name = call[..i].trim().to_string();
            let rest = &call[i + 1..];
            let inner = match find_closing_paren(rest) {
                Some(close) => &rest[..close],
                None => rest,
            };
            let args = split_top_level(inner, ',')
                .into_iter()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(parse_arg)
                .collect();
            Some(FormatterCall { name, args })
        }
        Some((i, _)) => {
            let name = call[..i].trim().to_string();
            let args = split_top_level(&call[i + 1..], ':')
                .into_iter()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(parse_arg)
                .collect();
            Some(FormatterCall { name, args })
        }
        None => Some(FormatterCall {
            name: call.to_string(),
            args: Vec::new(),
        }),
    }
}

fn parse_arg(raw: &str) -> Arg {
    if let Some(quote) = raw.chars().next().filter(|c| *c == '\'' || *c == '"') {
        let inner = raw[1..].strip_suffix(quote).unwrap_or(&raw[1..]);
        return Arg::Literal(Value::String(unescape(inner)));
    }
    match raw {
        "true" => return Arg::Literal(Value::Bool(true)),
        "false" => return Arg::Literal(Value::Bool(false)),
        "null" | "undefined" => return Arg::Literal(Value::Null),
        _ => {}
    }
    if raw.starts_with('{') || raw.starts_with('[') {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(raw) {
            return Arg::Literal(Value::from(json));
        }
    }
    if is_reference(raw) {
        return Arg::Reference(raw.to_string());
    }
    if let Ok(n) = raw.parse::<f64>() {
        return Arg::Literal(Value::Number(n));
    }
    Arg::Literal(Value::String(raw.to_string()))
}

fn is_reference(raw: &str) -> bool {
    let mut chars = raw.chars();
    let head = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => true,
        // Dot-prefixed lookup names are references, but a dot followed
        // by a digit is a fractional number like `.5`.
        Some('.') => !raw[1..].starts_with(|c: char| c.is_ascii_digit()),
        _ => false,
    };
    head && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(n @ ('\'' | '"' | '\\')) => out.push(n),
            Some(n) => {
                out.push('\\');
                out.push(n);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// First `(` or `:` outside quotes, marking the end of the stage name.
fn name_boundary(call: &str) -> Option<(usize, char)> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in call.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(' | ':') => return Some((i, c)),
            (None, _) => {}
        }
    }
    None
}

/// Matching `)` for a paren opened just before `rest`.
fn find_closing_paren(rest: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            (None, _) => {}
        }
    }
    None
}

fn find_top_level(input: &str, sep: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(' | '[' | '{') => depth += 1,
            (None, ')' | ']' | '}') => depth = depth.saturating_sub(1),
            (None, c) if c == sep && depth == 0 => return Some(i),
            (None, _) => {}
        }
    }
    None
}

fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = input;
    while let Some(i) = find_top_level(rest, sep) {
        parts.push(&rest[..i]);
        rest = &rest[i + sep.len_utf8()..];
    }
    parts.push(rest);
    parts
}
