//! Builtin formatters installed by [`FormatterRegistry::with_builtins`].
//!
//! String formatters work on the value's display text; `number` requires
//! a numeric value (or numeric string) and fails otherwise, which the
//! pipeline turns into a warn-and-passthrough.

use crate::error::FormatterError;
use crate::pipe::registry::FormatterRegistry;
use crate::value::Value;

pub(crate) fn install(registry: &mut FormatterRegistry) {
    registry.register("upper", |v: &Value, _: &[Value]| {
        Ok(Value::String(v.to_display().to_uppercase()))
    });

    registry.register("lower", |v: &Value, _: &[Value]| {
        Ok(Value::String(v.to_display().to_lowercase()))
    });

    registry.register("capitalize", |v: &Value, _: &[Value]| {
        let s = v.to_display();
        let mut chars = s.chars();
        Ok(Value::String(match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }))
    });

    registry.register("trim", |v: &Value, _: &[Value]| {
        Ok(Value::String(v.to_display().trim().to_string()))
    });

    // number(decimals) renders with a fixed fraction width: 5 | number(2)
    // is "5.00".
    registry.register("number", |v: &Value, args: &[Value]| {
        let n = v
            .coerce_f64()
            .ok_or_else(|| FormatterError::new(format!("not a number: {v:?}")))?;
        let decimals = arg_usize(args, 0).unwrap_or(0);
        Ok(Value::String(format!("{n:.decimals$}")))
    });

    registry.register("default", |v: &Value, args: &[Value]| {
        if v.is_truthy() {
            Ok(v.clone())
        } else {
            Ok(args.first().cloned().unwrap_or(Value::Null))
        }
    });

    // truncate(width, ellipsis?) keeps the total length at `width`,
    // ellipsis included.
    registry.register("truncate", |v: &Value, args: &[Value]| {
        let width =
            arg_usize(args, 0).ok_or_else(|| FormatterError::new("truncate needs a width"))?;
        let ellipsis = args
            .get(1)
            .map(Value::to_display)
            .unwrap_or_else(|| "…".to_string());
        let s = v.to_display();
        if s.chars().count() <= width {
            return Ok(Value::String(s));
        }
        let keep = width.saturating_sub(ellipsis.chars().count());
        let cut: String = s.chars().take(keep).collect();
        Ok(Value::String(cut + &ellipsis))
    });

    registry.register("pad_left", |v: &Value, args: &[Value]| {
        let width =
            arg_usize(args, 0).ok_or_else(|| FormatterError::new("pad_left needs a width"))?;
        Ok(Value::String(pad(&v.to_display(), width, true)))
    });

    registry.register("pad_right", |v: &Value, args: &[Value]| {
        let width =
            arg_usize(args, 0).ok_or_else(|| FormatterError::new("pad_right needs a width"))?;
        Ok(Value::String(pad(&v.to_display(), width, false)))
    });

    registry.register("json", |v: &Value, _: &[Value]| {
        serde_json::to_string(&v.to_json())
            .map(Value::String)
            .map_err(|e| FormatterError::new(e.to_string()))
    });
}

fn arg_usize(args: &[Value], index: usize) -> Option<usize> {
    args.get(index)
        .and_then(Value::coerce_f64)
        .filter(|n| *n >= 0.0)
        .map(|n| n as usize)
}

fn pad(s: &str, width: usize, left: bool) -> String {
    let len = s.chars().count();
    if len >= width {
        return s.to_string();
    }
    let fill = " ".repeat(width - len);
    if left {
        fill + s
    } else {
        s.to_string() + &fill
    }
}
