//! Literal text of values.
//!
//! The output parses back to an equal value: 64-bit integers keep their `l`
//! suffix, floats always carry a decimal point, strings are double-quoted
//! and escaped, and KVC keys are quoted when they are not plain identifiers.

use log::debug;

use crate::error::{EvalError, Result};
use crate::scanner::is_identifier;
use crate::value::Value;

pub fn format_value(value: &Value) -> Result<String> {
    debug!("Formatting {} value", value.type_name());

    let mut out = String::new();
    write_value(&mut out, value)?;
    Ok(out)
}

fn write_value(out: &mut String, value: &Value) -> Result<()> {
    match value {
        Value::Null => out.push_str("null"),

        Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),

        Value::Integer(i) => {
            let mut buf = itoa::Buffer::new();
            out.push_str(buf.format(*i));
        }

        Value::Long(l) => {
            let mut buf = itoa::Buffer::new();
            out.push_str(buf.format(*l));
            out.push('l');
        }

        Value::Float(f) => write_float(out, *f)?,

        Value::String(s) => write_string(out, s),

        Value::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item)?;
            }
            out.push(']');
        }

        Value::Kvc(kvc) => {
            out.push('{');
            for (i, (key, item)) in kvc.entries()?.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if is_identifier(key) {
                    out.push_str(key);
                } else {
                    write_string(out, key);
                }
                out.push_str(": ");
                write_value(out, item)?;
            }
            out.push('}');
        }

        Value::Error(e) => {
            out.push_str("error(");
            write_string(out, &e.message);
            out.push_str(", ");
            write_string(out, &e.error_type);
            out.push(')');
        }

        Value::Function(f) => {
            return Err(EvalError::type_mismatch(format!(
                "function '{}' has no literal form",
                f.name()
            )))
        }
    }
    Ok(())
}

/// `2.0`, `2.5`, `1.0E20`, `1.5E-7`
fn write_float(out: &mut String, f: f64) -> Result<()> {
    if !f.is_finite() {
        return Err(EvalError::type_mismatch(format!(
            "{} has no literal form",
            f
        )));
    }

    let text = format!("{:?}", f);
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            out.push_str(mantissa);
            if !mantissa.contains('.') {
                out.push_str(".0");
            }
            out.push('E');
            out.push_str(exponent);
        }
        None => out.push_str(&text),
    }
    Ok(())
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}
