//! List and string functions.

use std::rc::Rc;

use log::debug;

use super::{define, first_error};
use crate::environment::{MapProvider, ProviderRef};
use crate::error::{EvalError, Result};
use crate::format::format_value;
use crate::function::{call_with_values, Arguments, CallType};
use crate::value::{error_types, Value};

pub(super) fn register(scope: &mut MapProvider) {
    define(scope, "len", CallType::Prefix, 1, Some(1), len);
    define(scope, "range", CallType::Prefix, 2, Some(2), range);
    define(scope, "map", CallType::Dual, 2, Some(2), map);
    define(scope, "filter", CallType::Dual, 2, Some(2), filter);
    define(scope, "reduce", CallType::Dual, 2, Some(3), reduce);
    define(scope, "concat", CallType::Prefix, 0, None, concat);
    define(scope, "format", CallType::Prefix, 1, Some(1), format);
    define(scope, "error", CallType::Prefix, 1, Some(2), error);
    define(scope, "iserror", CallType::Prefix, 1, Some(1), is_error);
}

fn len(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    let value = args.get(0)?;
    Ok(match &value {
        Value::Null | Value::Error(_) => value,
        Value::List(items) => Value::Integer(items.len() as i32),
        Value::String(s) => Value::Integer(s.chars().count() as i32),
        Value::Kvc(kvc) => Value::Integer(kvc.len() as i32),
        other => Value::type_mismatch(format!(
            "'len' expects a list or a string, got {}",
            other.type_name()
        )),
    })
}

/// `range(start, count)`: `count` consecutive integers from `start`.
fn range(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    let values = args.evaluate_all()?;
    if let Some(error) = first_error(&values) {
        return Ok(error);
    }

    let (Some(start), Some(count)) = (values[0].as_i64(), values[1].as_i64()) else {
        return Ok(Value::type_mismatch("'range' expects integer start and count"));
    };

    let long = matches!(values[0], Value::Long(_));
    let items = (0..count.max(0))
        .map(|offset| {
            let n = start.wrapping_add(offset);
            if long {
                Value::Long(n)
            } else {
                Value::Integer(n as i32)
            }
        })
        .collect();

    Ok(Value::list(items))
}

/// Source list and function of a `map`/`filter`/`reduce` call, or the value
/// to return instead.
type Traversal = std::result::Result<(Rc<Vec<Value>>, Value), Value>;

fn list_and_function(name: &str, args: &Arguments<'_>) -> Result<Traversal> {
    let source = args.get(0)?;
    let items = match source {
        Value::List(items) => items,
        Value::Null | Value::Error(_) => return Ok(Err(source)),
        other => {
            return Ok(Err(Value::type_mismatch(format!(
                "'{}' expects a list, got {}",
                name,
                other.type_name()
            ))))
        }
    };

    let function = args.get(1)?;
    if !matches!(function, Value::Function(_) | Value::List(_) | Value::Kvc(_)) {
        return Err(EvalError::NotCallable(function.type_name().to_string()));
    }

    Ok(Ok((items, function)))
}

/// Call `function` with `leading` arguments, appending the item index when
/// the function takes one more parameter.
fn apply(
    env: &ProviderRef,
    function: &Value,
    mut leading: Vec<Value>,
    index: usize,
) -> Result<Value> {
    if let Value::Function(f) = function {
        if f.accepts(leading.len() + 1) && !f.accepts(leading.len()) {
            leading.push(Value::Integer(index as i32));
        }
    }
    call_with_values(function, env, &leading)
}

fn map(env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    let (items, function) = match list_and_function("map", args)? {
        Ok(found) => found,
        Err(value) => return Ok(value),
    };

    debug!("map over {} item(s)", items.len());

    let mapped = items
        .iter()
        .enumerate()
        .map(|(i, item)| apply(env, &function, vec![item.clone()], i))
        .collect::<Result<Vec<Value>>>()?;

    Ok(Value::list(mapped))
}

fn filter(env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    let (items, function) = match list_and_function("filter", args)? {
        Ok(found) => found,
        Err(value) => return Ok(value),
    };

    let mut kept: Vec<Value> = Vec::new();
    for (i, item) in items.iter().enumerate() {
        match apply(env, &function, vec![item.clone()], i)? {
            Value::Boolean(true) => kept.push(item.clone()),
            Value::Boolean(false) | Value::Null => {}
            error @ Value::Error(_) => return Ok(error),
            other => {
                return Ok(Value::type_mismatch(format!(
                    "'filter' predicate returned {}",
                    other.type_name()
                )))
            }
        }
    }

    Ok(Value::list(kept))
}

/// `reduce(list, (acc, item) => ..., initial)`. Without an initial value the
/// first item seeds the accumulator.
fn reduce(env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    let (items, function) = match list_and_function("reduce", args)? {
        Ok(found) => found,
        Err(value) => return Ok(value),
    };

    let (mut acc, skip) = if args.len() > 2 {
        (args.get(2)?, 0)
    } else {
        match items.first() {
            Some(first) => (first.clone(), 1),
            None => return Ok(Value::Null),
        }
    };

    for (i, item) in items.iter().enumerate().skip(skip) {
        acc = apply(env, &function, vec![acc, item.clone()], i)?;
    }

    Ok(acc)
}

/// Text of every argument joined; `null` contributes nothing.
fn concat(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    let mut out = String::new();
    for value in args.evaluate_all()? {
        match value {
            Value::Null => {}
            Value::String(s) => out.push_str(&s),
            other => out.push_str(&other.to_string()),
        }
    }
    Ok(Value::String(out))
}

/// The value's literal text.
fn format(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    match format_value(&args.get(0)?) {
        Ok(text) => Ok(Value::String(text)),
        Err(EvalError::TypeMismatch(message)) => Ok(Value::type_mismatch(message)),
        Err(e) => Err(e),
    }
}

/// `error(message[, type])`
fn error(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    let message = match args.get(0)? {
        Value::String(s) => s,
        other => other.to_string(),
    };

    let error_type = match args.get(1)? {
        Value::Null => error_types::USER_ERROR.to_string(),
        Value::String(s) => s,
        other => other.to_string(),
    };

    Ok(Value::error(error_type, message))
}

fn is_error(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    Ok(Value::Boolean(matches!(args.get(0)?, Value::Error(_))))
}
