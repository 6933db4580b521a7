use std::cmp::Ordering;

use super::{define, first_error};
use crate::environment::{MapProvider, ProviderRef};
use crate::error::Result;
use crate::function::{Arguments, CallType};
use crate::value::Value;

pub(super) fn register(scope: &mut MapProvider) {
    define(scope, "=", CallType::Infix, 2, Some(2), equal);
    define(scope, "!=", CallType::Infix, 2, Some(2), not_equal);
    define(scope, "<", CallType::Infix, 2, Some(2), less);
    define(scope, "<=", CallType::Infix, 2, Some(2), less_or_equal);
    define(scope, ">", CallType::Infix, 2, Some(2), greater);
    define(scope, ">=", CallType::Infix, 2, Some(2), greater_or_equal);
    define(scope, "in", CallType::Infix, 2, Some(2), contained_in);
}

fn equal(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    Ok(Value::Boolean(args.get(0)?.equals(&args.get(1)?)?))
}

fn not_equal(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    Ok(Value::Boolean(!args.get(0)?.equals(&args.get(1)?)?))
}

/// Ordering of two operands: `null` when either side is `null`, an error
/// value when they cannot be ordered against each other.
fn order(
    symbol: &str,
    args: &Arguments<'_>,
    accept: fn(Ordering) -> bool,
) -> Result<Value> {
    let values = args.evaluate_all()?;
    if let Some(error) = first_error(&values) {
        return Ok(error);
    }

    let (left, right) = (&values[0], &values[1]);
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }

    let ordering = match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => a.compare(b),
        _ => match (left, right) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            _ => {
                return Ok(Value::type_mismatch(format!(
                    "'{}' cannot compare {} with {}",
                    symbol,
                    left.type_name(),
                    right.type_name()
                )))
            }
        },
    };

    Ok(Value::Boolean(ordering.is_some_and(accept)))
}

fn less(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    order("<", args, Ordering::is_lt)
}

fn less_or_equal(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    order("<=", args, Ordering::is_le)
}

fn greater(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    order(">", args, Ordering::is_gt)
}

fn greater_or_equal(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    order(">=", args, Ordering::is_ge)
}

/// `item in list`
fn contained_in(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    let item = args.get(0)?;
    let container = args.get(1)?;

    match &container {
        Value::Null => Ok(Value::Null),
        Value::Error(_) => Ok(container.clone()),
        Value::List(items) => {
            for candidate in items.iter() {
                if item.equals(candidate)? {
                    return Ok(Value::Boolean(true));
                }
            }
            Ok(Value::Boolean(false))
        }
        other => Ok(Value::type_mismatch(format!(
            "'in' expects a list, got {}",
            other.type_name()
        ))),
    }
}
