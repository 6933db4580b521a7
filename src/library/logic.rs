//! Boolean and null-coalescing operators. Operands are evaluated left to
//! right and only as far as the result needs them.

use super::define;
use crate::environment::{MapProvider, ProviderRef};
use crate::error::Result;
use crate::function::{Arguments, CallType};
use crate::value::Value;

pub(super) fn register(scope: &mut MapProvider) {
    define(scope, "and", CallType::Infix, 2, None, and);
    define(scope, "or", CallType::Infix, 2, None, or);
    define(scope, "!", CallType::Prefix, 1, Some(1), not);
    define(scope, "not", CallType::Prefix, 1, Some(1), not);
    define(scope, "??", CallType::Infix, 2, None, coalesce);
    define(scope, "?!", CallType::Infix, 2, None, when_present);
}

/// The operand as a boolean, or the value to return in its place.
fn truth(symbol: &str, value: Value) -> std::result::Result<bool, Value> {
    match value {
        Value::Boolean(b) => Ok(b),
        Value::Error(_) => Err(value),
        other => Err(Value::type_mismatch(format!(
            "'{}' expects booleans, got {}",
            symbol,
            other.type_name()
        ))),
    }
}

/// Stop at the first operand equal to `decisive`.
fn short_circuit(symbol: &str, args: &Arguments<'_>, decisive: bool) -> Result<Value> {
    for i in 0..args.len() {
        match truth(symbol, args.get(i)?) {
            Ok(b) if b == decisive => return Ok(Value::Boolean(decisive)),
            Ok(_) => {}
            Err(value) => return Ok(value),
        }
    }
    Ok(Value::Boolean(!decisive))
}

fn and(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    short_circuit("and", args, false)
}

fn or(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    short_circuit("or", args, true)
}

fn not(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    Ok(match truth("not", args.get(0)?) {
        Ok(b) => Value::Boolean(!b),
        Err(value) => value,
    })
}

/// `a ?? b ?? c`: the first operand that is not `null`.
fn coalesce(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    for i in 0..args.len() {
        let value = args.get(i)?;
        if !value.is_null() {
            return Ok(value);
        }
    }
    Ok(Value::Null)
}

/// `a ?! b`: `null` when `a` is `null`, otherwise `b`. Longer chains stop
/// at the first `null`.
fn when_present(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    let mut value = Value::Null;
    for i in 0..args.len() {
        value = args.get(i)?;
        if value.is_null() {
            return Ok(Value::Null);
        }
    }
    Ok(value)
}
