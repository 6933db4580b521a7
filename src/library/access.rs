//! Member access and the pipe operator.

use super::define;
use crate::environment::{MapProvider, ProviderRef};
use crate::error::{EvalError, Result};
use crate::function::{call_with_values, Arguments, CallType};
use crate::value::Value;

pub(super) fn register(scope: &mut MapProvider) {
    define(scope, ".", CallType::Prefix, 2, Some(2), member);
    define(scope, "?.", CallType::Prefix, 2, Some(2), safe_member);
    define(scope, ">>", CallType::Infix, 2, None, pipe);
}

fn member_name(args: &Arguments<'_>) -> Result<String> {
    match args.get(1)? {
        Value::String(name) => Ok(name),
        other => Err(EvalError::type_mismatch(format!(
            "member name must be a string, got {}",
            other.type_name()
        ))),
    }
}

/// Field `name` of a KVC (`null` when missing), or `type`/`message` of an
/// error value.
fn read_member(source: &Value, name: &str) -> Result<Value> {
    let lookup = name.to_lowercase();

    match source {
        Value::Kvc(kvc) => Ok(kvc.get_field(&lookup)?.unwrap_or(Value::Null)),

        Value::Error(error) => Ok(match lookup.as_str() {
            "type" | "error-type" | "errortype" => Value::string(error.error_type.as_str()),
            "message" => Value::string(error.message.as_str()),
            _ => Value::Null,
        }),

        other => Ok(Value::type_mismatch(format!(
            "cannot read member '{}' of {}",
            name,
            other.type_name()
        ))),
    }
}

fn member(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    let source = args.get(0)?;
    let name = member_name(args)?;

    if source.is_null() {
        return Err(EvalError::MemberOfNull { member: name });
    }
    read_member(&source, &name)
}

fn safe_member(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    let source = args.get(0)?;
    if source.is_null() {
        return Ok(Value::Null);
    }
    read_member(&source, &member_name(args)?)
}

/// `x >> f >> g` is `g(f(x))`.
fn pipe(env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    let mut value = args.get(0)?;
    for i in 1..args.len() {
        let function = args.get(i)?;
        value = call_with_values(&function, env, &[value])?;
    }
    Ok(value)
}
