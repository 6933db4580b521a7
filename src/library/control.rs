//! `if`, `case` and `switch`. Only the chosen branch is evaluated.

use log::debug;

use super::define;
use crate::environment::{MapProvider, ProviderRef};
use crate::error::Result;
use crate::function::{Arguments, CallType};
use crate::value::Value;

pub(super) fn register(scope: &mut MapProvider) {
    define(scope, "if", CallType::Prefix, 3, Some(3), if_then_else);
    define(scope, "case", CallType::Prefix, 1, None, case);
    define(scope, "switch", CallType::Prefix, 1, None, switch);
}

/// A condition's truth; `null` counts as false.
fn condition(keyword: &str, value: Value) -> std::result::Result<bool, Value> {
    match value {
        Value::Boolean(b) => Ok(b),
        Value::Null => Ok(false),
        Value::Error(_) => Err(value),
        other => Err(Value::type_mismatch(format!(
            "'{}' condition must be a boolean, got {}",
            keyword,
            other.type_name()
        ))),
    }
}

fn if_then_else(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    match condition("if", args.get(0)?) {
        Ok(true) => args.get(1),
        Ok(false) => args.get(2),
        Err(value) => Ok(value),
    }
}

/// Arguments are `cond, value` pairs with an optional trailing default.
fn case(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    let pairs = args.len() / 2;

    for arm in 0..pairs {
        match condition("case", args.get(arm * 2)?) {
            Ok(true) => {
                debug!("case arm {} taken", arm);
                return args.get(arm * 2 + 1);
            }
            Ok(false) => {}
            Err(value) => return Ok(value),
        }
    }

    if args.len() % 2 == 1 {
        return args.get(args.len() - 1);
    }
    Ok(Value::Null)
}

/// Selector first, then `match, value` pairs with an optional default.
fn switch(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    let selector = args.get(0)?;
    let arms = args.len() - 1;

    for arm in 0..arms / 2 {
        let candidate = args.get(1 + arm * 2)?;
        if selector.equals(&candidate)? {
            debug!("switch arm {} taken", arm);
            return args.get(2 + arm * 2);
        }
    }

    if arms % 2 == 1 {
        return args.get(args.len() - 1);
    }
    Ok(Value::Null)
}
