//! Built-in functions of the root scope.
//!
//! Operator symbols are registered under their symbol text so the parser can
//! resolve them by lookup; word functions under their name.

mod access;
mod arithmetic;
mod collections;
mod comparison;
mod control;
mod logic;

use log::info;

use crate::environment::{MapProvider, ProviderRef};
use crate::function::{Builtin, BuiltinFn, CallType};
use crate::value::Value;

/// Fresh root scope holding every built-in.
pub fn root() -> ProviderRef {
    let mut scope = MapProvider::new();

    arithmetic::register(&mut scope);
    comparison::register(&mut scope);
    logic::register(&mut scope);
    control::register(&mut scope);
    access::register(&mut scope);
    collections::register(&mut scope);

    info!("Built-in library registered");

    scope.into_ref()
}

fn define(
    scope: &mut MapProvider,
    name: &'static str,
    call_type: CallType,
    min: usize,
    max: Option<usize>,
    func: BuiltinFn,
) {
    scope.define(name, Builtin::new(name, call_type, min, max, func).into_value());
}

/// First argument that is an error value, if any. Operators hand such
/// values through instead of computing with them.
fn first_error(values: &[Value]) -> Option<Value> {
    values.iter().find(|v| matches!(v, Value::Error(_))).cloned()
}

