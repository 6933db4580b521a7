//! Arithmetic over the numeric tower, plus `+` on strings, lists and KVCs.

use log::debug;

use super::{define, first_error};
use crate::environment::{MapProvider, ProviderRef};
use crate::error::Result;
use crate::function::{Arguments, CallType};
use crate::kvc::Kvc;
use crate::value::{error_types, highest_kind, Number, Value};

pub(super) fn register(scope: &mut MapProvider) {
    define(scope, "+", CallType::Infix, 2, None, add);
    define(scope, "-", CallType::Infix, 2, None, subtract);
    define(scope, "*", CallType::Infix, 2, None, multiply);
    define(scope, "/", CallType::Infix, 2, None, divide);
    define(scope, "%", CallType::Infix, 2, None, modulo);
    define(scope, "^", CallType::Infix, 2, None, power);
    define(scope, "div", CallType::Dual, 2, None, integer_divide);
    define(scope, "neg", CallType::Prefix, 1, Some(1), negate);
}

/// Outcome of a numeric fold: a number, or the error value to return.
type Folded = std::result::Result<Number, Value>;

#[derive(Debug, Clone, Copy)]
enum Op {
    Add,
    Subtract,
    Multiply,
    Modulo,
}

impl Op {
    fn symbol(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Subtract => "-",
            Op::Multiply => "*",
            Op::Modulo => "%",
        }
    }

    /// Combine two operands already promoted to the same kind.
    fn apply(self, a: Number, b: Number) -> Folded {
        Ok(match (a, b) {
            (Number::Integer(x), Number::Integer(y)) => Number::Integer(match self {
                Op::Add => x.wrapping_add(y),
                Op::Subtract => x.wrapping_sub(y),
                Op::Multiply => x.wrapping_mul(y),
                Op::Modulo if y == 0 => return Err(division_by_zero(self.symbol())),
                Op::Modulo => x.wrapping_rem(y),
            }),

            (Number::Long(x), Number::Long(y)) => Number::Long(match self {
                Op::Add => x.wrapping_add(y),
                Op::Subtract => x.wrapping_sub(y),
                Op::Multiply => x.wrapping_mul(y),
                Op::Modulo if y == 0 => return Err(division_by_zero(self.symbol())),
                Op::Modulo => x.wrapping_rem(y),
            }),

            (x, y) => {
                let (x, y) = (x.as_f64(), y.as_f64());
                Number::Float(match self {
                    Op::Add => x + y,
                    Op::Subtract => x - y,
                    Op::Multiply => x * y,
                    Op::Modulo => x % y,
                })
            }
        })
    }
}

fn division_by_zero(symbol: &str) -> Value {
    Value::error(
        error_types::DIVISION_BY_ZERO,
        format!("'{}' divided an integer by zero", symbol),
    )
}

/// Every operand as a number, or the error value for the first that is not.
fn numbers(symbol: &str, values: &[Value]) -> std::result::Result<Vec<Number>, Value> {
    values
        .iter()
        .map(|v| match v {
            Value::Null => Err(Value::error(
                error_types::NULL_OPERAND,
                format!("'{}' received a null operand", symbol),
            )),
            other => other.as_number().ok_or_else(|| {
                Value::type_mismatch(format!(
                    "'{}' expects numbers, got {}",
                    symbol,
                    other.type_name()
                ))
            }),
        })
        .collect()
}

/// Promote every operand to the highest kind present, then fold left.
fn fold(op: Op, numbers: &[Number]) -> Folded {
    let kind = highest_kind(numbers.iter().copied());
    let mut operands = numbers.iter().map(|n| n.promote(kind));

    let Some(mut acc) = operands.next() else {
        return Ok(Number::Integer(0));
    };
    for n in operands {
        acc = op.apply(acc, n)?;
    }
    Ok(acc)
}

fn settle(folded: Folded) -> Value {
    match folded {
        Ok(n) => Value::from(n),
        Err(error) => error,
    }
}

fn numeric(op: Op, args: &Arguments<'_>) -> Result<Value> {
    let values = args.evaluate_all()?;
    if let Some(error) = first_error(&values) {
        return Ok(error);
    }

    Ok(settle(
        numbers(op.symbol(), &values).and_then(|ns| fold(op, &ns)),
    ))
}

/// `+`: string concatenation when any operand is a string, list
/// concatenation, KVC merge, otherwise numeric addition. `null` operands
/// are skipped.
fn add(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    let values: Vec<Value> = args
        .evaluate_all()?
        .into_iter()
        .filter(|v| !v.is_null())
        .collect();

    if let Some(error) = first_error(&values) {
        return Ok(error);
    }

    if values.is_empty() {
        return Ok(Value::Null);
    }

    if let Some(first) = values.iter().position(|v| matches!(v, Value::String(_))) {
        return Ok(concatenate(&values, first));
    }

    if values.iter().all(|v| matches!(v, Value::List(_))) {
        let items: Vec<Value> = values
            .iter()
            .filter_map(Value::as_list)
            .flat_map(|items| items.iter().cloned())
            .collect();
        return Ok(Value::list(items));
    }

    let kvcs: Vec<_> = values.iter().filter_map(Value::as_kvc).collect();
    if kvcs.len() == values.len() {
        debug!("Merging {} kvc operand(s)", kvcs.len());
        let mut merged = kvcs[0].clone();
        for next in &kvcs[1..] {
            merged = Kvc::merge(&merged, next);
        }
        return Ok(Value::Kvc(merged));
    }

    Ok(settle(
        numbers("+", &values).and_then(|ns| fold(Op::Add, &ns)),
    ))
}

/// String `+`: numbers before the first string still add up, so
/// `1 + 2 + 'a'` is `"3a"`; everything from `first` on is stringified.
fn concatenate(values: &[Value], first: usize) -> Value {
    let (head, tail) = values.split_at(first);

    let mut out = String::new();
    match numbers("+", head) {
        Ok(ns) if ns.len() > 1 => match fold(Op::Add, &ns) {
            Ok(sum) => out.push_str(&Value::from(sum).to_string()),
            Err(error) => return error,
        },
        _ => head.iter().for_each(|v| out.push_str(&v.to_string())),
    }
    for value in tail {
        out.push_str(&value.to_string());
    }

    Value::String(out)
}

fn subtract(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    numeric(Op::Subtract, args)
}

fn multiply(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    numeric(Op::Multiply, args)
}

fn modulo(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    numeric(Op::Modulo, args)
}

/// One step of `/`: integer while the division is exact, float from the
/// first inexact step on.
fn quotient(a: Number, b: Number) -> Folded {
    let kind = a.kind().max(b.kind());
    match (a.promote(kind), b.promote(kind)) {
        (Number::Integer(_), Number::Integer(0)) | (Number::Long(_), Number::Long(0)) => {
            Err(division_by_zero("/"))
        }

        (Number::Integer(x), Number::Integer(y)) if x.wrapping_rem(y) == 0 => {
            Ok(Number::Integer(x.wrapping_div(y)))
        }

        (Number::Long(x), Number::Long(y)) if x.wrapping_rem(y) == 0 => {
            Ok(Number::Long(x.wrapping_div(y)))
        }

        (x, y) => Ok(Number::Float(x.as_f64() / y.as_f64())),
    }
}

fn divide(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    let values = args.evaluate_all()?;
    if let Some(error) = first_error(&values) {
        return Ok(error);
    }

    let folded = numbers("/", &values).and_then(|ns| {
        let mut operands = ns.into_iter();
        let mut acc = operands.next().unwrap_or(Number::Integer(0));
        for n in operands {
            acc = quotient(acc, n)?;
        }
        Ok(acc)
    });

    Ok(settle(folded))
}

/// `div`: truncating division over integer-family operands only.
fn integer_divide(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    let values = args.evaluate_all()?;
    if let Some(error) = first_error(&values) {
        return Ok(error);
    }

    let folded = numbers("div", &values).and_then(|ns| {
        if let Some(bad) = ns.iter().find(|n| matches!(n, Number::Float(_))) {
            return Err(Value::type_mismatch(format!(
                "'div' expects integers, got {:?}",
                bad.kind()
            )));
        }

        let kind = highest_kind(ns.iter().copied());
        let mut operands = ns.into_iter().map(|n| n.promote(kind));
        let mut acc = operands.next().unwrap_or(Number::Integer(0));
        for n in operands {
            acc = match (acc, n) {
                (_, n) if n.is_zero() => return Err(division_by_zero("div")),
                (Number::Integer(x), Number::Integer(y)) => Number::Integer(x.wrapping_div(y)),
                (Number::Long(x), Number::Long(y)) => Number::Long(x.wrapping_div(y)),
                (x, _) => x,
            };
        }
        Ok(acc)
    });

    Ok(settle(folded))
}

/// `b ^ e`: integer power for integer-family operands with a non-negative
/// exponent, float otherwise.
fn raise(base: Number, exponent: Number) -> Number {
    let kind = base.kind().max(exponent.kind());
    match (base.promote(kind), exponent.promote(kind)) {
        (Number::Integer(b), Number::Integer(e)) if e >= 0 => {
            Number::Integer(b.wrapping_pow(e as u32))
        }
        (Number::Long(b), Number::Long(e)) if (0..=i64::from(u32::MAX)).contains(&e) => {
            Number::Long(b.wrapping_pow(e as u32))
        }
        (b, e) => Number::Float(b.as_f64().powf(e.as_f64())),
    }
}

/// Chains of `^` group to the right: `2^3^2` is `2^(3^2)`.
fn power(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    let values = args.evaluate_all()?;
    if let Some(error) = first_error(&values) {
        return Ok(error);
    }

    let folded = numbers("^", &values).map(|ns| {
        ns.into_iter()
            .rev()
            .reduce(|exponent, base| raise(base, exponent))
            .unwrap_or(Number::Integer(0))
    });

    Ok(settle(folded))
}

fn negate(_env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    let value = args.get(0)?;
    Ok(match value {
        Value::Null | Value::Error(_) => value,
        Value::Integer(i) => Value::Integer(i.wrapping_neg()),
        Value::Long(l) => Value::Long(l.wrapping_neg()),
        Value::Float(f) => Value::Float(-f),
        other => Value::type_mismatch(format!("cannot negate {}", other.type_name())),
    })
}
