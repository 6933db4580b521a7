//! Runtime values.
//!
//! Every value is immutable once produced. Lists, KVCs, functions and error
//! values are reference counted so they can be shared freely between scopes.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::function::Callable;
use crate::kvc::{Kvc, Visited};

/// Canonical `error_type` strings carried by [`ErrorValue`].
pub mod error_types {
    pub const TYPE_MISMATCH: &str = "TYPE_MISMATCH";
    pub const DIVISION_BY_ZERO: &str = "DIVISION_BY_ZERO";
    pub const NULL_OPERAND: &str = "NULL_OPERAND";
    pub const USER_ERROR: &str = "USER_ERROR";
}

/// A first-class error produced by `error(...)` or by an operator that
/// received an anticipated but invalid operand.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorValue {
    pub error_type: String,
    pub message: String,
}

impl ErrorValue {
    pub fn new<T: Into<String>, M: Into<String>>(error_type: T, message: M) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
        }
    }
}

#[derive(Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Float(f64),
    String(String),
    List(Rc<Vec<Value>>),
    Kvc(Rc<Kvc>),
    Function(Rc<dyn Callable>),
    Error(Rc<ErrorValue>),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(items))
    }

    pub fn string<S: Into<String>>(s: S) -> Self {
        Value::String(s.into())
    }

    /// Wrap an [`ErrorValue`] of the given type.
    pub fn error<T: Into<String>, M: Into<String>>(error_type: T, message: M) -> Self {
        Value::Error(Rc::new(ErrorValue::new(error_type, message)))
    }

    pub fn type_mismatch<M: Into<String>>(message: M) -> Self {
        Self::error(error_types::TYPE_MISMATCH, message)
    }

    /// Lower-case type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Kvc(_) => "kvc",
            Value::Function(_) => "function",
            Value::Error(_) => "error",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Integer(i) => Some(Number::Integer(*i)),
            Value::Long(l) => Some(Number::Long(*l)),
            Value::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Rc<Vec<Value>>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_kvc(&self) -> Option<&Rc<Kvc>> {
        match self {
            Value::Kvc(kvc) => Some(kvc),
            _ => None,
        }
    }

    /// Integer-family value widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(i64::from(*i)),
            Value::Long(l) => Some(*l),
            _ => None,
        }
    }

    /// Does this value keep `kvc` alive?
    pub fn reaches(&self, kvc: &Kvc, seen: &mut Visited) -> bool {
        match self {
            Value::List(items) => items.iter().any(|v| v.reaches(kvc, seen)),
            Value::Kvc(other) => other.leads_to(kvc, seen),
            Value::Function(f) => f.reaches(kvc, seen),
            _ => false,
        }
    }

    /// Structural equality as used by `=`, `switch` and `in`.
    ///
    /// Numbers compare after promotion, KVCs compare field by field (which
    /// forces their lazy fields), functions compare by identity. Values of
    /// incompatible kinds are simply unequal.
    pub fn equals(&self, other: &Value) -> Result<bool> {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return Ok(a.compare(b) == Some(Ordering::Equal));
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ok(true),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(a == b),
            (Value::String(a), Value::String(b)) => Ok(a == b),
            (Value::List(a), Value::List(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b.iter()) {
                    if !x.equals(y)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Value::Kvc(a), Value::Kvc(b)) => {
                if Rc::ptr_eq(a, b) {
                    return Ok(true);
                }
                let left = a.entries()?;
                let right = b.entries()?;
                if left.len() != right.len() {
                    return Ok(false);
                }
                for (key, value) in &left {
                    match b.get_field(&key.to_lowercase())? {
                        Some(other) if value.equals(&other)? => {}
                        _ => return Ok(false),
                    }
                }
                Ok(true)
            }
            (Value::Function(a), Value::Function(b)) => Ok(Rc::ptr_eq(a, b)),
            (Value::Error(a), Value::Error(b)) => Ok(a == b),
            _ => Ok(false),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i)
    }
}

impl From<i64> for Value {
    fn from(l: i64) -> Self {
        Value::Long(l)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Integer(i) => Value::Integer(i),
            Number::Long(l) => Value::Long(l),
            Number::Float(f) => Value::Float(f),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => write!(f, "Boolean({})", b),
            Value::Integer(i) => write!(f, "Integer({})", i),
            Value::Long(l) => write!(f, "Long({})", l),
            Value::Float(x) => write!(f, "Float({:?})", x),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Kvc(kvc) => write!(f, "Kvc({:?})", kvc.keys()),
            Value::Function(func) => write!(f, "Function({})", func.name()),
            Value::Error(e) => write!(f, "Error({}: {})", e.error_type, e.message),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),

            Value::Boolean(b) => write!(f, "{}", b),

            Value::Integer(i) => write!(f, "{}", i),

            Value::Long(l) => write!(f, "{}", l),

            Value::Float(n) => {
                if n.is_finite() && n.fract() == 0.0 {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Function(func) => write!(f, "<function {}>", func.name()),

            Value::Error(e) => write!(f, "error {}: {}", e.error_type, e.message),

            Value::List(_) | Value::Kvc(_) => match crate::format::format_value(self) {
                Ok(text) => write!(f, "{}", text),
                Err(e) => write!(f, "<{}: {}>", self.type_name(), e),
            },
        }
    }
}

// ─────────────────────────────── numeric tower ──────────────────────────────

/// Rank of a numeric value in the promotion tower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NumericKind {
    Integer,
    Long,
    Float,
}

/// A numeric operand, detached from [`Value`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i32),
    Long(i64),
    Float(f64),
}

impl Number {
    pub fn kind(self) -> NumericKind {
        match self {
            Number::Integer(_) => NumericKind::Integer,
            Number::Long(_) => NumericKind::Long,
            Number::Float(_) => NumericKind::Float,
        }
    }

    /// Widen to `kind`. Promotion never narrows: asking for a lower kind
    /// returns the number unchanged.
    pub fn promote(self, kind: NumericKind) -> Number {
        match (self, kind) {
            (Number::Integer(i), NumericKind::Long) => Number::Long(i64::from(i)),
            (Number::Integer(i), NumericKind::Float) => Number::Float(f64::from(i)),
            (Number::Long(l), NumericKind::Float) => Number::Float(l as f64),
            (n, _) => n,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => f64::from(i),
            Number::Long(l) => l as f64,
            Number::Float(f) => f,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Integer(i) => i == 0,
            Number::Long(l) => l == 0,
            Number::Float(f) => f == 0.0,
        }
    }

    /// Numeric ordering after promotion to the common kind. `None` only for
    /// NaN.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        let kind = self.kind().max(other.kind());
        match (self.promote(kind), other.promote(kind)) {
            (Number::Integer(a), Number::Integer(b)) => Some(a.cmp(&b)),
            (Number::Long(a), Number::Long(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

/// Highest kind present among `numbers`.
pub fn highest_kind<I: IntoIterator<Item = Number>>(numbers: I) -> NumericKind {
    numbers
        .into_iter()
        .map(Number::kind)
        .max()
        .unwrap_or(NumericKind::Integer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_follows_the_tower() {
        assert_eq!(Number::Integer(3).promote(NumericKind::Long), Number::Long(3));
        assert_eq!(
            Number::Long(3).promote(NumericKind::Float),
            Number::Float(3.0)
        );
        assert_eq!(
            Number::Float(1.5).promote(NumericKind::Integer),
            Number::Float(1.5)
        );
    }

    #[test]
    fn highest_kind_picks_the_widest_operand() {
        let kind = highest_kind([Number::Integer(1), Number::Long(2), Number::Integer(3)]);
        assert_eq!(kind, NumericKind::Long);
        assert_eq!(highest_kind([]), NumericKind::Integer);
    }

    #[test]
    fn mixed_kinds_compare_numerically() {
        assert_eq!(
            Number::Integer(2).compare(Number::Float(2.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Number::Long(5).compare(Number::Integer(7)),
            Some(Ordering::Less)
        );
    }
}
