//! Function-call protocol.
//!
//! A callable declares how it may appear in source ([`CallType`]) and how
//! many parameters it takes. Arity is checked before any argument is
//! evaluated; the callable then receives an [`Arguments`] accessor and
//! decides itself which arguments to evaluate and in what order, which is
//! what makes `and`, `or`, `if` and friends short-circuit.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::environment::{ParameterFrame, ProviderRef};
use crate::error::{EvalError, Result};
use crate::expr::{Expression, LambdaExpression};
use crate::interpreter::evaluate;
use crate::kvc::{Kvc, Visited};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    /// `f(a, b)`; also member accessors.
    Prefix,
    /// Operator position only: `a + b`.
    Infix,
    /// `a op b ~ c` as well as `op(a, b, c)`.
    Dual,
}

pub trait Callable {
    fn name(&self) -> &str;

    fn call_type(&self) -> CallType;

    fn min_params(&self) -> usize;

    /// `None` for variadic callables.
    fn max_params(&self) -> Option<usize>;

    fn evaluate(&self, env: &ProviderRef, args: &Arguments<'_>) -> Result<Value>;

    fn accepts(&self, count: usize) -> bool {
        count >= self.min_params() && self.max_params().map_or(true, |max| count <= max)
    }

    /// Does this callable keep `kvc` alive? Only closures capture scopes.
    fn reaches(&self, _kvc: &Kvc, _seen: &mut Visited) -> bool {
        false
    }
}

enum ArgumentSource<'a> {
    Expressions {
        exprs: &'a [Expression],
        env: &'a ProviderRef,
    },
    Values(&'a [Value]),
}

/// Lazy accessor over a call's arguments. Each argument is evaluated at most
/// once, on first request.
pub struct Arguments<'a> {
    source: ArgumentSource<'a>,
    cache: RefCell<Vec<Option<Value>>>,
}

impl<'a> Arguments<'a> {
    pub fn from_expressions(exprs: &'a [Expression], env: &'a ProviderRef) -> Self {
        Arguments {
            cache: RefCell::new(vec![None; exprs.len()]),
            source: ArgumentSource::Expressions { exprs, env },
        }
    }

    pub fn from_values(values: &'a [Value]) -> Self {
        Arguments {
            source: ArgumentSource::Values(values),
            cache: RefCell::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match &self.source {
            ArgumentSource::Expressions { exprs, .. } => exprs.len(),
            ArgumentSource::Values(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Argument `i`; `null` past the end.
    pub fn get(&self, i: usize) -> Result<Value> {
        match &self.source {
            ArgumentSource::Values(values) => Ok(values.get(i).cloned().unwrap_or(Value::Null)),

            ArgumentSource::Expressions { exprs, env } => {
                let Some(expr) = exprs.get(i) else {
                    return Ok(Value::Null);
                };

                if let Some(Some(cached)) = self.cache.borrow().get(i) {
                    return Ok(cached.clone());
                }

                debug!("Evaluating argument {}", i);
                let value = evaluate(expr, env)?;
                if let Some(slot) = self.cache.borrow_mut().get_mut(i) {
                    *slot = Some(value.clone());
                }
                Ok(value)
            }
        }
    }

    /// Every argument, left to right.
    pub fn evaluate_all(&self) -> Result<Vec<Value>> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }
}

/// Check arity, then run the callable.
pub fn invoke(
    function: &Rc<dyn Callable>,
    env: &ProviderRef,
    args: &Arguments<'_>,
) -> Result<Value> {
    if !function.accepts(args.len()) {
        return Err(EvalError::parameter_count(
            function.name(),
            function.min_params(),
            function.max_params(),
            args.len(),
        ));
    }

    debug!("Invoking '{}' with {} argument(s)", function.name(), args.len());

    function.evaluate(env, args)
}

/// Apply any callable-like value: functions run, lists index with one
/// integer, KVCs look up one string key.
pub fn call_value(callee: &Value, env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
    match callee {
        Value::Function(f) => invoke(f, env, args),

        Value::List(items) if args.len() == 1 => {
            let index = args.get(0)?;
            Ok(match index.as_i64() {
                Some(i) if i >= 0 => items.get(i as usize).cloned().unwrap_or(Value::Null),
                Some(_) => Value::Null,
                None => Value::type_mismatch(format!(
                    "list index must be an integer, got {}",
                    index.type_name()
                )),
            })
        }

        Value::Kvc(kvc) if args.len() == 1 => {
            let key = args.get(0)?;
            match key.as_str() {
                Some(k) => Ok(kvc.get_field(&k.to_lowercase())?.unwrap_or(Value::Null)),
                None => Ok(Value::type_mismatch(format!(
                    "kvc key must be a string, got {}",
                    key.type_name()
                ))),
            }
        }

        other => Err(EvalError::NotCallable(other.type_name().to_string())),
    }
}

/// Call `function` with already evaluated arguments.
pub fn call_with_values(function: &Value, env: &ProviderRef, values: &[Value]) -> Result<Value> {
    call_value(function, env, &Arguments::from_values(values))
}

// ───────────────────────────── built-ins ────────────────────────────────────

pub type BuiltinFn = fn(&ProviderRef, &Arguments<'_>) -> Result<Value>;

/// Library function backed by a plain `fn` pointer.
pub struct Builtin {
    name: &'static str,
    call_type: CallType,
    min: usize,
    max: Option<usize>,
    func: BuiltinFn,
}

impl Builtin {
    pub fn new(
        name: &'static str,
        call_type: CallType,
        min: usize,
        max: Option<usize>,
        func: BuiltinFn,
    ) -> Self {
        Builtin {
            name,
            call_type,
            min,
            max,
            func,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Function(Rc::new(self))
    }
}

impl Callable for Builtin {
    fn name(&self) -> &str {
        self.name
    }

    fn call_type(&self) -> CallType {
        self.call_type
    }

    fn min_params(&self) -> usize {
        self.min
    }

    fn max_params(&self) -> Option<usize> {
        self.max
    }

    fn evaluate(&self, env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
        (self.func)(env, args)
    }
}

// ───────────────────────────── host functions ───────────────────────────────

/// Host closure exposed as a value. The closure always receives evaluated
/// arguments and must return a value, so shapes without a result cannot be
/// registered at all.
pub struct NativeFunction {
    name: String,
    call_type: CallType,
    arity: usize,
    func: Rc<dyn Fn(&[Value]) -> Result<Value>>,
}

impl NativeFunction {
    pub fn new<F>(name: &str, arity: usize, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        NativeFunction {
            name: name.to_string(),
            call_type: CallType::Prefix,
            arity,
            func: Rc::new(func),
        }
    }

    /// Make the function usable as `a name b`.
    pub fn dual(mut self) -> Self {
        self.call_type = CallType::Dual;
        self
    }

    pub fn into_value(self) -> Value {
        Value::Function(Rc::new(self))
    }
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn call_type(&self) -> CallType {
        self.call_type
    }

    fn min_params(&self) -> usize {
        self.arity
    }

    fn max_params(&self) -> Option<usize> {
        Some(self.arity)
    }

    fn evaluate(&self, _env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
        let values = args.evaluate_all()?;
        (self.func)(&values)
    }
}

// ───────────────────────────── lambdas ──────────────────────────────────────

/// `(a, b) => body` closed over the scope active where the literal was
/// evaluated.
pub struct Lambda {
    def: Rc<LambdaExpression>,
    closure: ProviderRef,
}

impl Lambda {
    pub fn new(def: Rc<LambdaExpression>, closure: ProviderRef) -> Self {
        Lambda { def, closure }
    }
}

impl Callable for Lambda {
    fn name(&self) -> &str {
        "lambda"
    }

    fn call_type(&self) -> CallType {
        CallType::Prefix
    }

    fn min_params(&self) -> usize {
        self.def.params.len()
    }

    fn max_params(&self) -> Option<usize> {
        Some(self.def.params.len())
    }

    fn evaluate(&self, _env: &ProviderRef, args: &Arguments<'_>) -> Result<Value> {
        let values = args.evaluate_all()?;
        let frame: ProviderRef = Rc::new(ParameterFrame::new(
            self.def.params.clone(),
            values,
            self.closure.clone(),
        ));
        evaluate(&self.def.body, &frame)
    }

    fn reaches(&self, kvc: &Kvc, seen: &mut Visited) -> bool {
        self.closure.reaches(kvc, seen)
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lambda({})", self.def.params.join(", "))
    }
}
