use std::rc::Rc;

use log::{debug, info};

use crate::environment::{MapProvider, ProviderRef};
use crate::error::{Error, EvalError, Result};
use crate::expr::{ExprKind, Expression};
use crate::function::{call_value, Arguments, Lambda};
use crate::kvc::{select, Kvc};
use crate::library;
use crate::parser::{self, ParseResult};
use crate::value::Value;

/// Evaluate `expr` in scope `env`.
///
/// Walks the tree directly; KVC fields and call arguments stay lazy until
/// something asks for them.
pub fn evaluate(expr: &Expression, env: &ProviderRef) -> Result<Value> {
    match &expr.kind {
        ExprKind::Literal(value) => Ok(value.clone()),

        ExprKind::Null => Ok(Value::Null),

        ExprKind::Reference { name, lookup } => {
            debug!("Looking up '{}'", name);
            env.get(lookup)?
                .ok_or_else(|| EvalError::Undefined { name: name.clone() })
        }

        ExprKind::Call { callee, args } => {
            let function = evaluate(callee, env)?;
            call_value(&function, env, &Arguments::from_expressions(args, env))
        }

        ExprKind::List(items) => {
            let values = items
                .iter()
                .map(|item| evaluate(item, env))
                .collect::<Result<Vec<Value>>>()?;
            Ok(Value::list(values))
        }

        ExprKind::Kvc(def) => Kvc::from_expression(def.clone(), Some(env.clone())).value(),

        ExprKind::Selector { source, projection } => {
            let source = evaluate(source, env)?;
            select(source, projection, env)
        }

        ExprKind::Lambda(def) => Ok(Value::Function(Rc::new(Lambda::new(
            def.clone(),
            env.clone(),
        )))),
    }
}

/// Parse-and-evaluate facade over a root scope.
pub struct Interpreter {
    root: ProviderRef,
}

impl Interpreter {
    /// Interpreter whose root scope is the built-in library.
    pub fn new() -> Self {
        info!("Initializing Interpreter");

        Self {
            root: library::root(),
        }
    }

    /// Built-ins plus host variables layered above them.
    pub fn with_variables<'v, I>(variables: I) -> Self
    where
        I: IntoIterator<Item = (&'v str, Value)>,
    {
        let mut scope = MapProvider::with_parent(library::root());
        for (name, value) in variables {
            scope.define(name, value);
        }

        info!("Initializing Interpreter with host variables");

        Self {
            root: scope.into_ref(),
        }
    }

    pub fn with_root(root: ProviderRef) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &ProviderRef {
        &self.root
    }

    pub fn parse(&self, source: &str) -> ParseResult {
        parser::parse(source, &self.root)
    }

    pub fn evaluate(&self, expr: &Expression) -> Result<Value> {
        evaluate(expr, &self.root)
    }

    /// Parse `source` completely, then evaluate it. Syntax errors and
    /// trailing input mean nothing is evaluated.
    pub fn run(&self, source: &str) -> std::result::Result<Value, Error> {
        Self::finish(self.parse(source), source.len(), &self.root)
    }

    /// Like [`run`](Self::run) for a `${...}` template document.
    pub fn run_template(&self, source: &str) -> std::result::Result<Value, Error> {
        Self::finish(parser::parse_template(source, &self.root), source.len(), &self.root)
    }

    /// Evaluate blank-separated expressions (`1 'a' x+1`) into a list. The
    /// whole text must be consumed.
    pub fn run_space_separated(&self, source: &str) -> std::result::Result<Value, Error> {
        Self::finish(
            parser::parse_space_separated(source, &self.root),
            source.len(),
            &self.root,
        )
    }

    fn finish(
        parsed: ParseResult,
        len: usize,
        root: &ProviderRef,
    ) -> std::result::Result<Value, Error> {
        if !parsed.errors.is_empty() {
            debug!("Parse produced {} error(s)", parsed.errors.len());
            return Err(Error::Syntax(parsed.errors));
        }

        if parsed.next_index < len {
            return Err(Error::TrailingInput(parsed.next_index));
        }

        let expr = parsed.expression.ok_or(Error::TrailingInput(0))?;
        let value = evaluate(&expr, root)?;

        info!("Evaluation completed: {}", value.type_name());

        Ok(value)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
