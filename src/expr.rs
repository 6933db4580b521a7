//! Executable expression tree.
//!
//! Produced by the parser next to the [`ParseNode`](crate::node::ParseNode)
//! tree. Every node carries the exact byte span the grammar consumed for it.
//! KVC and lambda bodies are reference counted because runtime values keep
//! pointing at them after the parse result is gone.

use std::rc::Rc;

use serde::Serialize;

use crate::value::Value;

/// Byte offset and length into the parsed source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub pos: usize,
    pub len: usize,
}

impl Span {
    pub fn new(pos: usize, len: usize) -> Self {
        Span { pos, len }
    }

    /// Span covering `start..end`.
    pub fn between(start: usize, end: usize) -> Self {
        Span {
            pos: start,
            len: end.saturating_sub(start),
        }
    }

    pub fn end(&self) -> usize {
        self.pos + self.len
    }

    pub fn contains(&self, other: &Span) -> bool {
        other.pos >= self.pos && other.end() <= self.end()
    }
}

#[derive(Debug, Clone)]
pub struct Expression {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Constant, including operator functions resolved at parse time.
    Literal(Value),

    /// Name lookup; `lookup` is the lower-cased `name`.
    Reference { name: String, lookup: String },

    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
    },

    List(Vec<Expression>),

    Kvc(Rc<KvcExpression>),

    /// `source{...}`
    Selector {
        source: Box<Expression>,
        projection: Rc<KvcExpression>,
    },

    Lambda(Rc<LambdaExpression>),

    Null,
}

#[derive(Debug, Clone)]
pub struct KvcExpression {
    pub fields: Vec<KvcField>,
    pub ret: Option<Expression>,
}

#[derive(Debug, Clone)]
pub struct KvcField {
    pub key: String,
    pub key_lookup: String,
    pub value: FieldValue,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum FieldValue {
    /// `key: expr`
    Expression(Expression),

    /// Bare `key`: the same name read from the parent scope.
    Inherit,
}

#[derive(Debug, Clone)]
pub struct LambdaExpression {
    /// Lower-cased parameter names.
    pub params: Vec<String>,
    pub body: Expression,
}

impl Expression {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expression { kind, span }
    }

    pub fn literal(value: Value, span: Span) -> Self {
        Self::new(ExprKind::Literal(value), span)
    }

    pub fn call(callee: Expression, args: Vec<Expression>, span: Span) -> Self {
        Self::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            span,
        )
    }

    /// Direct children, in source order.
    pub fn children(&self) -> Vec<&Expression> {
        match &self.kind {
            ExprKind::Literal(_) | ExprKind::Reference { .. } | ExprKind::Null => Vec::new(),

            ExprKind::Call { callee, args } => {
                let mut out: Vec<&Expression> = Vec::with_capacity(args.len() + 1);
                out.push(callee);
                out.extend(args.iter());
                // infix calls put the operator between the operands
                out.sort_by_key(|e| e.span.pos);
                out
            }

            ExprKind::List(items) => items.iter().collect(),

            ExprKind::Kvc(kvc) => kvc_children(kvc, None),

            ExprKind::Selector { source, projection } => kvc_children(projection, Some(&**source)),

            ExprKind::Lambda(lambda) => vec![&lambda.body],
        }
    }
}

fn kvc_children<'a>(kvc: &'a KvcExpression, source: Option<&'a Expression>) -> Vec<&'a Expression> {
    let mut out: Vec<&Expression> = Vec::new();
    out.extend(source);
    for field in &kvc.fields {
        if let FieldValue::Expression(e) = &field.value {
            out.push(e);
        }
    }
    out.extend(kvc.ret.as_ref());
    out.sort_by_key(|e| e.span.pos);
    out
}
