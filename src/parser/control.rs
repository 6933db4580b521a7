//! `case`, `switch`, `if ... then ... else` and lambdas.
//!
//! The three keyword forms compile to calls of the library functions of the
//! same name, which evaluate their arguments lazily.

use std::collections::HashSet;
use std::rc::Rc;

use log::debug;

use super::{Parsed, Parser};
use crate::error::SyntaxError;
use crate::expr::{ExprKind, Expression, LambdaExpression, Span};
use crate::node::{ParseNode, ParseNodeKind};

impl<'a> Parser<'a> {
    /// `case c1: v1, c2: v2, default`
    pub(super) fn case(&mut self, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        let (mut lead, start) = self.lead(i);
        let mut children: Vec<ParseNode> = Vec::new();
        let kw_end = self.keyword(&mut children, start, "case");
        if kw_end == start {
            return None;
        }

        debug!("Entering case at {}", start);

        let mut args: Vec<Expression> = Vec::new();
        let mut p = kw_end;

        loop {
            let (condition, cond_end) =
                self.required_expression(&mut children, p, "case condition")?;

            let colon = self.punct(&mut children, cond_end, ":", ParseNodeKind::Delimiter);
            if colon == cond_end {
                // default arm
                args.push(condition);
                p = cond_end;
                break;
            }

            let (value, value_end) = self.required_expression(&mut children, colon, "case value")?;
            args.push(condition);
            args.push(value);
            p = value_end;

            let comma = self.punct(&mut children, p, ",", ParseNodeKind::Delimiter);
            if comma == p {
                break;
            }
            p = comma;
        }

        self.keyword_call(
            siblings,
            &mut lead,
            children,
            ParseNodeKind::Case,
            "case",
            start,
            kw_end,
            p,
            args,
        )
    }

    /// `switch selector, m1: v1, m2: v2, default`
    pub(super) fn switch(&mut self, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        let (mut lead, start) = self.lead(i);
        let mut children: Vec<ParseNode> = Vec::new();
        let kw_end = self.keyword(&mut children, start, "switch");
        if kw_end == start {
            return None;
        }

        debug!("Entering switch at {}", start);

        let (selector, mut p) = self.required_expression(&mut children, kw_end, "switch selector")?;
        let mut args = vec![selector];

        loop {
            let comma = self.punct(&mut children, p, ",", ParseNodeKind::Delimiter);
            if comma == p {
                break;
            }

            let (candidate, cand_end) =
                self.required_expression(&mut children, comma, "switch branch")?;

            let colon = self.punct(&mut children, cand_end, ":", ParseNodeKind::Delimiter);
            if colon == cand_end {
                // default arm
                args.push(candidate);
                p = cand_end;
                break;
            }

            let (value, value_end) =
                self.required_expression(&mut children, colon, "switch value")?;
            args.push(candidate);
            args.push(value);
            p = value_end;
        }

        self.keyword_call(
            siblings,
            &mut lead,
            children,
            ParseNodeKind::Switch,
            "switch",
            start,
            kw_end,
            p,
            args,
        )
    }

    /// `if condition then a else b`; `else` is mandatory.
    pub(super) fn if_then_else(&mut self, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        let (mut lead, start) = self.lead(i);
        let mut children: Vec<ParseNode> = Vec::new();
        let kw_end = self.keyword(&mut children, start, "if");
        if kw_end == start {
            return None;
        }

        let (condition, p) = self.required_expression(&mut children, kw_end, "condition")?;

        let then_end = self.keyword(&mut children, p, "then");
        if then_end == p {
            self.expected_at(p, "'then'");
            return None;
        }
        let (yes, p) = self.required_expression(&mut children, then_end, "'then' value")?;

        let else_end = self.keyword(&mut children, p, "else");
        if else_end == p {
            self.expected_at(p, "'else'");
            return None;
        }
        let (no, end) = self.required_expression(&mut children, else_end, "'else' value")?;

        self.keyword_call(
            siblings,
            &mut lead,
            children,
            ParseNodeKind::IfExpression,
            "if",
            start,
            kw_end,
            end,
            vec![condition, yes, no],
        )
    }

    /// Build `keyword(args...)` with the keyword's span on the callee.
    #[allow(clippy::too_many_arguments)]
    fn keyword_call(
        &mut self,
        siblings: &mut Vec<ParseNode>,
        lead: &mut Vec<ParseNode>,
        children: Vec<ParseNode>,
        kind: ParseNodeKind,
        function_name: &str,
        start: usize,
        kw_end: usize,
        end: usize,
        args: Vec<Expression>,
    ) -> Parsed {
        let kw_span = Span::between(start, kw_end);
        let function = self.function(function_name, kw_span)?;

        siblings.append(lead);
        siblings.push(ParseNode::with_children(kind, start, end - start, children));

        Some((
            Expression::call(
                Expression::literal(function, kw_span),
                args,
                Span::between(start, end),
            ),
            end,
        ))
    }

    /// `x => body` or `(a, b) => body`. Gives up quietly until `=>` is seen.
    pub(super) fn lambda(&mut self, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        let (mut lead, start) = self.lead(i);
        let mut children: Vec<ParseNode> = Vec::new();

        let (params, p) = self.identifier_list(&mut children, start)?;

        let arrow = self.punct(&mut children, p, "=>", ParseNodeKind::Operator);
        if arrow == p {
            return None;
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut names: Vec<String> = Vec::with_capacity(params.len());
        for (name, span) in params {
            let lookup = name.to_lowercase();
            if !seen.insert(lookup.clone()) {
                self.error(SyntaxError::new(
                    span.pos,
                    span.len,
                    format!("parameter '{}' is duplicated", name),
                ));
                return None;
            }
            names.push(lookup);
        }

        let (body, end) = self.required_expression(&mut children, arrow, "lambda body")?;

        siblings.append(&mut lead);
        siblings.push(ParseNode::with_children(
            ParseNodeKind::LambdaExpression,
            start,
            end - start,
            children,
        ));

        Some((
            Expression::new(
                ExprKind::Lambda(Rc::new(LambdaExpression {
                    params: names,
                    body,
                })),
                Span::between(start, end),
            ),
            end,
        ))
    }
}
