//! Operator layers: general infix, the symbol precedence levels, prefix
//! operators and the postfix chain.

use std::mem;
use std::rc::Rc;

use log::debug;

use super::{Parsed, Parser};
use crate::error::SyntaxError;
use crate::expr::{ExprKind, Expression, KvcExpression, Span};
use crate::function::CallType;
use crate::node::{ParseNode, ParseNodeKind};
use crate::value::Value;

/// Operator symbols by level, tightest binding first.
const LEVELS: [&[&str]; 8] = [
    &["^"],
    &["*", "/", "%"],
    &["+", "-"],
    &[">=", "<=", "!=", ">", "<", "in"],
    &["=", "??", "?!"],
    &["and", "or"],
    &["|"],
    &[">>"],
];

/// Every symbol at any level plus tokens that must never be split into a
/// shorter operator (`=>` is not `=` followed by `>`).
const ALL_SYMBOLS: [&str; 22] = [
    "^", "*", "/", "%", "+", "-", ">=", "<=", "!=", ">", "<", "in", "=", "??", "?!", "and",
    "or", "|", ">>", "=>", "?.", "~",
];

const PAIR: &str = "|";

/// One postfix step after an operand.
enum Postfix {
    Call(Vec<Expression>),
    Member {
        function: Value,
        op: Span,
        name: String,
        name_span: Span,
    },
    Select(Rc<KvcExpression>),
}

impl<'a> Parser<'a> {
    /// `a op b ~ c ~ d` where `op` names a dual-callable function.
    pub(super) fn general_infix(&mut self, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        let top = LEVELS.len() - 1;
        let (mut lead, start) = self.lead(i);
        let mut children: Vec<ParseNode> = Vec::new();
        let (mut expr, mut pos) = self.infix(top, &mut children, start)?;

        loop {
            let mut step: Vec<ParseNode> = Vec::new();
            let op_start = self.skip_space(&mut step, pos);

            let Some((name, op_end)) = self.scanner.identifier(op_start) else {
                break;
            };
            let function = match self.provider.get(&name.to_lowercase()) {
                Ok(Some(Value::Function(f))) if f.call_type() == CallType::Dual => {
                    Value::Function(f)
                }
                _ => break,
            };

            debug!("General infix '{}' at {}", name, op_start);
            step.push(ParseNode::new(
                ParseNodeKind::Identifier,
                op_start,
                op_end - op_start,
            ));

            let what = format!("right operand of '{}'", name);
            let (second, mut end) = self.required_operand(top, &mut step, op_end, &what)?;
            let mut args = vec![expr, second];

            loop {
                let tilde = self.punct(&mut step, end, "~", ParseNodeKind::Delimiter);
                if tilde == end {
                    break;
                }
                let (next, next_end) =
                    self.required_operand(top, &mut step, tilde, "operand after '~'")?;
                args.push(next);
                end = next_end;
            }

            let callee = Expression::literal(function, Span::between(op_start, op_end));
            expr = Expression::call(callee, args, Span::between(start, end));

            children.append(&mut step);
            let inner = mem::take(&mut children);
            children.push(ParseNode::with_children(
                ParseNodeKind::GeneralInfixExpression,
                start,
                end - start,
                inner,
            ));
            pos = end;
        }

        siblings.append(&mut lead);
        siblings.append(&mut children);
        Some((expr, pos))
    }

    fn required_operand(
        &mut self,
        level: usize,
        nodes: &mut Vec<ParseNode>,
        i: usize,
        what: &str,
    ) -> Parsed {
        let mark = self.errors.len();
        let parsed = self.infix(level, nodes, i);
        if parsed.is_none() && !self.failed_since(mark) {
            self.expected_at(i, what);
        }
        parsed
    }

    fn operand(&mut self, level: usize, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        if level == 0 {
            self.prefix(siblings, i)
        } else {
            self.infix(level - 1, siblings, i)
        }
    }

    /// Operands of `level` joined by that level's symbols.
    ///
    /// A symbol whose right operand cannot be parsed is given back, so the
    /// enclosing construct sees it as unconsumed input.
    fn infix(&mut self, level: usize, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        let (mut lead, start) = self.lead(i);
        let mut children: Vec<ParseNode> = Vec::new();
        let (first, mut pos) = self.operand(level, &mut children, start)?;

        let mut operands = vec![first];
        let mut symbols: Vec<(&'static str, Span)> = Vec::new();

        loop {
            let mut step: Vec<ParseNode> = Vec::new();
            let op_pos = self.skip_space(&mut step, pos);

            let Some(symbol) = self
                .scanner
                .longest_symbol(op_pos, &ALL_SYMBOLS)
                .filter(|s| LEVELS[level].contains(s))
            else {
                break;
            };

            step.push(ParseNode::new(
                ParseNodeKind::Operator,
                op_pos,
                symbol.len(),
            ));

            let mark = self.errors.len();
            match self.operand(level, &mut step, op_pos + symbol.len()) {
                Some((operand, next)) => {
                    operands.push(operand);
                    symbols.push((symbol, Span::new(op_pos, symbol.len())));
                    children.append(&mut step);
                    pos = next;
                }
                None if self.failed_since(mark) => return None,
                None => break,
            }
        }

        siblings.append(&mut lead);

        if symbols.is_empty() {
            siblings.append(&mut children);
            return operands.pop().map(|e| (e, pos));
        }

        let expr = self.fold(operands, &symbols)?;
        siblings.push(ParseNode::with_children(
            ParseNodeKind::InfixExpression,
            start,
            pos - start,
            children,
        ));
        Some((expr, pos))
    }

    /// Turn `a + b + c - d` into `-(+(a, b, c), d)`: runs of one symbol
    /// become one n-ary call, a change of symbol folds to the left.
    fn fold(
        &mut self,
        operands: Vec<Expression>,
        symbols: &[(&'static str, Span)],
    ) -> Option<Expression> {
        if symbols[0].0 == PAIR {
            return self.pair(operands, symbols);
        }

        let mut operands = operands.into_iter();
        let mut acc = operands.next()?;
        let mut s = 0;

        while s < symbols.len() {
            let (symbol, symbol_span) = symbols[s];
            let mut args = vec![acc];
            while s < symbols.len() && symbols[s].0 == symbol {
                args.push(operands.next()?);
                s += 1;
            }

            let function = self.function(symbol, symbol_span)?;
            let start = args.first().map_or(symbol_span.pos, |e| e.span.pos);
            let end = args.last().map_or(symbol_span.end(), |e| e.span.end());
            acc = Expression::call(
                Expression::literal(function, symbol_span),
                args,
                Span::between(start, end),
            );
        }

        Some(acc)
    }

    /// `a | b` is a two-element list.
    fn pair(
        &mut self,
        operands: Vec<Expression>,
        symbols: &[(&'static str, Span)],
    ) -> Option<Expression> {
        if let Some((_, extra)) = symbols.get(1) {
            self.error(SyntaxError::new(
                extra.pos,
                extra.len,
                "'|' joins exactly two operands",
            ));
            return None;
        }

        let start = operands.first()?.span.pos;
        let end = operands.last()?.span.end();
        Some(Expression::new(
            ExprKind::List(operands),
            Span::between(start, end),
        ))
    }

    /// `!x` and `-x`. A `-` directly before a digit belongs to the number.
    fn prefix(&mut self, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        let (mut lead, start) = self.lead(i);

        let next = self.scanner.byte(start + 1);
        let function_name = match self.scanner.byte(start) {
            b'!' if next != b'=' => "!",
            b'-' if !next.is_ascii_digit() => "neg",
            _ => return self.postfix(siblings, i),
        };

        let mut children = vec![ParseNode::new(ParseNodeKind::Operator, start, 1)];
        let mark = self.errors.len();
        let Some((operand, end)) = self.prefix(&mut children, start + 1) else {
            if !self.failed_since(mark) {
                self.expected_at(start + 1, "operand");
            }
            return None;
        };

        let op_span = Span::new(start, 1);
        let function = self.function(function_name, op_span)?;
        let expr = Expression::call(
            Expression::literal(function, op_span),
            vec![operand],
            Span::between(start, end),
        );

        siblings.append(&mut lead);
        siblings.push(ParseNode::with_children(
            ParseNodeKind::PrefixOperatorExpression,
            start,
            end - start,
            children,
        ));
        Some((expr, end))
    }

    /// A unit followed by any number of calls, indexers, member accesses
    /// and selectors. Each step wraps everything parsed so far.
    fn postfix(&mut self, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        let (mut lead, start) = self.lead(i);
        let mut children: Vec<ParseNode> = Vec::new();
        let (mut expr, mut pos) = self.unit(&mut children, start)?;

        loop {
            let mark = self.errors.len();
            let mut step: Vec<ParseNode> = Vec::new();

            let Some((suffix, end, kind)) = self.postfix_step(&mut step, pos) else {
                if self.failed_since(mark) {
                    return None;
                }
                break;
            };

            let span = Span::between(start, end);
            expr = match suffix {
                Postfix::Call(args) => Expression::call(expr, args, span),
                Postfix::Member {
                    function,
                    op,
                    name,
                    name_span,
                } => Expression::call(
                    Expression::literal(function, op),
                    vec![expr, Expression::literal(Value::String(name), name_span)],
                    span,
                ),
                Postfix::Select(projection) => Expression::new(
                    ExprKind::Selector {
                        source: Box::new(expr),
                        projection,
                    },
                    span,
                ),
            };

            let mut inner = mem::take(&mut children);
            inner.append(&mut step);
            children.push(ParseNode::with_children(kind, start, end - start, inner));
            pos = end;
        }

        siblings.append(&mut lead);
        siblings.append(&mut children);
        Some((expr, pos))
    }

    /// One postfix step at `pos`. Call and selector brackets must follow
    /// immediately; a member dot may be preceded by blanks.
    fn postfix_step(
        &mut self,
        nodes: &mut Vec<ParseNode>,
        pos: usize,
    ) -> Option<(Postfix, usize, ParseNodeKind)> {
        match self.scanner.byte(pos) {
            b'(' => {
                let (args, end) = self.argument_list(nodes, pos, ")")?;
                return Some((Postfix::Call(args), end, ParseNodeKind::FunctionCall));
            }
            b'[' => {
                let (args, end) = self.argument_list(nodes, pos, "]")?;
                return Some((Postfix::Call(args), end, ParseNodeKind::FunctionCall));
            }
            b'{' => {
                let (projection, end) = self.braced_kvc(nodes, pos)?;
                return Some((
                    Postfix::Select(Rc::new(projection)),
                    end,
                    ParseNodeKind::Selector,
                ));
            }
            _ => {}
        }

        let (mut blank, at) = self.lead(pos);
        let symbol = if self.scanner.literal(at, "?.") > at {
            "?."
        } else if self.scanner.byte(at) == b'.' {
            "."
        } else {
            return None;
        };
        let op_end = at + symbol.len();

        let mut step = vec![ParseNode::new(ParseNodeKind::Operator, at, symbol.len())];
        let (mut gap, name_start) = self.lead(op_end);
        let Some((name, name_end)) = self.scanner.identifier(name_start) else {
            self.error(SyntaxError::expected(name_start, "member name"));
            return None;
        };
        step.append(&mut gap);
        step.push(ParseNode::new(
            ParseNodeKind::Identifier,
            name_start,
            name_end - name_start,
        ));

        let op = Span::new(at, symbol.len());
        let function = self.function(symbol, op)?;

        nodes.append(&mut blank);
        nodes.append(&mut step);

        Some((
            Postfix::Member {
                function,
                op,
                name: name.to_string(),
                name_span: Span::between(name_start, name_end),
            },
            name_end,
            ParseNodeKind::MemberAccess,
        ))
    }

    /// Comma-separated expressions between the bracket at `pos` and
    /// `close`; a trailing comma is allowed.
    pub(super) fn argument_list(
        &mut self,
        nodes: &mut Vec<ParseNode>,
        pos: usize,
        close: &str,
    ) -> Option<(Vec<Expression>, usize)> {
        nodes.push(ParseNode::new(ParseNodeKind::OpenBrace, pos, 1));
        let mut items: Vec<Expression> = Vec::new();
        let mut p = pos + 1;

        loop {
            let mark = self.errors.len();
            match self.expression(nodes, p) {
                Some((item, next)) => {
                    items.push(item);
                    p = next;
                }
                None if self.failed_since(mark) => return None,
                None => break,
            }

            let comma = self.punct(nodes, p, ",", ParseNodeKind::Delimiter);
            if comma == p {
                break;
            }
            p = comma;
        }

        let end = self.close(nodes, p, close)?;
        Some((items, end))
    }
}
