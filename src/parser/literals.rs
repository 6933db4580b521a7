//! Literal and name recognizers.

use log::debug;

use super::{Parsed, Parser};
use crate::error::SyntaxError;
use crate::expr::{ExprKind, Expression, Span};
use crate::node::{ParseNode, ParseNodeKind};
use crate::value::{Number, Value};

impl<'a> Parser<'a> {
    pub(super) fn number_literal(&mut self, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        let (mut lead, start) = self.lead(i);

        let (number, end) = match self.scanner.number(start) {
            Ok(Some(found)) => found,
            Ok(None) => return None,
            Err(e) => {
                self.error(e);
                return None;
            }
        };

        let kind = match number {
            Number::Integer(_) => ParseNodeKind::LiteralInteger,
            Number::Long(_) => ParseNodeKind::LiteralLong,
            Number::Float(_) => ParseNodeKind::LiteralFloat,
        };

        siblings.append(&mut lead);
        siblings.push(ParseNode::new(kind, start, end - start));

        Some((
            Expression::literal(Value::from(number), Span::between(start, end)),
            end,
        ))
    }

    pub(super) fn string_literal(&mut self, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        let (mut lead, start) = self.lead(i);

        let (text, end) = match self.scanner.string(start) {
            Ok(Some(found)) => found,
            Ok(None) => return None,
            Err(e) => {
                self.error(e);
                return None;
            }
        };

        siblings.append(&mut lead);
        siblings.push(ParseNode::new(
            ParseNodeKind::LiteralString,
            start,
            end - start,
        ));

        Some((
            Expression::literal(Value::String(text), Span::between(start, end)),
            end,
        ))
    }

    /// `true`, `false`, `null` in any letter case.
    pub(super) fn keyword_literal(&mut self, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        let (mut lead, start) = self.lead(i);

        let candidates = [
            ("true", ParseNodeKind::LiteralBoolean),
            ("false", ParseNodeKind::LiteralBoolean),
            ("null", ParseNodeKind::LiteralNull),
        ];

        for (word, kind) in candidates {
            let end = self.scanner.keyword(start, word);
            if end == start {
                continue;
            }

            let span = Span::between(start, end);
            let expr = match word {
                "true" => Expression::literal(Value::Boolean(true), span),
                "false" => Expression::literal(Value::Boolean(false), span),
                _ => Expression::new(ExprKind::Null, span),
            };

            siblings.append(&mut lead);
            siblings.push(ParseNode::new(kind, start, end - start));
            return Some((expr, end));
        }

        None
    }

    pub(super) fn reference(&mut self, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        let (mut lead, start) = self.lead(i);

        let (name, end) = self.scanner.identifier(start)?;

        siblings.append(&mut lead);
        siblings.push(ParseNode::new(
            ParseNodeKind::Identifier,
            start,
            end - start,
        ));

        Some((
            Expression::new(
                ExprKind::Reference {
                    name: name.to_string(),
                    lookup: name.to_lowercase(),
                },
                Span::between(start, end),
            ),
            end,
        ))
    }

    /// `( expression )`. The returned expression's span covers the
    /// parentheses.
    pub(super) fn group(&mut self, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        let (mut lead, start) = self.lead(i);
        if self.scanner.byte(start) != b'(' {
            return None;
        }

        debug!("Entering group at {}", start);

        let mut children = vec![ParseNode::new(ParseNodeKind::OpenBrace, start, 1)];
        let (mut inner, next) = self.required_expression(&mut children, start + 1, "expression")?;
        let end = self.close(&mut children, next, ")")?;

        inner.span = Span::between(start, end);

        siblings.append(&mut lead);
        siblings.push(ParseNode::with_children(
            ParseNodeKind::Group,
            start,
            end - start,
            children,
        ));

        Some((inner, end))
    }

    /// `IDENT` or `( IDENT, ... )` as used by lambdas. Never records errors.
    pub(super) fn identifier_list(
        &mut self,
        siblings: &mut Vec<ParseNode>,
        i: usize,
    ) -> Option<(Vec<(String, Span)>, usize)> {
        let (mut lead, start) = self.lead(i);

        if let Some((name, end)) = self.scanner.identifier(start) {
            siblings.append(&mut lead);
            siblings.push(ParseNode::new(
                ParseNodeKind::Identifier,
                start,
                end - start,
            ));
            return Some((vec![(name.to_string(), Span::between(start, end))], end));
        }

        if self.scanner.byte(start) != b'(' {
            return None;
        }

        let mut children = vec![ParseNode::new(ParseNodeKind::OpenBrace, start, 1)];
        let mut names: Vec<(String, Span)> = Vec::new();
        let mut p = start + 1;

        loop {
            let (mut blank, at) = self.lead(p);
            let Some((name, end)) = self.scanner.identifier(at) else {
                break;
            };
            children.append(&mut blank);
            children.push(ParseNode::new(ParseNodeKind::Identifier, at, end - at));
            names.push((name.to_string(), Span::between(at, end)));
            p = end;

            let comma = self.punct(&mut children, p, ",", ParseNodeKind::Delimiter);
            if comma == p {
                break;
            }
            p = comma;
        }

        let end = self.punct(&mut children, p, ")", ParseNodeKind::CloseBrace);
        if end == p {
            return None;
        }

        siblings.append(&mut lead);
        siblings.push(ParseNode::with_children(
            ParseNodeKind::IdentifierList,
            start,
            end - start,
            children,
        ));

        Some((names, end))
    }

    /// Error helper for constructs that committed to a prefix.
    pub(super) fn expected_at(&mut self, i: usize, what: &str) {
        let at = self.after_space(i);
        self.error(SyntaxError::expected(at, what));
    }
}
