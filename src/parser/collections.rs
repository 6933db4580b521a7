//! Lists and key/value collections.

use std::collections::HashSet;
use std::rc::Rc;

use log::debug;

use super::{Parsed, Parser};
use crate::error::SyntaxError;
use crate::expr::{ExprKind, Expression, FieldValue, KvcExpression, KvcField, Span};
use crate::node::{ParseNode, ParseNodeKind};

enum Item {
    Field(KvcField),
    Return(Expression, Span),
}

impl<'a> Parser<'a> {
    /// `[a, b, c]`
    pub(super) fn list(&mut self, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        let (mut lead, start) = self.lead(i);
        if self.scanner.byte(start) != b'[' {
            return None;
        }

        let mut children: Vec<ParseNode> = Vec::new();
        let (items, end) = self.argument_list(&mut children, start, "]")?;

        siblings.append(&mut lead);
        siblings.push(ParseNode::with_children(
            ParseNodeKind::List,
            start,
            end - start,
            children,
        ));

        Some((
            Expression::new(ExprKind::List(items), Span::between(start, end)),
            end,
        ))
    }

    /// `{ key: value; ... }` as a standalone expression.
    pub(super) fn kvc(&mut self, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        let (mut lead, start) = self.lead(i);
        if self.scanner.byte(start) != b'{' {
            return None;
        }

        let (def, end) = self.braced_kvc(&mut lead, start)?;
        siblings.append(&mut lead);

        Some((
            Expression::new(ExprKind::Kvc(Rc::new(def)), Span::between(start, end)),
            end,
        ))
    }

    /// Braced item list starting at the `{` at `start`; pushes one
    /// `KeyValueCollection` node.
    pub(super) fn braced_kvc(
        &mut self,
        nodes: &mut Vec<ParseNode>,
        start: usize,
    ) -> Option<(KvcExpression, usize)> {
        debug!("Entering kvc at {}", start);

        let mut children = vec![ParseNode::new(ParseNodeKind::OpenBrace, start, 1)];
        let (def, p) = self.kvc_items(&mut children, start + 1)?;
        let end = self.close(&mut children, p, "}")?;

        nodes.push(ParseNode::with_children(
            ParseNodeKind::KeyValueCollection,
            start,
            end - start,
            children,
        ));
        Some((def, end))
    }

    /// Does the input at `start` open with `key:`, `return`/`eval`, or a bare
    /// identifier key followed by `,` or `;`?
    pub(super) fn looks_like_naked_kvc(&self, start: usize) -> bool {
        if self.scanner.keyword(start, "return") > start || self.scanner.keyword(start, "eval") > start
        {
            return true;
        }

        if let Some((_, end)) = self.scanner.identifier(start) {
            let next = self.after_space(end);
            return matches!(self.scanner.byte(next), b':' | b',' | b';');
        }

        match self.scanner.string(start) {
            Ok(Some((_, end))) => self.scanner.byte(self.after_space(end)) == b':',
            _ => false,
        }
    }

    /// Brace-less KVC spanning the whole root input.
    pub(super) fn naked_kvc(&mut self, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        let (mut lead, start) = self.lead(i);
        let mut children: Vec<ParseNode> = Vec::new();
        let (def, end) = self.kvc_items(&mut children, start)?;

        siblings.append(&mut lead);
        siblings.push(ParseNode::with_children(
            ParseNodeKind::KeyValueCollection,
            start,
            end - start,
            children,
        ));

        Some((
            Expression::new(ExprKind::Kvc(Rc::new(def)), Span::between(start, end)),
            end,
        ))
    }

    /// Items separated by `,` or `;`. Keys are unique ignoring case and at
    /// most one `return` is allowed.
    fn kvc_items(
        &mut self,
        nodes: &mut Vec<ParseNode>,
        i: usize,
    ) -> Option<(KvcExpression, usize)> {
        let mut fields: Vec<KvcField> = Vec::new();
        let mut ret: Option<Expression> = None;
        let mut seen: HashSet<String> = HashSet::new();
        let mut p = i;

        loop {
            let mark = self.errors.len();
            match self.kvc_item(nodes, p) {
                Some((Item::Field(field), next)) => {
                    if !seen.insert(field.key_lookup.clone()) {
                        self.error(SyntaxError::new(
                            field.span.pos,
                            field.span.len,
                            format!("key '{}' is duplicated", field.key),
                        ));
                        return None;
                    }
                    fields.push(field);
                    p = next;
                }
                Some((Item::Return(expr, span), next)) => {
                    if ret.is_some() {
                        self.error(SyntaxError::new(
                            span.pos,
                            span.len,
                            "only one return expression is allowed",
                        ));
                        return None;
                    }
                    ret = Some(expr);
                    p = next;
                }
                None if self.failed_since(mark) => return None,
                None => break,
            }

            let separator = match self.punct(nodes, p, ",", ParseNodeKind::Delimiter) {
                end if end > p => end,
                _ => self.punct(nodes, p, ";", ParseNodeKind::Delimiter),
            };
            if separator == p {
                break;
            }
            p = separator;
        }

        Some((KvcExpression { fields, ret }, p))
    }

    /// `key: value`, `"key": value`, bare `key`, or `return value`.
    fn kvc_item(&mut self, nodes: &mut Vec<ParseNode>, i: usize) -> Option<(Item, usize)> {
        let (mut lead, start) = self.lead(i);
        let mut children: Vec<ParseNode> = Vec::new();

        for word in ["return", "eval"] {
            let after = self.keyword(&mut children, start, word);
            if after == start {
                continue;
            }

            let (expr, end) = self.required_expression(&mut children, after, "return expression")?;
            nodes.append(&mut lead);
            nodes.push(ParseNode::with_children(
                ParseNodeKind::ReturnExpression,
                start,
                end - start,
                children,
            ));
            return Some((Item::Return(expr, Span::between(start, end)), end));
        }

        let (key, key_end, quoted) = match self.scanner.identifier(start) {
            Some((name, end)) => (name.to_string(), end, false),
            None => match self.scanner.string(start) {
                Ok(Some((text, end))) => (text, end, true),
                Ok(None) => return None,
                Err(e) => {
                    self.error(e);
                    return None;
                }
            },
        };

        children.push(ParseNode::new(
            if quoted {
                ParseNodeKind::LiteralString
            } else {
                ParseNodeKind::Identifier
            },
            start,
            key_end - start,
        ));

        let colon = self.punct(&mut children, key_end, ":", ParseNodeKind::Delimiter);
        let (value, end) = if colon > key_end {
            let (expr, end) = self.required_expression(&mut children, colon, "value expression")?;
            (FieldValue::Expression(expr), end)
        } else if quoted {
            self.expected_at(key_end, "':'");
            return None;
        } else {
            (FieldValue::Inherit, key_end)
        };

        nodes.append(&mut lead);
        nodes.push(ParseNode::with_children(
            ParseNodeKind::KeyValuePair,
            start,
            end - start,
            children,
        ));

        let key_lookup = key.to_lowercase();
        Some((
            Item::Field(KvcField {
                key,
                key_lookup,
                value,
                span: Span::between(start, end),
            }),
            end,
        ))
    }
}
