//! String templates: `f"..{expr}.."` inside expressions, `${expr}` in whole
//! template documents, and blank-separated argument lists.

use log::debug;
use memchr::{memchr2, memchr3};

use super::{Parsed, Parser};
use crate::error::SyntaxError;
use crate::expr::{ExprKind, Expression, Span};
use crate::node::{ParseNode, ParseNodeKind};
use crate::value::Value;

/// Accumulates literal text and spliced expressions of one template.
struct Parts {
    items: Vec<Expression>,
    text: String,
    text_start: usize,
}

impl Parts {
    fn new(start: usize) -> Self {
        Parts {
            items: Vec::new(),
            text: String::new(),
            text_start: start,
        }
    }

    /// Close the pending literal run ending at `end`.
    fn flush(&mut self, nodes: &mut Vec<ParseNode>, end: usize) {
        if end > self.text_start {
            nodes.push(ParseNode::new(
                ParseNodeKind::LiteralString,
                self.text_start,
                end - self.text_start,
            ));
            self.items.push(Expression::literal(
                Value::String(std::mem::take(&mut self.text)),
                Span::between(self.text_start, end),
            ));
        }
        self.text_start = end;
    }

    /// A single literal part folds into one literal; otherwise the parts
    /// are concatenated at run time.
    fn into_expression(mut self, concat: Option<Value>, span: Span) -> Option<Expression> {
        match self.items.len() {
            0 => Some(Expression::literal(Value::string(""), span)),
            1 if matches!(self.items[0].kind, ExprKind::Literal(_)) => {
                let mut only = self.items.pop()?;
                only.span = span;
                Some(only)
            }
            _ => Some(Expression::call(
                Expression::literal(concat?, Span::new(span.pos, 0)),
                self.items,
                span,
            )),
        }
    }
}

impl<'a> Parser<'a> {
    /// `f"text {expr} text"` with either quote. `\{` is a literal brace.
    pub(super) fn format_string(&mut self, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        let (mut lead, start) = self.lead(i);
        let quote = self.scanner.byte(start + 1);
        if !matches!(self.scanner.byte(start), b'f' | b'F') || !matches!(quote, b'"' | b'\'') {
            return None;
        }

        debug!("Entering format string at {}", start);

        let bytes = self.scanner.source().as_bytes();
        let mut children: Vec<ParseNode> = Vec::new();
        let mut parts = Parts::new(start + 2);
        let mut p = start + 2;

        let end = loop {
            let Some(off) = bytes.get(p..).and_then(|rest| memchr3(quote, b'\\', b'{', rest))
            else {
                self.error(SyntaxError::expected(
                    self.scanner.len(),
                    &format!("'{}'", quote as char),
                ));
                return None;
            };

            parts.text.push_str(self.scanner.slice(p, p + off));
            p += off;

            match self.scanner.byte(p) {
                b'\\' => match self.scanner.escape(p, quote) {
                    Ok((c, next)) => {
                        parts.text.push(c);
                        p = next;
                    }
                    Err(e) => {
                        self.error(e);
                        return None;
                    }
                },
                b'{' => {
                    parts.flush(&mut children, p);
                    p = self.splice(&mut children, &mut parts, p, p + 1)?;
                }
                _ => {
                    parts.flush(&mut children, p);
                    break p + 1;
                }
            }
        };

        let concat = self.function("concat", Span::new(start, 1))?;
        let expr = parts.into_expression(Some(concat), Span::between(start, end))?;

        siblings.append(&mut lead);
        siblings.push(ParseNode::with_children(
            ParseNodeKind::StringTemplate,
            start,
            end - start,
            children,
        ));
        Some((expr, end))
    }

    /// `{expr}` (or `${expr}`) opened at `open`; the expression starts at
    /// `inner`. Returns the offset after the closing brace.
    fn splice(
        &mut self,
        nodes: &mut Vec<ParseNode>,
        parts: &mut Parts,
        open: usize,
        inner: usize,
    ) -> Option<usize> {
        nodes.push(ParseNode::new(
            ParseNodeKind::OpenBrace,
            open,
            inner - open,
        ));
        let (expr, next) = self.required_expression(nodes, inner, "expression")?;
        let end = self.close(nodes, next, "}")?;
        parts.items.push(expr);
        parts.text_start = end;
        Some(end)
    }

    /// Whole-input template: literal text with `${expr}` splices. `\$`
    /// escapes a dollar sign; any other backslash is literal.
    pub(super) fn template_document(&mut self, siblings: &mut Vec<ParseNode>) -> Parsed {
        let bytes = self.scanner.source().as_bytes();
        let len = self.scanner.len();
        let mut children: Vec<ParseNode> = Vec::new();
        let mut parts = Parts::new(0);
        let mut p = 0;

        while p < len {
            let Some(off) = memchr2(b'$', b'\\', &bytes[p..]) else {
                parts.text.push_str(self.scanner.slice(p, len));
                p = len;
                break;
            };

            parts.text.push_str(self.scanner.slice(p, p + off));
            p += off;

            match (self.scanner.byte(p), self.scanner.byte(p + 1)) {
                (b'\\', b'$') => {
                    parts.text.push('$');
                    p += 2;
                }
                (b'$', b'{') => {
                    parts.flush(&mut children, p);
                    p = self.splice(&mut children, &mut parts, p, p + 2)?;
                }
                (c, _) => {
                    parts.text.push(c as char);
                    p += 1;
                }
            }
        }
        parts.flush(&mut children, len);

        let concat = self.function("concat", Span::new(0, 0))?;
        let expr = parts.into_expression(Some(concat), Span::between(0, len))?;

        siblings.push(ParseNode::with_children(
            ParseNodeKind::StringTemplate,
            0,
            len,
            children,
        ));
        Some((expr, p))
    }

    /// Expressions separated by blanks, as one list expression.
    pub(super) fn space_separated_list(
        &mut self,
        siblings: &mut Vec<ParseNode>,
        i: usize,
    ) -> Parsed {
        let (mut lead, start) = self.lead(i);
        let mut children: Vec<ParseNode> = Vec::new();
        let mut items: Vec<Expression> = Vec::new();
        let mut p = start;

        loop {
            let mark = self.errors.len();
            match self.expression(&mut children, p) {
                Some((item, next)) => {
                    items.push(item);
                    p = next;
                }
                None if self.failed_since(mark) => return None,
                None => break,
            }
        }

        siblings.append(&mut lead);
        siblings.push(ParseNode::with_children(
            ParseNodeKind::List,
            start,
            p - start,
            children,
        ));
        Some((
            Expression::new(ExprKind::List(items), Span::between(start, p)),
            p,
        ))
    }
}
