/*!
Recursive-descent grammar engine
================================

One recognizer per construct. Every recognizer has the shape

```text
fn construct(&mut self, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed
```

* `i` may point at leading blanks; the recognizer skips them itself.
* On success it appends its parse nodes (leading blanks included) to
  `siblings` and returns the expression with the offset after it.
* `None` with no new entry in `self.errors` means "no progress, try another
  alternative". `None` after an error was recorded means the construct had
  committed (e.g. after `case`) and the caller must stop as well.

Nodes are always built in a scratch buffer owned by the attempt and only
moved into `siblings` on success, so abandoned alternatives leave no ghost
nodes behind.

Grammar (condensed)
-------------------

```text
root        → naked_kvc | expression
expression  → general_infix
general     → infix ( IDENT infix ( "~" infix )* )*         IDENT is Dual
infix[n]    → infix[n-1] ( SYM[n] infix[n-1] )*              n = 0..7
infix[-1]   → prefix
prefix      → ( "!" | "-" ) prefix | postfix
postfix     → unit ( "(" args ")" | "[" args "]" | "." IDENT | "?." IDENT | "{" kvc "}" )*
unit        → fstring | STRING | NUMBER | list | kvc | case | switch | if
            | "true" | "false" | "null" | lambda | IDENT | "(" expression ")"
```

Time complexity is linear in the input: no alternative re-parses text
another alternative already accepted, and the only double attempt (naked KVC
vs expression at the root) is decided by a constant look-ahead.
*/

mod collections;
mod control;
mod literals;
mod operators;
mod template;

use log::{debug, info};

use crate::environment::ProviderRef;
use crate::error::SyntaxError;
use crate::expr::{Expression, Span};
use crate::node::{ParseNode, ParseNodeKind};
use crate::scanner::{Scanner, SpaceKind};
use crate::value::Value;

/// Recognizer outcome: the expression and the offset after it.
pub(crate) type Parsed = Option<(Expression, usize)>;

/// Everything one parse produces.
#[derive(Debug)]
pub struct ParseResult {
    pub expression: Option<Expression>,
    pub node: ParseNode,
    /// Offset after the last consumed byte; equals the source length when
    /// the whole input was consumed.
    pub next_index: usize,
    pub errors: Vec<SyntaxError>,
}

impl ParseResult {
    pub fn is_complete(&self, source: &str) -> bool {
        self.errors.is_empty() && self.next_index == source.len()
    }
}

/// Parse an expression (or a naked KVC) from `source`. Operator symbols and
/// word operators are resolved against `provider` while parsing.
pub fn parse(source: &str, provider: &ProviderRef) -> ParseResult {
    info!("Beginning parse of {} byte(s)", source.len());

    let mut parser = Parser::new(source, provider);
    let mut children: Vec<ParseNode> = Vec::new();
    let (expression, next) = parser.root(&mut children);

    parser.finish(expression, next, children)
}

/// Parse a template document: literal text with `${expr}` splices.
pub fn parse_template(source: &str, provider: &ProviderRef) -> ParseResult {
    info!("Beginning template parse of {} byte(s)", source.len());

    let mut parser = Parser::new(source, provider);
    let mut children: Vec<ParseNode> = Vec::new();
    let (expression, next) = match parser.template_document(&mut children) {
        Some((e, next)) => (Some(e), next),
        None => (None, 0),
    };

    parser.finish(expression, next, children)
}

/// Parse blank-separated expressions into one list expression.
pub fn parse_space_separated(source: &str, provider: &ProviderRef) -> ParseResult {
    info!("Beginning space-separated list parse of {} byte(s)", source.len());

    let mut parser = Parser::new(source, provider);
    let mut children: Vec<ParseNode> = Vec::new();
    let (expression, next) = match parser.space_separated_list(&mut children, 0) {
        Some((e, next)) => (Some(e), parser.skip_space(&mut children, next)),
        None => (None, 0),
    };

    parser.finish(expression, next, children)
}

pub(crate) struct Parser<'a> {
    scanner: Scanner<'a>,
    provider: &'a ProviderRef,
    errors: Vec<SyntaxError>,
    /// A `/*` without its `*/` was skipped somewhere.
    open_comment: bool,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, provider: &'a ProviderRef) -> Self {
        Parser {
            scanner: Scanner::new(source),
            provider,
            errors: Vec::new(),
            open_comment: false,
        }
    }

    fn finish(
        mut self,
        expression: Option<Expression>,
        next: usize,
        children: Vec<ParseNode>,
    ) -> ParseResult {
        let node = ParseNode::with_children(ParseNodeKind::RootExpression, 0, next, children);

        if self.open_comment {
            self.error(SyntaxError::expected(self.scanner.len(), "'*/'"));
        }

        info!(
            "Parse finished at {} of {} with {} error(s)",
            next,
            self.scanner.len(),
            self.errors.len()
        );

        ParseResult {
            expression,
            node,
            next_index: next,
            errors: self.errors,
        }
    }

    fn root(&mut self, siblings: &mut Vec<ParseNode>) -> (Option<Expression>, usize) {
        let start = self.after_space(0);

        let parsed = if self.looks_like_naked_kvc(start) {
            debug!("Root is a naked kvc");
            self.naked_kvc(siblings, 0)
        } else {
            let mark = self.errors.len();
            let parsed = self.expression(siblings, 0);
            if parsed.is_none() && self.errors.len() == mark {
                self.error(SyntaxError::expected(start, "expression"));
            }
            parsed
        };

        match parsed {
            Some((expr, next)) => {
                let end = self.skip_space(siblings, next);
                (Some(expr), end)
            }
            None => (None, 0),
        }
    }

    // ───────────────────────── shared helpers ─────────────────────────

    fn error(&mut self, error: SyntaxError) {
        self.errors.push(error);
    }

    /// Did anything record an error since `mark`?
    fn failed_since(&self, mark: usize) -> bool {
        self.errors.len() > mark
    }

    /// Skip blanks and comments from `i`, adding their nodes to `nodes`.
    fn skip_space(&mut self, nodes: &mut Vec<ParseNode>, i: usize) -> usize {
        let mut p = i;
        while let Some((kind, end)) = self.scanner.space(p) {
            let node_kind = match kind {
                SpaceKind::WhiteSpace => ParseNodeKind::WhiteSpace,
                SpaceKind::Comment => ParseNodeKind::Comment,
                SpaceKind::OpenComment => {
                    self.open_comment = true;
                    ParseNodeKind::Comment
                }
            };
            nodes.push(ParseNode::new(node_kind, p, end - p));
            p = end;
        }
        p
    }

    /// Offset after blanks and comments, without recording nodes.
    fn after_space(&self, i: usize) -> usize {
        let mut p = i;
        while let Some((_, end)) = self.scanner.space(p) {
            p = end;
        }
        p
    }

    /// Leading blanks of an attempt, kept aside until the attempt succeeds.
    fn lead(&mut self, i: usize) -> (Vec<ParseNode>, usize) {
        let mut nodes = Vec::new();
        let start = self.skip_space(&mut nodes, i);
        (nodes, start)
    }

    /// Match `lit` after optional blanks. On success the blanks and a node
    /// of `kind` go to `nodes` and the offset after `lit` is returned;
    /// otherwise `i` is returned and `nodes` is untouched.
    fn punct(
        &mut self,
        nodes: &mut Vec<ParseNode>,
        i: usize,
        lit: &str,
        kind: ParseNodeKind,
    ) -> usize {
        let (mut lead, start) = self.lead(i);
        let end = self.scanner.literal(start, lit);
        if end == start {
            return i;
        }
        nodes.append(&mut lead);
        nodes.push(ParseNode::new(kind, start, end - start));
        end
    }

    /// Like [`punct`](Self::punct) for a keyword (word boundary required).
    fn keyword(&mut self, nodes: &mut Vec<ParseNode>, i: usize, kw: &str) -> usize {
        let (mut lead, start) = self.lead(i);
        let end = self.scanner.keyword(start, kw);
        if end == start {
            return i;
        }
        nodes.append(&mut lead);
        nodes.push(ParseNode::new(ParseNodeKind::KeyWord, start, end - start));
        end
    }

    /// Resolve an operator or keyword function at parse time.
    fn function(&mut self, name: &str, span: Span) -> Option<Value> {
        match self.provider.get(&name.to_lowercase()) {
            Ok(Some(value @ Value::Function(_))) => Some(value),
            _ => {
                self.error(SyntaxError::new(
                    span.pos,
                    span.len,
                    format!("function '{}' is not defined", name),
                ));
                None
            }
        }
    }

    /// Parse an expression that must be there; records `what expected`
    /// when it is missing and nothing more specific was reported.
    fn required_expression(
        &mut self,
        nodes: &mut Vec<ParseNode>,
        i: usize,
        what: &str,
    ) -> Parsed {
        let mark = self.errors.len();
        let parsed = self.expression(nodes, i);
        if parsed.is_none() && !self.failed_since(mark) {
            let at = self.after_space(i);
            self.error(SyntaxError::expected(at, what));
        }
        parsed
    }

    /// Require the closing delimiter `lit`.
    fn close(&mut self, nodes: &mut Vec<ParseNode>, i: usize, lit: &str) -> Option<usize> {
        let end = self.punct(nodes, i, lit, ParseNodeKind::CloseBrace);
        if end == i {
            let at = self.after_space(i);
            self.error(SyntaxError::expected(at, &format!("'{}'", lit)));
            return None;
        }
        Some(end)
    }

    // ───────────────────────── units ─────────────────────────

    /// Primary construct at `i`: tries each alternative in turn and stops
    /// at the first that makes progress or commits with an error.
    fn unit(&mut self, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        let alternatives: [fn(&mut Self, &mut Vec<ParseNode>, usize) -> Parsed; 12] = [
            Self::format_string,
            Self::string_literal,
            Self::number_literal,
            Self::list,
            Self::kvc,
            Self::case,
            Self::switch,
            Self::if_then_else,
            Self::keyword_literal,
            Self::lambda,
            Self::reference,
            Self::group,
        ];

        let mark = self.errors.len();
        for alternative in alternatives {
            if let Some(parsed) = alternative(self, siblings, i) {
                return Some(parsed);
            }
            if self.failed_since(mark) {
                return None;
            }
        }
        None
    }

    /// Top of the precedence chain.
    pub(crate) fn expression(&mut self, siblings: &mut Vec<ParseNode>, i: usize) -> Parsed {
        self.general_infix(siblings, i)
    }
}
