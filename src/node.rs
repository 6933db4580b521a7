use log::debug;
use serde::Serialize;
use std::fmt;

/// Kind tag of a [`ParseNode`].
///
/// The parse tree mirrors every recognition step of the grammar, so it also
/// carries whitespace, comments and punctuation that the expression tree
/// leaves out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseNodeKind {
    /// Whole-input wrapper
    RootExpression,

    /// Run of blanks / newlines
    WhiteSpace,

    /// `// ...` or `/* ... */`
    Comment,

    /// `case`, `then`, `return`, ...
    KeyWord,

    /// A user-defined name
    Identifier,

    /// `(a, b)` parameter list of a lambda
    IdentifierList,

    /// Infix or prefix operator symbol
    Operator,

    /// `,` `;` `:` `=>` `~`
    Delimiter,

    /// `(` `[` `{`
    OpenBrace,

    /// `)` `]` `}`
    CloseBrace,

    /// 32-bit integer literal
    LiteralInteger,

    /// 64-bit integer literal
    LiteralLong,

    /// Floating point literal
    LiteralFloat,

    /// Quoted string, or literal text inside a template
    LiteralString,

    /// `true` / `false`
    LiteralBoolean,

    /// `null`
    LiteralNull,

    /// `f"..."` or a `${...}` template document
    StringTemplate,

    /// Chain of symbolic infix operators of one precedence level
    InfixExpression,

    /// `a op b ~ c`
    GeneralInfixExpression,

    /// `!x`, `-x`
    PrefixOperatorExpression,

    /// `f(a, b)` or `f[a]`
    FunctionCall,

    /// `a.b` or `a?.b`
    MemberAccess,

    /// `a{...}`
    Selector,

    /// `(a, b) => body`
    LambdaExpression,

    /// `[a, b]`
    List,

    /// `{ ... }`
    KeyValueCollection,

    /// `key: value` or a bare key
    KeyValuePair,

    /// `return expr`
    ReturnExpression,

    /// `case c: v, ...`
    Case,

    /// `switch s, m: v, ...`
    Switch,

    /// `if c then a else b`
    IfExpression,

    /// `( expr )`
    Group,
}

impl fmt::Display for ParseNodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Tooling-facing span tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseNode {
    pub kind: ParseNodeKind,

    /// Byte offset of the first byte covered.
    pub pos: usize,

    /// Byte length covered.
    pub len: usize,

    pub children: Vec<ParseNode>,
}

impl ParseNode {
    pub fn new(kind: ParseNodeKind, pos: usize, len: usize) -> Self {
        Self::with_children(kind, pos, len, Vec::new())
    }

    pub fn with_children(
        kind: ParseNodeKind,
        pos: usize,
        len: usize,
        children: Vec<ParseNode>,
    ) -> Self {
        debug!("Parse node: kind={:?}, pos={}, len={}", kind, pos, len);

        Self {
            kind,
            pos,
            len,
            children,
        }
    }

    /// One past the last byte covered.
    pub fn end(&self) -> usize {
        self.pos + self.len
    }

    /// Pre-order walk over this node and all descendants.
    pub fn iter(&self) -> ParseNodeIter<'_> {
        ParseNodeIter { stack: vec![self] }
    }

    /// Deepest node whose span contains `position`.
    pub fn node_at(&self, position: usize) -> Option<&ParseNode> {
        if position < self.pos || position >= self.end() {
            return None;
        }

        self.children
            .iter()
            .find_map(|c| c.node_at(position))
            .or(Some(self))
    }

    /// Source text covered by this node.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.pos..self.end()).unwrap_or("")
    }
}

pub struct ParseNodeIter<'a> {
    stack: Vec<&'a ParseNode>,
}

impl<'a> Iterator for ParseNodeIter<'a> {
    type Item = &'a ParseNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
