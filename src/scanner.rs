//! Module `scanner` holds the scanning primitives the grammar engine is built
//! on. There is no separate token stream: every primitive takes a byte offset
//! into the source and answers "what is here, and where does it end".
//!
//! # Primitives
//!
//! - `literal` / `keyword`: case-insensitive matching of fixed text; keywords
//!   additionally require a word boundary.
//! - `space`: one run of blanks or one comment (`// ...`, `/* ... */`).
//! - `identifier`: `[A-Za-z_][A-Za-z0-9_]*`, refusing reserved words from the
//!   perfect-hash `KEYWORDS` set.
//! - `number`: `-?digits(.digits)?(E-?digits)?l?` with range checking.
//! - `string`: `"..."` / `'...'` with backslash and `\uXXXX` escapes.
//! - `longest_symbol`: longest operator symbol starting at an offset.
//!
//! # Performance
//!
//! - Line comments are skipped with `memchr`, block comments and string
//!   bodies with `memchr::memmem` / `memchr2`.
//! - All primitives are O(length of the matched text).

use crate::error::SyntaxError;
use crate::value::Number;
use log::debug;
use memchr::{memchr, memchr2, memmem};
use phf::phf_set;

// ─────────────────────────────────────────────────────────────────────────────
// Reserved words (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Set<&'static str> = phf_set! {
    "return",
    "eval",
    "case",
    "switch",
    "if",
    "then",
    "else",
    "true",
    "false",
    "null",
    "and",
    "or",
    "in",
};

/// Is `word` reserved (case-insensitive)?
pub fn is_keyword(word: &str) -> bool {
    word.len() <= 6 && KEYWORDS.contains(word.to_ascii_lowercase().as_str())
}

/// Can `word` be written as a bare identifier?
pub fn is_identifier(word: &str) -> bool {
    let bytes = word.as_bytes();
    !bytes.is_empty()
        && is_ident_start(bytes[0])
        && bytes[1..].iter().all(|b| is_ident_continue(*b))
        && !is_keyword(word)
}

#[inline(always)]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

#[inline(always)]
fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// What [`Scanner::space`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceKind {
    WhiteSpace,
    Comment,
    /// `/*` without a closing `*/`; runs to the end of input.
    OpenComment,
}

/// Position-addressed view over the source text.
#[derive(Clone, Copy)]
pub struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline(always)]
    pub fn source(&self) -> &'a str {
        self.src
    }

    /// Byte at `i`, or `0` past the end.
    #[inline(always)]
    pub fn byte(&self, i: usize) -> u8 {
        self.bytes.get(i).copied().unwrap_or(0)
    }

    /// Source slice, empty when out of range.
    #[inline(always)]
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        self.src.get(start..end).unwrap_or("")
    }

    // ───────────────────────────── literal matching ─────────────────────────

    /// Match `lit` case-insensitively at `i`. Returns the offset after the
    /// match, or `i` when there is none.
    pub fn literal(&self, i: usize, lit: &str) -> usize {
        let end = i + lit.len();
        if end <= self.len() && self.bytes[i..end].eq_ignore_ascii_case(lit.as_bytes()) {
            end
        } else {
            i
        }
    }

    /// Like [`literal`](Self::literal) but the next byte must not continue
    /// a word, so `in` does not match the start of `index`.
    pub fn keyword(&self, i: usize, kw: &str) -> usize {
        let end = self.literal(i, kw);
        if end == i || is_ident_continue(self.byte(end)) {
            i
        } else {
            end
        }
    }

    /// Longest entry of `symbols` present at `i`. Alphabetic symbols need a
    /// word boundary.
    pub fn longest_symbol(&self, i: usize, symbols: &[&'static str]) -> Option<&'static str> {
        symbols
            .iter()
            .copied()
            .filter(|sym| {
                let alphabetic = sym.bytes().all(|b| b.is_ascii_alphabetic());
                let end = if alphabetic {
                    self.keyword(i, sym)
                } else {
                    self.literal(i, sym)
                };
                end > i
            })
            .max_by_key(|sym| sym.len())
    }

    // ───────────────────────────── blanks & comments ────────────────────────

    /// One whitespace run or one comment starting at `i`.
    pub fn space(&self, i: usize) -> Option<(SpaceKind, usize)> {
        let mut p = i;
        while matches!(self.byte(p), b' ' | b'\t' | b'\r' | b'\n') {
            p += 1;
        }
        if p > i {
            return Some((SpaceKind::WhiteSpace, p));
        }

        if self.byte(i) == b'/' && self.byte(i + 1) == b'/' {
            let end = match memchr(b'\n', &self.bytes[i..]) {
                Some(off) => i + off,
                None => self.len(),
            };
            return Some((SpaceKind::Comment, end));
        }

        if self.byte(i) == b'/' && self.byte(i + 1) == b'*' {
            return match memmem::find(&self.bytes[i + 2..], b"*/") {
                Some(off) => Some((SpaceKind::Comment, i + 2 + off + 2)),
                None => Some((SpaceKind::OpenComment, self.len())),
            };
        }

        None
    }

    // ───────────────────────────── identifiers ──────────────────────────────

    /// Identifier at `i`, excluding reserved words.
    pub fn identifier(&self, i: usize) -> Option<(&'a str, usize)> {
        if !is_ident_start(self.byte(i)) {
            return None;
        }

        let mut p = i + 1;
        while is_ident_continue(self.byte(p)) {
            p += 1;
        }

        let word = self.slice(i, p);
        if is_keyword(word) {
            debug!("'{}' at {} is reserved", word, i);
            return None;
        }

        Some((word, p))
    }

    // ───────────────────────────── numbers ──────────────────────────────────

    /// Numeric literal at `i`.
    ///
    /// * A decimal point makes the literal floating.
    /// * Without a decimal point a positive exponent appends zeros to the
    ///   integer digits; a negative one makes the literal floating.
    /// * `l` forces a 64-bit integer and is refused after a decimal point.
    /// * Integers that leave the 32-bit range become 64-bit; leaving the
    ///   64-bit range is a syntax error.
    pub fn number(&self, i: usize) -> Result<Option<(Number, usize)>, SyntaxError> {
        let mut p = i;
        if self.byte(p) == b'-' {
            p += 1;
        }

        let digits_start = p;
        while self.byte(p).is_ascii_digit() {
            p += 1;
        }
        if p == digits_start {
            return Ok(None);
        }
        let int_end = p;

        let mut has_point = false;
        if self.byte(p) == b'.' && self.byte(p + 1).is_ascii_digit() {
            has_point = true;
            p += 1;
            while self.byte(p).is_ascii_digit() {
                p += 1;
            }
        }

        // (negative, digits)
        let mut exponent: Option<(bool, &str)> = None;
        if matches!(self.byte(p), b'e' | b'E') {
            let mut q = p + 1;
            let negative = self.byte(q) == b'-';
            if negative {
                q += 1;
            }
            let exp_start = q;
            while self.byte(q).is_ascii_digit() {
                q += 1;
            }
            if q > exp_start {
                exponent = Some((negative, self.slice(exp_start, q)));
                p = q;
            }
        }
        let number_end = p;

        let mut long = false;
        if matches!(self.byte(p), b'l' | b'L') {
            if has_point {
                return Err(SyntaxError::new(
                    p,
                    1,
                    "'l' suffix is not allowed on a floating point literal",
                ));
            }
            long = true;
            p += 1;
        }

        let text = self.slice(i, number_end);

        if has_point || matches!(exponent, Some((true, _))) {
            if long {
                return Err(SyntaxError::new(
                    i,
                    p - i,
                    "'l' suffix is not allowed on a floating point literal",
                ));
            }
            return match text.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Some((Number::Float(f), p))),
                _ => Err(SyntaxError::new(i, p - i, "numeric literal out of range")),
            };
        }

        let out_of_range = || SyntaxError::new(i, p - i, "numeric literal out of range");

        let mut value = self
            .slice(i, int_end)
            .parse::<i64>()
            .map_err(|_| out_of_range())?;

        if let Some((_, exp)) = exponent {
            if value != 0 {
                value = exp
                    .parse::<u32>()
                    .ok()
                    .and_then(|z| 10i64.checked_pow(z))
                    .and_then(|scale| value.checked_mul(scale))
                    .ok_or_else(out_of_range)?;
            }
        }

        let number = match i32::try_from(value) {
            Ok(small) if !long => Number::Integer(small),
            _ => Number::Long(value),
        };

        Ok(Some((number, p)))
    }

    // ───────────────────────────── strings ──────────────────────────────────

    /// Quoted string at `i` (either quote style). The error position is the
    /// failure point, not the opening quote.
    pub fn string(&self, i: usize) -> Result<Option<(String, usize)>, SyntaxError> {
        let quote = self.byte(i);
        if quote != b'"' && quote != b'\'' {
            return Ok(None);
        }

        let mut out = String::new();
        let mut p = i + 1;

        loop {
            if p >= self.len() {
                return Err(SyntaxError::expected(
                    self.len(),
                    &format!("'{}'", quote as char),
                ));
            }

            let b = self.byte(p);
            if b == quote {
                return Ok(Some((out, p + 1)));
            }

            if b == b'\\' {
                let (c, next) = self.escape(p, quote)?;
                out.push(c);
                p = next;
                continue;
            }

            let run_end = match memchr2(quote, b'\\', &self.bytes[p..]) {
                Some(off) => p + off,
                None => self.len(),
            };
            out.push_str(self.slice(p, run_end));
            p = run_end;
        }
    }

    /// Decode the escape sequence whose backslash is at `p`. `quote` is the
    /// delimiter reported when the input ends mid-escape.
    pub fn escape(&self, p: usize, quote: u8) -> Result<(char, usize), SyntaxError> {
        let Some(c) = self.src.get(p + 1..).and_then(|rest| rest.chars().next()) else {
            return Err(SyntaxError::expected(
                self.len(),
                &format!("'{}'", quote as char),
            ));
        };

        let decoded = match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'u' => {
                let hex = self.slice(p + 2, p + 6);
                let code = if hex.len() == 4 {
                    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
                } else {
                    None
                };
                return match code {
                    Some(ch) => Ok((ch, p + 6)),
                    None => Err(SyntaxError::new(p, 2, "invalid unicode escape")),
                };
            }
            other => other,
        };

        Ok((decoded, p + 1 + c.len_utf8()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(src: &str) -> Number {
        match Scanner::new(src).number(0) {
            Ok(Some((n, end))) => {
                assert_eq!(end, src.len(), "number did not consume {:?}", src);
                n
            }
            other => panic!("no number in {:?}: {:?}", src, other),
        }
    }

    #[test]
    fn literals_match_case_insensitively() {
        let s = Scanner::new("TRUE and");
        assert_eq!(s.keyword(0, "true"), 4);
        assert_eq!(s.keyword(5, "and"), 8);
        assert_eq!(Scanner::new("index").keyword(0, "in"), 0);
    }

    #[test]
    fn longest_symbol_prefers_longer_operators() {
        let s = Scanner::new(">>=");
        assert_eq!(s.longest_symbol(0, &[">", ">=", ">>"]), Some(">>"));
        assert_eq!(Scanner::new("a").longest_symbol(0, &["+"]), None);
    }

    #[test]
    fn comments_and_blanks() {
        let s = Scanner::new("  // note\n/* block */x");
        assert_eq!(s.space(0), Some((SpaceKind::WhiteSpace, 2)));
        assert_eq!(s.space(2), Some((SpaceKind::Comment, 9)));
        assert_eq!(s.space(10), Some((SpaceKind::Comment, 21)));
        assert_eq!(s.space(21), None);
        assert_eq!(
            Scanner::new("/* open").space(0),
            Some((SpaceKind::OpenComment, 7))
        );
    }

    #[test]
    fn identifiers_exclude_keywords() {
        assert_eq!(Scanner::new("abc_1+").identifier(0), Some(("abc_1", 5)));
        assert_eq!(Scanner::new("Case x").identifier(0), None);
        assert!(is_identifier("casex"));
        assert!(!is_identifier("1a"));
    }

    #[test]
    fn number_kinds() {
        assert_eq!(number("12"), Number::Integer(12));
        assert_eq!(number("-3"), Number::Integer(-3));
        assert_eq!(number("2.5"), Number::Float(2.5));
        assert_eq!(number("7l"), Number::Long(7));
        assert_eq!(number("3E2"), Number::Integer(300));
        assert_eq!(number("3E10"), Number::Long(30_000_000_000));
        assert_eq!(number("1.5E2"), Number::Float(150.0));
        assert_eq!(number("5E-1"), Number::Float(0.5));
        assert_eq!(number("3000000000"), Number::Long(3_000_000_000));
    }

    #[test]
    fn number_overflow_is_a_syntax_error() {
        assert!(Scanner::new("9E30").number(0).is_err());
        assert!(Scanner::new("99999999999999999999").number(0).is_err());
        assert!(Scanner::new("1.5l").number(0).is_err());
        assert!(Scanner::new("1E19").number(0).is_err());
    }

    #[test]
    fn large_exponents_are_checked_against_the_result() {
        assert_eq!(number("0E25"), Number::Integer(0));
        assert_eq!(number("-0E400"), Number::Integer(0));
        assert_eq!(number("1E18"), Number::Long(1_000_000_000_000_000_000));
        assert_eq!(number("-9E18"), Number::Long(-9_000_000_000_000_000_000));
    }

    #[test]
    fn strings_and_escapes() {
        let s = Scanner::new(r#""a\"b\n\u0041" rest"#);
        assert_eq!(s.string(0), Ok(Some(("a\"b\nA".to_string(), 14))));
        assert_eq!(
            Scanner::new("'it''").string(0),
            Ok(Some(("it".to_string(), 4)))
        );
    }

    #[test]
    fn unterminated_string_reports_the_failure_point() {
        let err = Scanner::new("\"abc").string(0).unwrap_err();
        assert_eq!(err.position, 4);
        assert_eq!(err.message, "'\"' expected");
    }
}
