//! Evaluator for calculated cells.
//!
//! An expression is plain arithmetic over numeric literals and cell tokens
//! (`r<row>c<col>`). Tokens are substituted from a value map first; the
//! resulting text must then consist only of digits, `+ - * / ( ) .` and
//! whitespace, otherwise nothing is evaluated at all.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Deepest nesting of parentheses and unary signs the parser accepts.
const MAX_DEPTH: usize = 256;

lazy_static! {
    static ref TOKEN_REGEX: Regex = Regex::new(r"r\d+c\d+").unwrap();
    static ref FORBIDDEN_REGEX: Regex = Regex::new(r"[^0-9+\-*/().\s]").unwrap();
}

/// A value entered by the user of a piece: checkbox state, number or text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric reading used by calculated cells. Text is read the way a
    /// lenient float parser would (longest numeric prefix); booleans and
    /// non-finite numbers have no numeric reading.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => parse_float_prefix(s),
            FieldValue::Bool(_) => None,
        };
        n.filter(|n| n.is_finite())
    }

    pub fn as_bool(&self) -> bool {
        matches!(self, FieldValue::Bool(true))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

/// Values keyed by expression token (`r0c1`).
pub type CalcValues = BTreeMap<String, FieldValue>;

/// Longest prefix of `s` (after leading whitespace) that reads as a decimal
/// number, e.g. `" 12.5kg"` → `12.5`.
fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac = end + 1;
        while frac < bytes.len() && bytes[frac].is_ascii_digit() {
            frac += 1;
            digits += 1;
        }
        end = frac;
    }
    if digits == 0 {
        return None;
    }
    // exponent only counts when followed by at least one digit
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let start = exp;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > start {
            end = exp;
        }
    }
    s[..end].parse().ok()
}

/// Evaluate `expr` against `values`. Returns `NaN` for an empty expression,
/// disallowed characters, malformed arithmetic or a non-finite result.
pub fn evaluate_expression(expr: &str, values: &CalcValues) -> f64 {
    if expr.is_empty() {
        return f64::NAN;
    }
    let replaced = TOKEN_REGEX.replace_all(expr, |caps: &Captures| {
        let n = values
            .get(&caps[0])
            .and_then(FieldValue::as_number)
            .unwrap_or(0.0);
        format!("{n}")
    });
    if FORBIDDEN_REGEX.is_match(&replaced) {
        return f64::NAN;
    }
    match Parser::new(&replaced).and_then(|mut p| p.parse()) {
        Some(n) if n.is_finite() => n,
        _ => f64::NAN,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Token {
    Num(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(src: &str) -> Option<Vec<Token>> {
    let bytes = src.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'+' => out.push(Token::Plus),
            b'-' => out.push(Token::Minus),
            b'*' => out.push(Token::Star),
            b'/' => out.push(Token::Slash),
            b'(' => out.push(Token::LParen),
            b')' => out.push(Token::RParen),
            b'0'..=b'9' | b'.' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                let literal = &src[start..i];
                // "1.2.3" and a lone "." are not numbers
                if literal.matches('.').count() > 1 || literal == "." {
                    return None;
                }
                out.push(Token::Num(literal.parse().ok()?));
                continue;
            }
            _ if b.is_ascii_whitespace() => {}
            _ => {
                // non-ASCII whitespace passed the allow-list
                let ch = src[i..].chars().next()?;
                if !ch.is_whitespace() {
                    return None;
                }
                i += ch.len_utf8();
                continue;
            }
        }
        i += 1;
    }
    Some(out)
}

/// Recursive-descent parser with the usual precedence:
/// `expr := term (('+'|'-') term)*`, `term := unary (('*'|'/') unary)*`,
/// `unary := ('+'|'-') unary | primary`, `primary := number | '(' expr ')'`.
///
/// Nesting deeper than [`MAX_DEPTH`] fails the parse instead of recursing on.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(src: &str) -> Option<Self> {
        Some(Parser {
            tokens: tokenize(src)?,
            pos: 0,
            depth: 0,
        })
    }

    /// Run `f` one nesting level deeper.
    fn nested(&mut self, f: impl FnOnce(&mut Self) -> Option<f64>) -> Option<f64> {
        if self.depth >= MAX_DEPTH {
            return None;
        }
        self.depth += 1;
        let value = f(self);
        self.depth -= 1;
        value
    }

    fn parse(&mut self) -> Option<f64> {
        let value = self.expr()?;
        (self.pos == self.tokens.len()).then_some(value)
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.peek()?;
        self.pos += 1;
        Some(t)
    }

    fn expr(&mut self) -> Option<f64> {
        let mut lhs = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = if op == Token::Plus { lhs + rhs } else { lhs - rhs };
        }
        Some(lhs)
    }

    fn term(&mut self) -> Option<f64> {
        let mut lhs = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = if op == Token::Star { lhs * rhs } else { lhs / rhs };
        }
        Some(lhs)
    }

    fn unary(&mut self) -> Option<f64> {
        match self.peek()? {
            Token::Plus => {
                self.pos += 1;
                self.nested(Self::unary)
            }
            Token::Minus => {
                self.pos += 1;
                self.nested(Self::unary).map(|v| -v)
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Option<f64> {
        match self.bump()? {
            Token::Num(n) => Some(n),
            Token::LParen => {
                let inner = self.nested(Self::expr)?;
                (self.bump()? == Token::RParen).then_some(inner)
            }
            _ => None,
        }
    }
}
