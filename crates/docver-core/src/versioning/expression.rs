//! Condition expressions of standard versioning filters
//!
//! A condition is a small boolean expression over the document before the
//! save (`previousDocument`) and the document being saved (`currentDocument`):
//!
//! ```text
//! currentDocument.dc.title != previousDocument.dc.title && !currentDocument.hasFacet('Frozen')
//! ```
//!
//! Conditions are normalized into a `#{...}` template guarded against a
//! missing previous document (see [`normalize_condition`]), then parsed once
//! at registration time. Evaluation never fails: unknown properties resolve to
//! null and anything that is not `true` is false.

use docver_common::{DocverError, Result};
use serde_json::Value;

use crate::document::Document;

pub const PREVIOUS_DOCUMENT: &str = "previousDocument";
pub const CURRENT_DOCUMENT: &str = "currentDocument";

const TEMPLATE_OPEN: &str = "#{";
const ALT_TEMPLATE_OPEN: &str = "${";
const TEMPLATE_CLOSE: char = '}';

/// Wrap a condition into its evaluated `#{...}` form.
///
/// - `${...}` expressions pass through unchanged
/// - an expression starting with `previousDocument` is only wrapped
/// - anything else gets the `previousDocument != null && ` guard
///
/// Both bare and `#{...}`-wrapped inputs are accepted.
///
/// ```
/// use docver_core::versioning::normalize_condition;
///
/// assert_eq!(
///     normalize_condition("currentDocument.dc.title == 'x'"),
///     "#{previousDocument != null && currentDocument.dc.title == 'x'}"
/// );
/// assert_eq!(normalize_condition("${currentDocument.checkedOut}"), "${currentDocument.checkedOut}");
/// ```
pub fn normalize_condition(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with(ALT_TEMPLATE_OPEN) {
        return trimmed.to_string();
    }

    let inner = trimmed
        .strip_prefix(TEMPLATE_OPEN)
        .and_then(|s| s.strip_suffix(TEMPLATE_CLOSE))
        .map(str::trim)
        .unwrap_or(trimmed);

    if inner.starts_with(PREVIOUS_DOCUMENT) {
        format!("{TEMPLATE_OPEN}{inner}{TEMPLATE_CLOSE}")
    } else {
        format!("{TEMPLATE_OPEN}{PREVIOUS_DOCUMENT} != null && {inner}{TEMPLATE_CLOSE}")
    }
}

/// Expression body of a normalized template
fn template_body(normalized: &str) -> Option<&str> {
    normalized
        .strip_prefix(TEMPLATE_OPEN)
        .or_else(|| normalized.strip_prefix(ALT_TEMPLATE_OPEN))
        .and_then(|s| s.strip_suffix(TEMPLATE_CLOSE))
}

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Number(f64),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Comma,
    And,
    Or,
    Not,
    Eq,
    Ne,
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '(' | ')' | '[' | ']' | '.' | ',' => {
                tokens.push(match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '.' => Token::Dot,
                    _ => Token::Comma,
                });
                i += 1;
            },
            '&' | '|' | '=' => {
                if next != Some(c) {
                    return Err(format!("expected '{c}{c}' at offset {i}"));
                }
                tokens.push(match c {
                    '&' => Token::And,
                    '|' => Token::Or,
                    _ => Token::Eq,
                });
                i += 2;
            },
            '!' if next == Some('=') => {
                tokens.push(Token::Ne);
                i += 2;
            },
            '!' => {
                tokens.push(Token::Not);
                i += 1;
            },
            '\'' | '"' => {
                let quote = c;
                let mut value = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err("unterminated string literal".to_string()),
                        Some('\\') => {
                            let escaped = chars
                                .get(i + 1)
                                .ok_or_else(|| "unterminated string literal".to_string())?;
                            value.push(*escaped);
                            i += 2;
                        },
                        Some(&ch) if ch == quote => {
                            i += 1;
                            break;
                        },
                        Some(&ch) => {
                            value.push(ch);
                            i += 1;
                        },
                    }
                }
                tokens.push(Token::Str(value));
            },
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if chars.get(i) == Some(&'.') && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()) {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let number = text
                    .parse::<f64>()
                    .map_err(|e| format!("invalid number '{text}': {e}"))?;
                tokens.push(Token::Number(number));
            },
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "eq" => Token::Eq,
                    "ne" => Token::Ne,
                    _ => Token::Ident(word),
                });
            },
            other => return Err(format!("unexpected character '{other}' at offset {i}")),
        }
    }

    Ok(tokens)
}

// ============================================================================
// Syntax tree
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    Previous,
    Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    HasFacet,
    HasSchema,
}

impl Method {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "hasFacet" => Some(Method::HasFacet),
            "hasSchema" => Some(Method::HasSchema),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Path { root: Root, segments: Vec<String> },
    Call { root: Root, method: Method, args: Vec<Expr> },
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare { left: Box<Expr>, right: Box<Expr>, negate: bool },
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> std::result::Result<(), String> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(format!("expected {:?}, found {:?}", expected, self.peek()))
        }
    }

    fn parse(mut self) -> std::result::Result<Expr, String> {
        if self.tokens.is_empty() {
            return Err("empty expression".to_string());
        }
        let expr = self.parse_or()?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(format!("unexpected trailing {:?}", token)),
        }
    }

    fn parse_or(&mut self) -> std::result::Result<Expr, String> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> std::result::Result<Expr, String> {
        let mut left = self.parse_unary()?;
        while self.eat(&Token::And) {
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> std::result::Result<Expr, String> {
        if self.eat(&Token::Not) {
            return Ok(Expr::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> std::result::Result<Expr, String> {
        let left = self.parse_primary()?;
        let negate = match self.peek() {
            Some(Token::Eq) => false,
            Some(Token::Ne) => true,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.parse_primary()?;
        Ok(Expr::Compare {
            left: Box::new(left),
            right: Box::new(right),
            negate,
        })
    }

    fn parse_primary(&mut self) -> std::result::Result<Expr, String> {
        match self.next() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            },
            Some(Token::Str(value)) => Ok(Expr::Literal(Value::String(value))),
            Some(Token::Number(value)) => Ok(Expr::Literal(Value::from(value))),
            Some(Token::Ident(word)) => match word.as_str() {
                "null" => Ok(Expr::Literal(Value::Null)),
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                PREVIOUS_DOCUMENT => self.parse_path(Root::Previous),
                CURRENT_DOCUMENT => self.parse_path(Root::Current),
                other => Err(format!("unknown identifier '{other}'")),
            },
            Some(token) => Err(format!("unexpected {:?}", token)),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    fn parse_path(&mut self, root: Root) -> std::result::Result<Expr, String> {
        let mut segments = Vec::new();
        loop {
            if self.eat(&Token::Dot) {
                let name = match self.next() {
                    Some(Token::Ident(name)) => name,
                    other => return Err(format!("expected a name after '.', found {:?}", other)),
                };
                if self.peek() == Some(&Token::LParen) {
                    return self.parse_call(root, &segments, &name);
                }
                segments.push(name);
            } else if self.eat(&Token::LBracket) {
                match self.next() {
                    Some(Token::Str(key)) => segments.push(key),
                    other => return Err(format!("expected a quoted key in [...], found {:?}", other)),
                }
                self.expect(&Token::RBracket)?;
            } else {
                return Ok(Expr::Path { root, segments });
            }
        }
    }

    fn parse_call(
        &mut self,
        root: Root,
        segments: &[String],
        name: &str,
    ) -> std::result::Result<Expr, String> {
        let method = Method::parse(name).ok_or_else(|| format!("unknown method '{name}'"))?;
        if !segments.is_empty() {
            return Err(format!("'{name}' can only be called on a document"));
        }
        self.expect(&Token::LParen)?;
        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.parse_or()?);
                if self.eat(&Token::RParen) {
                    break;
                }
                self.expect(&Token::Comma)?;
            }
        }
        if args.len() != 1 {
            return Err(format!("'{name}' takes exactly one argument"));
        }
        Ok(Expr::Call { root, method, args })
    }
}

// ============================================================================
// Evaluation
// ============================================================================

struct Scope<'a> {
    previous: Option<&'a Document>,
    current: &'a Document,
}

impl<'a> Scope<'a> {
    fn document(&self, root: Root) -> Option<&'a Document> {
        match root {
            Root::Previous => self.previous,
            Root::Current => Some(self.current),
        }
    }
}

fn document_field(doc: &Document, name: &str) -> Option<Value> {
    let value = match name {
        "type" => Value::String(doc.doc_type.clone()),
        "name" => Value::String(doc.name.clone()),
        "id" => Value::String(doc.id.to_string()),
        "checkedOut" | "isCheckedOut" => Value::Bool(doc.is_checked_out()),
        "versionable" | "isVersionable" => Value::Bool(doc.is_versionable()),
        "currentLifeCycleState" | "lifeCycleState" => doc
            .lifecycle_state
            .clone()
            .map(Value::String)
            .unwrap_or(Value::Null),
        "versionLabel" => Value::String(doc.version_label()),
        "majorVersion" => Value::from(doc.version.major),
        "minorVersion" => Value::from(doc.version.minor),
        _ => return None,
    };
    Some(value)
}

fn index(value: Value, segment: &str) -> Value {
    match value {
        Value::Object(mut map) => map.remove(segment).unwrap_or(Value::Null),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i).cloned())
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// A bare root resolves to the document id so that `!= null` and document
/// equality both work.
fn resolve(doc: Option<&Document>, segments: &[String]) -> Value {
    let Some(doc) = doc else {
        return Value::Null;
    };
    let Some((first, rest)) = segments.split_first() else {
        return Value::String(doc.id.to_string());
    };
    let property = |key: &str| doc.property(key).cloned().unwrap_or(Value::Null);

    let (value, rest) = match document_field(doc, first) {
        Some(value) => (value, rest),
        None if first.contains(':') => (property(first.as_str()), rest),
        None => match rest.split_first() {
            // `dc.title` is the `dc:title` property
            Some((second, rest)) => (property(format!("{first}:{second}").as_str()), rest),
            None => (Value::Null, rest),
        },
    };
    rest.iter().fold(value, |value, segment| index(value, segment))
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

fn truthy(value: &Value) -> bool {
    matches!(value, Value::Bool(true))
}

impl Expr {
    fn evaluate(&self, scope: &Scope<'_>) -> Value {
        match self {
            Expr::Literal(value) => value.clone(),
            Expr::Path { root, segments } => resolve(scope.document(*root), segments),
            Expr::Call { root, method, args } => {
                let Some(doc) = scope.document(*root) else {
                    return Value::Bool(false);
                };
                let argument = args.first().map(|arg| arg.evaluate(scope));
                let Some(Value::String(name)) = argument else {
                    return Value::Bool(false);
                };
                Value::Bool(match method {
                    Method::HasFacet => doc.has_facet(&name),
                    Method::HasSchema => doc.has_schema(&name),
                })
            },
            Expr::Not(inner) => Value::Bool(!truthy(&inner.evaluate(scope))),
            Expr::And(left, right) => {
                Value::Bool(truthy(&left.evaluate(scope)) && truthy(&right.evaluate(scope)))
            },
            Expr::Or(left, right) => {
                Value::Bool(truthy(&left.evaluate(scope)) || truthy(&right.evaluate(scope)))
            },
            Expr::Compare {
                left,
                right,
                negate,
            } => Value::Bool(values_equal(&left.evaluate(scope), &right.evaluate(scope)) != *negate),
        }
    }
}

/// A parsed, normalized condition
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    source: String,
    normalized: String,
    expr: Expr,
}

impl Condition {
    /// Normalize and parse `source`; malformed expressions are rejected here
    pub fn parse(source: &str) -> Result<Self> {
        let normalized = normalize_condition(source);
        let body = template_body(&normalized)
            .ok_or_else(|| DocverError::invalid_expression(source, "unbalanced template delimiters"))?;
        let tokens = tokenize(body).map_err(|reason| DocverError::invalid_expression(source, reason))?;
        let expr = Parser { tokens, pos: 0 }
            .parse()
            .map_err(|reason| DocverError::invalid_expression(source, reason))?;

        Ok(Self {
            source: source.to_string(),
            normalized,
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn evaluate(&self, previous: Option<&Document>, current: &Document) -> bool {
        truthy(&self.expr.evaluate(&Scope { previous, current }))
    }
}

impl std::str::FromStr for Condition {
    type Err = DocverError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
