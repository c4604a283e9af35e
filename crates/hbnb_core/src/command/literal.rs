//! Constrained literal-value parser.
//!
//! # Responsibility
//! - Turn user text into `AttrValue` for update commands.
//! - Accept only an enumerable grammar; never evaluate expressions.
//!
//! # Grammar
//! - strings: `'...'` or `"..."` with `\\ \' \" \n \r \t \0` escapes
//! - integers (i64, or u64 above `i64::MAX`) and finite floats, optional sign
//!   and exponent
//! - `True`/`False`/`None` (also `true`/`false`/`null`)
//! - lists `[a, b]`, tuples `(a, b)` (read as lists), mappings `{'k': v}`
//!   with string keys; trailing commas allowed
//!
//! # Invariants
//! - Nesting deeper than `MAX_DEPTH` is rejected, never recursed into.
//! - The whole input must be consumed; trailing text is an error.

use crate::model::value::{AttrPairs, AttrValue};
use std::error::Error;
use std::fmt::{Display, Formatter};

const MAX_DEPTH: usize = 32;

/// Literal parse failure; `position` is a char offset into the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralError {
    UnexpectedEnd,
    UnexpectedChar { position: usize, found: char },
    UnknownWord { position: usize, word: String },
    InvalidNumber { position: usize, text: String },
    UnterminatedString { position: usize },
    NonStringKey { position: usize },
    TrailingInput { position: usize },
    TooDeep,
    NotAMapping,
}

impl Display for LiteralError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedEnd => write!(f, "unexpected end of input"),
            Self::UnexpectedChar { position, found } => {
                write!(f, "unexpected `{found}` at {position}")
            }
            Self::UnknownWord { position, word } => {
                write!(f, "unknown name `{word}` at {position}")
            }
            Self::InvalidNumber { position, text } => {
                write!(f, "invalid number `{text}` at {position}")
            }
            Self::UnterminatedString { position } => {
                write!(f, "unterminated string starting at {position}")
            }
            Self::NonStringKey { position } => {
                write!(f, "mapping key at {position} is not a string")
            }
            Self::TrailingInput { position } => write!(f, "unexpected input at {position}"),
            Self::TooDeep => write!(f, "nesting deeper than {MAX_DEPTH} levels"),
            Self::NotAMapping => write!(f, "expected a mapping literal"),
        }
    }
}

impl Error for LiteralError {}

/// Parses exactly one literal value from `input`.
pub fn parse_literal(input: &str) -> Result<AttrValue, LiteralError> {
    let mut parser = LiteralParser::new(input);
    parser.skip_ws();
    let value = parser.value(0)?;
    parser.skip_ws();
    match parser.peek() {
        None => Ok(value),
        Some(_) => Err(LiteralError::TrailingInput {
            position: parser.pos,
        }),
    }
}

/// Parses a mapping literal such as `{'name': 'x', 'age': 3}`.
pub fn parse_mapping(input: &str) -> Result<AttrPairs, LiteralError> {
    match parse_literal(input)? {
        AttrValue::Map(pairs) => Ok(pairs),
        _ => Err(LiteralError::NotAMapping),
    }
}

/// Reads `input` as a literal when possible, else keeps it as text.
pub fn speculate_literal(input: &str) -> AttrValue {
    parse_literal(input).unwrap_or_else(|_| AttrValue::Str(input.to_string()))
}

struct LiteralParser {
    chars: Vec<char>,
    pos: usize,
}

impl LiteralParser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(found) => Err(LiteralError::UnexpectedChar {
                position: self.pos - 1,
                found,
            }),
            None => Err(LiteralError::UnexpectedEnd),
        }
    }

    fn value(&mut self, depth: usize) -> Result<AttrValue, LiteralError> {
        if depth > MAX_DEPTH {
            return Err(LiteralError::TooDeep);
        }
        match self.peek() {
            None => Err(LiteralError::UnexpectedEnd),
            Some('\'' | '"') => self.string().map(AttrValue::Str),
            Some('[') => self.sequence(']', depth).map(AttrValue::List),
            Some('(') => self.parenthesized(depth),
            Some('{') => self.mapping(depth).map(AttrValue::Map),
            Some(c) if c.is_ascii_digit() || matches!(c, '+' | '-' | '.') => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.word(),
            Some(found) => Err(LiteralError::UnexpectedChar {
                position: self.pos,
                found,
            }),
        }
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let start = self.pos;
        let quote = self.bump().ok_or(LiteralError::UnexpectedEnd)?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(LiteralError::UnterminatedString { position: start }),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    None => return Err(LiteralError::UnterminatedString { position: start }),
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('t') => out.push('\t'),
                    Some('0') => out.push('\0'),
                    Some(c @ ('\\' | '\'' | '"')) => out.push(c),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<AttrValue, LiteralError> {
        let start = self.pos;
        let mut text = String::new();
        if let Some(sign @ ('+' | '-')) = self.peek() {
            text.push(sign);
            self.pos += 1;
        }

        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => text.push(c),
                '.' => {
                    is_float = true;
                    text.push(c);
                }
                'e' | 'E' => {
                    is_float = true;
                    text.push(c);
                    if let Some(sign @ ('+' | '-')) = self.chars.get(self.pos + 1).copied() {
                        text.push(sign);
                        self.pos += 1;
                    }
                }
                _ => break,
            }
            self.pos += 1;
        }

        let invalid = || LiteralError::InvalidNumber {
            position: start,
            text: text.clone(),
        };

        if is_float {
            return match text.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(AttrValue::Float(value)),
                _ => Err(invalid()),
            };
        }

        let digits = text.trim_start_matches(|c: char| c == '+' || c == '-');
        if digits.is_empty() || (digits.len() > 1 && digits.starts_with('0')) {
            return Err(invalid());
        }
        text.parse::<i64>()
            .map(AttrValue::Int)
            .or_else(|_| text.parse::<u64>().map(AttrValue::UInt))
            .map_err(|_| invalid())
    }

    fn word(&mut self) -> Result<AttrValue, LiteralError> {
        let start = self.pos;
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            word.push(c);
            self.pos += 1;
        }
        match word.as_str() {
            "True" | "true" => Ok(AttrValue::Bool(true)),
            "False" | "false" => Ok(AttrValue::Bool(false)),
            "None" | "null" => Ok(AttrValue::Null),
            _ => Err(LiteralError::UnknownWord {
                position: start,
                word,
            }),
        }
    }

    /// Comma-separated values up to `close`. Returns the items and whether a
    /// separating comma was seen.
    fn items(&mut self, close: char, depth: usize) -> Result<(Vec<AttrValue>, bool), LiteralError> {
        self.pos += 1;
        let mut items = Vec::new();
        let mut saw_comma = false;
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok((items, saw_comma));
            }
            items.push(self.value(depth + 1)?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    saw_comma = true;
                    self.pos += 1;
                }
                Some(c) if c == close => {}
                Some(found) => {
                    return Err(LiteralError::UnexpectedChar {
                        position: self.pos,
                        found,
                    })
                }
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    fn sequence(&mut self, close: char, depth: usize) -> Result<Vec<AttrValue>, LiteralError> {
        self.items(close, depth).map(|(items, _)| items)
    }

    /// `(x)` is just `x`; `()`, `(x,)` and `(x, y)` are tuples.
    fn parenthesized(&mut self, depth: usize) -> Result<AttrValue, LiteralError> {
        let (mut items, saw_comma) = self.items(')', depth)?;
        if items.len() == 1 && !saw_comma {
            return Ok(items.remove(0));
        }
        Ok(AttrValue::List(items))
    }

    fn mapping(&mut self, depth: usize) -> Result<AttrPairs, LiteralError> {
        self.pos += 1;
        let mut pairs: AttrPairs = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(pairs);
            }

            let key_position = self.pos;
            let key = match self.value(depth + 1)? {
                AttrValue::Str(key) => key,
                _ => {
                    return Err(LiteralError::NonStringKey {
                        position: key_position,
                    })
                }
            };
            self.skip_ws();
            self.expect(':')?;
            self.skip_ws();
            let value = self.value(depth + 1)?;

            match pairs.iter_mut().find(|(existing, _)| *existing == key) {
                Some((_, slot)) => *slot = value,
                None => pairs.push((key, value)),
            }

            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {}
                Some(found) => {
                    return Err(LiteralError::UnexpectedChar {
                        position: self.pos,
                        found,
                    })
                }
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }
}
