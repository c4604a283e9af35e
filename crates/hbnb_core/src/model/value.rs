//! Tagged attribute values.
//!
//! # Responsibility
//! - Hold user-assigned attribute values without runtime reflection.
//! - Bridge values to the JSON wire shape and to the display form.
//!
//! # Invariants
//! - `Float` values are always finite (JSON has no NaN/inf).
//! - `Map` keeps insertion order, both in memory and on the wire.
//! - `Display` output is readable back by `command::literal::parse_literal`.

use serde_json::{Map, Number, Value};
use std::fmt::{Display, Formatter, Write};

/// Ordered attribute name -> value pairs.
pub type AttrPairs = Vec<(String, AttrValue)>;

/// One open-ended attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`; kept apart so they survive a reload.
    UInt(u64),
    Float(f64),
    Str(String),
    List(Vec<AttrValue>),
    Map(AttrPairs),
}

impl AttrValue {
    /// Converts this value into its JSON wire representation.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(value) => Value::Bool(*value),
            Self::Int(value) => Value::Number(Number::from(*value)),
            Self::UInt(value) => Value::Number(Number::from(*value)),
            // Non-finite floats are rejected at construction; `Null` keeps the
            // conversion total.
            Self::Float(value) => Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Str(value) => Value::String(value.clone()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(pairs) => {
                let mut map = Map::with_capacity(pairs.len());
                for (key, value) in pairs {
                    map.insert(key.clone(), value.to_json());
                }
                Value::Object(map)
            }
        }
    }
}

impl From<Value> for AttrValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(value),
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Self::Int(int)
                } else if let Some(uint) = number.as_u64() {
                    Self::UInt(uint)
                } else {
                    Self::Float(number.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(text) => Self::Str(text),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl Display for AttrValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(value) => write!(f, "{value}"),
            Self::UInt(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:?}"),
            Self::Str(text) => f.write_str(&quote_text(text)),
            Self::List(items) => {
                f.write_char('[')?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_char(']')
            }
            Self::Map(pairs) => write_pairs(f, pairs.iter().map(|(k, v)| (k.as_str(), v))),
        }
    }
}

/// Writes `{'key': value, ...}` for the given pairs.
pub(crate) fn write_pairs<'a>(
    f: &mut impl Write,
    pairs: impl Iterator<Item = (&'a str, &'a AttrValue)>,
) -> std::fmt::Result {
    f.write_char('{')?;
    for (index, (key, value)) in pairs.enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}: {value}", quote_text(key))?;
    }
    f.write_char('}')
}

/// Quotes text the way the display form expects.
///
/// Single quotes are preferred; double quotes are used when the text holds a
/// single quote but no double quote.
pub(crate) fn quote_text(text: &str) -> String {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
