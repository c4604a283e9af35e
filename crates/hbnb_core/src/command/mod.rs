//! Command-line input parsing.
//!
//! # Responsibility
//! - Normalize verb-first and call-style input into one `Command` shape.
//! - Parse update payloads (positional or mapping literal) safely.
//! - Define every user-facing command error message.
//!
//! # Invariants
//! - Parsing never touches the registry; validation against live records
//!   happens at dispatch time.
//! - User text is only ever read through the constrained literal grammar.

use crate::model::value::{AttrPairs, AttrValue};
use crate::repo::registry::RegistryError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod literal;
mod parser;
pub mod tokenize;

pub use literal::LiteralError;
pub use parser::parse_line;

/// Registry action named by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Create,
    Show,
    Destroy,
    All,
    Count,
    Update,
}

impl Verb {
    const ALL: [Verb; 6] = [
        Verb::Create,
        Verb::Show,
        Verb::Destroy,
        Verb::All,
        Verb::Count,
        Verb::Update,
    ];

    pub fn all() -> &'static [Verb] {
        &Self::ALL
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Show => "show",
            Self::Destroy => "destroy",
            Self::All => "all",
            Self::Count => "count",
            Self::Update => "update",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|verb| verb.as_str() == value)
    }
}

/// Which grammar produced a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// `verb Type id name value`
    VerbFirst,
    /// `Type.verb(args)`
    CallStyle,
}

/// Attribute payload of an `update` command.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateArgs {
    /// Not an update, or nothing after the id.
    None,
    /// `name value`; the value has already been speculatively read as a
    /// literal.
    Positional {
        name: Option<String>,
        value: Option<AttrValue>,
    },
    /// `{...}` mapping literal, or why it failed to parse.
    Dictionary(Result<AttrPairs, LiteralError>),
}

/// One normalized command: `(verb, type_name, id, rest)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub verb: Verb,
    pub syntax: Syntax,
    pub type_name: Option<String>,
    pub id: Option<String>,
    pub update: UpdateArgs,
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Blank line.
    Empty,
    /// `quit`.
    Quit,
    /// The literal `EOF` command.
    EndOfInput,
    /// `help [topic]`.
    Help(Option<String>),
    Command(Command),
}

/// User-facing command failure. `Display` is the exact printed message.
#[derive(Debug)]
pub enum CommandError {
    MissingClassName,
    UnknownClass,
    MissingInstanceId,
    InstanceNotFound,
    MissingAttributeName,
    MissingAttributeValue,
    InvalidDictionary(LiteralError),
    UnknownSyntax(String),
    Storage(RegistryError),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingClassName => f.write_str("** class name missing **"),
            Self::UnknownClass => f.write_str("** class doesn't exist **"),
            Self::MissingInstanceId => f.write_str("** instance id missing **"),
            Self::InstanceNotFound => f.write_str("** no instance found **"),
            Self::MissingAttributeName => f.write_str("** attribute name missing **"),
            Self::MissingAttributeValue => f.write_str("** value missing **"),
            Self::InvalidDictionary(_) => f.write_str("** invalid dictionary format **"),
            Self::UnknownSyntax(line) => write!(f, "*** Unknown syntax: {line}"),
            Self::Storage(err) => write!(f, "** storage error: {err} **"),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDictionary(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegistryError> for CommandError {
    fn from(value: RegistryError) -> Self {
        match value {
            RegistryError::NotFound { .. } => Self::InstanceNotFound,
            other => Self::Storage(other),
        }
    }
}
