//! Record domain model.
//!
//! # Responsibility
//! - Define the identity-bearing attribute bag managed by the registry.
//! - Encode/decode the record's persisted mapping shape.
//! - Produce the human-readable display form.
//!
//! # Invariants
//! - `id` is generated once and never reassigned.
//! - `created_at` is fixed at creation; `updated_at >= created_at` after any
//!   local mutation.
//! - Timestamps carry microsecond precision, so encode/decode is lossless.
//! - Reserved attribute names never appear in the free-form attribute bag.

use crate::model::value::{write_pairs, AttrPairs, AttrValue};
use chrono::{NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque record identifier.
///
/// Freshly created records use UUIDv4 text; persisted identifiers are kept
/// verbatim, whatever their shape.
pub type RecordId = String;

/// Wire key carrying the record type name.
pub const CLASS_KEY: &str = "__class__";
/// Timestamp wire format, always written with six fractional digits.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
/// Accepted on read; the fractional part is optional.
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const RESERVED_ATTRIBUTES: &[&str] = &["id", "created_at", "updated_at", CLASS_KEY];

/// Closed set of record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecordType {
    BaseModel,
    User,
    Amenity,
    Place,
    Review,
    State,
    City,
}

impl RecordType {
    const ALL: [RecordType; 7] = [
        RecordType::BaseModel,
        RecordType::User,
        RecordType::Amenity,
        RecordType::Place,
        RecordType::Review,
        RecordType::State,
        RecordType::City,
    ];

    /// Returns every known record type.
    pub fn all() -> &'static [RecordType] {
        &Self::ALL
    }

    /// Returns the wire/command spelling of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BaseModel => "BaseModel",
            Self::User => "User",
            Self::Amenity => "Amenity",
            Self::Place => "Place",
            Self::Review => "Review",
            Self::State => "State",
            Self::City => "City",
        }
    }

    /// Parses a case-sensitive type name; unknown names yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == value)
    }
}

impl Display for RecordType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the registry key `Type.id`.
pub fn composite_key(kind: RecordType, id: &str) -> String {
    format!("{}.{id}", kind.as_str())
}

/// Returns whether `name` is managed by the record itself.
pub fn is_reserved_attribute(name: &str) -> bool {
    RESERVED_ATTRIBUTES.contains(&name)
}

/// Error raised when a persisted mapping cannot become a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordDecodeError {
    MissingField(&'static str),
    InvalidField { field: &'static str, reason: String },
}

impl Display for RecordDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing field `{field}`"),
            Self::InvalidField { field, reason } => {
                write!(f, "invalid field `{field}`: {reason}")
            }
        }
    }
}

impl Error for RecordDecodeError {}

/// One managed entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: RecordId,
    kind: RecordType,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    attributes: AttrPairs,
}

impl Record {
    /// Creates a fresh record with a generated id.
    ///
    /// The record is not registered anywhere; `Registry::create` owns that.
    pub fn new(kind: RecordType) -> Self {
        let now = now_micros();
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            created_at: now,
            updated_at: now,
            attributes: Vec::new(),
        }
    }

    /// Rebuilds a record from its persisted mapping.
    ///
    /// Every entry is copied verbatim except the type tag; the timestamp
    /// entries are decoded from text. No registration side effect.
    ///
    /// # Errors
    /// - `MissingField` when `id`, `created_at` or `updated_at` is absent.
    /// - `InvalidField` when one of those is not text or not a timestamp.
    pub fn from_attributes(
        kind: RecordType,
        attributes: &Map<String, Value>,
    ) -> Result<Self, RecordDecodeError> {
        let id = match attributes.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(_) => {
                return Err(RecordDecodeError::InvalidField {
                    field: "id",
                    reason: "expected a string".to_string(),
                })
            }
            None => return Err(RecordDecodeError::MissingField("id")),
        };
        let created_at = decode_timestamp(attributes, "created_at")?;
        let updated_at = decode_timestamp(attributes, "updated_at")?;

        let extra = attributes
            .iter()
            .filter(|(key, _)| !is_reserved_attribute(key))
            .map(|(key, value)| (key.clone(), AttrValue::from(value.clone())))
            .collect();

        Ok(Self {
            id,
            kind,
            created_at,
            updated_at,
            attributes: extra,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> RecordType {
        self.kind
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn updated_at(&self) -> NaiveDateTime {
        self.updated_at
    }

    /// Registry key for this record.
    pub fn key(&self) -> String {
        composite_key(self.kind, &self.id)
    }

    /// Free-form attributes in assignment order.
    pub fn attributes(&self) -> &[(String, AttrValue)] {
        &self.attributes
    }

    /// Looks up one free-form attribute.
    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Assigns one free-form attribute, keeping its original position when
    /// it already exists.
    ///
    /// Returns `false` (and changes nothing) for reserved names.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: AttrValue) -> bool {
        let name = name.into();
        if is_reserved_attribute(&name) {
            return false;
        }
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.attributes.push((name, value)),
        }
        true
    }

    /// Refreshes `updated_at` to the current time.
    pub fn touch(&mut self) {
        let now = now_micros();
        // Clock steps backwards must not push `updated_at` behind `created_at`.
        self.updated_at = now.max(self.created_at);
    }

    /// Encodes the record into its persisted mapping.
    ///
    /// Order: `id`, `created_at`, `updated_at`, free-form attributes,
    /// then the type tag.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::with_capacity(self.attributes.len() + 4);
        map.insert("id".to_string(), Value::String(self.id.clone()));
        map.insert(
            "created_at".to_string(),
            Value::String(format_timestamp(self.created_at)),
        );
        map.insert(
            "updated_at".to_string(),
            Value::String(format_timestamp(self.updated_at)),
        );
        for (key, value) in &self.attributes {
            map.insert(key.clone(), value.to_json());
        }
        map.insert(
            CLASS_KEY.to_string(),
            Value::String(self.kind.as_str().to_string()),
        );
        map
    }

    /// Display form: `[Type] (id) {'id': ..., 'created_at': ..., ...}`.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] ({}) ", self.kind, self.id)?;

        let id = AttrValue::Str(self.id.clone());
        let created_at = AttrValue::Str(format_timestamp(self.created_at));
        let updated_at = AttrValue::Str(format_timestamp(self.updated_at));
        let identity = [
            ("id", &id),
            ("created_at", &created_at),
            ("updated_at", &updated_at),
        ];
        let extra = self
            .attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value));

        write_pairs(f, identity.into_iter().chain(extra))
    }
}

/// Formats a timestamp as `YYYY-MM-DDTHH:MM:SS.ffffff`.
pub fn format_timestamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses `YYYY-MM-DDTHH:MM:SS[.ffffff]`.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_PARSE_FORMAT)
}

fn decode_timestamp(
    attributes: &Map<String, Value>,
    field: &'static str,
) -> Result<NaiveDateTime, RecordDecodeError> {
    match attributes.get(field) {
        Some(Value::String(text)) => {
            parse_timestamp(text).map_err(|err| RecordDecodeError::InvalidField {
                field,
                reason: format!("`{text}`: {err}"),
            })
        }
        Some(_) => Err(RecordDecodeError::InvalidField {
            field,
            reason: "expected a string".to_string(),
        }),
        None => Err(RecordDecodeError::MissingField(field)),
    }
}

fn now_micros() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(6)
}
