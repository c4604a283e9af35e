//! Persistence backends for the registry's object set.
//!
//! # Responsibility
//! - Move the whole serialized object set to and from durable storage.
//! - Keep I/O and JSON encoding details out of the registry.
//!
//! # Invariants
//! - `save` always writes the full object set; there are no partial writes.
//! - `load` distinguishes "never written" (`Ok(None)`) from undecodable
//!   content (`StoreError::Malformed`).

use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Composite key -> serialized record mapping, as persisted.
pub type StoredObjects = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Malformed(serde_json::Error),
    Encode(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Malformed(err) => write!(f, "malformed storage content: {err}"),
            Self::Encode(err) => write!(f, "failed to encode objects: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Malformed(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Whole-set object persistence contract.
pub trait ObjectStore {
    /// Reads the persisted object set, `None` when nothing was ever saved.
    fn load(&self) -> StoreResult<Option<StoredObjects>>;
    /// Replaces the persisted object set.
    fn save(&self, objects: &StoredObjects) -> StoreResult<()>;
    /// Short backend label for diagnostics.
    fn describe(&self) -> String;
}

impl<S: ObjectStore + ?Sized> ObjectStore for &S {
    fn load(&self) -> StoreResult<Option<StoredObjects>> {
        (**self).load()
    }

    fn save(&self, objects: &StoredObjects) -> StoreResult<()> {
        (**self).save(objects)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Decodes persisted text into an object set.
pub(crate) fn decode_objects(text: &str) -> StoreResult<StoredObjects> {
    serde_json::from_str::<StoredObjects>(text).map_err(StoreError::Malformed)
}

/// Encodes an object set into persisted text.
pub(crate) fn encode_objects(objects: &StoredObjects) -> StoreResult<String> {
    serde_json::to_string(objects).map_err(StoreError::Encode)
}
