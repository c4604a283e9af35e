//! In-process backend for tests and throwaway sessions.

use super::{decode_objects, encode_objects, ObjectStore, StoreResult, StoredObjects};
use std::cell::RefCell;

/// Keeps the last saved JSON text in memory.
///
/// Goes through the same encode/decode path as the file backend, so wire
/// shape problems surface identically.
#[derive(Debug, Default)]
pub struct MemoryStore {
    text: RefCell<Option<String>>,
    saves: RefCell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from pre-existing persisted text, valid or not.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: RefCell::new(Some(text.into())),
            saves: RefCell::new(0),
        }
    }

    /// Last persisted text, if any.
    pub fn text(&self) -> Option<String> {
        self.text.borrow().clone()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl ObjectStore for MemoryStore {
    fn load(&self) -> StoreResult<Option<StoredObjects>> {
        match self.text.borrow().as_deref() {
            Some(text) => decode_objects(text).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, objects: &StoredObjects) -> StoreResult<()> {
        let text = encode_objects(objects)?;
        *self.text.borrow_mut() = Some(text);
        *self.saves.borrow_mut() += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
