//! In-memory record registry with whole-set persistence.
//!
//! # Responsibility
//! - Own every live record, keyed by `Type.id`.
//! - Rebuild the record set from the object store at startup.
//! - Rewrite the full record set after every mutation.
//!
//! # Invariants
//! - A record is stored under exactly `record.key()`.
//! - Each mutating call persists at most once, synchronously, before
//!   returning.
//! - Reconstruction from storage never triggers a persist.
//! - A malformed store leaves the registry empty; no partial recovery.

use crate::model::record::{composite_key, Record, RecordDecodeError, RecordId, RecordType};
use crate::model::value::AttrPairs;
use crate::store::{ObjectStore, StoreError, StoredObjects};
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug)]
pub enum RegistryError {
    Store(StoreError),
    NotFound { kind: RecordType, id: RecordId },
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "record not found: {kind}.{id}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::NotFound { .. } => None,
        }
    }
}

impl From<StoreError> for RegistryError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Result of rebuilding the registry from its store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing persisted yet; registry starts empty.
    Missing,
    /// Records restored; `skipped` counts entries with unknown type tags.
    Loaded { loaded: usize, skipped: usize },
    /// Stored content could not be decoded; registry starts empty.
    Malformed { reason: String },
}

/// Process-scoped record registry.
///
/// Constructed once at startup and passed by reference to whoever needs it.
pub struct Registry<S: ObjectStore> {
    store: S,
    objects: BTreeMap<String, Record>,
}

impl<S: ObjectStore> Registry<S> {
    /// Creates an empty registry bound to `store`. Call `load` to restore.
    pub fn new(store: S) -> Self {
        Self {
            store,
            objects: BTreeMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Live key -> record mapping.
    pub fn all(&self) -> &BTreeMap<String, Record> {
        &self.objects
    }

    /// Mutable live mapping. Callers own persisting afterwards.
    pub fn all_mut(&mut self) -> &mut BTreeMap<String, Record> {
        &mut self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Inserts or replaces `record` under its key. Does not persist.
    pub fn register(&mut self, record: Record) -> Option<Record> {
        self.objects.insert(record.key(), record)
    }

    /// Writes the full record set to the store.
    pub fn persist(&self) -> RegistryResult<()> {
        let started_at = Instant::now();
        let objects: StoredObjects = self
            .objects
            .iter()
            .map(|(key, record)| (key.clone(), Value::Object(record.to_map())))
            .collect();

        if let Err(err) = self.store.save(&objects) {
            warn!(
                "event=registry_persist module=registry status=error store={} error={}",
                self.store.describe(),
                err
            );
            return Err(err.into());
        }

        debug!(
            "event=registry_persist module=registry status=ok objects={} duration_ms={}",
            objects.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Replaces the in-memory set with the store's content.
    ///
    /// # Errors
    /// - Only when the store cannot be read at all. Undecodable content is
    ///   reported through `LoadOutcome::Malformed`.
    pub fn load(&mut self) -> RegistryResult<LoadOutcome> {
        let started_at = Instant::now();
        self.objects.clear();

        let stored = match self.store.load() {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                info!(
                    "event=registry_load module=registry status=missing store={}",
                    self.store.describe()
                );
                return Ok(LoadOutcome::Missing);
            }
            Err(StoreError::Malformed(err)) => return Ok(self.malformed(err.to_string())),
            Err(err) => return Err(err.into()),
        };

        let (records, skipped) = match decode_records(stored) {
            Ok(decoded) => decoded,
            Err(reason) => return Ok(self.malformed(reason)),
        };

        let loaded = records.len();
        for record in records {
            self.register(record);
        }

        info!(
            "event=registry_load module=registry status=ok store={} loaded={} skipped={} duration_ms={}",
            self.store.describe(),
            loaded,
            skipped,
            started_at.elapsed().as_millis()
        );
        Ok(LoadOutcome::Loaded { loaded, skipped })
    }

    /// Creates, registers and persists a fresh record of `kind`.
    ///
    /// On a persist failure the record stays registered in memory.
    pub fn create(&mut self, kind: RecordType) -> RegistryResult<RecordId> {
        let record = Record::new(kind);
        let id = record.id().to_string();
        self.register(record);
        info!(
            "event=record_create module=registry status=ok type={}",
            kind
        );
        self.persist()?;
        Ok(id)
    }

    pub fn get(&self, kind: RecordType, id: &str) -> Option<&Record> {
        self.objects.get(&composite_key(kind, id))
    }

    /// Removes one record and persists.
    pub fn destroy(&mut self, kind: RecordType, id: &str) -> RegistryResult<Record> {
        let removed = self
            .objects
            .remove(&composite_key(kind, id))
            .ok_or_else(|| RegistryError::NotFound {
                kind,
                id: id.to_string(),
            })?;
        info!(
            "event=record_destroy module=registry status=ok type={}",
            kind
        );
        self.persist()?;
        Ok(removed)
    }

    /// Applies attribute assignments, refreshes `updated_at`, and persists.
    ///
    /// Reserved names are skipped. When nothing was applied the record is
    /// left untouched and nothing is persisted. Returns the applied count.
    pub fn update(
        &mut self,
        kind: RecordType,
        id: &str,
        assignments: AttrPairs,
    ) -> RegistryResult<usize> {
        let record = self
            .objects
            .get_mut(&composite_key(kind, id))
            .ok_or_else(|| RegistryError::NotFound {
                kind,
                id: id.to_string(),
            })?;

        let requested = assignments.len();
        let mut applied = 0;
        for (name, value) in assignments {
            if record.set_attribute(name, value) {
                applied += 1;
            }
        }
        if applied == 0 {
            debug!(
                "event=record_update module=registry status=noop type={} requested={}",
                kind, requested
            );
            return Ok(0);
        }

        record.touch();
        info!(
            "event=record_update module=registry status=ok type={} applied={} skipped={}",
            kind,
            applied,
            requested - applied
        );
        self.persist()?;
        Ok(applied)
    }

    /// Number of registered records of `kind`.
    pub fn count(&self, kind: RecordType) -> usize {
        let prefix = format!("{}.", kind.as_str());
        self.objects
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .count()
    }

    /// Records in key order, optionally restricted to one type.
    pub fn records(&self, kind: Option<RecordType>) -> impl Iterator<Item = &Record> {
        self.objects
            .values()
            .filter(move |record| kind.map_or(true, |kind| record.kind() == kind))
    }

    fn malformed(&mut self, reason: String) -> LoadOutcome {
        self.objects.clear();
        warn!(
            "event=registry_load module=registry status=malformed store={} reason={}",
            self.store.describe(),
            reason
        );
        LoadOutcome::Malformed { reason }
    }
}

/// Decodes every stored entry; unknown type tags are skipped.
fn decode_records(stored: StoredObjects) -> Result<(Vec<Record>, usize), String> {
    let mut records = Vec::with_capacity(stored.len());
    let mut skipped = 0;

    for (key, entry) in stored {
        let Value::Object(attributes) = entry else {
            return Err(format!("entry `{key}` is not an object"));
        };
        let Some(tag) = attributes.get(crate::model::record::CLASS_KEY) else {
            return Err(format!("entry `{key}` has no type tag"));
        };
        let kind = match serde_json::from_value::<RecordType>(tag.clone()) {
            Ok(kind) => kind,
            Err(_) => {
                debug!(
                    "event=registry_load module=registry status=skip reason=unknown_type"
                );
                skipped += 1;
                continue;
            }
        };
        let record = Record::from_attributes(kind, &attributes)
            .map_err(|err: RecordDecodeError| format!("entry `{key}`: {err}"))?;
        records.push(record);
    }

    Ok((records, skipped))
}
