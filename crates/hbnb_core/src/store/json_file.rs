//! Flat JSON file backend.

use super::{decode_objects, encode_objects, ObjectStore, StoreResult, StoredObjects};
use log::{error, info};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Backing file holding one JSON object keyed by `Type.id`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ObjectStore for JsonFileStore {
    fn load(&self) -> StoreResult<Option<StoredObjects>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                error!(
                    "event=store_read module=store status=error backend=file error={}",
                    err
                );
                return Err(err.into());
            }
        };
        decode_objects(&text).map(Some)
    }

    fn save(&self, objects: &StoredObjects) -> StoreResult<()> {
        let started_at = Instant::now();
        let text = encode_objects(objects)?;

        if let Err(err) = std::fs::write(&self.path, text.as_bytes()) {
            error!(
                "event=store_write module=store status=error backend=file duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }

        info!(
            "event=store_write module=store status=ok backend=file objects={} bytes={} duration_ms={}",
            objects.len(),
            text.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
