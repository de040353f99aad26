#![forbid(unsafe_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::{Collections, MesaStore, StorageError};

const STAGING_FILE: &str = "staging.json";
const CANONICAL_MENU_FILE: &str = "canonical-menu.json";
const CANONICAL_OCCUPANCY_FILE: &str = "canonical-occupancy.json";
const PROFILES_FILE: &str = "profiles.json";
const PRODUCTS_FILE: &str = "products.json";
const PUBLISHED_FILE: &str = "published.json";
const AUDIT_FILE: &str = "audit.json";

/// File-backed snapshot of the store: one plain JSON array per logical
/// collection under a data directory.
///
/// Each save writes the collection to `<name>.json.tmp` and renames it
/// over the target, so a crash never leaves a partial file. There is no
/// cross-writer guard: two concurrent savers race and the later rename
/// silently wins. Callers needing multi-writer correctness must
/// serialize saves or add an optimistic-concurrency token.
#[derive(Debug, Clone)]
pub struct JsonSnapshot {
    dir: PathBuf,
}

fn write_array<T: Serialize>(dir: &Path, name: &str, rows: &[T]) -> Result<(), StorageError> {
    let path = dir.join(name);
    let tmp = dir.join(format!("{name}.tmp"));
    let bytes = serde_json::to_vec_pretty(rows).map_err(|e| StorageError::Corrupt {
        path: path.clone(),
        source: e,
    })?;
    fs::write(&tmp, bytes).map_err(|e| StorageError::Io {
        path: tmp.clone(),
        source: e,
    })?;
    fs::rename(&tmp, &path).map_err(|e| StorageError::Io { path, source: e })
}

fn read_array<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Vec<T>, StorageError> {
    let path = dir.join(name);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::Io { path, source: e }),
    };
    serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupt { path, source: e })
}

impl JsonSnapshot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, store: &MesaStore) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| StorageError::Io {
            path: self.dir.clone(),
            source: e,
        })?;
        let collections = store.to_collections();
        write_array(&self.dir, STAGING_FILE, &collections.staging)?;
        write_array(&self.dir, CANONICAL_MENU_FILE, &collections.canonical_menu)?;
        write_array(
            &self.dir,
            CANONICAL_OCCUPANCY_FILE,
            &collections.canonical_occupancy,
        )?;
        write_array(&self.dir, PROFILES_FILE, &collections.profiles)?;
        write_array(&self.dir, PRODUCTS_FILE, &collections.products)?;
        write_array(&self.dir, PUBLISHED_FILE, &collections.published)?;
        write_array(&self.dir, AUDIT_FILE, &collections.audit)
    }

    /// Load a store from disk. Missing files yield empty collections,
    /// so a fresh data directory loads as an empty store.
    pub fn load(&self) -> Result<MesaStore, StorageError> {
        let collections = Collections {
            staging: read_array(&self.dir, STAGING_FILE)?,
            canonical_menu: read_array(&self.dir, CANONICAL_MENU_FILE)?,
            canonical_occupancy: read_array(&self.dir, CANONICAL_OCCUPANCY_FILE)?,
            profiles: read_array(&self.dir, PROFILES_FILE)?,
            products: read_array(&self.dir, PRODUCTS_FILE)?,
            published: read_array(&self.dir, PUBLISHED_FILE)?,
            audit: read_array(&self.dir, AUDIT_FILE)?,
        };
        MesaStore::from_collections(collections)
    }
}
