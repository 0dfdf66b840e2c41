//! JSON file collection
//!
//! An in-memory collection mirrored to a single JSON array file. Reads take
//! the shared lock; mutations take the exclusive lock for the whole
//! lookup + mutate + persist step. Every mutation rewrites the file in full
//! through a temporary file and a rename.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{StoreError, StoreResult};

/// An entity that can live in a [`JsonCollection`].
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Entity name used in error messages
    const ENTITY: &'static str;

    fn id(&self) -> &str;
}

#[derive(Debug)]
struct Indexed<T> {
    items: Vec<T>,
    by_id: HashMap<String, usize>,
}

/// File-backed collection with O(1) lookup by ID.
#[derive(Debug)]
pub struct JsonCollection<T> {
    path: PathBuf,
    state: RwLock<Indexed<T>>,
}

impl<T: Record> JsonCollection<T> {
    /// Load the collection from `path`. The file must exist.
    pub fn load(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let items = read_items(&path)?;
        Self::from_records(path, items)
    }

    /// Load the collection from `path`, starting empty if the file is missing.
    pub fn load_or_empty(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if !path.exists() {
            tracing::info!(path = %path.display(), entity = T::ENTITY, "Data file missing, starting empty");
            return Self::from_records(path, Vec::new());
        }
        Self::load(path)
    }

    /// Build a collection from records already in memory. Rejects duplicate IDs.
    pub fn from_records(path: impl Into<PathBuf>, items: Vec<T>) -> StoreResult<Self> {
        let mut by_id = HashMap::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if by_id.insert(item.id().to_string(), index).is_some() {
                return Err(StoreError::Duplicate {
                    entity: T::ENTITY,
                    field: "id",
                    key: item.id().to_string(),
                });
            }
        }

        Ok(Self {
            path: path.into(),
            state: RwLock::new(Indexed { items, by_id }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone of the record with the given ID
    pub fn get(&self, id: &str) -> Option<T> {
        let state = self.state.read();
        state.by_id.get(id).map(|&index| state.items[index].clone())
    }

    /// Run `f` over all records under the shared lock
    pub fn read<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.state.read().items)
    }

    /// Mutate the record with the given ID and persist the whole collection.
    ///
    /// Returns `Ok(None)` if no record has that ID. If persisting fails the
    /// in-memory record is restored, so memory never runs ahead of the file.
    pub fn update(&self, id: &str, f: impl FnOnce(&mut T)) -> StoreResult<Option<T>> {
        let mut state = self.state.write();
        let Some(&index) = state.by_id.get(id) else {
            return Ok(None);
        };

        let previous = state.items[index].clone();
        f(&mut state.items[index]);

        if let Err(e) = self.persist(&state.items) {
            state.items[index] = previous;
            return Err(e);
        }

        Ok(Some(state.items[index].clone()))
    }

    /// Append a record and persist the whole collection. Rejects a duplicate ID.
    pub fn append(&self, item: T) -> StoreResult<T> {
        let mut state = self.state.write();
        if state.by_id.contains_key(item.id()) {
            return Err(StoreError::Duplicate {
                entity: T::ENTITY,
                field: "id",
                key: item.id().to_string(),
            });
        }
        state.items.push(item.clone());

        if let Err(e) = self.persist(&state.items) {
            state.items.pop();
            return Err(e);
        }

        let index = state.items.len() - 1;
        state.by_id.insert(item.id().to_string(), index);
        Ok(item)
    }

    fn persist(&self, items: &[T]) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(items).map_err(|source| StoreError::Serialize {
            entity: T::ENTITY,
            source,
        })?;

        let tmp = tmp_path(&self.path);
        let persist_err = |source: io::Error| StoreError::Persist {
            path: self.path.display().to_string(),
            source,
        };

        fs::write(&tmp, bytes).map_err(persist_err)?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            persist_err(e)
        })?;

        tracing::debug!(path = %self.path.display(), records = items.len(), "Persisted collection");
        Ok(())
    }
}

fn read_items<T: DeserializeOwned>(path: &Path) -> StoreResult<Vec<T>> {
    let data = fs::read(path).map_err(|source| StoreError::Load {
        path: path.display().to_string(),
        source,
    })?;

    // An empty file is treated as an empty collection
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    serde_json::from_slice(&data).map_err(|source| StoreError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
