//! JSON-file backed request history

use std::path::PathBuf;

use crate::domain::HistoryEntry;

use super::{HistoryStore, JsonCollection, Record, StoreResult};

impl Record for HistoryEntry {
    const ENTITY: &'static str = "history";

    fn id(&self) -> &str {
        &self.id
    }
}

/// History log backed by `histories.json`. A missing file starts an empty log.
#[derive(Debug)]
pub struct JsonHistoryStore {
    entries: JsonCollection<HistoryEntry>,
}

impl JsonHistoryStore {
    pub fn load(path: impl Into<PathBuf>) -> StoreResult<Self> {
        Ok(Self {
            entries: JsonCollection::load_or_empty(path)?,
        })
    }
}

impl HistoryStore for JsonHistoryStore {
    fn append(&self, entry: HistoryEntry) -> StoreResult<HistoryEntry> {
        self.entries.append(entry)
    }

    fn entries_for(&self, customer_id: &str) -> Vec<HistoryEntry> {
        self.entries.read(|entries| {
            entries
                .iter()
                .filter(|entry| entry.customer_id == customer_id)
                .cloned()
                .collect()
        })
    }
}
