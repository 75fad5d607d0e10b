use std::collections::{HashMap, hash_map::Entry};

use parking_lot::RwLock;

use super::{IdentifierStore, RecordQuery, SctIdRecord};
use crate::error::Result;

/// An in-process [`IdentifierStore`].
///
/// Never fails. Contents are lost when the value is dropped, so it stands in
/// for a durable store in tests and single-run deployments.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, SctIdRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl IdentifierStore for MemoryStore {
    fn insert(&self, record: SctIdRecord) -> Result<bool> {
        match self.records.write().entry(record.sctid.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
        }
    }

    fn get(&self, sctid: &str) -> Result<Option<SctIdRecord>> {
        Ok(self.records.read().get(sctid).cloned())
    }

    fn remove(&self, sctid: &str) -> Result<Option<SctIdRecord>> {
        Ok(self.records.write().remove(sctid))
    }

    fn search(
        &self,
        query: &RecordQuery,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<SctIdRecord>> {
        let records = self.records.read();
        let mut hits: Vec<&SctIdRecord> = records
            .values()
            .filter(|record| query.matches(record))
            .collect();
        hits.sort_by(|a, b| query.compare(a, b));

        Ok(hits
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}
