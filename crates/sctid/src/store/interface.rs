use super::{RecordQuery, SctIdRecord};
use crate::{
    error::Result,
    namespace::{Category, Namespace},
};

/// The system of record for issued and registered identifiers.
///
/// Records are keyed by their formatted identifier. The store outlives the
/// process; counters only consult it when they are first constructed.
pub trait IdentifierStore: Send + Sync {
    /// Inserts `record` unless one with the same identifier already exists.
    ///
    /// Returns `true` if the record was inserted. The check and the insert are
    /// a single atomic step.
    fn insert(&self, record: SctIdRecord) -> Result<bool>;

    fn get(&self, sctid: &str) -> Result<Option<SctIdRecord>>;

    /// Removes the record for `sctid`, returning it if present.
    fn remove(&self, sctid: &str) -> Result<Option<SctIdRecord>>;

    /// Returns at most `limit` matching records after skipping `offset`.
    fn search(&self, query: &RecordQuery, offset: usize, limit: usize)
    -> Result<Vec<SctIdRecord>>;

    fn contains(&self, sctid: &str) -> Result<bool> {
        Ok(self.get(sctid)?.is_some())
    }

    /// The highest sequence recorded for `(namespace, category)`.
    fn last_sequence(&self, namespace: &Namespace, category: Category) -> Result<Option<u64>> {
        let query = RecordQuery::new()
            .namespace(namespace.clone())
            .partition_id(category.partition_id(namespace))
            .sequence_descending();

        Ok(self
            .search(&query, 0, 1)?
            .into_iter()
            .next()
            .map(|record| record.sequence))
    }
}
