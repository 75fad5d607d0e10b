use core::cmp::Ordering;

use crate::{encoding::SctId, namespace::Namespace};

/// One persisted identifier, issued by the engine or registered from outside.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SctIdRecord {
    pub sctid: String,
    pub namespace: Namespace,
    pub partition_id: String,
    pub sequence: u64,
}

impl SctIdRecord {
    /// Builds the record for `id`, whose encoded form is `sctid`.
    pub fn new(id: &SctId, sctid: impl Into<String>) -> Self {
        Self {
            sctid: sctid.into(),
            namespace: id.namespace().clone(),
            partition_id: id.partition_id(),
            sequence: id.item_id(),
        }
    }
}

/// Ordering applied to search hits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SequenceOrder {
    #[default]
    Unsorted,
    Ascending,
    Descending,
}

/// Exact-match filter over [`SctIdRecord`] fields.
///
/// # Example
/// ```
/// use sctid::{Namespace, RecordQuery};
///
/// let query = RecordQuery::new()
///     .namespace(Namespace::International)
///     .partition_id("00")
///     .sequence_descending();
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordQuery {
    namespace: Option<Namespace>,
    partition_id: Option<String>,
    order: SequenceOrder,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = Some(namespace);
        self
    }

    #[must_use]
    pub fn partition_id(mut self, partition_id: impl Into<String>) -> Self {
        self.partition_id = Some(partition_id.into());
        self
    }

    #[must_use]
    pub fn sequence_ascending(mut self) -> Self {
        self.order = SequenceOrder::Ascending;
        self
    }

    #[must_use]
    pub fn sequence_descending(mut self) -> Self {
        self.order = SequenceOrder::Descending;
        self
    }

    pub fn order(&self) -> SequenceOrder {
        self.order
    }

    pub fn matches(&self, record: &SctIdRecord) -> bool {
        self.namespace
            .as_ref()
            .is_none_or(|namespace| *namespace == record.namespace)
            && self
                .partition_id
                .as_deref()
                .is_none_or(|partition_id| partition_id == record.partition_id)
    }

    /// Orders two matching records according to [`Self::order`].
    pub fn compare(&self, a: &SctIdRecord, b: &SctIdRecord) -> Ordering {
        match self.order {
            SequenceOrder::Unsorted => Ordering::Equal,
            SequenceOrder::Ascending => a.sequence.cmp(&b.sequence),
            SequenceOrder::Descending => b.sequence.cmp(&a.sequence),
        }
    }
}
