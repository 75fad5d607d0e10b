use portable_atomic::{AtomicUsize, Ordering};

use super::ItemIdStrategy;
use crate::{
    error::{Error, Result},
    namespace::{Category, Namespace},
};

/// Replays a fixed list of item ids forever, ignoring the requested key.
///
/// Makes no attempt to avoid collisions; used to exercise the identifier
/// service's retry and exhaustion handling.
#[derive(Debug)]
pub struct CyclingStrategy {
    item_ids: Vec<u64>,
    position: AtomicUsize,
}

impl CyclingStrategy {
    pub fn new(item_ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            item_ids: item_ids.into_iter().collect(),
            position: AtomicUsize::new(0),
        }
    }
}

impl ItemIdStrategy for CyclingStrategy {
    fn next_item_id(&self, namespace: &Namespace, category: Category) -> Result<u64> {
        if self.item_ids.is_empty() {
            return Err(Error::Exhausted {
                namespace: namespace.clone(),
                category,
            });
        }

        let position = self.position.fetch_add(1, Ordering::Relaxed);
        Ok(self.item_ids[position % self.item_ids.len()])
    }
}
