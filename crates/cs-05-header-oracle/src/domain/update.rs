//! Staged oracle mutations.
//!
//! Every change to the header DAG is collected in an [`UpdateBatch`] and
//! handed to storage in one `apply_update` call.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use shared_types::{BlockHash, Height, Position};

use super::record::StoredHeader;

/// Set changes where adding and removing the same key cancel out.
#[derive(Clone, Debug)]
pub struct SetDelta<T: Ord> {
    pub add: BTreeSet<T>,
    pub remove: BTreeSet<T>,
}

impl<T: Ord> Default for SetDelta<T> {
    fn default() -> Self {
        Self {
            add: BTreeSet::new(),
            remove: BTreeSet::new(),
        }
    }
}

impl<T: Ord + Clone> SetDelta<T> {
    pub fn insert(&mut self, value: T) {
        self.remove.remove(&value);
        self.add.insert(value);
    }

    pub fn delete(&mut self, value: T) {
        self.add.remove(&value);
        self.remove.insert(value);
    }

    /// `Some` when this delta decides membership, `None` to defer to storage.
    pub fn contains(&self, value: &T) -> Option<bool> {
        if self.add.contains(value) {
            Some(true)
        } else if self.remove.contains(value) {
            Some(false)
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// Apply to a stored set.
    pub fn apply_to(&self, target: &mut BTreeSet<T>) {
        for value in &self.remove {
            target.remove(value);
        }
        for value in &self.add {
            target.insert(value.clone());
        }
    }
}

/// Everything one oracle operation changes, applied atomically.
#[derive(Clone, Debug, Default)]
pub struct UpdateBatch {
    pub headers: HashMap<BlockHash, StoredHeader>,
    /// Drop best-chain entries strictly above this height before `best_set`.
    pub best_truncate_above: Option<Height>,
    pub best_set: BTreeMap<Height, BlockHash>,
    /// `Some(None)` clears the checkpoint.
    pub checkpoint: Option<Option<Position>>,
    pub siblings: SetDelta<BlockHash>,
    /// `(parent, child)` pairs waiting for `parent`.
    pub disconnected: SetDelta<(BlockHash, BlockHash)>,
    pub banned: SetDelta<BlockHash>,
}

impl UpdateBatch {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
            && self.best_truncate_above.is_none()
            && self.best_set.is_empty()
            && self.checkpoint.is_none()
            && self.siblings.is_empty()
            && self.disconnected.is_empty()
            && self.banned.is_empty()
    }
}
