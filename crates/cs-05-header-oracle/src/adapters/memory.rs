//! In-memory header storage.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use parking_lot::RwLock;
use shared_types::{BlockHash, Height, Position};

use crate::domain::{StoredHeader, UpdateBatch};
use crate::error::OracleError;
use crate::ports::outbound::HeaderStorage;

#[derive(Default)]
struct State {
    headers: HashMap<BlockHash, Vec<u8>>,
    best: BTreeMap<Height, BlockHash>,
    checkpoint: Option<Position>,
    siblings: BTreeSet<BlockHash>,
    disconnected: BTreeSet<(BlockHash, BlockHash)>,
    banned: BTreeSet<BlockHash>,
}

/// [`HeaderStorage`] backed by maps behind one lock.
///
/// Records are kept bincode-encoded so every load goes through the same
/// decode and chain check a persistent store would.
#[derive(Default)]
pub struct InMemoryHeaderStorage {
    state: RwLock<State>,
}

impl InMemoryHeaderStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header_count(&self) -> usize {
        self.state.read().headers.len()
    }

    /// Overwrite a raw record. Lets tests plant corrupt or foreign data.
    pub fn insert_raw(&self, hash: BlockHash, bytes: Vec<u8>) {
        self.state.write().headers.insert(hash, bytes);
    }
}

impl HeaderStorage for InMemoryHeaderStorage {
    fn load_header(&self, hash: &BlockHash) -> Result<Option<StoredHeader>, OracleError> {
        match self.state.read().headers.get(hash) {
            Some(bytes) => Ok(Some(StoredHeader::from_bytes(bytes)?)),
            None => Ok(None),
        }
    }

    fn current_best(&self) -> Result<Option<Position>, OracleError> {
        Ok(self
            .state
            .read()
            .best
            .last_key_value()
            .map(|(height, hash)| Position::new(*height, *hash)))
    }

    fn current_checkpoint(&self) -> Result<Option<Position>, OracleError> {
        Ok(self.state.read().checkpoint)
    }

    fn best_hash(&self, height: Height) -> Result<Option<BlockHash>, OracleError> {
        Ok(self.state.read().best.get(&height).copied())
    }

    fn disconnected_hashes(&self) -> Result<Vec<(BlockHash, BlockHash)>, OracleError> {
        Ok(self.state.read().disconnected.iter().copied().collect())
    }

    fn disconnected_children(&self, parent: &BlockHash) -> Result<Vec<BlockHash>, OracleError> {
        Ok(self
            .state
            .read()
            .disconnected
            .range((*parent, [0u8; 32])..=(*parent, [0xff; 32]))
            .map(|(_, child)| *child)
            .collect())
    }

    fn sibling_hashes(&self) -> Result<Vec<BlockHash>, OracleError> {
        Ok(self.state.read().siblings.iter().copied().collect())
    }

    fn banned_hashes(&self) -> Result<Vec<BlockHash>, OracleError> {
        Ok(self.state.read().banned.iter().copied().collect())
    }

    fn apply_update(&self, batch: UpdateBatch) -> Result<(), OracleError> {
        // Encode everything first so a failure leaves the state untouched.
        let encoded = batch
            .headers
            .iter()
            .map(|(hash, record)| Ok((*hash, record.to_bytes()?)))
            .collect::<Result<Vec<_>, OracleError>>()?;

        let mut state = self.state.write();
        state.headers.extend(encoded);
        if let Some(top) = batch.best_truncate_above {
            state.best.retain(|height, _| *height <= top);
        }
        state.best.extend(batch.best_set);
        if let Some(checkpoint) = batch.checkpoint {
            state.checkpoint = checkpoint;
        }
        batch.siblings.apply_to(&mut state.siblings);
        batch.disconnected.apply_to(&mut state.disconnected);
        batch.banned.apply_to(&mut state.banned);
        Ok(())
    }
}
