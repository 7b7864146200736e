//! Read-through view of storage plus the changes staged so far.
//!
//! Later steps of one oracle operation see earlier ones while storage stays
//! untouched until the batch is committed.

use std::collections::{BTreeSet, HashMap};

use shared_types::{display_hash, BlockHash, ChainType, Height, Position};

use crate::domain::{HeaderRecord, StoredHeader, UpdateBatch};
use crate::error::OracleError;
use crate::ports::outbound::HeaderStorage;

/// Staging area for one oracle operation.
pub struct UpdateTransaction<'a> {
    storage: &'a dyn HeaderStorage,
    chain: ChainType,
    batch: UpdateBatch,
    records: HashMap<BlockHash, HeaderRecord>,
    tip: Option<Position>,
}

impl<'a> UpdateTransaction<'a> {
    pub fn new(storage: &'a dyn HeaderStorage, chain: ChainType) -> Self {
        Self {
            storage,
            chain,
            batch: UpdateBatch::default(),
            records: HashMap::new(),
            tip: None,
        }
    }

    pub fn chain(&self) -> ChainType {
        self.chain
    }

    pub fn load(&self, hash: &BlockHash) -> Result<Option<HeaderRecord>, OracleError> {
        if let Some(record) = self.records.get(hash) {
            return Ok(Some(record.clone()));
        }
        match self.storage.load_header(hash)? {
            Some(stored) => Ok(Some(stored.into_record(self.chain)?)),
            None => Ok(None),
        }
    }

    /// Load a header bookkeeping says must exist.
    pub fn require(&self, hash: &BlockHash) -> Result<HeaderRecord, OracleError> {
        self.load(hash)?
            .ok_or_else(|| OracleError::MissingHeader(display_hash(hash)))
    }

    pub fn put(&mut self, record: HeaderRecord) {
        let hash = record.hash();
        self.batch
            .headers
            .insert(hash, StoredHeader::from_record(&record));
        self.records.insert(hash, record);
    }

    pub fn best_hash(&self, height: Height) -> Result<Option<BlockHash>, OracleError> {
        if let Some(hash) = self.batch.best_set.get(&height) {
            return Ok(Some(*hash));
        }
        if self.batch.best_truncate_above.is_some_and(|top| height > top) {
            return Ok(None);
        }
        self.storage.best_hash(height)
    }

    pub fn is_best(&self, position: &Position) -> Result<bool, OracleError> {
        Ok(self.best_hash(position.height)? == Some(position.hash))
    }

    pub fn tip(&self) -> Result<Position, OracleError> {
        match self.tip {
            Some(tip) => Ok(tip),
            None => self
                .storage
                .current_best()?
                .ok_or_else(|| OracleError::Storage("no best chain".into())),
        }
    }

    /// Cut the best chain back to `height`.
    pub fn truncate_best(&mut self, height: Height) -> Result<(), OracleError> {
        let top = match self.batch.best_truncate_above {
            Some(existing) => existing.min(height),
            None => height,
        };
        self.batch.best_truncate_above = Some(top);
        self.batch.best_set.retain(|h, _| *h <= height);
        let hash = self
            .best_hash(height)?
            .ok_or_else(|| OracleError::MissingHeader(format!("best chain at height {height}")))?;
        self.tip = Some(Position::new(height, hash));
        Ok(())
    }

    /// Extend the best chain by `position`, which must sit directly on the tip.
    pub fn push_best(&mut self, position: Position) {
        self.batch.best_set.insert(position.height, position.hash);
        self.tip = Some(position);
    }

    pub fn checkpoint(&self) -> Result<Option<Position>, OracleError> {
        match self.batch.checkpoint {
            Some(staged) => Ok(staged),
            None => self.storage.current_checkpoint(),
        }
    }

    pub fn set_checkpoint(&mut self, checkpoint: Option<Position>) {
        self.batch.checkpoint = Some(checkpoint);
    }

    pub fn is_sibling(&self, hash: &BlockHash) -> Result<bool, OracleError> {
        match self.batch.siblings.contains(hash) {
            Some(staged) => Ok(staged),
            None => Ok(self.storage.sibling_hashes()?.contains(hash)),
        }
    }

    pub fn siblings(&self) -> Result<Vec<BlockHash>, OracleError> {
        let mut set: BTreeSet<BlockHash> = self.storage.sibling_hashes()?.into_iter().collect();
        self.batch.siblings.apply_to(&mut set);
        Ok(set.into_iter().collect())
    }

    pub fn add_sibling(&mut self, hash: BlockHash) {
        self.batch.siblings.insert(hash);
    }

    pub fn remove_sibling(&mut self, hash: BlockHash) {
        self.batch.siblings.delete(hash);
    }

    pub fn add_disconnected(&mut self, parent: BlockHash, child: BlockHash) {
        self.batch.disconnected.insert((parent, child));
    }

    /// Take every orphan waiting for `parent`.
    pub fn take_disconnected_children(&mut self, parent: &BlockHash) -> Result<Vec<BlockHash>, OracleError> {
        let mut children: BTreeSet<BlockHash> =
            self.storage.disconnected_children(parent)?.into_iter().collect();
        for (p, child) in &self.batch.disconnected.remove {
            if p == parent {
                children.remove(child);
            }
        }
        for (p, child) in &self.batch.disconnected.add {
            if p == parent {
                children.insert(*child);
            }
        }
        for child in &children {
            self.batch.disconnected.delete((*parent, *child));
        }
        Ok(children.into_iter().collect())
    }

    pub fn banned(&self) -> Result<Vec<BlockHash>, OracleError> {
        let mut set: BTreeSet<BlockHash> = self.storage.banned_hashes()?.into_iter().collect();
        self.batch.banned.apply_to(&mut set);
        Ok(set.into_iter().collect())
    }

    pub fn ban(&mut self, hash: BlockHash) {
        self.batch.siblings.delete(hash);
        self.batch.banned.insert(hash);
    }

    pub fn unban(&mut self, hash: BlockHash) {
        self.batch.banned.delete(hash);
    }

    pub fn into_batch(self) -> UpdateBatch {
        self.batch
    }
}
