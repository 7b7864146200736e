//! In-memory adapters for tests and embedding.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use cs_02_gcs_filter::{GcsError, GcsFilter};
use cs_04_tx_codec::{compute_block_filter, Block, Script};
use parking_lot::RwLock;
use shared_crypto::hash160;
use shared_types::{BlockHash, FilterType};

use crate::domain::{Bip32Index, SubchainKey};
use crate::error::WalletError;
use crate::ports::outbound::{ChainDataSource, PatternSource, WalletStorage};

/// Snapshot storage held in memory.
#[derive(Default)]
pub struct InMemoryWalletStorage {
    snapshot: RwLock<Option<Vec<u8>>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl InMemoryWalletStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }

    /// Make every following `save` fail.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::Relaxed);
    }
}

impl WalletStorage for InMemoryWalletStorage {
    fn load(&self) -> Result<Option<Vec<u8>>, WalletError> {
        Ok(self.snapshot.read().clone())
    }

    fn save(&self, snapshot: &[u8]) -> Result<(), WalletError> {
        if self.fail_saves.load(Ordering::Relaxed) {
            return Err(WalletError::Storage("save rejected".into()));
        }
        *self.snapshot.write() = Some(snapshot.to_vec());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Filters and blocks the scanner can find, inserted by the caller.
#[derive(Default)]
pub struct InMemoryChainData {
    filters: RwLock<HashMap<(FilterType, BlockHash), GcsFilter>>,
    blocks: RwLock<HashMap<BlockHash, Arc<Block>>>,
}

impl InMemoryChainData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `block` and its filter of `filter_type`.
    pub fn insert_block(&self, block: Arc<Block>, filter_type: FilterType) -> Result<(), GcsError> {
        let filter = compute_block_filter(&block, filter_type, &[])?;
        self.insert_filter(filter_type, block.hash(), filter);
        self.insert_block_only(block);
        Ok(())
    }

    pub fn insert_filter(&self, filter_type: FilterType, block: BlockHash, filter: GcsFilter) {
        self.filters.write().insert((filter_type, block), filter);
    }

    /// Store a filter for `block` but hold the block back.
    pub fn insert_filter_only(&self, block: &Block, filter_type: FilterType) -> Result<(), GcsError> {
        let filter = compute_block_filter(block, filter_type, &[])?;
        self.insert_filter(filter_type, block.hash(), filter);
        Ok(())
    }

    pub fn insert_block_only(&self, block: Arc<Block>) {
        self.blocks.write().insert(block.hash(), block);
    }
}

impl ChainDataSource for InMemoryChainData {
    fn filter(&self, filter_type: FilterType, block: &BlockHash) -> Option<GcsFilter> {
        self.filters.read().get(&(filter_type, *block)).cloned()
    }

    fn block(&self, block: &BlockHash) -> Option<Arc<Block>> {
        self.blocks.read().get(block).cloned()
    }
}

/// Deterministic P2PKH derivation: the key hash is
/// `hash160(subchain id ∥ index)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptPatternSource;

impl ScriptPatternSource {
    pub fn script(key: &SubchainKey, index: Bip32Index) -> Script {
        let mut preimage = key.id().to_vec();
        preimage.extend_from_slice(&index.to_le_bytes());
        Script::p2pkh(&hash160(&preimage))
    }
}

impl PatternSource for ScriptPatternSource {
    fn derive(&self, key: &SubchainKey, index: Bip32Index) -> Result<Vec<Vec<u8>>, WalletError> {
        let script = Self::script(key, index);
        let element = match key.filter_type {
            FilterType::BasicBip158 | FilterType::BasicBchVariant => script.serialize(),
            FilterType::Es => script.pubkey_hash().map(<[u8]>::to_vec).unwrap_or_default(),
        };
        Ok(vec![element])
    }
}
