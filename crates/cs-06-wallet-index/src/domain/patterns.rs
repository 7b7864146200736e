//! Pattern tables and the block match index.
//!
//! Each subchain maps derivation indices to the filter elements of the
//! script derived there. Once a pattern has been tested against a block the
//! pair is recorded, and [`PatternIndex::untested`] never returns it for that
//! block again.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use shared_types::{BlockHash, Position};

use super::subchain::{pattern_id, Bip32Index, PatternId, SubchainId, SubchainKey, MAX_INDEX};
use crate::error::WalletError;

/// One derived script and the elements a filter is tested with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletPattern {
    pub id: PatternId,
    pub subchain: SubchainId,
    pub index: Bip32Index,
    pub elements: Vec<Vec<u8>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct SubchainPatterns {
    pub key: SubchainKey,
    pub elements: BTreeMap<Bip32Index, Vec<Vec<u8>>>,
    pub last_scanned: Option<Position>,
    pub last_used: Option<Bip32Index>,
}

impl SubchainPatterns {
    fn new(key: SubchainKey) -> Self {
        Self {
            key,
            elements: BTreeMap::new(),
            last_scanned: None,
            last_used: None,
        }
    }

    fn pattern(&self, id: &SubchainId, index: Bip32Index, elements: &[Vec<u8>]) -> WalletPattern {
        WalletPattern {
            id: pattern_id(id, index),
            subchain: *id,
            index,
            elements: elements.to_vec(),
        }
    }
}

/// All pattern tables of one wallet.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PatternIndex {
    subchains: BTreeMap<SubchainId, SubchainPatterns>,
    /// Element bytes to the pattern that produced them.
    by_element: BTreeMap<Vec<u8>, BTreeSet<PatternId>>,
    by_id: BTreeMap<PatternId, (SubchainId, Bip32Index)>,
    /// Patterns already tested against each block.
    tested: BTreeMap<BlockHash, BTreeSet<PatternId>>,
}

impl PatternIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn subchain(&self, id: &SubchainId) -> Result<&SubchainPatterns, WalletError> {
        self.subchains
            .get(id)
            .ok_or_else(|| WalletError::UnknownSubchain(shared_types::display_hash(id)))
    }

    fn subchain_mut(&mut self, id: &SubchainId) -> Result<&mut SubchainPatterns, WalletError> {
        self.subchains
            .get_mut(id)
            .ok_or_else(|| WalletError::UnknownSubchain(shared_types::display_hash(id)))
    }

    pub fn contains(&self, id: &SubchainId) -> bool {
        self.subchains.contains_key(id)
    }

    pub fn key(&self, id: &SubchainId) -> Result<SubchainKey, WalletError> {
        Ok(self.subchain(id)?.key)
    }

    /// Register elements for new indices. Re-registering an index with the
    /// same elements is a no-op.
    pub fn add_elements(
        &mut self,
        key: &SubchainKey,
        elements: Vec<(Bip32Index, Vec<Vec<u8>>)>,
    ) -> Result<SubchainId, WalletError> {
        let id = key.id();
        for (index, items) in &elements {
            if *index > MAX_INDEX {
                return Err(WalletError::IndexExhausted {
                    subchain: key.to_string(),
                    index: *index,
                });
            }
            let conflicting = self
                .subchains
                .get(&id)
                .and_then(|s| s.elements.get(index))
                .is_some_and(|existing| existing != items);
            if conflicting {
                return Err(WalletError::ConflictingPattern {
                    subchain: key.to_string(),
                    index: *index,
                });
            }
        }

        let subchain = self
            .subchains
            .entry(id)
            .or_insert_with(|| SubchainPatterns::new(*key));
        for (index, items) in elements {
            let pattern = pattern_id(&id, index);
            for element in &items {
                self.by_element
                    .entry(element.clone())
                    .or_default()
                    .insert(pattern);
            }
            self.by_id.insert(pattern, (id, index));
            subchain.elements.insert(index, items);
        }
        Ok(id)
    }

    pub fn last_indexed(&self, id: &SubchainId) -> Result<Option<Bip32Index>, WalletError> {
        Ok(self.subchain(id)?.elements.keys().next_back().copied())
    }

    pub fn last_scanned(&self, id: &SubchainId) -> Result<Option<Position>, WalletError> {
        Ok(self.subchain(id)?.last_scanned)
    }

    pub fn set_last_scanned(&mut self, id: &SubchainId, position: Option<Position>) -> Result<(), WalletError> {
        self.subchain_mut(id)?.last_scanned = position;
        Ok(())
    }

    /// Highest index seen on chain.
    pub fn last_used(&self, id: &SubchainId) -> Result<Option<Bip32Index>, WalletError> {
        Ok(self.subchain(id)?.last_used)
    }

    pub fn mark_used(&mut self, pattern: &PatternId) {
        let Some((id, index)) = self.by_id.get(pattern).copied() else {
            return;
        };
        if let Some(subchain) = self.subchains.get_mut(&id) {
            subchain.last_used = subchain.last_used.max(Some(index));
        }
    }

    pub fn record_tested(&mut self, block: BlockHash, patterns: impl IntoIterator<Item = PatternId>) {
        self.tested.entry(block).or_default().extend(patterns);
    }

    pub fn patterns(&self, id: &SubchainId) -> Result<Vec<WalletPattern>, WalletError> {
        let subchain = self.subchain(id)?;
        Ok(subchain
            .elements
            .iter()
            .map(|(index, items)| subchain.pattern(id, *index, items))
            .collect())
    }

    /// Patterns of `id` with no test record for `block`.
    pub fn untested(&self, id: &SubchainId, block: &BlockHash) -> Result<Vec<WalletPattern>, WalletError> {
        let subchain = self.subchain(id)?;
        let tested = self.tested.get(block);
        Ok(subchain
            .elements
            .iter()
            .map(|(index, items)| subchain.pattern(id, *index, items))
            .filter(|p| tested.map_or(true, |t| !t.contains(&p.id)))
            .collect())
    }

    /// Every element of `id`, for matching block contents.
    pub fn element_set(&self, id: &SubchainId) -> Result<BTreeSet<Vec<u8>>, WalletError> {
        Ok(self
            .subchain(id)?
            .elements
            .values()
            .flatten()
            .cloned()
            .collect())
    }

    /// Pattern of `id` that produced `element`.
    pub fn pattern_for(&self, id: &SubchainId, element: &[u8]) -> Option<PatternId> {
        self.by_element
            .get(element)?
            .iter()
            .find(|p| self.by_id.get(*p).is_some_and(|(s, _)| s == id))
            .copied()
    }

    /// Forget every test record and the scan position of `id` so it is
    /// scanned again from the start.
    pub fn drop_index(&mut self, id: &SubchainId) -> Result<(), WalletError> {
        let subchain = self.subchain_mut(id)?;
        subchain.last_scanned = None;
        let ids: BTreeSet<PatternId> = subchain
            .elements
            .keys()
            .map(|index| pattern_id(id, *index))
            .collect();
        for tested in self.tested.values_mut() {
            tested.retain(|p| !ids.contains(p));
        }
        self.tested.retain(|_, set| !set.is_empty());
        Ok(())
    }
}
