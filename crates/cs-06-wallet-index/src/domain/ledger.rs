//! # UTXO Ledger
//!
//! Wallet outputs and their lifecycle.
//!
//! ## State Machine
//!
//! ```text
//! [UnconfirmedNew] ──confirm──→ [ConfirmedNew] ──spend──→ [ConfirmedSpend]
//!        │                            │
//!        └──mempool spend──→ [UnconfirmedSpend] ──confirm──┘
//!
//!   reorg: *New → [OrphanedNew], *Spend → [OrphanedSpend]
//! ```
//!
//! Every transition goes through [`UtxoLedger::change_state`], which keeps
//! each outpoint in at most one height-bucketed state set.

use std::collections::{BTreeMap, BTreeSet};

use cs_04_tx_codec::{Output, Transaction};
use serde::{Deserialize, Serialize};
use shared_types::{BlockHash, Height, Outpoint, Position, Txid, UNKNOWN_HEIGHT};

use super::subchain::PatternId;
use crate::error::WalletError;

/// Lifecycle state of a wallet output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OutputState {
    UnconfirmedNew,
    ConfirmedNew,
    UnconfirmedSpend,
    ConfirmedSpend,
    OrphanedNew,
    OrphanedSpend,
}

impl OutputState {
    pub const ALL: [OutputState; 6] = [
        OutputState::UnconfirmedNew,
        OutputState::ConfirmedNew,
        OutputState::UnconfirmedSpend,
        OutputState::ConfirmedSpend,
        OutputState::OrphanedNew,
        OutputState::OrphanedSpend,
    ];

    /// Counted towards the balance.
    pub fn is_unspent(&self) -> bool {
        matches!(self, OutputState::UnconfirmedNew | OutputState::ConfirmedNew)
    }

    pub fn is_spent(&self) -> bool {
        matches!(
            self,
            OutputState::UnconfirmedSpend | OutputState::ConfirmedSpend | OutputState::OrphanedSpend
        )
    }
}

/// A wallet output: where it was created and its serialized form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxoRecord {
    /// Creation height, [`UNKNOWN_HEIGHT`] while unconfirmed.
    pub height: Height,
    pub output: Vec<u8>,
    pub value: i64,
    pub pattern: Option<PatternId>,
    pub spent_by: Option<Txid>,
}

/// A wallet-relevant transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    pub raw: Vec<u8>,
    pub block: Option<Position>,
}

impl TxRecord {
    pub fn transaction(&self) -> Result<Transaction, WalletError> {
        Ok(Transaction::parse(&self.raw)?)
    }
}

/// Wallet balance in base units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub confirmed: i64,
    pub unconfirmed: i64,
}

impl Balance {
    pub fn total(&self) -> Result<i64, WalletError> {
        self.confirmed
            .checked_add(self.unconfirmed)
            .ok_or(WalletError::BalanceOverflow("total"))
    }
}

/// What one transaction changed in the ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerChanges {
    pub created: Vec<Outpoint>,
    pub spent: Vec<Outpoint>,
}

impl LedgerChanges {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.spent.is_empty()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UtxoLedger {
    outputs: BTreeMap<Outpoint, TxoRecord>,
    states: BTreeMap<OutputState, BTreeMap<Height, BTreeSet<Outpoint>>>,
    locations: BTreeMap<Outpoint, (OutputState, Height)>,
    transactions: BTreeMap<Txid, TxRecord>,
}

impl UtxoLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `outpoint` into `target` at `height`, out of wherever it was.
    pub fn change_state(&mut self, outpoint: &Outpoint, height: Height, target: OutputState) {
        if let Some((state, old_height)) = self.locations.remove(outpoint) {
            self.remove_from_bucket(outpoint, state, old_height);
        }
        self.states
            .entry(target)
            .or_default()
            .entry(height)
            .or_default()
            .insert(*outpoint);
        self.locations.insert(*outpoint, (target, height));
    }

    fn remove_from_bucket(&mut self, outpoint: &Outpoint, state: OutputState, height: Height) {
        let Some(buckets) = self.states.get_mut(&state) else {
            return;
        };
        if let Some(set) = buckets.get_mut(&height) {
            set.remove(outpoint);
            if set.is_empty() {
                buckets.remove(&height);
            }
        }
    }

    pub fn state(&self, outpoint: &Outpoint) -> Option<OutputState> {
        self.locations.get(outpoint).map(|(state, _)| *state)
    }

    pub fn output(&self, outpoint: &Outpoint) -> Option<&TxoRecord> {
        self.outputs.get(outpoint)
    }

    pub fn contains(&self, outpoint: &Outpoint) -> bool {
        self.outputs.contains_key(outpoint)
    }

    /// Outputs currently in `state`, ordered by bucket height.
    pub fn outputs_in(&self, state: OutputState) -> Vec<(Outpoint, TxoRecord)> {
        self.states
            .get(&state)
            .into_iter()
            .flat_map(|buckets| buckets.values().flatten())
            .filter_map(|outpoint| self.outputs.get(outpoint).map(|r| (*outpoint, r.clone())))
            .collect()
    }

    /// Number of state sets holding `outpoint`.
    pub fn bucket_count(&self, outpoint: &Outpoint) -> usize {
        self.states
            .values()
            .filter(|buckets| buckets.values().any(|set| set.contains(outpoint)))
            .count()
    }

    pub fn outpoints(&self) -> impl Iterator<Item = &Outpoint> {
        self.outputs.keys()
    }

    /// Values come off the wire unchecked, so sums fail instead of wrapping.
    pub fn balance(&self) -> Result<Balance, WalletError> {
        let sum = |state, label| -> Result<i64, WalletError> {
            self.outputs_in(state)
                .iter()
                .try_fold(0i64, |acc, (_, record)| acc.checked_add(record.value))
                .ok_or(WalletError::BalanceOverflow(label))
        };
        Ok(Balance {
            confirmed: sum(OutputState::ConfirmedNew, "confirmed")?,
            unconfirmed: sum(OutputState::UnconfirmedNew, "unconfirmed")?,
        })
    }

    pub fn transactions(&self) -> &BTreeMap<Txid, TxRecord> {
        &self.transactions
    }

    /// Apply a transaction mined at `block`.
    ///
    /// `owned` lists the created outputs that belong to the wallet, with the
    /// pattern that matched each.
    pub fn add_confirmed(
        &mut self,
        tx: &Transaction,
        block: Position,
        owned: &[(u32, PatternId)],
    ) -> LedgerChanges {
        let txid = tx.txid();
        let mut changes = LedgerChanges::default();

        for (index, pattern) in owned {
            let Some(output) = tx.outputs().get(*index as usize) else {
                continue;
            };
            let outpoint = Outpoint::new(txid, *index);
            let target = match self.state(&outpoint) {
                Some(OutputState::UnconfirmedSpend | OutputState::ConfirmedSpend) => None,
                Some(OutputState::OrphanedSpend) => Some(OutputState::UnconfirmedSpend),
                _ => Some(OutputState::ConfirmedNew),
            };
            let record = self
                .outputs
                .entry(outpoint)
                .or_insert_with(|| new_record(output, *pattern));
            record.height = block.height;
            if let Some(target) = target {
                let height = match target {
                    OutputState::ConfirmedNew => block.height,
                    _ => UNKNOWN_HEIGHT,
                };
                self.change_state(&outpoint, height, target);
            }
            changes.created.push(outpoint);
        }

        for input in tx.inputs() {
            let previous = *input.previous();
            if let Some(record) = self.outputs.get_mut(&previous) {
                record.spent_by = Some(txid);
                self.change_state(&previous, block.height, OutputState::ConfirmedSpend);
                changes.spent.push(previous);
            }
        }

        if !changes.is_empty() {
            self.transactions.insert(
                txid,
                TxRecord {
                    raw: tx.serialize(),
                    block: Some(block),
                },
            );
        }
        changes
    }

    /// Apply a transaction seen in the mempool.
    pub fn add_mempool(&mut self, tx: &Transaction, owned: &[(u32, PatternId)]) -> LedgerChanges {
        let txid = tx.txid();
        let mut changes = LedgerChanges::default();

        for (index, pattern) in owned {
            let Some(output) = tx.outputs().get(*index as usize) else {
                continue;
            };
            let outpoint = Outpoint::new(txid, *index);
            if self.contains(&outpoint) {
                continue;
            }
            self.outputs.insert(outpoint, new_record(output, *pattern));
            self.change_state(&outpoint, UNKNOWN_HEIGHT, OutputState::UnconfirmedNew);
            changes.created.push(outpoint);
        }

        for input in tx.inputs() {
            let previous = *input.previous();
            let unspent = self.state(&previous).is_some_and(|s| !s.is_spent());
            if let (true, Some(record)) = (unspent, self.outputs.get_mut(&previous)) {
                record.spent_by = Some(txid);
                self.change_state(&previous, UNKNOWN_HEIGHT, OutputState::UnconfirmedSpend);
                changes.spent.push(previous);
            }
        }

        if !changes.is_empty() {
            self.transactions.entry(txid).or_insert_with(|| TxRecord {
                raw: tx.serialize(),
                block: None,
            });
        }
        changes
    }

    /// Undo every confirmation at or above the lowest height in `undone`.
    ///
    /// Outputs created there become orphaned. Outputs whose spend was undone
    /// but whose creation survives return to `ConfirmedNew`.
    pub fn reorg(&mut self, undone: &[Position]) -> Vec<Outpoint> {
        let Some(fork) = undone.iter().map(|p| p.height).min() else {
            return Vec::new();
        };
        let undone_blocks: BTreeSet<BlockHash> = undone.iter().map(|p| p.hash).collect();

        let mut affected = Vec::new();
        let snapshot: Vec<(Outpoint, OutputState, Height)> = self
            .locations
            .iter()
            .map(|(outpoint, (state, height))| (*outpoint, *state, *height))
            .collect();
        for (outpoint, state, height) in snapshot {
            let Some(created) = self.outputs.get(&outpoint).map(|r| r.height) else {
                continue;
            };
            let creation_undone = created != UNKNOWN_HEIGHT && created >= fork;
            let next = match state {
                OutputState::ConfirmedNew if creation_undone => Some((created, OutputState::OrphanedNew)),
                OutputState::ConfirmedSpend | OutputState::UnconfirmedSpend if creation_undone => {
                    Some((height, OutputState::OrphanedSpend))
                }
                OutputState::ConfirmedSpend if height >= fork => Some((created, OutputState::ConfirmedNew)),
                _ => None,
            };
            if let Some((height, target)) = next {
                if target == OutputState::ConfirmedNew {
                    if let Some(record) = self.outputs.get_mut(&outpoint) {
                        record.spent_by = None;
                    }
                }
                self.change_state(&outpoint, height, target);
                affected.push(outpoint);
            }
        }

        for record in self.transactions.values_mut() {
            let orphaned = record
                .block
                .is_some_and(|b| b.height >= fork || undone_blocks.contains(&b.hash));
            if orphaned {
                record.block = None;
            }
        }
        affected
    }
}

fn new_record(output: &Output, pattern: PatternId) -> TxoRecord {
    TxoRecord {
        height: UNKNOWN_HEIGHT,
        output: output.serialize(),
        value: output.value(),
        pattern: Some(pattern),
        spent_by: None,
    }
}
