//! # Wallet Index Service
//!
//! One mutex guards the whole wallet state. A mutation runs against a copy,
//! the copy is saved, and only then does it replace the live state. A failed
//! save leaves both storage and memory as they were.
//!
//! Matching is per subchain. When two subchains see the same transaction,
//! its net effect is only complete once both have scanned the block; until
//! then the balance may be under-counted.

use std::collections::BTreeSet;
use std::sync::Arc;

use cs_04_tx_codec::{Block, Transaction};
use cs_telemetry::{log_block_event, log_tx_event, TelemetryContext};
use parking_lot::Mutex;
use shared_types::{display_hash, BlockHash, Outpoint, Position, Txid};
use tracing::{debug, info, warn};

use crate::domain::{
    Balance, Bip32Index, LedgerChanges, OutputState, PatternId, PatternIndex, SubchainId,
    SubchainKey, TxRecord, TxoRecord, WalletPattern, WalletSnapshot,
};
use crate::error::WalletError;
use crate::ports::inbound::WalletIndexApi;
use crate::ports::outbound::WalletStorage;

const COMPONENT: &str = "wallet-index";

/// Pattern tables and UTXO ledger over a [`WalletStorage`].
pub struct WalletIndex<S: WalletStorage> {
    storage: Arc<S>,
    telemetry: TelemetryContext,
    state: Mutex<WalletSnapshot>,
}

impl<S: WalletStorage> WalletIndex<S> {
    /// Open the index, restoring the last saved snapshot.
    pub fn new(storage: Arc<S>, telemetry: TelemetryContext) -> Result<Self, WalletError> {
        let state = match storage.load()? {
            Some(bytes) => {
                let snapshot = WalletSnapshot::from_bytes(&bytes)?;
                info!(
                    outputs = snapshot.ledger.outpoints().count(),
                    "Restored wallet snapshot"
                );
                snapshot
            }
            None => WalletSnapshot::default(),
        };
        Ok(Self {
            storage,
            telemetry,
            state: Mutex::new(state),
        })
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    fn mutate<T, F>(&self, operation: F) -> Result<T, WalletError>
    where
        F: FnOnce(&mut WalletSnapshot) -> Result<T, WalletError>,
    {
        let mut guard = self.state.lock();
        let mut next = guard.clone();
        let output = operation(&mut next)?;
        self.storage.save(&next.to_bytes()?)?;
        *guard = next;
        Ok(output)
    }

    fn read<T, F>(&self, query: F) -> T
    where
        F: FnOnce(&WalletSnapshot) -> T,
    {
        query(&self.state.lock())
    }

    fn confirm(
        state: &mut WalletSnapshot,
        id: &SubchainId,
        elements: &BTreeSet<Vec<u8>>,
        position: Position,
        tx: &Transaction,
    ) -> LedgerChanges {
        let owned = owned_outputs(&mut state.patterns, id, elements, tx);
        state.ledger.add_confirmed(tx, position, &owned)
    }

    fn log_changes(&self, tx: &Transaction, changes: &LedgerChanges, confirmed: bool) {
        if changes.is_empty() {
            return;
        }
        log_tx_event!(
            debug,
            COMPONENT,
            "Wallet transaction applied",
            display_hash(&tx.txid()),
            created = changes.created.len(),
            spent = changes.spent.len(),
            confirmed
        );
    }
}

/// Outputs of `tx` paying to a pattern of `id`, marking those patterns used.
fn owned_outputs(
    patterns: &mut PatternIndex,
    id: &SubchainId,
    elements: &BTreeSet<Vec<u8>>,
    tx: &Transaction,
) -> Vec<(u32, PatternId)> {
    let mut owned = Vec::new();
    for found in tx.find_matches(elements) {
        if let Some(pattern) = patterns.pattern_for(id, &found.element) {
            patterns.mark_used(&pattern);
            owned.push((found.outpoint.index, pattern));
        }
    }
    owned
}

fn merge(total: &mut LedgerChanges, changes: LedgerChanges) {
    total.created.extend(changes.created);
    total.spent.extend(changes.spent);
}

impl<S: WalletStorage> WalletIndexApi for WalletIndex<S> {
    fn subchain_add_elements(
        &self,
        key: &SubchainKey,
        elements: Vec<(Bip32Index, Vec<Vec<u8>>)>,
    ) -> Result<SubchainId, WalletError> {
        let count = elements.len();
        let id = self.mutate(|state| state.patterns.add_elements(key, elements))?;
        debug!(subchain = %key, count, "Registered patterns");
        Ok(id)
    }

    fn subchain_last_indexed(&self, id: &SubchainId) -> Result<Option<Bip32Index>, WalletError> {
        self.read(|state| state.patterns.last_indexed(id))
    }

    fn subchain_last_used(&self, id: &SubchainId) -> Result<Option<Bip32Index>, WalletError> {
        self.read(|state| state.patterns.last_used(id))
    }

    fn subchain_last_scanned(&self, id: &SubchainId) -> Result<Option<Position>, WalletError> {
        self.read(|state| state.patterns.last_scanned(id))
    }

    fn subchain_set_last_scanned(
        &self,
        id: &SubchainId,
        position: Option<Position>,
    ) -> Result<(), WalletError> {
        self.mutate(|state| state.patterns.set_last_scanned(id, position))
    }

    fn subchain_match_block(
        &self,
        id: &SubchainId,
        block: &BlockHash,
        patterns: Vec<PatternId>,
    ) -> Result<(), WalletError> {
        self.mutate(|state| {
            state.patterns.key(id)?;
            state.patterns.record_tested(*block, patterns);
            Ok(())
        })
    }

    fn subchain_drop_index(&self, id: &SubchainId) -> Result<(), WalletError> {
        self.mutate(|state| state.patterns.drop_index(id))?;
        info!(subchain = %display_hash(id), "Dropped subchain scan index");
        Ok(())
    }

    fn get_patterns(&self, id: &SubchainId) -> Result<Vec<WalletPattern>, WalletError> {
        self.read(|state| state.patterns.patterns(id))
    }

    fn get_untested_patterns(
        &self,
        id: &SubchainId,
        block: &BlockHash,
    ) -> Result<Vec<WalletPattern>, WalletError> {
        self.read(|state| state.patterns.untested(id, block))
    }

    fn add_confirmed_transaction(
        &self,
        id: &SubchainId,
        position: Position,
        tx: &Transaction,
    ) -> Result<LedgerChanges, WalletError> {
        let changes = self.mutate(|state| {
            let elements = state.patterns.element_set(id)?;
            Ok(Self::confirm(state, id, &elements, position, tx))
        })?;
        self.log_changes(tx, &changes, true);
        Ok(changes)
    }

    fn add_confirmed_block(
        &self,
        id: &SubchainId,
        position: Position,
        block: &Block,
    ) -> Result<LedgerChanges, WalletError> {
        let _span = self.telemetry.span().entered();
        let changes = self.mutate(|state| {
            let elements = state.patterns.element_set(id)?;
            let mut total = LedgerChanges::default();
            for tx in block.transactions() {
                merge(&mut total, Self::confirm(state, id, &elements, position, tx));
            }
            Ok(total)
        })?;
        if !changes.is_empty() {
            log_block_event!(
                info,
                COMPONENT,
                "Wallet activity in block",
                position.height,
                display_hash(&position.hash),
                created = changes.created.len(),
                spent = changes.spent.len()
            );
        }
        Ok(changes)
    }

    fn add_mempool_transaction(
        &self,
        id: &SubchainId,
        tx: &Transaction,
    ) -> Result<LedgerChanges, WalletError> {
        let changes = self.mutate(|state| {
            let elements = state.patterns.element_set(id)?;
            let owned = owned_outputs(&mut state.patterns, id, &elements, tx);
            Ok(state.ledger.add_mempool(tx, &owned))
        })?;
        self.log_changes(tx, &changes, false);
        Ok(changes)
    }

    fn reorg(&self, undone: &[Position]) -> Result<Vec<Outpoint>, WalletError> {
        if undone.is_empty() {
            return Ok(Vec::new());
        }
        let _span = self.telemetry.span().entered();
        let result = self.mutate(|state| Ok(state.ledger.reorg(undone)));
        match &result {
            Ok(affected) => info!(
                blocks = undone.len(),
                outputs = affected.len(),
                "Wallet outputs rolled back"
            ),
            Err(e) => warn!(error = %e, "Wallet reorg not persisted"),
        }
        result
    }

    fn get_balance(&self) -> Result<Balance, WalletError> {
        let result = self.read(|state| state.ledger.balance());
        if let Err(e) = &result {
            warn!(error = %e, "Wallet balance unavailable");
        }
        result
    }

    fn get_outputs(&self, state: OutputState) -> Vec<(Outpoint, TxoRecord)> {
        self.read(|snapshot| snapshot.ledger.outputs_in(state))
    }

    fn output_state(&self, outpoint: &Outpoint) -> Option<OutputState> {
        self.read(|state| state.ledger.state(outpoint))
    }

    fn get_transactions(&self) -> Vec<(Txid, TxRecord)> {
        self.read(|state| {
            state
                .ledger
                .transactions()
                .iter()
                .map(|(txid, record)| (*txid, record.clone()))
                .collect()
        })
    }
}
